//! Write a message to a serial port and print what comes back.
//!
//! With a TX-RX loopback plug fitted the message is echoed verbatim; on an
//! open line the read times out after `--vtime` deciseconds.
//!
//! ```bash
//! cargo run --example loopback -- --port /dev/ttyUSB0 --baud 9600 --message "AT\r\n"
//! ```

use clap::Parser;
use serial_stream::config::ConfigLoader;
use serial_stream::{
    logging, BaudRate, CharacterSize, FlowControl, Parity, PortParameters, SerialStreamBuf,
    StopBits,
};
use std::io::{BufRead, Write};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "loopback", about = "Serial loopback check")]
struct Args {
    /// Device path or configured alias
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate; defaults to the configured test baud
    #[arg(short, long)]
    baud: Option<u32>,

    /// Text to send
    #[arg(short, long, default_value = "serial-stream loopback\n")]
    message: String,

    /// Read timeout in deciseconds
    #[arg(long, default_value_t = 10)]
    vtime: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = ConfigLoader::load()?.into_config();
    logging::init(&config.logging)?;

    let port = args
        .port
        .or_else(|| config.testing.port.clone())
        .map(|p| config.serial.resolve_port(&p))
        .ok_or("no port given; pass --port or set TEST_PORT")?;
    let baud = match args.baud {
        Some(bps) => BaudRate::try_from(bps)?,
        None => config.testing.baud_rate,
    };

    let params = PortParameters::new(
        baud,
        CharacterSize::Eight,
        FlowControl::None,
        Parity::None,
        StopBits::One,
    )
    .with_vmin(0)
    .with_vtime(args.vtime);

    let mut stream = SerialStreamBuf::with_parameters(&port, &params)?;
    info!(port = %port, baud = %baud, "port open");

    stream.flush_io_buffers()?;
    stream.write_all(args.message.as_bytes())?;
    stream.flush()?;

    let mut echoed = Vec::with_capacity(args.message.len());
    while echoed.len() < args.message.len() {
        let chunk = stream.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        let byte = chunk[0];
        stream.consume(1);
        echoed.push(byte);
    }

    println!(
        "sent {} bytes, received {}: {:?}",
        args.message.len(),
        echoed.len(),
        String::from_utf8_lossy(&echoed)
    );

    stream.close()?;
    Ok(())
}
