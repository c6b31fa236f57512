//! Tests requiring actual serial hardware.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0          # required
//! export TEST_BAUD=9600                  # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if port has TX-RX loopback
//!
//! cargo test --features hardware-tests --test integration_hardware -- --ignored
//! ```

use super::utils::{skip_without_hardware, PortTestFixture, TimingHelper};
use serial_stream::{Availability, BaudRate, ErrorKind, OpenMode, SerialStreamBuf, TtyDevice};
use std::io::{BufRead, Write};

#[test]
#[ignore]
fn test_real_port_open_close() {
    let port_name = match skip_without_hardware() {
        Some(p) => p,
        None => return,
    };

    let mut stream = SerialStreamBuf::<TtyDevice>::new();
    stream
        .open(&port_name, OpenMode::READ_WRITE)
        .unwrap_or_else(|e| panic!("Port open failed: {}", e));
    assert!(stream.is_open());
    assert_eq!(stream.name(), Some(port_name.as_str()));

    // Default parameters are applied on open.
    assert_eq!(stream.baud_rate().unwrap(), BaudRate::Baud115200);

    let err = stream
        .open(&port_name, OpenMode::READ_WRITE)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PortOpen);

    stream.close().unwrap();
    assert!(!stream.is_open());
}

#[test]
#[ignore]
fn test_real_port_configuration_roundtrip() {
    let mut fixture = match PortTestFixture::setup() {
        Some(f) => f,
        None => return,
    };

    let baud = fixture.config.baud_rate;
    assert_eq!(fixture.stream.baud_rate().unwrap(), baud);

    fixture.stream.set_baud_rate(BaudRate::Baud19200).unwrap();
    assert_eq!(fixture.stream.baud_rate().unwrap(), BaudRate::Baud19200);

    fixture.stream.set_vtime(3).unwrap();
    assert_eq!(fixture.stream.vtime().unwrap(), 3);
}

#[test]
#[ignore]
fn test_real_port_flush_queues() {
    let mut fixture = match PortTestFixture::setup() {
        Some(f) => f,
        None => return,
    };

    fixture.stream.flush_io_buffers().unwrap();
    assert_eq!(fixture.stream.available(), Availability::Empty);
}

#[test]
#[ignore]
fn test_real_port_loopback_line() {
    let mut fixture = match PortTestFixture::setup() {
        Some(f) => f,
        None => return,
    };
    if !fixture.loopback_enabled() {
        println!("Skipping loopback test: TEST_LOOPBACK not set");
        return;
    }

    let timer = TimingHelper::new("loopback line");
    fixture.stream.flush_io_buffers().unwrap();
    fixture.stream.write_all(b"serial-stream\n").unwrap();
    fixture.stream.flush().unwrap();

    let mut line = String::new();
    fixture.stream.read_line(&mut line).unwrap();
    assert_eq!(line, "serial-stream\n");
    assert!(timer.finish() < fixture.config.timeout() * 2);
}
