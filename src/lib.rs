//! Serial Stream Library
//!
//! Treats a serial device as an unbuffered byte stream while exposing the
//! device-specific line parameters: baud rate, character size, parity, stop
//! bits, flow control and the non-canonical `VMIN`/`VTIME` read controls.
//!
//! # Modules
//!
//! - `port`: symbolic parameters, the `SerialDevice` driver trait, the unix
//!   tty backend and an in-memory mock
//! - `stream`: `SerialStreamBuf`, the stream adapter and open/close lifecycle
//! - `config`: Configuration management with TOML support
//! - `logging`: `tracing` subscriber setup

pub mod config;
pub mod logging;
pub mod port;
pub mod stream;

// Re-export commonly used types for convenience
pub use port::{
    BaudRate, CharacterSize, ClearBuffer, ErrorKind, FlowControl, MockDevice, OpenMode, Parity,
    PortError, PortParameters, PortResult, SerialDevice, StopBits,
};
pub use stream::{Availability, SerialStreamBuf};

#[cfg(unix)]
pub use port::TtyDevice;

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
