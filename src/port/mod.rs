//! Device layer for serial communication.
//!
//! Provides the symbolic parameter types, the `SerialDevice` driver trait,
//! a termios-backed implementation for unix ttys and an in-memory mock.

pub mod error;
pub mod mock;
pub mod params;
pub mod traits;

#[cfg(unix)]
pub mod tty;

pub use error::{ErrorKind, PortError, PortResult};
pub use mock::MockDevice;
pub use params::*;
pub use traits::*;

#[cfg(unix)]
pub use tty::TtyDevice;
