//! Port-specific error types.
//!
//! `PortError` covers every failure the device layer and the stream adapter
//! can report. `ErrorKind` groups the variants into the five categories
//! callers usually branch on.

use std::io;
use thiserror::Error;

/// A specialized `Result` type for port and stream operations.
pub type PortResult<T> = Result<T, PortError>;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The device could not be opened (bad path, permission denied, busy).
    #[error("Failed to open serial port '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Attempted to open a port that's already open.
    #[error("Port is already open")]
    AlreadyOpen,

    /// Attempted to use a port that's not open.
    #[error("Port is not open")]
    NotOpen,

    /// The requested value or combination is not supported by the device.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A genuine system-call level failure.
    #[error("Device I/O error: {0}")]
    Io(#[from] io::Error),

    /// The operation is not provided by an unbuffered serial stream.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Coarse classification of a [`PortError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PortOpen,
    NotOpen,
    InvalidParameter,
    DeviceIo,
    Unsupported,
}

impl PortError {
    /// Create an Open error for the given device path.
    pub fn open(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidParameter error from a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Open { .. } | Self::AlreadyOpen => ErrorKind::PortOpen,
            Self::NotOpen => ErrorKind::NotOpen,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::Io(_) => ErrorKind::DeviceIo,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Map a `serialport` failure raised while opening `path`.
    pub(crate) fn from_open(path: &str, err: serialport::Error) -> Self {
        Self::open(path, err.to_string())
    }
}

impl From<serialport::Error> for PortError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::InvalidInput => Self::InvalidParameter(err.description),
            serialport::ErrorKind::NoDevice => {
                Self::Io(io::Error::new(io::ErrorKind::NotFound, err.description))
            }
            serialport::ErrorKind::Io(kind) => Self::Io(io::Error::new(kind, err.description)),
            serialport::ErrorKind::Unknown => Self::Io(io::Error::other(err.description)),
        }
    }
}

impl From<PortError> for io::Error {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Io(e) => e,
            PortError::NotOpen => io::Error::new(io::ErrorKind::NotConnected, err),
            PortError::InvalidParameter(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            PortError::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, err),
            other => io::Error::other(other),
        }
    }
}
