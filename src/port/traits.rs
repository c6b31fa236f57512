//! Core traits for serial device abstraction.
//!
//! `SerialDevice` is the narrow driver interface the stream adapter sits on.
//! Both the termios-backed [`TtyDevice`](super::TtyDevice) and the in-memory
//! [`MockDevice`](super::MockDevice) implement it.

use super::error::PortResult;
use super::params::PortParameters;

/// Which driver-level queue to discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearBuffer {
    /// Received but unread bytes.
    Input,
    /// Written but untransmitted bytes.
    Output,
    /// Both directions.
    All,
}

impl From<ClearBuffer> for serialport::ClearBuffer {
    fn from(buffer: ClearBuffer) -> Self {
        match buffer {
            ClearBuffer::Input => serialport::ClearBuffer::Input,
            ClearBuffer::Output => serialport::ClearBuffer::Output,
            ClearBuffer::All => serialport::ClearBuffer::All,
        }
    }
}

/// Blocking, unbuffered access to a single serial device.
///
/// Implementations must not buffer: every call maps onto one driver request.
/// A `read_bytes` result of `Ok(0)` means "no data under the active VMIN/VTIME
/// policy", never end of file.
pub trait SerialDevice: Send + std::fmt::Debug {
    /// Get the name/path of this device.
    fn name(&self) -> &str;

    /// Issue a single read into `buffer`.
    ///
    /// Blocks according to the active VMIN/VTIME policy and returns the
    /// number of bytes read, which may be zero.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> PortResult<usize>;

    /// Issue a single write of `data`.
    ///
    /// Returns the number of bytes the driver accepted.
    fn write_bytes(&mut self, data: &[u8]) -> PortResult<usize>;

    /// Number of bytes queued for reading at the driver.
    fn bytes_to_read(&self) -> PortResult<usize>;

    /// Discard queued bytes in the given direction.
    fn clear(&mut self, buffer: ClearBuffer) -> PortResult<()>;

    /// Block until all written bytes have been transmitted.
    fn drain(&mut self) -> PortResult<()>;

    /// Re-query the parameters the driver currently has in effect.
    ///
    /// This may differ from the last applied set when the hardware coerces
    /// an unsupported combination.
    fn settings(&self) -> PortResult<PortParameters>;

    /// The active `(VMIN, VTIME)` pair.
    fn control_chars(&self) -> PortResult<(u8, u8)> {
        self.settings().map(|p| (p.vmin, p.vtime))
    }

    /// Apply a full parameter set.
    fn apply(&mut self, params: &PortParameters) -> PortResult<()>;

    /// Drain output, discard unread input and release the device.
    fn close(self) -> PortResult<()>
    where
        Self: Sized;
}
