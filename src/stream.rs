//! Unbuffered stream adapter over a serial device.
//!
//! `SerialStreamBuf` turns a blocking [`SerialDevice`] into a byte stream.
//! It holds no buffer of its own beyond a single lookahead byte, the putback
//! slot, which backs [`peek_byte`](SerialStreamBuf::peek_byte) and the
//! [`BufRead`] implementation.
//!
//! "No data yet" is never an error here: the primitives return a zero count
//! or `None`, and genuine device failures are parked in a status slot that
//! [`last_error`](SerialStreamBuf::last_error) exposes. Calling a read or
//! write primitive on a closed stream returns [`PortError::NotOpen`].
//!
//! An instance is not internally synchronized. Share it across threads only
//! behind external locking.

use crate::port::params::control_char;
use crate::port::{
    BaudRate, CharacterSize, ClearBuffer, FlowControl, OpenMode, Parity, PortError, PortParameters,
    PortResult, SerialDevice, StopBits,
};
use std::io::{self, BufRead, Read, Write};
use tracing::{debug, trace, warn};

#[cfg(unix)]
use crate::port::TtyDevice;
#[cfg(unix)]
use std::os::unix::io::{AsRawFd, RawFd};

/// Device used when none is named: the tty backend on unix.
#[cfg(unix)]
pub type DefaultDevice = TtyDevice;

/// Device used when none is named.
#[cfg(not(unix))]
pub type DefaultDevice = crate::port::MockDevice;

/// Tri-state answer of [`SerialStreamBuf::available`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// At least one byte can be read without blocking.
    Ready,
    /// The driver confirmed there is nothing to read.
    Empty,
    /// The answer could not be determined. Not an error.
    Unknown,
}

impl Availability {
    /// Stream-style hint: `1`, `0` or `-1`.
    pub fn as_hint(self) -> isize {
        match self {
            Availability::Ready => 1,
            Availability::Empty => 0,
            Availability::Unknown => -1,
        }
    }
}

/// Unbuffered byte stream over an exclusively owned serial device.
///
/// The stream is Closed until a device is opened or attached. Dropping an
/// open stream closes it.
///
/// # Example
/// ```
/// use serial_stream::port::MockDevice;
/// use serial_stream::{OpenMode, SerialStreamBuf};
///
/// let mut stream = SerialStreamBuf::new();
/// stream.attach(MockDevice::loopback("LOOP0"), OpenMode::default())?;
///
/// assert_eq!(stream.put_bytes(b"PING")?, 4);
/// assert_eq!(stream.peek_byte()?, Some(b'P'));
///
/// let mut buf = [0u8; 4];
/// assert_eq!(stream.get_bytes(&mut buf)?, 4);
/// assert_eq!(&buf, b"PING");
/// # Ok::<(), serial_stream::PortError>(())
/// ```
pub struct SerialStreamBuf<D: SerialDevice = DefaultDevice> {
    device: Option<D>,
    mode: OpenMode,
    putback: Option<u8>,
    last_error: Option<PortError>,
}

impl<D: SerialDevice> SerialStreamBuf<D> {
    /// Create a closed stream.
    pub fn new() -> Self {
        Self {
            device: None,
            mode: OpenMode::default(),
            putback: None,
            last_error: None,
        }
    }

    /// Take ownership of an already configured device and transition to Open.
    pub fn attach(&mut self, device: D, mode: OpenMode) -> PortResult<()> {
        if self.device.is_some() {
            return Err(PortError::AlreadyOpen);
        }
        if mode.is_empty() {
            return Err(PortError::invalid("open mode must include read or write"));
        }

        debug!(port = device.name(), ?mode, "serial stream opened");
        self.device = Some(device);
        self.mode = mode;
        self.putback = None;
        self.last_error = None;
        Ok(())
    }

    /// Whether a device is currently held.
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Mode the stream was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Name of the open device.
    pub fn name(&self) -> Option<&str> {
        self.device.as_ref().map(|d| d.name())
    }

    /// Borrow the underlying device.
    pub fn device(&self) -> PortResult<&D> {
        self.device.as_ref().ok_or(PortError::NotOpen)
    }

    /// Drain pending output, discard unread input and release the device.
    ///
    /// Closing a closed stream is a no-op. The device is released even when
    /// the final flush fails.
    pub fn close(&mut self) -> PortResult<()> {
        self.putback = None;
        match self.device.take() {
            Some(device) => {
                debug!(port = device.name(), "closing serial stream");
                device.close()
            }
            None => Ok(()),
        }
    }

    /// The most recent device failure swallowed by a stream primitive.
    pub fn last_error(&self) -> Option<&PortError> {
        self.last_error.as_ref()
    }

    /// Take and clear the recorded device failure.
    pub fn take_error(&mut self) -> Option<PortError> {
        self.last_error.take()
    }

    // --- driver queues ---

    /// Discard bytes received but not yet read, including the putback slot.
    pub fn flush_input_buffer(&mut self) -> PortResult<()> {
        self.open_device()?.clear(ClearBuffer::Input)?;
        self.putback = None;
        debug!("input buffer flushed");
        Ok(())
    }

    /// Discard bytes written but not yet transmitted.
    pub fn flush_output_buffer(&mut self) -> PortResult<()> {
        self.open_device()?.clear(ClearBuffer::Output)?;
        debug!("output buffer flushed");
        Ok(())
    }

    /// Discard both queues.
    pub fn flush_io_buffers(&mut self) -> PortResult<()> {
        self.open_device()?.clear(ClearBuffer::All)?;
        self.putback = None;
        debug!("input and output buffers flushed");
        Ok(())
    }

    /// Whether at least one byte can be read right now.
    pub fn is_data_available(&self) -> PortResult<bool> {
        let device = self.device.as_ref().ok_or(PortError::NotOpen)?;
        Ok(self.putback.is_some() || device.bytes_to_read()? > 0)
    }

    // --- configuration ---

    /// All parameters currently in effect at the driver.
    pub fn parameters(&self) -> PortResult<PortParameters> {
        self.device()?.settings()
    }

    /// Apply a complete parameter set.
    ///
    /// If the driver rejects any field, the previous settings are restored.
    pub fn set_parameters(&mut self, params: &PortParameters) -> PortResult<()> {
        let device = self.open_device()?;
        let previous = device.settings()?;
        apply_or_restore(device, params, &previous)?;
        debug!(port = device.name(), ?params, "parameters applied");
        Ok(())
    }

    /// Reset every parameter to its default.
    pub fn set_default_parameters(&mut self) -> PortResult<()> {
        self.set_parameters(&PortParameters::default())
    }

    /// Set the line speed.
    pub fn set_baud_rate(&mut self, baud_rate: BaudRate) -> PortResult<()> {
        self.update("baud_rate", |p| p.baud_rate = baud_rate)
    }

    /// Line speed in effect at the driver.
    pub fn baud_rate(&self) -> PortResult<BaudRate> {
        Ok(self.parameters()?.baud_rate)
    }

    /// Set the number of data bits per character.
    pub fn set_character_size(&mut self, size: CharacterSize) -> PortResult<()> {
        self.update("character_size", |p| p.character_size = size)
    }

    /// Data bits per character in effect at the driver.
    pub fn character_size(&self) -> PortResult<CharacterSize> {
        Ok(self.parameters()?.character_size)
    }

    /// Set the parity mode.
    pub fn set_parity(&mut self, parity: Parity) -> PortResult<()> {
        self.update("parity", |p| p.parity = parity)
    }

    /// Parity mode in effect at the driver.
    pub fn parity(&self) -> PortResult<Parity> {
        Ok(self.parameters()?.parity)
    }

    /// Set the number of stop bits.
    pub fn set_stop_bits(&mut self, stop_bits: StopBits) -> PortResult<()> {
        self.update("stop_bits", |p| p.stop_bits = stop_bits)
    }

    /// Stop bits in effect at the driver.
    pub fn stop_bits(&self) -> PortResult<StopBits> {
        Ok(self.parameters()?.stop_bits)
    }

    /// Set the flow control mode.
    pub fn set_flow_control(&mut self, flow_control: FlowControl) -> PortResult<()> {
        self.update("flow_control", |p| p.flow_control = flow_control)
    }

    /// Flow control mode in effect at the driver.
    pub fn flow_control(&self) -> PortResult<FlowControl> {
        Ok(self.parameters()?.flow_control)
    }

    /// Minimum byte count for non-canonical reads. Values above 255 are rejected.
    pub fn set_vmin(&mut self, vmin: u16) -> PortResult<()> {
        let vmin = control_char("VMIN", vmin)?;
        self.update("vmin", |p| p.vmin = vmin)
    }

    /// Active VMIN.
    pub fn vmin(&self) -> PortResult<u8> {
        Ok(self.parameters()?.vmin)
    }

    /// Read timeout in deciseconds. Values above 255 are rejected.
    pub fn set_vtime(&mut self, vtime: u16) -> PortResult<()> {
        let vtime = control_char("VTIME", vtime)?;
        self.update("vtime", |p| p.vtime = vtime)
    }

    /// Active VTIME, in deciseconds.
    pub fn vtime(&self) -> PortResult<u8> {
        Ok(self.parameters()?.vtime)
    }

    // --- stream primitives ---

    /// Buffer assignment is ignored; the stream stays unbuffered.
    pub fn set_buffer(&mut self, _buffer: &mut [u8]) -> &mut Self {
        trace!("set_buffer ignored on unbuffered serial stream");
        self
    }

    /// Write all of `data`, looping until the driver accepted every byte.
    ///
    /// Returns fewer than `data.len()` only when the device failed; the
    /// failure is then available from [`last_error`](Self::last_error).
    pub fn put_bytes(&mut self, data: &[u8]) -> PortResult<usize> {
        let device = self.device.as_mut().ok_or(PortError::NotOpen)?;
        if !self.mode.is_writable() {
            record(
                &mut self.last_error,
                PortError::Unsupported("stream not opened for writing"),
            );
            return Ok(0);
        }

        let mut written = 0;
        while written < data.len() {
            match device.write_bytes(&data[written..]) {
                Ok(0) => {
                    record(
                        &mut self.last_error,
                        io::Error::from(io::ErrorKind::WriteZero).into(),
                    );
                    break;
                }
                Ok(n) => written += n,
                Err(e) => {
                    record(&mut self.last_error, e);
                    break;
                }
            }
        }

        trace!(requested = data.len(), written, "put_bytes");
        Ok(written)
    }

    /// Write a single byte. Returns it back, or `None` if the device failed.
    pub fn put_byte(&mut self, byte: u8) -> PortResult<Option<u8>> {
        Ok((self.put_bytes(&[byte])? == 1).then_some(byte))
    }

    /// Read up to `buf.len()` bytes.
    ///
    /// A byte in the putback slot is delivered first. Device reads are then
    /// repeated until `buf` is full or the device yields nothing under the
    /// active VMIN/VTIME policy, so the count may be short. With both VMIN
    /// and VTIME set, a short read means the inter-byte timer expired and
    /// the loop stops there.
    pub fn get_bytes(&mut self, buf: &mut [u8]) -> PortResult<usize> {
        let device = self.device.as_mut().ok_or(PortError::NotOpen)?;
        if !self.mode.is_readable() {
            record(
                &mut self.last_error,
                PortError::Unsupported("stream not opened for reading"),
            );
            return Ok(0);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let mut filled = 0;
        if let Some(byte) = self.putback.take() {
            buf[0] = byte;
            filled = 1;
        }

        // An unreadable policy is treated as timed, which never over-blocks.
        let timed = device
            .control_chars()
            .map_or(true, |(vmin, vtime)| vmin > 0 && vtime > 0);

        while filled < buf.len() {
            let wanted = buf.len() - filled;
            match device.read_bytes(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    if timed && n < wanted {
                        break;
                    }
                }
                Err(e) => {
                    record(&mut self.last_error, e);
                    break;
                }
            }
        }

        trace!(requested = buf.len(), filled, "get_bytes");
        Ok(filled)
    }

    /// Look at the next byte without consuming it.
    ///
    /// The byte is parked in the putback slot and handed out again by the
    /// next consuming read. `None` means no byte arrived under the active
    /// VMIN/VTIME policy.
    pub fn peek_byte(&mut self) -> PortResult<Option<u8>> {
        if let Some(byte) = self.putback {
            self.open_device()?;
            return Ok(Some(byte));
        }
        let byte = self.read_one()?;
        self.putback = byte;
        Ok(byte)
    }

    /// Read and consume the next byte.
    pub fn take_byte(&mut self) -> PortResult<Option<u8>> {
        self.open_device()?;
        match self.putback.take() {
            Some(byte) => Ok(Some(byte)),
            None => self.read_one(),
        }
    }

    /// Push a byte back beyond the putback slot.
    ///
    /// Always fails with `None`: the device stream is never rewritten. The
    /// refusal is recorded as [`PortError::Unsupported`].
    pub fn put_back(&mut self, byte: Option<u8>) -> Option<u8> {
        trace!(?byte, "put_back refused");
        self.last_error
            .get_or_insert(PortError::Unsupported("putback beyond the one-byte lookahead"));
        None
    }

    /// Whether a read would find data right now.
    ///
    /// A failed driver query or a closed stream yields
    /// [`Availability::Unknown`] rather than an error.
    pub fn available(&self) -> Availability {
        let Some(device) = self.device.as_ref() else {
            return Availability::Unknown;
        };
        if !self.mode.is_readable() {
            return Availability::Unknown;
        }
        if self.putback.is_some() {
            return Availability::Ready;
        }
        match device.bytes_to_read() {
            Ok(0) => Availability::Empty,
            Ok(_) => Availability::Ready,
            Err(e) => {
                debug!(error = %e, "availability query failed");
                Availability::Unknown
            }
        }
    }

    fn open_device(&mut self) -> PortResult<&mut D> {
        self.device.as_mut().ok_or(PortError::NotOpen)
    }

    fn read_one(&mut self) -> PortResult<Option<u8>> {
        let device = self.device.as_mut().ok_or(PortError::NotOpen)?;
        if !self.mode.is_readable() {
            record(
                &mut self.last_error,
                PortError::Unsupported("stream not opened for reading"),
            );
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match device.read_bytes(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) => {
                record(&mut self.last_error, e);
                Ok(None)
            }
        }
    }

    fn update(
        &mut self,
        setting: &str,
        change: impl FnOnce(&mut PortParameters),
    ) -> PortResult<()> {
        let device = self.open_device()?;
        let previous = device.settings()?;
        let mut params = previous;
        change(&mut params);
        apply_or_restore(device, &params, &previous)?;
        debug!(port = device.name(), setting, "parameter updated");
        Ok(())
    }

    /// Run `op` with the status slot set aside, returning its result
    /// together with any failure `op` itself recorded. The earlier status
    /// is put back afterwards.
    fn with_fresh_status<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> PortResult<T>,
    ) -> PortResult<(T, Option<PortError>)> {
        let earlier = self.last_error.take();
        let result = op(self);
        let fresh = self.last_error.take();
        self.last_error = earlier;
        Ok((result?, fresh))
    }

    /// A single device read for `io::Read`, so large buffers do not wait
    /// for VMIN to be satisfied repeatedly.
    fn read_once(&mut self, buf: &mut [u8]) -> PortResult<usize> {
        if buf.is_empty() {
            self.open_device()?;
            return Ok(0);
        }
        if let Some(byte) = self.putback.take() {
            self.open_device()?;
            buf[0] = byte;
            return Ok(1);
        }

        let device = self.device.as_mut().ok_or(PortError::NotOpen)?;
        if !self.mode.is_readable() {
            return Err(PortError::Unsupported("stream not opened for reading"));
        }
        device.read_bytes(buf)
    }
}

#[cfg(unix)]
impl SerialStreamBuf<TtyDevice> {
    /// Open `path` with default parameters.
    pub fn open(&mut self, path: &str, mode: OpenMode) -> PortResult<()> {
        self.open_with_parameters(path, mode, &PortParameters::default())
    }

    /// Open `path` and apply `params`.
    ///
    /// On failure the stream stays Closed and the call can be retried.
    pub fn open_with_parameters(
        &mut self,
        path: &str,
        mode: OpenMode,
        params: &PortParameters,
    ) -> PortResult<()> {
        if self.is_open() {
            return Err(PortError::AlreadyOpen);
        }
        let device = TtyDevice::open(path, mode, params)?;
        self.attach(device, mode)
    }

    /// Create a stream and open `path` for reading and writing.
    ///
    /// ```no_run
    /// use serial_stream::{BaudRate, CharacterSize, FlowControl, Parity, PortParameters, SerialStreamBuf, StopBits};
    ///
    /// let params = PortParameters::new(
    ///     BaudRate::Baud9600,
    ///     CharacterSize::Eight,
    ///     FlowControl::None,
    ///     Parity::None,
    ///     StopBits::One,
    /// );
    /// let stream = SerialStreamBuf::with_parameters("/dev/ttyUSB0", &params)?;
    /// # Ok::<(), serial_stream::PortError>(())
    /// ```
    pub fn with_parameters(path: &str, params: &PortParameters) -> PortResult<Self> {
        let mut stream = Self::new();
        stream.open_with_parameters(path, OpenMode::default(), params)?;
        Ok(stream)
    }
}

#[cfg(unix)]
impl<D: SerialDevice + AsRawFd> SerialStreamBuf<D> {
    /// Raw descriptor of the open device, for control calls this type does
    /// not wrap. I/O issued through it bypasses the putback slot.
    pub fn file_descriptor(&self) -> PortResult<RawFd> {
        Ok(self.device()?.as_raw_fd())
    }
}

impl<D: SerialDevice> Default for SerialStreamBuf<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: SerialDevice> Drop for SerialStreamBuf<D> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close serial stream on drop");
        }
    }
}

impl<D: SerialDevice> std::fmt::Debug for SerialStreamBuf<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStreamBuf")
            .field("device", &self.device)
            .field("mode", &self.mode)
            .field("putback", &self.putback)
            .finish()
    }
}

/// `Ok(0)` means nothing arrived under the active VMIN/VTIME policy.
impl<D: SerialDevice> Read for SerialStreamBuf<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_once(buf)?)
    }
}

impl<D: SerialDevice> Write for SerialStreamBuf<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let (written, fresh) = self.with_fresh_status(|s| s.put_bytes(buf))?;
        if let Some(err) = fresh {
            if written == 0 {
                return Err(err.into());
            }
            self.last_error = Some(err);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.open_device()?.drain()?)
    }
}

/// The putback slot doubles as a one-byte read buffer.
impl<D: SerialDevice> BufRead for SerialStreamBuf<D> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.putback.is_none() {
            let (_, fresh) = self.with_fresh_status(|s| s.peek_byte())?;
            if let Some(err) = fresh {
                return Err(err.into());
            }
        }
        Ok(match &self.putback {
            Some(byte) => std::slice::from_ref(byte),
            None => &[],
        })
    }

    fn consume(&mut self, amt: usize) {
        if amt > 0 {
            self.putback = None;
        }
    }
}

/// Device failures replace the status; a refusal never hides one.
fn record(slot: &mut Option<PortError>, err: PortError) {
    if matches!(err, PortError::Unsupported(_)) {
        debug!(error = %err, "operation refused");
        slot.get_or_insert(err);
        return;
    }
    warn!(error = %err, "serial device failure");
    *slot = Some(err);
}

fn apply_or_restore<D: SerialDevice>(
    device: &mut D,
    params: &PortParameters,
    previous: &PortParameters,
) -> PortResult<()> {
    let Err(err) = device.apply(params) else {
        return Ok(());
    };
    if let Err(restore) = device.apply(previous) {
        warn!(port = device.name(), error = %restore, "failed to restore parameters");
    }
    Err(err)
}
