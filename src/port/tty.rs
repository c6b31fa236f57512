//! Termios-backed serial device.
//!
//! Opening, exclusivity and the line parameters go through the `serialport`
//! crate. `VMIN`/`VTIME` and the raw blocking `read(2)`/`write(2)` calls go
//! straight to the descriptor via `libc`, because `serialport` forces both
//! control characters to zero and polls with its own timeout.

use super::error::{PortError, PortResult};
use super::params::{BaudRate, OpenMode, PortParameters};
use super::traits::{ClearBuffer, SerialDevice};
use serialport::{SerialPort, TTYPort};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::{debug, trace};

/// Serial device backed by a tty file descriptor.
pub struct TtyDevice {
    /// The underlying serialport handle; owns the descriptor.
    port: TTYPort,
    /// The device path for identification.
    name: String,
}

impl TtyDevice {
    /// Open `path` exclusively and apply `params`.
    ///
    /// # Example
    /// ```no_run
    /// use serial_stream::port::{OpenMode, PortParameters, TtyDevice};
    ///
    /// let device = TtyDevice::open("/dev/ttyUSB0", OpenMode::default(), &PortParameters::default())?;
    /// # Ok::<(), serial_stream::PortError>(())
    /// ```
    pub fn open(path: &str, mode: OpenMode, params: &PortParameters) -> PortResult<Self> {
        if mode.is_empty() {
            return Err(PortError::invalid("open mode must include read or write"));
        }

        let builder = serialport::new(path, params.baud_rate.bps())
            .data_bits(params.character_size.into())
            .flow_control(params.flow_control.into())
            .parity(params.parity.into())
            .stop_bits(params.stop_bits.into())
            .timeout(Duration::ZERO);

        let port = TTYPort::open(&builder).map_err(|e| PortError::from_open(path, e))?;

        // A failure past this point drops `port`, which closes the descriptor.
        let mut device = Self::from_port(port, params).map_err(|e| match e {
            PortError::Io(err) => PortError::open(path, err.to_string()),
            other => other,
        })?;
        device.name = path.to_string();

        debug!(port = path, ?params, "serial device opened");
        Ok(device)
    }

    /// Wrap an already open port, such as one half of a pseudo-terminal pair.
    ///
    /// The descriptor is switched to blocking, raw non-canonical mode and
    /// `params` applied.
    pub fn from_port(port: TTYPort, params: &PortParameters) -> PortResult<Self> {
        let name = port.name().unwrap_or_else(|| "<unnamed tty>".to_string());
        let mut device = Self { port, name };
        let fd = device.port.as_raw_fd();
        set_blocking(fd)?;
        make_raw(fd)?;
        device.apply(params)?;
        Ok(device)
    }

    /// Get a reference to the underlying serialport implementation.
    ///
    /// This can be useful for accessing platform-specific features.
    pub fn as_raw(&self) -> &TTYPort {
        &self.port
    }

    fn set_control_chars(&mut self, vmin: u8, vtime: u8) -> PortResult<()> {
        let fd = self.port.as_raw_fd();
        let mut termios = get_termios(fd)?;
        termios.c_cc[libc::VMIN] = vmin;
        termios.c_cc[libc::VTIME] = vtime;
        // SAFETY: `fd` is owned by `self.port` and `termios` is fully initialized.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
            return Err(termios_error("VMIN/VTIME", io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl SerialDevice for TtyDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> PortResult<usize> {
        if buffer.is_empty() {
            return Ok(0);
        }
        let fd = self.port.as_raw_fd();
        loop {
            // SAFETY: the pointer and length describe `buffer`, which outlives the call.
            let n = unsafe { libc::read(fd, buffer.as_mut_ptr().cast(), buffer.len()) };
            if n >= 0 {
                trace!(port = %self.name, bytes = n, "read");
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return Ok(0),
                _ => return Err(err.into()),
            }
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> PortResult<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let fd = self.port.as_raw_fd();
        loop {
            // SAFETY: the pointer and length describe `data`, which outlives the call.
            let n = unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) };
            if n >= 0 {
                trace!(port = %self.name, bytes = n, "write");
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err.into());
            }
        }
    }

    fn bytes_to_read(&self) -> PortResult<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn clear(&mut self, buffer: ClearBuffer) -> PortResult<()> {
        self.port.clear(buffer.into()).map_err(PortError::from)
    }

    fn drain(&mut self) -> PortResult<()> {
        // SAFETY: the descriptor is owned by `self.port` and still open.
        if unsafe { libc::tcdrain(self.port.as_raw_fd()) } != 0 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }

    fn settings(&self) -> PortResult<PortParameters> {
        let bps = self.port.baud_rate()?;
        let baud_rate = BaudRate::try_from(bps).map_err(|_| {
            PortError::invalid(format!("driver reports non-standard baud rate {bps}"))
        })?;
        let (vmin, vtime) = self.control_chars()?;

        Ok(PortParameters {
            baud_rate,
            character_size: self.port.data_bits()?.into(),
            parity: self.port.parity()?.into(),
            stop_bits: self.port.stop_bits()?.into(),
            flow_control: self.port.flow_control()?.into(),
            vmin,
            vtime,
        })
    }

    fn control_chars(&self) -> PortResult<(u8, u8)> {
        let termios = get_termios(self.port.as_raw_fd())?;
        Ok((termios.c_cc[libc::VMIN], termios.c_cc[libc::VTIME]))
    }

    fn apply(&mut self, params: &PortParameters) -> PortResult<()> {
        self.port
            .set_baud_rate(params.baud_rate.bps())
            .map_err(|e| rejected("baud rate", e))?;
        self.port
            .set_data_bits(params.character_size.into())
            .map_err(|e| rejected("character size", e))?;
        self.port
            .set_parity(params.parity.into())
            .map_err(|e| rejected("parity", e))?;
        self.port
            .set_stop_bits(params.stop_bits.into())
            .map_err(|e| rejected("stop bits", e))?;
        self.port
            .set_flow_control(params.flow_control.into())
            .map_err(|e| rejected("flow control", e))?;
        self.set_control_chars(params.vmin, params.vtime)
    }

    fn close(mut self) -> PortResult<()> {
        let drained = self.drain();
        let cleared = self.clear(ClearBuffer::Input);
        debug!(port = %self.name, "serial device closed");
        drained.and(cleared)
    }
}

impl AsRawFd for TtyDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.port.as_raw_fd()
    }
}

impl std::fmt::Debug for TtyDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtyDevice")
            .field("name", &self.name)
            .field("fd", &self.port.as_raw_fd())
            .finish()
    }
}

/// `serialport` reports the driver's EINVAL as `ErrorKind::Unknown`.
fn rejected(setting: &str, err: serialport::Error) -> PortError {
    match err.kind() {
        serialport::ErrorKind::Unknown | serialport::ErrorKind::InvalidInput => {
            PortError::invalid(format!("{setting} rejected by driver: {}", err.description))
        }
        _ => err.into(),
    }
}

fn termios_error(setting: &str, err: io::Error) -> PortError {
    if err.raw_os_error() == Some(libc::EINVAL) {
        PortError::invalid(format!("{setting} rejected by driver: {err}"))
    } else {
        err.into()
    }
}

fn get_termios(fd: RawFd) -> PortResult<libc::termios> {
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: tcgetattr fully initializes the struct when it returns 0.
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error().into());
    }
    // SAFETY: checked above.
    Ok(unsafe { termios.assume_init() })
}

fn make_raw(fd: RawFd) -> PortResult<()> {
    let mut termios = get_termios(fd)?;
    // SAFETY: `termios` was filled in by tcgetattr and `fd` is open.
    unsafe {
        libc::cfmakeraw(&mut termios);
        if libc::tcsetattr(fd, libc::TCSANOW, &termios) != 0 {
            return Err(io::Error::last_os_error().into());
        }
    }
    Ok(())
}

fn set_blocking(fd: RawFd) -> PortResult<()> {
    // SAFETY: F_GETFL/F_SETFL only touch the descriptor's status flags.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error().into());
    }
    if flags & libc::O_NONBLOCK == 0 {
        return Ok(());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::ErrorKind;

    #[test]
    fn test_port_open_error() {
        let result = TtyDevice::open(
            "/dev/nonexistent_port_12345",
            OpenMode::default(),
            &PortParameters::default(),
        );

        match result {
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::PortOpen);
                assert!(e.to_string().contains("nonexistent"));
            }
            Ok(device) => panic!("Expected open failure, got: {:?}", device),
        }
    }

    #[test]
    fn test_empty_mode_rejected() {
        let result = TtyDevice::open(
            "/dev/nonexistent_port_12345",
            OpenMode::empty(),
            &PortParameters::default(),
        );
        assert!(matches!(result, Err(PortError::InvalidParameter(_))));
    }

    #[test]
    fn test_driver_rejection_is_invalid_parameter() {
        let err = rejected(
            "parity",
            serialport::Error::new(serialport::ErrorKind::Unknown, "Invalid argument"),
        );
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(err.to_string().contains("parity"));

        let err = rejected(
            "baud rate",
            serialport::Error::new(
                serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
                "denied",
            ),
        );
        assert_eq!(err.kind(), ErrorKind::DeviceIo);
    }

    #[test]
    fn test_einval_from_tcsetattr_is_invalid_parameter() {
        let err = termios_error("VMIN/VTIME", io::Error::from_raw_os_error(libc::EINVAL));
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = termios_error("VMIN/VTIME", io::Error::from_raw_os_error(libc::EIO));
        assert_eq!(err.kind(), ErrorKind::DeviceIo);
    }

    #[test]
    fn test_pty_pair_settings_roundtrip() {
        let (_master, slave) = TTYPort::pair().expect("Failed to create pty pair");
        let params = PortParameters::default().with_vmin(0).with_vtime(3);
        let device = TtyDevice::from_port(slave, &params).expect("Failed to wrap pty");

        let active = device.settings().expect("Failed to query settings");
        assert_eq!(active.vmin, 0);
        assert_eq!(active.vtime, 3);
        assert_eq!(active.baud_rate, params.baud_rate);
    }
}
