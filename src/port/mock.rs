//! Mock serial device for testing.
//!
//! `MockDevice` simulates a serial line without hardware. Clones share the
//! same state, so a test can hand one clone to a stream and keep another to
//! feed input and inspect output.

use super::error::{PortError, PortResult};
use super::params::{BaudRate, CharacterSize, Parity, PortParameters};
use super::traits::{ClearBuffer, SerialDevice};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// Inner state of the mock device.
#[derive(Debug, Default)]
struct MockState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of every accepted write, one entry per driver call.
    write_log: Vec<Vec<u8>>,
    /// Echo every accepted write into the read queue.
    loopback: bool,
    /// Parameters currently in effect.
    settings: PortParameters,
    /// Rates above this are rejected by `apply`.
    baud_ceiling: Option<BaudRate>,
    /// Character size the "hardware" silently forces.
    forced_character_size: Option<CharacterSize>,
    /// Parity the "hardware" refuses after accepting the fields before it.
    rejected_parity: Option<Parity>,
    /// Upper bound on bytes accepted or returned per driver call.
    chunk_limit: Option<usize>,
    /// Fail the next N reads.
    read_failures: usize,
    /// Let N more writes succeed, then fail.
    writes_before_failure: Option<usize>,
    /// Fail availability queries.
    availability_broken: bool,
    /// Number of driver read calls issued.
    read_calls: usize,
    /// Whether input has been cleared.
    input_cleared: bool,
    /// Whether `close` has been called.
    closed: bool,
}

/// Mock serial device implementation for testing.
///
/// # Example
/// ```
/// use serial_stream::port::{MockDevice, SerialDevice};
///
/// let mut device = MockDevice::new("MOCK0");
/// device.enqueue_read(b"Hello");
///
/// let mut buffer = [0u8; 8];
/// let n = device.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello");
///
/// device.write_bytes(b"Response").unwrap();
/// assert_eq!(device.written(), b"Response");
/// ```
#[derive(Clone)]
pub struct MockDevice {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    /// Create a new mock device with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a mock device whose writes loop back into its read queue.
    pub fn loopback(name: impl Into<String>) -> Self {
        let device = Self::new(name);
        device.state.lock().loopback = true;
        device
    }

    /// Append bytes to the read queue.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// All written bytes, concatenated in order.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Drain the write log, returning its bytes concatenated.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().write_log).concat()
    }

    /// One entry per driver write call.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Bytes still waiting in the read queue.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Number of driver read calls issued so far.
    pub fn read_calls(&self) -> usize {
        self.state.lock().read_calls
    }

    /// Reject any baud rate above `ceiling`.
    pub fn set_baud_ceiling(&self, ceiling: BaudRate) {
        self.state.lock().baud_ceiling = Some(ceiling);
    }

    /// Silently coerce every requested character size to `size`.
    pub fn force_character_size(&self, size: CharacterSize) {
        let mut state = self.state.lock();
        state.forced_character_size = Some(size);
        state.settings.character_size = size;
    }

    /// Refuse `parity` in `apply`, leaving baud rate and character size
    /// already changed the way a field-by-field driver update would.
    pub fn reject_parity(&self, parity: Parity) {
        self.state.lock().rejected_parity = Some(parity);
    }

    /// Accept or return at most `limit` bytes per driver call.
    pub fn set_chunk_limit(&self, limit: usize) {
        self.state.lock().chunk_limit = Some(limit.max(1));
    }

    /// Make the next `count` reads fail with an I/O error.
    pub fn fail_reads(&self, count: usize) {
        self.state.lock().read_failures = count;
    }

    /// Let `count` more writes succeed, then fail every write after.
    pub fn fail_writes_after(&self, count: usize) {
        self.state.lock().writes_before_failure = Some(count);
    }

    /// Make availability queries fail.
    pub fn break_availability(&self) {
        self.state.lock().availability_broken = true;
    }

    /// Whether input has been cleared since creation.
    pub fn was_cleared(&self) -> bool {
        self.state.lock().input_cleared
    }

    /// Whether `close` has been called on any clone.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl SerialDevice for MockDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> PortResult<usize> {
        let mut state = self.state.lock();
        state.read_calls += 1;

        if state.read_failures > 0 {
            state.read_failures -= 1;
            return Err(PortError::Io(io::Error::other("simulated read failure")));
        }

        let limit = state.chunk_limit.unwrap_or(usize::MAX).min(buffer.len());
        let mut bytes_read = 0;
        while bytes_read < limit {
            match state.read_queue.pop_front() {
                Some(byte) => {
                    buffer[bytes_read] = byte;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        // An empty queue reads as zero bytes: the VMIN=0 view of a silent line.
        Ok(bytes_read)
    }

    fn write_bytes(&mut self, data: &[u8]) -> PortResult<usize> {
        let mut state = self.state.lock();

        match state.writes_before_failure {
            Some(0) => {
                return Err(PortError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "simulated write failure",
                )))
            }
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }

        let accepted = state.chunk_limit.unwrap_or(usize::MAX).min(data.len());
        let chunk = &data[..accepted];
        state.write_log.push(chunk.to_vec());
        if state.loopback {
            state.read_queue.extend(chunk);
        }

        Ok(accepted)
    }

    fn bytes_to_read(&self) -> PortResult<usize> {
        let state = self.state.lock();
        if state.availability_broken {
            return Err(PortError::Io(io::Error::other("simulated FIONREAD failure")));
        }
        Ok(state.read_queue.len())
    }

    fn clear(&mut self, buffer: ClearBuffer) -> PortResult<()> {
        let mut state = self.state.lock();
        if matches!(buffer, ClearBuffer::Input | ClearBuffer::All) {
            state.read_queue.clear();
            state.input_cleared = true;
        }
        Ok(())
    }

    fn drain(&mut self) -> PortResult<()> {
        Ok(())
    }

    fn settings(&self) -> PortResult<PortParameters> {
        Ok(self.state.lock().settings)
    }

    fn apply(&mut self, params: &PortParameters) -> PortResult<()> {
        let mut state = self.state.lock();

        if let Some(ceiling) = state.baud_ceiling {
            if params.baud_rate > ceiling {
                return Err(PortError::invalid(format!(
                    "baud rate {} exceeds device maximum {}",
                    params.baud_rate, ceiling
                )));
            }
        }

        let mut active = *params;
        if let Some(size) = state.forced_character_size {
            active.character_size = size;
        }

        if state.rejected_parity == Some(params.parity) {
            state.settings.baud_rate = active.baud_rate;
            state.settings.character_size = active.character_size;
            return Err(PortError::invalid(format!(
                "parity {:?} rejected by device",
                params.parity
            )));
        }

        state.settings = active;
        Ok(())
    }

    fn close(self) -> PortResult<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
