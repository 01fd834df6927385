//! Scripted serial port for tests.
//!
//! `MockSerialPort` stands in for a programmer on the other end of the cable:
//! each complete command frame written to it can trigger a canned reply, and
//! every write and successful read is recorded in order so tests can check
//! how exchanges were sequenced on the wire.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// One observable operation on the mock wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// Bytes handed to `write_bytes`.
    Write(Vec<u8>),
    /// Bytes returned by a successful `read_bytes`.
    Read(Vec<u8>),
}

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes waiting to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Replies keyed by command text (without the CR terminator).
    replies: HashMap<Vec<u8>, Vec<u8>>,
    /// Reply for commands that have no entry in `replies`.
    fallback_reply: Option<Vec<u8>>,
    /// Ordered log of writes and reads.
    events: Vec<WireEvent>,
    /// Upper bound on bytes returned per read call.
    read_chunk: Option<usize>,
    /// Delay applied to every read call that returns data.
    latency: Duration,
    /// Fail the next write or read with an I/O error.
    fail_next: bool,
    buffers_cleared: bool,
    /// Bytes dropped by `clear_input`.
    input_discarded: usize,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so a test can keep a handle after moving the port into
/// a transport.
///
/// # Example
/// ```
/// use stage_programmer::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.set_reply("T", b"\x10\x00....0150\r");
///
/// port.write_bytes(b"T\r").unwrap();
/// let mut buffer = [0u8; 16];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"\x10\x00....0150\r");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Reply with `reply` every time `command` is written.
    ///
    /// `reply` is delivered verbatim, so include the CR terminator unless the
    /// test wants to simulate a device that never finishes its line.
    pub fn set_reply(&mut self, command: &str, reply: &[u8]) {
        self.state
            .lock()
            .replies
            .insert(command.as_bytes().to_vec(), reply.to_vec());
    }

    /// Reply used for any command without a dedicated reply.
    pub fn set_fallback_reply(&mut self, reply: &[u8]) {
        self.state.lock().fallback_reply = Some(reply.to_vec());
    }

    /// Push raw bytes into the receive buffer, independent of any write.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Limit how many bytes a single read call may return.
    pub fn set_read_chunk(&mut self, max_bytes: usize) {
        self.state.lock().read_chunk = Some(max_bytes.max(1));
    }

    /// Sleep this long inside every read call that returns data.
    pub fn set_latency(&mut self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Make the next write or read fail with a broken-pipe error.
    pub fn fail_next_operation(&mut self) {
        self.state.lock().fail_next = true;
    }

    /// All frames written so far, in order.
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                WireEvent::Write(bytes) => Some(bytes.clone()),
                WireEvent::Read(_) => None,
            })
            .collect()
    }

    /// The ordered write/read log.
    pub fn events(&self) -> Vec<WireEvent> {
        self.state.lock().events.clone()
    }

    /// Total bytes thrown away by input clears.
    pub fn discarded_input(&self) -> usize {
        self.state.lock().input_discarded
    }

    /// Whether `clear_buffers` has been called.
    pub fn was_cleared(&self) -> bool {
        self.state.lock().buffers_cleared
    }

    /// Bytes waiting in the receive buffer.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    fn broken_pipe() -> PortError {
        PortError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "simulated cable fault",
        ))
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.fail_next {
            state.fail_next = false;
            return Err(Self::broken_pipe());
        }

        state.events.push(WireEvent::Write(data.to_vec()));

        let command = data.strip_suffix(b"\r").unwrap_or(data);
        let reply = state
            .replies
            .get(command)
            .or(state.fallback_reply.as_ref())
            .cloned();
        if let Some(reply) = reply {
            state.read_queue.extend(reply);
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let latency = {
            let mut state = self.state.lock();
            if state.fail_next {
                state.fail_next = false;
                return Err(Self::broken_pipe());
            }
            if state.read_queue.is_empty() {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::WouldBlock,
                    "No data available",
                )));
            }
            state.latency
        };

        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let mut state = self.state.lock();
        let limit = state.read_chunk.unwrap_or(buffer.len()).min(buffer.len());
        let count = limit.min(state.read_queue.len());
        for slot in buffer.iter_mut().take(count) {
            if let Some(byte) = state.read_queue.pop_front() {
                *slot = byte;
            }
        }
        state.events.push(WireEvent::Read(buffer[..count].to_vec()));

        Ok(count)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.input_discarded += state.read_queue.len();
        state.read_queue.clear();
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
