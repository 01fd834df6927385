//! Exclusive request/response channel over one serial link.
//!
//! Every exchange goes through [`Transport::query`], which holds the channel
//! lock from the first byte written until the matching reply has been read.
//! Nothing else in the crate touches the port.

use crate::error::TransportError;
use crate::port::{PortConfiguration, PortError, SerialPortAdapter, SyncSerialPort};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Terminator appended to every command and ending every reply.
pub const TERMINATOR: u8 = b'\r';

/// Timing parameters fixed when the transport is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Upper bound on waiting for a reply terminator.
    pub response_timeout: Duration,
    /// Timeout of a single read call on the port.
    pub read_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(50),
        }
    }
}

/// An ASCII command with its trailing CR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame(Vec<u8>);

impl CommandFrame {
    /// Frame `command`, rejecting text the programmer cannot receive.
    pub fn new(command: &str) -> Result<Self, TransportError> {
        if !command.is_ascii() || command.as_bytes().contains(&TERMINATOR) {
            return Err(TransportError::InvalidCommand(command.to_string()));
        }
        let mut bytes = Vec::with_capacity(command.len() + 1);
        bytes.extend_from_slice(command.as_bytes());
        bytes.push(TERMINATOR);
        Ok(Self(bytes))
    }

    /// Bytes as sent on the wire, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Bytes of one reply, terminator stripped.
///
/// `terminated` is false when the response timeout expired first; the bytes
/// are then whatever partial data arrived. An empty terminated frame is a real
/// empty reply from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    bytes: Vec<u8>,
    terminated: bool,
}

impl ResponseFrame {
    pub fn terminated(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            terminated: true,
        }
    }

    pub fn timed_out(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            terminated: false,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Serial channel with mutually exclusive exchanges.
///
/// The port lives in an `Option` so [`close`](Self::close) can release it
/// exactly once while the transport itself is still shared.
pub struct Transport<P: SerialPortAdapter = SyncSerialPort> {
    name: String,
    settings: TransportSettings,
    port: Mutex<Option<P>>,
}

impl Transport<SyncSerialPort> {
    /// Open `port_name` at 19200 baud, 8-N-1, RTS/CTS with default timing.
    pub fn open(port_name: &str) -> Result<Self, TransportError> {
        Self::open_with(port_name, TransportSettings::default())
    }

    /// Open `port_name` with explicit timing.
    pub fn open_with(port_name: &str, settings: TransportSettings) -> Result<Self, TransportError> {
        let connection = |source: PortError| TransportError::Connection {
            port: port_name.to_string(),
            source,
        };

        let config = PortConfiguration::with_read_timeout(settings.read_timeout);
        let mut port = SyncSerialPort::open(port_name, config).map_err(connection)?;
        port.clear_buffers().map_err(connection)?;

        info!(
            port = port_name,
            baud = crate::port::PROGRAMMER_BAUD_RATE,
            "serial connection on"
        );
        Ok(Self::new(port, settings))
    }
}

impl<P: SerialPortAdapter> Transport<P> {
    /// Wrap an already opened adapter.
    pub fn new(port: P, settings: TransportSettings) -> Self {
        Self {
            name: port.name().to_string(),
            settings,
            port: Mutex::new(Some(port)),
        }
    }

    /// Name of the underlying port.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.port.lock().is_some()
    }

    /// Send `command` and return the reply it elicited.
    ///
    /// The channel lock is held for the whole write+read sequence and dropped
    /// on every return path.
    pub fn query(&self, command: &str) -> Result<ResponseFrame, TransportError> {
        let frame = CommandFrame::new(command)?;

        let mut guard = self.port.lock();
        let port = guard.as_mut().ok_or(TransportError::Closed)?;

        // A reply that missed an earlier deadline must not answer this command.
        port.clear_input().map_err(TransportError::Io)?;
        Self::send_command(port, &frame)?;
        let response = Self::read_response(port, self.settings.response_timeout)?;

        debug!(
            port = %self.name,
            command,
            reply_len = response.len(),
            terminated = response.is_terminated(),
            "exchange complete"
        );
        Ok(response)
    }

    /// Release the port. Returns false if it was already closed.
    pub fn close(&self) -> bool {
        match self.port.lock().take() {
            Some(port) => {
                drop(port);
                info!(port = %self.name, "serial connection off");
                true
            }
            None => false,
        }
    }

    fn send_command(port: &mut P, frame: &CommandFrame) -> Result<(), TransportError> {
        let mut remaining = frame.as_bytes();
        while !remaining.is_empty() {
            let written = port.write_bytes(remaining).map_err(TransportError::Io)?;
            if written == 0 {
                return Err(TransportError::Io(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "port accepted no bytes",
                ))));
            }
            remaining = &remaining[written..];
        }
        port.flush().map_err(TransportError::Io)?;
        trace!(frame = ?String::from_utf8_lossy(frame.as_bytes()), "command written");
        Ok(())
    }

    fn read_response(port: &mut P, timeout: Duration) -> Result<ResponseFrame, TransportError> {
        let deadline = Instant::now() + timeout;
        let mut bytes = Vec::with_capacity(16);
        let mut chunk = [0u8; 64];

        loop {
            match port.read_bytes(&mut chunk) {
                Ok(n) => {
                    let received = &chunk[..n];
                    if let Some(end) = memchr::memchr(TERMINATOR, received) {
                        bytes.extend_from_slice(&received[..end]);
                        let trailing = n - end - 1;
                        if trailing > 0 {
                            debug!(trailing, "discarding bytes after reply terminator");
                        }
                        return Ok(ResponseFrame::terminated(bytes));
                    }
                    bytes.extend_from_slice(received);
                }
                Err(e) if e.is_no_data() => std::thread::yield_now(),
                Err(e) => return Err(TransportError::Io(e)),
            }

            if Instant::now() >= deadline {
                warn!(
                    received = bytes.len(),
                    timeout_ms = timeout.as_millis() as u64,
                    "no reply terminator before timeout"
                );
                return Ok(ResponseFrame::timed_out(bytes));
            }
        }
    }
}

impl<P: SerialPortAdapter> Drop for Transport<P> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<P: SerialPortAdapter> std::fmt::Debug for Transport<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockSerialPort, WireEvent};

    fn quick() -> TransportSettings {
        TransportSettings {
            response_timeout: Duration::from_millis(20),
            read_timeout: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_command_frame_appends_single_cr() {
        let frame = CommandFrame::new("R1250").unwrap();
        assert_eq!(frame.as_bytes(), b"R1250\r");
    }

    #[test]
    fn test_command_frame_rejects_terminator_and_non_ascii() {
        assert!(matches!(
            CommandFrame::new("S\rE"),
            Err(TransportError::InvalidCommand(_))
        ));
        assert!(matches!(
            CommandFrame::new("L1°"),
            Err(TransportError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_query_writes_frame_and_strips_terminator() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_reply("T", b"reply\r");
        let transport = Transport::new(port.clone(), quick());

        let frame = transport.query("T").unwrap();

        assert_eq!(frame.bytes(), b"reply");
        assert!(frame.is_terminated());
        assert_eq!(port.written_frames(), vec![b"T\r".to_vec()]);
    }

    #[test]
    fn test_reply_reassembled_across_reads() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_reply("T", b"0123456789\r");
        port.set_read_chunk(3);
        let transport = Transport::new(port, quick());

        let frame = transport.query("T").unwrap();
        assert_eq!(frame.bytes(), b"0123456789");
    }

    #[test]
    fn test_bytes_after_terminator_are_dropped() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_reply("T", b"ok\rnoise");
        let transport = Transport::new(port, quick());

        assert_eq!(transport.query("T").unwrap().bytes(), b"ok");
    }

    #[test]
    fn test_silent_device_yields_unterminated_frame() {
        let port = MockSerialPort::new("MOCK0");
        let transport = Transport::new(port, quick());

        let started = Instant::now();
        let frame = transport.query("S").unwrap();

        assert!(!frame.is_terminated());
        assert!(frame.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_empty_reply_is_distinct_from_timeout() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_reply("S", b"\r");
        let transport = Transport::new(port, quick());

        let frame = transport.query("S").unwrap();
        assert!(frame.is_empty());
        assert!(frame.is_terminated());
    }

    #[test]
    fn test_io_failure_releases_the_channel() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_reply("T", b"ok\r");
        port.fail_next_operation();
        let transport = Transport::new(port, quick());

        assert!(matches!(transport.query("T"), Err(TransportError::Io(_))));
        assert_eq!(transport.query("T").unwrap().bytes(), b"ok");
    }

    #[test]
    fn test_close_is_idempotent() {
        let port = MockSerialPort::new("MOCK0");
        let transport = Transport::new(port, quick());

        assert!(transport.is_open());
        assert!(transport.close());
        assert!(!transport.close());
        assert!(!transport.is_open());
        assert!(matches!(transport.query("T"), Err(TransportError::Closed)));
    }

    #[test]
    fn test_late_reply_is_discarded_before_next_command() {
        let mut port = MockSerialPort::new("MOCK0");
        let transport = Transport::new(port.clone(), quick());

        assert!(!transport.query("T").unwrap().is_terminated());

        port.enqueue_read(b"old\r");
        port.set_reply("T", b"new\r");

        assert_eq!(transport.query("T").unwrap().bytes(), b"new");
        assert_eq!(port.discarded_input(), 4);
    }

    #[test]
    fn test_open_missing_port_reports_connection_error() {
        let name = "/dev/nonexistent_stage_programmer";

        match Transport::open_with(name, quick()) {
            Err(TransportError::Connection { port, .. }) => assert_eq!(port, name),
            Err(other) => panic!("expected a connection error, got {other:?}"),
            Ok(_) => panic!("opening a missing port must fail"),
        }
    }

    #[test]
    fn test_invalid_command_never_reaches_the_wire() {
        let port = MockSerialPort::new("MOCK0");
        let transport = Transport::new(port.clone(), quick());

        assert!(transport.query("S\r").is_err());
        assert_eq!(port.events(), Vec::<WireEvent>::new());
    }
}
