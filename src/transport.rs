//! Serial link shared by a control thread and a receive worker.
//!
//! A [`SerialLink`] is a cloneable handle to one serial stream: the driver
//! that owns the device keeps one clone for commands while its receive
//! worker polls another. Writes are paced with a fixed turnaround delay so
//! slow radio and TNC firmware is never overrun.

#[cfg(test)]
use std::collections::VecDeque;

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serialport::{ClearBuffer, StopBits};
use thiserror::Error;

/// Pacing delay applied after every write, giving the device time to turn
/// the line around before the next command arrives.
pub const WRITE_PACING: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no serial port configured")]
    NotConfigured,
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Serial parameters for one link.
///
/// Applied when the port is opened; reconfiguring an open link takes effect
/// at the next open. Stop bits are given as a count, where 2 selects two
/// stop bits and any other value one.
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port: Option<String>,
    pub baud: u32,
    pub timeout: Duration,
    pub stop_bits: u8,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud: 9600,
            timeout: Duration::from_millis(100),
            stop_bits: 1,
        }
    }
}

/// Byte-level operations the link needs from a port. Implemented by the
/// real serial port and, in tests, by a scripted mock.
pub(crate) trait RawPort: Send {
    fn bytes_to_read(&mut self) -> Result<u32, TransportError>;
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write_all_bytes(&mut self, buf: &[u8]) -> io::Result<()>;
    fn clear_input(&mut self) -> Result<(), TransportError>;
    fn set_rts(&mut self, enabled: bool) -> Result<(), TransportError>;
}

impl RawPort for Box<dyn serialport::SerialPort> {
    fn bytes_to_read(&mut self) -> Result<u32, TransportError> {
        Ok(self.as_ref().bytes_to_read()?)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }

    fn write_all_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(self, buf)
    }

    fn clear_input(&mut self) -> Result<(), TransportError> {
        Ok(self.clear(ClearBuffer::Input)?)
    }

    fn set_rts(&mut self, enabled: bool) -> Result<(), TransportError> {
        Ok(self.write_request_to_send(enabled)?)
    }
}

struct LinkState {
    settings: SerialSettings,
    port: Option<Box<dyn RawPort>>,
}

/// Cloneable handle to one serial stream.
///
/// Clones share the same underlying port and settings, so the control
/// thread and the receive worker see a single connection.
#[derive(Clone)]
pub struct SerialLink {
    state: Arc<Mutex<LinkState>>,
}

impl SerialLink {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LinkState {
                settings: SerialSettings::default(),
                port: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LinkState> {
        // A worker that panicked mid-access must not take the port down
        // with it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets the serial parameters used by the next [`open`](Self::open).
    pub fn configure(&self, port: &str, baud: u32, timeout_ms: u64, stop_bits: u8) {
        let mut state = self.state();
        state.settings = SerialSettings {
            port: Some(port.to_string()),
            baud,
            timeout: Duration::from_millis(timeout_ms),
            stop_bits,
        };
        debug!("configured {port}: {baud} baud, {timeout_ms} ms timeout, {stop_bits} stop bits");
    }

    /// Claims the configured port. On failure the link stays closed.
    /// Opening an already-open link is a no-op with a warning.
    pub fn open(&self) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.port.is_some() {
            warn!("serial port already open");
            return Ok(());
        }
        let Some(name) = state.settings.port.clone() else {
            warn!("no serial port configured");
            return Err(TransportError::NotConfigured);
        };
        let stop_bits = match state.settings.stop_bits {
            2 => StopBits::Two,
            1 => StopBits::One,
            other => {
                warn!("unsupported stop-bit count {other}, using one");
                StopBits::One
            }
        };
        match serialport::new(name.as_str(), state.settings.baud)
            .timeout(state.settings.timeout)
            .stop_bits(stop_bits)
            .open()
        {
            Ok(port) => {
                debug!("{name} opened at {} baud", state.settings.baud);
                state.port = Some(Box::new(port));
                Ok(())
            }
            Err(source) => {
                warn!("{name} failed to open: {source}");
                Err(TransportError::Open { port: name, source })
            }
        }
    }

    /// Releases the port. Closing an already-closed link is a no-op with a
    /// warning, never an error.
    pub fn close(&self) {
        let mut state = self.state();
        match state.port.take() {
            Some(_) => debug!("serial port closed"),
            None => warn!("serial port was not open, nothing to close"),
        }
    }

    /// Tears the stream down so the next open starts clean.
    pub fn reset(&self) {
        debug!("resetting serial stream");
        self.close();
    }

    pub fn is_open(&self) -> bool {
        self.state().port.is_some()
    }

    /// Writes raw bytes, then sleeps for [`WRITE_PACING`]. A write on a
    /// closed link is a no-op with a warning; callers on critical paths
    /// must check [`is_open`](Self::is_open) themselves.
    pub fn write_bytes(&self, bytes: &[u8]) {
        {
            let mut state = self.state();
            let Some(port) = state.port.as_mut() else {
                warn!("serial port not open, dropping {} bytes", bytes.len());
                return;
            };
            match port.write_all_bytes(bytes) {
                Ok(()) => debug!("wrote {bytes:02x?}"),
                Err(e) => {
                    warn!("serial write failed: {e}");
                    return;
                }
            }
        }
        thread::sleep(WRITE_PACING);
    }

    /// Writes ASCII command text with the same contract as
    /// [`write_bytes`](Self::write_bytes).
    pub fn write_str(&self, text: &str) {
        {
            let mut state = self.state();
            let Some(port) = state.port.as_mut() else {
                warn!("serial port not open, dropping command {text:?}");
                return;
            };
            match port.write_all_bytes(text.as_bytes()) {
                Ok(()) => debug!("wrote {text:?}"),
                Err(e) => {
                    warn!("serial write failed: {e}");
                    return;
                }
            }
        }
        thread::sleep(WRITE_PACING);
    }

    /// Returns everything currently buffered, or empty when nothing is
    /// waiting (including when the link is closed).
    pub fn read_available(&self) -> Vec<u8> {
        let mut state = self.state();
        let Some(port) = state.port.as_mut() else {
            return Vec::new();
        };
        let available = match port.bytes_to_read() {
            Ok(n) => n as usize,
            Err(e) => {
                warn!("serial status query failed: {e}");
                return Vec::new();
            }
        };
        if available == 0 {
            return Vec::new();
        }
        let mut buf = vec![0u8; available];
        match port.read_bytes(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                debug!("read {buf:02x?}");
                buf
            }
            Err(e) => {
                warn!("serial read failed: {e}");
                Vec::new()
            }
        }
    }

    /// [`read_available`](Self::read_available) as lossy UTF-8 text.
    pub fn read_text(&self) -> String {
        String::from_utf8_lossy(&self.read_available()).into_owned()
    }

    /// Reads one buffered byte, or `None` when nothing is waiting. A poll
    /// timeout from the OS also comes back as `None`; only hard port
    /// failures are errors.
    pub fn read_byte(&self) -> Result<Option<u8>, TransportError> {
        let mut state = self.state();
        let Some(port) = state.port.as_mut() else {
            return Ok(None);
        };
        if port.bytes_to_read()? == 0 {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        match port.read_bytes(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Drops any unread input held by the OS.
    pub fn discard_input(&self) {
        let mut state = self.state();
        if let Some(port) = state.port.as_mut() {
            if let Err(e) = port.clear_input() {
                warn!("failed to clear input buffer: {e}");
            }
        }
    }

    /// Drives the RTS line. Ignored with a warning when the link is closed.
    pub fn set_rts(&self, enabled: bool) {
        let mut state = self.state();
        match state.port.as_mut() {
            Some(port) => {
                if let Err(e) = port.set_rts(enabled) {
                    warn!("failed to set RTS: {e}");
                }
            }
            None => warn!("serial port not open, RTS unchanged"),
        }
    }

    #[cfg(test)]
    pub(crate) fn install(&self, port: Box<dyn RawPort>) {
        self.state().port = Some(port);
    }
}

impl Default for SerialLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Script/capture double standing in for a physical port in tests: reads
/// drain a shared incoming buffer, writes are captured per call, and an
/// optional reply script feeds the incoming buffer one entry per write.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MockPort {
    incoming: Arc<Mutex<VecDeque<u8>>>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    replies: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

#[cfg(test)]
impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_incoming(&self, bytes: &[u8]) {
        self.incoming.lock().unwrap().extend(bytes.iter().copied());
    }

    pub fn queue_reply(&self, bytes: &[u8]) {
        self.replies.lock().unwrap().push_back(bytes.to_vec());
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl RawPort for MockPort {
    fn bytes_to_read(&mut self) -> Result<u32, TransportError> {
        Ok(self.incoming.lock().unwrap().len() as u32)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut incoming = self.incoming.lock().unwrap();
        let n = buf.len().min(incoming.len());
        for slot in &mut buf[..n] {
            *slot = incoming.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write_all_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.written.lock().unwrap().push(buf.to_vec());
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            self.incoming.lock().unwrap().extend(reply);
        }
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), TransportError> {
        self.incoming.lock().unwrap().clear();
        Ok(())
    }

    fn set_rts(&mut self, _enabled: bool) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_on_closed_link_is_a_no_op() {
        let link = SerialLink::new();
        link.write_bytes(&[0x01, 0x02]);
        link.write_str("ID;");
        assert!(!link.is_open());
    }

    #[test]
    fn close_on_closed_link_is_a_no_op() {
        let link = SerialLink::new();
        link.close();
        link.close();
        assert!(!link.is_open());
    }

    #[test]
    fn open_without_port_fails_and_stays_closed() {
        let link = SerialLink::new();
        assert!(matches!(link.open(), Err(TransportError::NotConfigured)));
        assert!(!link.is_open());
    }

    #[test]
    fn reads_drain_the_installed_port() {
        let link = SerialLink::new();
        let mock = MockPort::new();
        mock.push_incoming(&[0xAA, 0xBB]);
        link.install(Box::new(mock.clone()));

        assert!(link.is_open());
        assert_eq!(link.read_byte().unwrap(), Some(0xAA));
        assert_eq!(link.read_available(), vec![0xBB]);
        assert_eq!(link.read_byte().unwrap(), None);
        assert_eq!(link.read_text(), "");
    }

    #[test]
    fn writes_are_captured_in_order() {
        let link = SerialLink::new();
        let mock = MockPort::new();
        link.install(Box::new(mock.clone()));

        link.write_bytes(&[0xFE, 0xFD]);
        link.write_str("FA;");
        assert_eq!(mock.writes(), vec![vec![0xFE, 0xFD], b"FA;".to_vec()]);
    }

    #[test]
    fn discard_input_clears_pending_bytes() {
        let link = SerialLink::new();
        let mock = MockPort::new();
        mock.push_incoming(&[1, 2, 3]);
        link.install(Box::new(mock.clone()));

        link.discard_input();
        assert_eq!(link.read_available(), Vec::<u8>::new());
    }
}
