//! Escaped-delimiter TNC driver for Kantronics 9612-class packet
//! controllers.
//!
//! The controller boots into a line-command shell; connect negotiates its
//! way to a prompt, verifies the model from the VERSION reply, applies a
//! fixed setup sequence, and drops the device into raw frame mode before
//! the receive loop starts.

use std::thread;
use std::time::Duration;

use log::{debug, warn};

use super::Tnc;
use crate::framing::kiss::{self, KissDeframer};
use crate::receiver::{PacketQueue, ReceiveLoop};
use crate::transport::SerialLink;

/// Substring the VERSION reply must contain before any setup is sent.
const MODEL_TAG: &str = "9612";

/// Sentinel that forces the controller out of raw frame mode.
const EXIT_FRAME_MODE: [u8; 3] = [0xC0, 0xFF, 0xC0];

/// Header byte carried at the front of every transmitted payload.
const PAYLOAD_HEADER: u8 = 0x42;

/// Ordered command sequence applied once the controller identifies itself.
const SETUP_COMMANDS: [&str; 10] = [
    "HBAUD 4800",     // radio-side baud
    "ABAUD 9600",     // serial-side baud
    "XMITLVL 100/27", // transmit levels per port
    "MYDROP 1/0",
    "PORT 2",         // radio hangs off port 2
    "TXDELAY 100/100",
    "AXDELAY 0/0",
    "MAXUSERS 0/1",
    "INTF KISS",      // raw frame interface
    "RESET",
];

const SETTLE_LONG: Duration = Duration::from_millis(500);
const SETTLE_SHORT: Duration = Duration::from_millis(100);

/// Driver for the escaped-delimiter TNC family.
pub struct KantronicsTnc {
    link: SerialLink,
    queue: PacketQueue,
    receive: ReceiveLoop,
    kiss_mode: bool,
}

impl KantronicsTnc {
    pub fn new() -> Self {
        Self {
            link: SerialLink::new(),
            queue: PacketQueue::new(),
            receive: ReceiveLoop::new(),
            kiss_mode: false,
        }
    }

    pub fn kiss_mode(&self) -> bool {
        self.kiss_mode
    }

    fn send_line(&self, text: &str) {
        self.link.write_str(&format!("{text}\r"));
    }

    /// Wakes the command prompt. An empty reply to the carriage returns
    /// means the controller is still in raw frame mode and gets kicked out
    /// with the exit sentinel first.
    fn enter_command_mode(&self) {
        thread::sleep(SETTLE_LONG);
        self.link.write_str("\r");
        self.link.write_str("\r");
        if self.link.read_text().is_empty() {
            debug!("no prompt, leaving frame mode");
            self.link.write_bytes(&EXIT_FRAME_MODE);
            thread::sleep(SETTLE_LONG);
            self.link.write_str("\r");
            self.link.discard_input();
        }
        self.link.discard_input();
    }
}

impl Tnc for KantronicsTnc {
    fn model_name(&self) -> &'static str {
        "9612XE"
    }

    fn is_open(&self) -> bool {
        self.link.is_open()
    }

    fn set_port(&mut self, port: &str) {
        self.link.configure(port, 9600, 100, 1);
    }

    fn connect(&mut self) -> bool {
        debug!("{} connecting", self.model_name());
        if self.link.open().is_err() {
            return false;
        }
        self.enter_command_mode();
        self.send_line("VERSION");
        let version = self.link.read_text();
        if !version.contains(MODEL_TAG) {
            warn!("{} did not identify itself: {version:?}", self.model_name());
            return false;
        }
        for command in SETUP_COMMANDS {
            self.send_line(command);
        }
        debug!("setup reply: {:?}", self.link.read_text());
        self.link.discard_input();
        thread::sleep(SETTLE_SHORT);
        debug!("{} setup finished", self.model_name());

        self.receive
            .start(self.link.clone(), KissDeframer::new(), self.queue.sender());
        true
    }

    fn disconnect(&mut self) {
        debug!("{} disconnecting", self.model_name());
        self.receive.stop();
        thread::sleep(SETTLE_SHORT);
        self.link.close();
        debug!("{} disconnected", self.model_name());
    }

    fn send_packet(&mut self, payload: &[u8]) {
        let mut headed = Vec::with_capacity(payload.len() + 1);
        headed.push(PAYLOAD_HEADER);
        headed.extend_from_slice(payload);
        debug!("sending {} payload bytes to the TNC", payload.len());
        self.link.write_bytes(&kiss::encode_frame(&headed));
    }

    fn set_kiss_mode(&mut self, enabled: bool) {
        self.kiss_mode = enabled;
        debug!("{} KISS mode flag set to {enabled}", self.model_name());
    }

    fn get_packet(&mut self) -> Option<String> {
        self.queue.pop()
    }
}

impl Default for KantronicsTnc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockPort;

    fn settle() {
        thread::sleep(Duration::from_millis(400));
    }

    #[test]
    fn send_packet_frames_with_header_and_escapes() {
        let mut tnc = KantronicsTnc::new();
        let mock = MockPort::new();
        tnc.link.install(Box::new(mock.clone()));

        tnc.send_packet(&[0xAA, 0xC0, 0xDB]);
        assert_eq!(
            mock.writes(),
            vec![vec![0xC0, 0x00, 0x42, 0xAA, 0xDB, 0xDC, 0xDB, 0xDD, 0xC0]]
        );
    }

    #[test]
    fn connect_verifies_the_model_before_setup() {
        let mut tnc = KantronicsTnc::new();
        let mock = MockPort::new();
        // Prompt answers the wake-up, VERSION identifies the model.
        mock.queue_reply(b"");
        mock.queue_reply(b"cmd:");
        mock.queue_reply(b"9612XE KISS v8.0\r");
        tnc.link.install(Box::new(mock.clone()));

        assert!(tnc.connect());

        let writes = mock.writes();
        assert_eq!(writes[0], b"\r".to_vec());
        assert_eq!(writes[1], b"\r".to_vec());
        assert_eq!(writes[2], b"VERSION\r".to_vec());
        assert_eq!(writes[3], b"HBAUD 4800\r".to_vec());
        assert_eq!(writes.last(), Some(&b"RESET\r".to_vec()));
        assert!(tnc.receive.is_running());
        tnc.disconnect();
    }

    #[test]
    fn connect_kicks_a_silent_controller_out_of_frame_mode() {
        let mut tnc = KantronicsTnc::new();
        let mock = MockPort::new();
        // No prompt at all: wake-up replies are empty, then the sentinel
        // and extra return bring the shell back for VERSION.
        mock.queue_reply(b"");
        mock.queue_reply(b"");
        mock.queue_reply(b"");
        mock.queue_reply(b"");
        mock.queue_reply(b"9612XE KISS v8.0\r");
        tnc.link.install(Box::new(mock.clone()));

        assert!(tnc.connect());
        assert!(mock.writes().contains(&EXIT_FRAME_MODE.to_vec()));
        tnc.disconnect();
    }

    #[test]
    fn connect_fails_on_unknown_model() {
        let mut tnc = KantronicsTnc::new();
        let mock = MockPort::new();
        mock.queue_reply(b"");
        mock.queue_reply(b"cmd:");
        mock.queue_reply(b"KPC-3 v9.1\r");
        tnc.link.install(Box::new(mock.clone()));

        assert!(!tnc.connect());
        // Setup never started.
        assert_eq!(mock.writes().last(), Some(&b"VERSION\r".to_vec()));
        assert!(!tnc.receive.is_running());
    }

    #[test]
    fn received_frames_lose_the_command_byte() {
        let mut tnc = KantronicsTnc::new();
        let mock = MockPort::new();
        tnc.link.install(Box::new(mock.clone()));
        tnc.receive
            .start(tnc.link.clone(), KissDeframer::new(), tnc.queue.sender());

        mock.push_incoming(&kiss::encode_frame(&[0x42, 0xC0, 0x01]));
        settle();
        assert_eq!(tnc.get_packet().as_deref(), Some("42 c0 01"));
        assert_eq!(tnc.get_packet(), None);

        tnc.receive.stop();
    }
}
