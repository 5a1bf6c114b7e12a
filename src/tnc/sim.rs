//! CRC-trailer TNC driver for the packet-link simulator counterpart.
//!
//! No handshake: the simulator is ready as soon as the port opens, so
//! connect only claims the link and starts the receive loop.

use std::thread;
use std::time::Duration;

use log::debug;

use super::Tnc;
use crate::framing::trailer::{self, TrailerDeframer};
use crate::receiver::{PacketQueue, ReceiveLoop};
use crate::transport::SerialLink;

const SETTLE: Duration = Duration::from_millis(100);

/// Driver for the checksum-trailer TNC.
pub struct SimPacketTnc {
    link: SerialLink,
    queue: PacketQueue,
    receive: ReceiveLoop,
    kiss_mode: bool,
}

impl SimPacketTnc {
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
}

impl Tnc for SimPacketTnc {
    fn model_name(&self) -> &'static str {
        "GS-Sim"
    }

    fn is_open(&self) -> bool {
        self.link.is_open()
    }

    fn set_port(&mut self, port: &str) {
        self.link.configure(port, 115_200, 100, 1);
    }

    fn connect(&mut self) -> bool {
        debug!("{} connecting", self.model_name());
        if self.link.open().is_err() {
            return false;
        }
        self.receive
            .start(self.link.clone(), TrailerDeframer::new(), self.queue.sender());
        true
    }

    fn disconnect(&mut self) {
        debug!("{} disconnecting", self.model_name());
        self.receive.stop();
        thread::sleep(SETTLE);
        self.link.close();
        debug!("{} disconnected", self.model_name());
    }

    fn send_packet(&mut self, payload: &[u8]) {
        debug!("sending {} payload bytes to the TNC", payload.len());
        self.link.write_bytes(&trailer::encode_frame(payload));
    }

    fn set_kiss_mode(&mut self, enabled: bool) {
        self.kiss_mode = enabled;
        debug!("{} KISS mode flag set to {enabled}", self.model_name());
    }

    fn get_packet(&mut self) -> Option<String> {
        self.queue.pop()
    }
}

impl Default for SimPacketTnc {
    fn default() -> Self {
        Self::new()
    }
}
