//! No-op TNC driver for running the console without hardware.

use log::debug;

use super::Tnc;

/// Accepts every command and only logs it; never produces packets.
#[derive(Debug, Default)]
pub struct DummyTnc {
    open: bool,
    port: String,
    kiss_mode: bool,
}

impl DummyTnc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kiss_mode(&self) -> bool {
        self.kiss_mode
    }
}

impl Tnc for DummyTnc {
    fn model_name(&self) -> &'static str {
        "DummyTnc"
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn set_port(&mut self, port: &str) {
        self.port = port.to_string();
        debug!("{} port is {}", self.model_name(), self.port);
    }

    fn connect(&mut self) -> bool {
        debug!("{} connected", self.model_name());
        self.open = true;
        true
    }

    fn disconnect(&mut self) {
        debug!("{} disconnected", self.model_name());
        self.open = false;
    }

    fn send_packet(&mut self, payload: &[u8]) {
        debug!("{} dropped {} payload bytes", self.model_name(), payload.len());
    }

    fn set_kiss_mode(&mut self, enabled: bool) {
        self.kiss_mode = enabled;
        debug!("{} KISS mode flag set to {enabled}", self.model_name());
    }

    fn get_packet(&mut self) -> Option<String> {
        None
    }
}
