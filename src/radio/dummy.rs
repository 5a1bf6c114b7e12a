//! No-op radio driver for running the console without hardware.

use log::debug;

use super::{Radio, RxMode};

/// Accepts every command and only logs it.
#[derive(Debug, Default)]
pub struct DummyRadio {
    open: bool,
    port: String,
}

impl DummyRadio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Radio for DummyRadio {
    fn model_name(&self) -> &'static str {
        "DummyRadio"
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

    fn change_frequency(&mut self, uplink_hz: u32, downlink_hz: u32) {
        debug!(
            "{} changed uplink to {uplink_hz}, downlink to {downlink_hz}",
            self.model_name()
        );
    }

    fn change_receive_mode(&mut self, mode: RxMode) {
        debug!("{} receive mode set to {mode:?}", self.model_name());
    }
}
