//! Closed device selection.
//!
//! The console picks one radio variant and one TNC variant per session;
//! the choice is resolved into a concrete driver once, at construction,
//! and everything downstream works through the capability traits.

use crate::radio::{DummyRadio, IcomRadio, Radio, RxMode, YaesuRadio};
use crate::tnc::{DummyTnc, KantronicsTnc, SimPacketTnc, Tnc};

/// Radio driver families the console can operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioKind {
    /// Binary addressed-frame protocol.
    Icom,
    /// ASCII line-command protocol.
    Yaesu,
    /// Hardware-free stand-in.
    Dummy,
}

impl RadioKind {
    pub fn build(self) -> RadioDevice {
        match self {
            RadioKind::Icom => RadioDevice::Icom(IcomRadio::new()),
            RadioKind::Yaesu => RadioDevice::Yaesu(YaesuRadio::new()),
            RadioKind::Dummy => RadioDevice::Dummy(DummyRadio::new()),
        }
    }
}

/// TNC driver families the console can operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TncKind {
    /// Escaped-delimiter framing behind a line-command shell.
    Kantronics,
    /// Checksum-trailer framing of the packet-link simulator.
    SimPacket,
    /// Hardware-free stand-in.
    Dummy,
}

impl TncKind {
    pub fn build(self) -> TncDevice {
        match self {
            TncKind::Kantronics => TncDevice::Kantronics(KantronicsTnc::new()),
            TncKind::SimPacket => TncDevice::SimPacket(SimPacketTnc::new()),
            TncKind::Dummy => TncDevice::Dummy(DummyTnc::new()),
        }
    }
}

/// A constructed radio driver.
pub enum RadioDevice {
    Icom(IcomRadio),
    Yaesu(YaesuRadio),
    Dummy(DummyRadio),
}

impl RadioDevice {
    fn inner(&self) -> &dyn Radio {
        match self {
            RadioDevice::Icom(radio) => radio,
            RadioDevice::Yaesu(radio) => radio,
            RadioDevice::Dummy(radio) => radio,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Radio {
        match self {
            RadioDevice::Icom(radio) => radio,
            RadioDevice::Yaesu(radio) => radio,
            RadioDevice::Dummy(radio) => radio,
        }
    }
}

impl Radio for RadioDevice {
    fn model_name(&self) -> &'static str {
        self.inner().model_name()
    }

    fn is_open(&self) -> bool {
        self.inner().is_open()
    }

    fn set_port(&mut self, port: &str) {
        self.inner_mut().set_port(port);
    }

    fn connect(&mut self) -> bool {
        self.inner_mut().connect()
    }

    fn disconnect(&mut self) {
        self.inner_mut().disconnect();
    }

    fn change_frequency(&mut self, uplink_hz: u32, downlink_hz: u32) {
        self.inner_mut().change_frequency(uplink_hz, downlink_hz);
    }

    fn change_receive_mode(&mut self, mode: RxMode) {
        self.inner_mut().change_receive_mode(mode);
    }
}

/// A constructed TNC driver.
pub enum TncDevice {
    Kantronics(KantronicsTnc),
    SimPacket(SimPacketTnc),
    Dummy(DummyTnc),
}

impl TncDevice {
    fn inner(&self) -> &dyn Tnc {
        match self {
            TncDevice::Kantronics(tnc) => tnc,
            TncDevice::SimPacket(tnc) => tnc,
            TncDevice::Dummy(tnc) => tnc,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Tnc {
        match self {
            TncDevice::Kantronics(tnc) => tnc,
            TncDevice::SimPacket(tnc) => tnc,
            TncDevice::Dummy(tnc) => tnc,
        }
    }
}

impl Tnc for TncDevice {
    fn model_name(&self) -> &'static str {
        self.inner().model_name()
    }

    fn is_open(&self) -> bool {
        self.inner().is_open()
    }

    fn set_port(&mut self, port: &str) {
        self.inner_mut().set_port(port);
    }

    fn connect(&mut self) -> bool {
        self.inner_mut().connect()
    }

    fn disconnect(&mut self) {
        self.inner_mut().disconnect();
    }

    fn send_packet(&mut self, payload: &[u8]) {
        self.inner_mut().send_packet(payload);
    }

    fn set_kiss_mode(&mut self, enabled: bool) {
        self.inner_mut().set_kiss_mode(enabled);
    }

    fn get_packet(&mut self) -> Option<String> {
        self.inner_mut().get_packet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_build_the_matching_driver() {
        assert_eq!(RadioKind::Icom.build().model_name(), "IC-9100");
        assert_eq!(RadioKind::Yaesu.build().model_name(), "FT-991A");
        assert_eq!(RadioKind::Dummy.build().model_name(), "DummyRadio");
        assert_eq!(TncKind::Kantronics.build().model_name(), "9612XE");
        assert_eq!(TncKind::SimPacket.build().model_name(), "GS-Sim");
        assert_eq!(TncKind::Dummy.build().model_name(), "DummyTnc");
    }

    #[test]
    fn dummy_pair_runs_a_full_session_through_the_enums() {
        let mut radio = RadioKind::Dummy.build();
        let mut tnc = TncKind::Dummy.build();

        radio.set_port("COM7");
        tnc.set_port("COM8");
        assert!(radio.connect());
        assert!(tnc.connect());

        radio.change_frequency(436_850_000, 437_375_000);
        radio.change_receive_mode(RxMode::FmData);
        tnc.send_packet(&[0x01, 0x02]);
        tnc.set_kiss_mode(true);
        assert_eq!(tnc.get_packet(), None);

        tnc.disconnect();
        radio.disconnect();
        assert!(!radio.is_open());
        assert!(!tnc.is_open());
    }
}
