//! Binary addressed-frame driver for CI-V controlled transceivers.
//!
//! Frame format: `FE FE <dst> <src> <cmd> [<sub>] <data...> FD`. Frequency
//! data travels as five bytes of packed BCD, least-significant decade pair
//! first. Split operation runs on one VFO with a duplex offset, so a
//! frequency change tunes the downlink and programs the uplink as an
//! offset sub-frame.

use log::{debug, warn};

use super::{Radio, RxMode};
use crate::transport::SerialLink;

/// Preamble byte, sent twice at the start of every frame.
pub const PREAMBLE: u8 = 0xFE;
/// Frame terminator.
pub const TERMINATOR: u8 = 0xFD;

/// Bus address of the transceiver on the command path.
const TRANSCEIVER_ADDR: u8 = 0x00;
/// Bus address of this controller.
const CONTROLLER_ADDR: u8 = 0x00;
/// The set's own CI-V address; the split-offset sub-frame targets it
/// directly.
const CIV_BUS_ADDR: u8 = 0x7C;

// Command bytes.
const CMD_FREQ: u8 = 0x00;
const CMD_MODE: u8 = 0x01;
const CMD_VFO: u8 = 0x07;
const CMD_SPLIT: u8 = 0x0F;
const CMD_TRX_ID: u8 = 0x19;
const CMD_EXTENDED: u8 = 0x1A;

// Mode codes carried by CMD_MODE.
const MODE_CW: u8 = 0x03;
const MODE_FM: u8 = 0x05;

/// Split pair loaded during connect: command uplink and telemetry downlink.
const INITIAL_UPLINK_HZ: u32 = 436_850_000;
const INITIAL_DOWNLINK_HZ: u32 = 437_375_000;

/// Builds one addressed command frame. `sub` is omitted from the wire when
/// `None`.
pub fn command_frame(dst: u8, src: u8, cmd: u8, sub: Option<u8>, data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(6 + usize::from(sub.is_some()) + data.len());
    frame.push(PREAMBLE);
    frame.push(PREAMBLE);
    frame.push(dst);
    frame.push(src);
    frame.push(cmd);
    if let Some(sub) = sub {
        frame.push(sub);
    }
    frame.extend_from_slice(data);
    frame.push(TERMINATOR);
    frame
}

/// Packs a frequency in Hz into five BCD bytes, least-significant decade
/// pair first, covering the 1 Hz through 1 GHz places.
pub fn encode_bcd_frequency(hz: u32) -> [u8; 5] {
    let mut bytes = [0u8; 5];
    let mut rest = hz;
    for byte in &mut bytes {
        let low = rest % 10;
        let high = rest / 10 % 10;
        *byte = (high * 16 + low) as u8;
        rest /= 100;
    }
    bytes
}

/// The split-offset sub-frame: a fixed 13-byte extended command carrying
/// the duplex offset as three BCD bytes for the 100 Hz through 10 MHz
/// places, padded with a zero byte before the terminator.
fn split_offset_frame(offset_hz: u32) -> [u8; 13] {
    let mut frame = [0u8; 13];
    frame[..8].copy_from_slice(&[
        PREAMBLE,
        PREAMBLE,
        CIV_BUS_ADDR,
        CONTROLLER_ADDR,
        CMD_EXTENDED,
        0x05,
        0x00,
        0x17,
    ]);
    let mut rest = offset_hz / 100;
    for slot in &mut frame[8..11] {
        let low = rest % 10;
        let high = rest / 10 % 10;
        *slot = (high * 16 + low) as u8;
        rest /= 100;
    }
    frame[12] = TERMINATOR;
    frame
}

/// Driver for the binary addressed-frame radio family.
pub struct IcomRadio {
    link: SerialLink,
}

impl IcomRadio {
    pub fn new() -> Self {
        Self {
            link: SerialLink::new(),
        }
    }

    fn send(&self, cmd: u8, sub: Option<u8>, data: &[u8]) {
        self.link
            .write_bytes(&command_frame(TRANSCEIVER_ADDR, CONTROLLER_ADDR, cmd, sub, data));
    }

    /// Selects VFO-A, applies the mode and its data-path companion, and
    /// optionally re-asserts duplex (the receive path does, the transmit
    /// path does not).
    fn change_mode(&self, mode: RxMode, reassert_duplex: bool) {
        self.send(CMD_VFO, Some(0x00), &[]);
        let (mode_code, data_mode) = match mode {
            RxMode::CwUpper => (MODE_CW, [0x00, 0x00]),
            RxMode::FmData => (MODE_FM, [0x01, 0x01]),
            RxMode::Fm => {
                warn!("{} has no plain-FM mapping, mode unchanged", self.model_name());
                return;
            }
        };
        self.send(CMD_MODE, None, &[mode_code]);
        self.send(CMD_EXTENDED, Some(0x06), &data_mode);
        if reassert_duplex {
            self.send(CMD_SPLIT, Some(0x11), &[]);
        }
    }

    /// Transmit-side mode change; the set keeps TX and RX modes in step
    /// when both are applied.
    pub fn change_transmit_mode(&self, mode: RxMode) {
        self.change_mode(mode, false);
    }
}

impl Radio for IcomRadio {
    fn model_name(&self) -> &'static str {
        "IC-9100"
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
            warn!("{} failed to connect", self.model_name());
            return false;
        }
        self.send(CMD_TRX_ID, Some(0x00), &[]); // transceiver ID query
        self.send(CMD_VFO, Some(0x01), &[]); // split operation
        self.send(CMD_VFO, None, &[]); // VFO mode
        self.send(CMD_EXTENDED, Some(0x05), &[0x00, 0x14, 0x01]); // quick split
        self.change_frequency(INITIAL_UPLINK_HZ, INITIAL_DOWNLINK_HZ);
        self.change_receive_mode(RxMode::FmData);
        self.change_transmit_mode(RxMode::FmData);
        // The set wants duplex toggled through 0x11 before settling on
        // 0x10, or the split state comes up wrong.
        self.send(CMD_SPLIT, Some(0x11), &[]);
        self.send(CMD_SPLIT, Some(0x10), &[]);
        debug!("{} initialized", self.model_name());
        true
    }

    fn disconnect(&mut self) {
        debug!("{} disconnecting", self.model_name());
        self.send(CMD_SPLIT, Some(0x00), &[]); // split off
        self.link.close();
    }

    fn change_frequency(&mut self, uplink_hz: u32, downlink_hz: u32) {
        debug!("uplink = {uplink_hz}, downlink = {downlink_hz}");
        // The modeled passes always have the downlink above the uplink.
        let offset_hz = downlink_hz.wrapping_sub(uplink_hz);
        self.send(CMD_FREQ, None, &encode_bcd_frequency(downlink_hz));
        debug!("split offset {offset_hz}");
        self.link.write_bytes(&split_offset_frame(offset_hz));
        self.send(CMD_SPLIT, Some(0x11), &[]);
    }

    fn change_receive_mode(&mut self, mode: RxMode) {
        self.change_mode(mode, true);
    }
}

impl Default for IcomRadio {
    fn default() -> Self {
        Self::new()
    }
}
