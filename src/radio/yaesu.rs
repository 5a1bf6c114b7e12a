//! ASCII line-command driver for CAT controlled transceivers.
//!
//! Every command is a two-letter mnemonic, decimal argument digits, and a
//! `;` terminator. Split duplex runs across two VFOs: VFO-A receives the
//! downlink, VFO-B transmits the uplink.

use std::thread;
use std::time::Duration;

use log::{debug, warn};

use super::{Radio, RxMode};
use crate::transport::SerialLink;

/// Command terminator.
const TERMINATOR: char = ';';

// Two-letter command mnemonics.
const VFO_A_FREQ: &str = "FA";
const VFO_B_FREQ: &str = "FB";
const TX_VFO: &str = "FT";
const RADIO_ID: &str = "ID";
const MODE: &str = "MD";
const MENU: &str = "EX";
const BAND_SELECT: &str = "BS";
const SWAP_VFO: &str = "SV";
const COPY_VFO: &str = "AB";
const TX_QUERY: &str = "TX";

/// Pause between a query write and reading its reply.
const REPLY_SETTLE: Duration = Duration::from_millis(10);

/// Working frequency of the 9600-baud packet preset.
const GMSK_HZ: u32 = 436_850_000;
/// Working frequency of the 1200-baud packet preset.
const AFSK_HZ: u32 = 145_825_000;

/// Builds one terminated command line.
pub fn command(mnemonic: &str, args: &[&str]) -> Vec<u8> {
    let mut text = String::from(mnemonic);
    for arg in args {
        text.push_str(arg);
    }
    text.push(TERMINATOR);
    debug!("command = {text}");
    text.into_bytes()
}

fn mode_code(mode: RxMode) -> &'static str {
    match mode {
        RxMode::CwUpper => "3",
        RxMode::FmData => "A",
        RxMode::Fm => "4",
    }
}

/// Driver for the ASCII line-command radio family.
pub struct YaesuRadio {
    link: SerialLink,
}

impl YaesuRadio {
    pub fn new() -> Self {
        Self {
            link: SerialLink::new(),
        }
    }

    fn send(&self, mnemonic: &str, args: &[&str]) {
        self.link.write_bytes(&command(mnemonic, args));
    }

    fn set_menu(&self, entry: &str, value: &str) {
        self.send(MENU, &[entry, value]);
    }

    /// Transmit-side mode change. The mode command always lands on the
    /// active VFO, so this swaps to the transmit VFO, applies the mode,
    /// and swaps back.
    pub fn change_transmit_mode(&self, mode: RxMode) {
        self.send(SWAP_VFO, &[]);
        self.send(MODE, &["0", mode_code(mode)]);
        self.send(SWAP_VFO, &[]);
        debug!("{} transmit mode {mode:?}", self.model_name());
    }

    /// 9600-baud packet preset: FM-data on both sides, data jack routing,
    /// 70 cm working frequency on both VFOs.
    pub fn setup_gmsk(&mut self) {
        self.change_transmit_mode(RxMode::FmData);
        self.change_receive_mode(RxMode::FmData);
        self.set_menu("079", "1"); // FM packet rate 9600
        self.send(BAND_SELECT, &["16"]); // 430 MHz band
        self.change_frequency(GMSK_HZ, GMSK_HZ);
        self.send(COPY_VFO, &[]);
        self.change_frequency(GMSK_HZ, GMSK_HZ);
        self.set_menu("076", "0"); // FM PTT from the data line
        self.set_menu("077", "1"); // FM port on the data jack
    }

    /// 1200-baud packet preset on the 2 m band.
    pub fn setup_afsk(&mut self) {
        self.change_transmit_mode(RxMode::FmData);
        self.change_receive_mode(RxMode::FmData);
        self.set_menu("079", "9"); // FM packet rate 1200
        self.send(BAND_SELECT, &["15"]); // 144 MHz band
        self.change_frequency(AFSK_HZ, AFSK_HZ);
        self.set_menu("076", "1"); // FM PTT from RTS
        self.set_menu("077", "2"); // FM port on USB audio
    }

    /// Queries transmit status. A `'2'` in the reply's third position means
    /// the set is inhibited from transmitting.
    pub fn transmit_ready(&mut self) -> bool {
        self.send(TX_QUERY, &[]);
        thread::sleep(REPLY_SETTLE);
        let reply = self.link.read_text();
        debug!("transmit status reply: {reply:?}");
        reply.chars().nth(2).is_some_and(|c| c != '2')
    }
}

impl Radio for YaesuRadio {
    fn model_name(&self) -> &'static str {
        "FT-991A"
    }

    fn is_open(&self) -> bool {
        self.link.is_open()
    }

    fn set_port(&mut self, port: &str) {
        self.link.configure(port, 9600, 100, 2);
    }

    fn connect(&mut self) -> bool {
        debug!("{} connecting", self.model_name());
        if self.link.open().is_err() {
            return false;
        }
        self.link.set_rts(true);

        self.send(RADIO_ID, &[]);
        thread::sleep(REPLY_SETTLE);
        let radio_id = self.link.read_text();
        if radio_id.is_empty() {
            warn!("{} returned no ID, check CAT settings", self.model_name());
            return false;
        }
        debug!("radio id: {radio_id}");

        self.send(TX_VFO, &["3"]); // transmit on VFO-B (split)
        self.set_menu("062", "1"); // data mode OTHERS
        self.set_menu("070", "1"); // data input on the rear jack
        self.set_menu("071", "0"); // data PTT from the data line
        self.set_menu("072", "1"); // data port select
        self.set_menu("073", "100"); // data out level
        self.set_menu("074", "1"); // FM mic source rear
        self.set_menu("075", "100"); // FM out level
        self.set_menu("117", "0"); // spectrum display
        self.setup_gmsk();
        debug!("{} initialized", self.model_name());
        true
    }

    fn disconnect(&mut self) {
        debug!("{} disconnecting", self.model_name());
        self.link.close();
    }

    fn change_frequency(&mut self, uplink_hz: u32, downlink_hz: u32) {
        debug!("uplink = {uplink_hz}, downlink = {downlink_hz}");
        self.send(VFO_A_FREQ, &[&format!("{downlink_hz:09}")]);
        self.send(VFO_B_FREQ, &[&format!("{uplink_hz:09}")]);
    }

    fn change_receive_mode(&mut self, mode: RxMode) {
        self.send(MODE, &["0", mode_code(mode)]);
        debug!("{} receive mode {mode:?}", self.model_name());
    }
}

impl Default for YaesuRadio {
    fn default() -> Self {
        Self::new()
    }
}
