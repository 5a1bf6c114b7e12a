//! Radio transceiver drivers.
//!
//! Both physical drivers translate the same operator intents into their
//! vendor's command protocol: [`icom`] speaks a binary addressed-frame
//! protocol over a single VFO with a split offset, [`yaesu`] an ASCII
//! line-command protocol that realizes split duplex across two VFOs.

pub mod dummy;
pub mod icom;
pub mod yaesu;

use std::str::FromStr;

use thiserror::Error;

pub use dummy::DummyRadio;
pub use icom::IcomRadio;
pub use yaesu::YaesuRadio;

/// Operating modes the console can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxMode {
    /// CW on the upper sideband.
    CwUpper,
    /// FM with the data path enabled, for packet operation.
    FmData,
    /// Plain FM voice.
    Fm,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown receive mode {0:?}")]
pub struct UnknownModeError(pub String);

impl FromStr for RxMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CW-U" => Ok(Self::CwUpper),
            "FM-D" => Ok(Self::FmData),
            "FM" => Ok(Self::Fm),
            other => Err(UnknownModeError(other.to_string())),
        }
    }
}

/// Capability surface shared by every radio driver.
pub trait Radio {
    fn model_name(&self) -> &'static str;

    fn is_open(&self) -> bool;

    /// Selects the serial port the next connect will claim.
    fn set_port(&mut self, port: &str);

    /// Opens the link and runs the vendor initialization sequence.
    /// `false` when the port cannot be claimed or the set does not answer.
    fn connect(&mut self) -> bool;

    fn disconnect(&mut self);

    /// Tunes the split pair: transmit on `uplink_hz`, receive on
    /// `downlink_hz`.
    fn change_frequency(&mut self, uplink_hz: u32, downlink_hz: u32);

    /// Switches the receive operating mode.
    fn change_receive_mode(&mut self, mode: RxMode);
}
