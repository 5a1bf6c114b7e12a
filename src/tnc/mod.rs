//! Packet TNC drivers.
//!
//! A connected TNC owns a background receive loop that deframes inbound
//! bytes and queues decoded packets; outbound payloads are framed with the
//! scheme the device understands. [`kantronics`] speaks escaped-delimiter
//! framing behind a line-command handshake, [`sim`] the checksum-trailer
//! framing of the packet-link simulator.

pub mod dummy;
pub mod kantronics;
pub mod sim;

pub use dummy::DummyTnc;
pub use kantronics::KantronicsTnc;
pub use sim::SimPacketTnc;

/// Capability surface shared by every TNC driver.
pub trait Tnc {
    fn model_name(&self) -> &'static str;

    fn is_open(&self) -> bool;

    /// Selects the serial port the next connect will claim.
    fn set_port(&mut self, port: &str);

    /// Opens the link, runs any vendor handshake, and starts the receive
    /// loop. `false` when the port cannot be claimed or the handshake
    /// fails.
    fn connect(&mut self) -> bool;

    /// Stops the receive loop and releases the port.
    fn disconnect(&mut self);

    /// Frames and transmits one payload.
    fn send_packet(&mut self, payload: &[u8]);

    /// Records whether the link should run in raw frame (KISS) mode.
    fn set_kiss_mode(&mut self, enabled: bool);

    /// Next received packet as hex-pair text, in arrival order, or `None`
    /// when the queue is empty.
    fn get_packet(&mut self) -> Option<String>;
}
