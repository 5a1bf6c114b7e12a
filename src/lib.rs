//! Hardware-control core for a satellite ground-station operator console.
//!
//! This crate drives a radio transceiver and a packet terminal-node
//! controller (TNC) over two serial links. Radios speak one of two vendor
//! command protocols behind the [`radio::Radio`] capability trait: a binary
//! addressed-frame protocol ([`radio::icom`]) or an ASCII line-command
//! protocol ([`radio::yaesu`]). TNCs exchange binary packets through one of
//! two framing schemes behind [`tnc::Tnc`]: escaped delimiters
//! ([`framing::kiss`]) or a checksum trailer ([`framing::trailer`]), with a
//! background [`receiver::ReceiveLoop`] decoding inbound bytes into a
//! per-device packet queue.
//!
//! Drivers are selected once per session through the closed
//! [`devices::RadioKind`] / [`devices::TncKind`] dispatch, and each owns its
//! [`transport::SerialLink`]. Diagnostics go through the [`log`] facade; the
//! embedding application owns logger setup and serial-port selection.

pub mod crc;
pub mod devices;
pub mod framing;
pub mod hex;
pub mod radio;
pub mod receiver;
pub mod tnc;
pub mod transport;
