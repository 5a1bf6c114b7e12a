//! Length-implicit framing with a trailing checksum.
//!
//! Frames carry no delimiters: a fixed header byte, the payload, then the
//! 16-bit checksum low byte first. The receive side treats an empty read
//! burst as the frame boundary.

use log::{debug, warn};

use crate::crc;
use crate::framing::Deframer;

/// Header byte prepended to every transmitted payload.
pub const FRAME_HEADER: u8 = 0x42;

/// Frames a payload for transmission: header, payload, checksum trailer.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 3);
    frame.push(FRAME_HEADER);
    frame.extend_from_slice(payload);
    crc::append_checksum(&mut frame);
    frame
}

/// Receive-side deframer: accumulates one read burst and validates it
/// against its checksum trailer once the burst ends.
///
/// A burst that fails validation, or never reaches the three-byte minimum,
/// is dropped wholesale with no resynchronization search. The counterpart
/// modem frames the same way, so a corrupt frame costs exactly that frame.
#[derive(Debug, Default)]
pub struct TrailerDeframer {
    buf: Vec<u8>,
}

impl TrailerDeframer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deframer for TrailerDeframer {
    fn push_byte(&mut self, byte: u8) -> Option<Vec<u8>> {
        self.buf.push(byte);
        None
    }

    fn end_of_burst(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            return None;
        }
        if self.buf.len() < 3 {
            debug!("dropping short burst of {} bytes", self.buf.len());
            self.buf.clear();
            return None;
        }
        if !crc::validate_trailer(&self.buf) {
            warn!("CRC error, dropping {} buffered bytes", self.buf.len());
            self.buf.clear();
            return None;
        }
        let mut frame = std::mem::take(&mut self.buf);
        frame.truncate(frame.len() - 2);
        Some(frame)
    }
}
