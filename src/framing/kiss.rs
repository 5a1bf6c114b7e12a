//! Escaped start/end-delimiter framing.
//!
//! Frames are delimited by `FEND` (0xC0); a payload `FEND` travels as
//! `FESC TFEND` and a payload `FESC` as `FESC TFESC`. On the wire a data
//! frame is `C0 00 <escaped payload> C0`, the 0x00 being the data-frame
//! command byte the controller expects after the opening delimiter.

use log::debug;

use crate::framing::Deframer;

/// Frame delimiter.
pub const FEND: u8 = 0xC0;
/// Escape introducer.
pub const FESC: u8 = 0xDB;
/// Escaped stand-in for a payload `FEND`.
pub const TFEND: u8 = 0xDC;
/// Escaped stand-in for a payload `FESC`.
pub const TFESC: u8 = 0xDD;

/// Data-frame command byte.
pub const CMD_DATA: u8 = 0x00;

/// Applies the escape map to a payload.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        match byte {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            _ => out.push(byte),
        }
    }
    out
}

/// Reverses [`escape`]. An escape introducer followed by anything other
/// than `TFEND`/`TFESC` is passed through untouched.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().copied().peekable();
    while let Some(byte) = iter.next() {
        if byte == FESC {
            match iter.peek() {
                Some(&TFEND) => {
                    iter.next();
                    out.push(FEND);
                }
                Some(&TFESC) => {
                    iter.next();
                    out.push(FESC);
                }
                _ => out.push(byte),
            }
        } else {
            out.push(byte);
        }
    }
    out
}

/// Frames a payload for transmission: delimiter, data command byte, escaped
/// payload, delimiter.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![FEND, CMD_DATA];
    frame.extend_from_slice(&escape(payload));
    frame.push(FEND);
    frame
}

/// Incremental receive-side deframer.
///
/// A delimiter outside a frame opens one; a delimiter inside closes it and
/// the bytes between are unescaped. A closed frame no longer than two bytes
/// is degenerate and dropped; longer frames lose their leading command byte
/// and the rest is the logical packet.
#[derive(Debug, Default)]
pub struct KissDeframer {
    in_frame: bool,
    buf: Vec<u8>,
}

impl KissDeframer {
    pub fn new() -> Self {
        Self::default()
    }

    fn complete(&mut self) -> Option<Vec<u8>> {
        let raw = unescape(&self.buf);
        self.buf.clear();
        if raw.len() <= 2 {
            debug!("dropping degenerate {}-byte frame", raw.len());
            return None;
        }
        Some(raw[1..].to_vec())
    }
}

impl Deframer for KissDeframer {
    fn push_byte(&mut self, byte: u8) -> Option<Vec<u8>> {
        match byte {
            FEND if !self.in_frame => {
                self.in_frame = true;
                None
            }
            FEND => {
                self.in_frame = false;
                if self.buf.is_empty() {
                    return None;
                }
                self.complete()
            }
            _ if self.in_frame => {
                self.buf.push(byte);
                None
            }
            // Inter-frame noise.
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deframe(deframer: &mut KissDeframer, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes
            .iter()
            .filter_map(|&b| deframer.push_byte(b))
            .collect()
    }

    #[test]
    fn escape_round_trips_reserved_bytes() {
        let payloads: [&[u8]; 4] = [
            &[],
            &[0xC0],
            &[0xDB, 0xDC, 0xDD, 0xC0, 0xDB],
            &[0x00, 0x42, 0xC0, 0xC0, 0x7F],
        ];
        for payload in payloads {
            assert_eq!(unescape(&escape(payload)), payload);
        }
    }

    #[test]
    fn escape_map_is_exact() {
        assert_eq!(escape(&[0xC0]), vec![0xDB, 0xDC]);
        assert_eq!(escape(&[0xDB]), vec![0xDB, 0xDD]);
        assert_eq!(escape(&[0x41]), vec![0x41]);
    }

    #[test]
    fn encode_frame_wraps_and_escapes() {
        assert_eq!(
            encode_frame(&[0x42, 0xC0, 0x01]),
            vec![0xC0, 0x00, 0x42, 0xDB, 0xDC, 0x01, 0xC0]
        );
    }

    #[test]
    fn deframer_inverts_encode_frame() {
        let payloads: [&[u8]; 3] = [
            &[0x42, 0x01],
            &[0xC0, 0xDB, 0xC0],
            &[0x10, 0x20, 0x30, 0x40],
        ];
        let mut deframer = KissDeframer::new();
        for payload in payloads {
            let frames = deframe(&mut deframer, &encode_frame(payload));
            assert_eq!(frames, vec![payload.to_vec()]);
        }
    }

    #[test]
    fn noise_outside_frames_is_ignored() {
        let mut deframer = KissDeframer::new();
        let mut bytes = vec![0x11, 0x22];
        bytes.extend_from_slice(&encode_frame(&[0xAA, 0xBB]));
        assert_eq!(deframe(&mut deframer, &bytes), vec![vec![0xAA, 0xBB]]);
    }

    #[test]
    fn empty_and_degenerate_frames_are_dropped() {
        let mut deframer = KissDeframer::new();
        // Back-to-back delimiters, then a frame with only the command byte
        // and one payload byte.
        let bytes = [0xC0, 0xC0, 0xC0, 0x00, 0x42, 0xC0];
        assert!(deframe(&mut deframer, &bytes).is_empty());
    }

    #[test]
    fn frame_split_across_bursts_still_completes() {
        let mut deframer = KissDeframer::new();
        let frame = encode_frame(&[0x01, 0x02, 0x03]);
        let (head, tail) = frame.split_at(3);
        assert!(deframe(&mut deframer, head).is_empty());
        assert_eq!(deframer.end_of_burst(), None);
        assert_eq!(deframe(&mut deframer, tail), vec![vec![0x01, 0x02, 0x03]]);
    }
}
