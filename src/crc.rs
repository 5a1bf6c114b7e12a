//! 16-bit frame checksum shared by both TNC framing schemes.

use crc::{Crc, CRC_16_IBM_SDLC};

/// The packet link uses CRC-16/X.25: register seeded with 0xFFFF, the
/// reflected CCITT polynomial (0x8408 bit-serially), and a final XOR with
/// 0xFFFF. The counterpart modem computes the same sum, so the algorithm
/// must match bit for bit.
pub const LINK_CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Checksum over a whole byte sequence.
pub fn checksum(data: &[u8]) -> u16 {
    LINK_CRC16.checksum(data)
}

/// Appends the checksum of `frame` to it, low byte first.
pub fn append_checksum(frame: &mut Vec<u8>) {
    let crc = checksum(frame);
    frame.push((crc & 0xFF) as u8);
    frame.push((crc >> 8) as u8);
}

/// Validates a frame carrying its checksum in the trailing two bytes, low
/// byte first. Frames shorter than three bytes never validate.
pub fn validate_trailer(frame: &[u8]) -> bool {
    if frame.len() < 3 {
        return false;
    }
    let (payload, trailer) = frame.split_at(frame.len() - 2);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    checksum(payload) == received
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_check_value() {
        assert_eq!(checksum(b"123456789"), 0x906E);
    }

    #[test]
    fn appended_checksum_validates() {
        let mut frame = vec![0x42, 0x01, 0x02];
        append_checksum(&mut frame);
        assert_eq!(frame.len(), 5);
        assert!(validate_trailer(&frame));
    }

    #[test]
    fn every_single_bit_flip_fails_validation() {
        let mut frame = vec![0x42, 0xDE, 0xAD, 0xBE, 0xEF];
        append_checksum(&mut frame);
        let payload_len = frame.len() - 2;
        for byte in 0..payload_len {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    !validate_trailer(&corrupted),
                    "flip of byte {byte} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn short_frames_never_validate() {
        assert!(!validate_trailer(&[]));
        assert!(!validate_trailer(&[0x00]));
        assert!(!validate_trailer(&[0x00, 0x00]));
    }
}
