//! Space-separated hex-pair text, the operator-facing packet representation.
//!
//! Received packets are published as lowercase pairs (`"aa 0b c0"`) and
//! operator payload input is parsed from the same shape. A malformed pair
//! is a hard error for the invoking command handler to surface, unlike the
//! device-absence conditions elsewhere in the crate, which only log.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HexError {
    #[error("invalid hex pair {token:?}")]
    InvalidPair { token: String },
}

/// Formats bytes as lowercase hex pairs: `[0xAA, 0x0B]` becomes `"aa 0b"`.
pub fn to_hex_pairs(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses whitespace-separated hex pairs, upper or lower case.
pub fn parse_hex_pairs(text: &str) -> Result<Vec<u8>, HexError> {
    text.split_whitespace()
        .map(|token| {
            if token.len() > 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(HexError::InvalidPair {
                    token: token.to_string(),
                });
            }
            u8::from_str_radix(token, 16).map_err(|_| HexError::InvalidPair {
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_lowercase_pairs() {
        assert_eq!(to_hex_pairs(&[0xAA, 0x0B, 0xC0]), "aa 0b c0");
        assert_eq!(to_hex_pairs(&[]), "");
    }

    #[test]
    fn parses_mixed_case_pairs() {
        assert_eq!(parse_hex_pairs("AA 0b C0").unwrap(), vec![0xAA, 0x0B, 0xC0]);
        assert_eq!(parse_hex_pairs("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn round_trips_through_text() {
        let bytes = vec![0x00, 0xC0, 0xDB, 0xFF];
        assert_eq!(parse_hex_pairs(&to_hex_pairs(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn malformed_pairs_are_hard_errors() {
        assert!(parse_hex_pairs("zz").is_err());
        assert!(parse_hex_pairs("aa 0x1").is_err());
        assert!(parse_hex_pairs("abc").is_err());
    }
}
