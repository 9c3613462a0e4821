use std::fmt::Write;

use crate::error::{CodecError, Result};

/// Digit case for [`hex_encode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HexCase {
    #[default]
    Lower,
    Upper,
}

/// Render bytes as a contiguous hex string.
pub fn hex_encode(bytes: &[u8], case: HexCase) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing into a String cannot fail.
        let _ = match case {
            HexCase::Lower => write!(out, "{byte:02x}"),
            HexCase::Upper => write!(out, "{byte:02X}"),
        };
    }
    out
}

/// Parse a hex string into bytes.
///
/// Whitespace, `:` separators and a leading `0x` are ignored.
pub fn hex_decode(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CodecError::InvalidHex(format!(
            "odd number of digits ({})",
            digits.len()
        )));
    }

    digits
        .chunks_exact(2)
        .map(|pair| -> Result<u8> { Ok((nibble(pair[0])? << 4) | nibble(pair[1])?) })
        .collect()
}

fn nibble(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(CodecError::InvalidHex(format!(
            "unexpected character '{}'",
            other as char
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_lower_and_upper() {
        let bytes = [0x00, 0xAB, 0x7f];
        assert_eq!(hex_encode(&bytes, HexCase::Lower), "00ab7f");
        assert_eq!(hex_encode(&bytes, HexCase::Upper), "00AB7F");
        assert_eq!(hex_encode(&[], HexCase::Upper), "");
    }

    #[test]
    fn decodes_with_separators_and_prefix() {
        assert_eq!(hex_decode("0x01 02:0a").unwrap(), vec![0x01, 0x02, 0x0A]);
        assert_eq!(hex_decode("DEADbeef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(hex_decode("").unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(hex_decode("abc"), Err(CodecError::InvalidHex(_))));
        assert!(matches!(hex_decode("zz"), Err(CodecError::InvalidHex(_))));
    }
}
