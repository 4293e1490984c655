//! Percent-escaped directory names for wavelet identifiers.
//!
//! A wave or wavelet id renders as `domain/id`, which cannot be a file
//! system name as-is. Bytes outside `[A-Za-z0-9._-]` are escaped as `%XX`
//! (uppercase hex), giving a deterministic round-trip on every platform.

use crate::error::{StoreError, StoreResult};

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.')
}

/// Escape an identifier into a file system safe directory name.
pub(crate) fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for &byte in raw.as_bytes() {
        if is_plain(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Invert [`escape`]. Fails on truncated or non-hex escapes and on
/// escaped bytes that do not form valid UTF-8.
pub(crate) fn unescape(name: &str) -> StoreResult<String> {
    let mut bytes = Vec::with_capacity(name.len());
    let mut chars = name.bytes();
    while let Some(byte) = chars.next() {
        if byte != b'%' {
            bytes.push(byte);
            continue;
        }
        let hi = chars.next();
        let lo = chars.next();
        let (Some(hi), Some(lo)) = (hi, lo) else {
            return Err(StoreError::InvalidDirName(name.into()));
        };
        let pair = [hi, lo];
        let hex = std::str::from_utf8(&pair)
            .ok()
            .and_then(|s| u8::from_str_radix(s, 16).ok());
        match hex {
            Some(value) => bytes.push(value),
            None => return Err(StoreError::InvalidDirName(name.into())),
        }
    }
    String::from_utf8(bytes).map_err(|_| StoreError::InvalidDirName(name.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(escape("conv.root-2_x"), "conv.root-2_x");
        assert_eq!(unescape("conv.root-2_x").unwrap(), "conv.root-2_x");
    }

    #[test]
    fn separators_and_plus_are_escaped() {
        assert_eq!(escape("example.com/w+wave1"), "example.com%2Fw%2Bwave1");
    }

    #[test]
    fn roundtrip_is_deterministic() {
        for raw in [
            "example.com/conv+root",
            "a b/c%d",
            "unicode/ßω",
            "%",
            "../../etc",
        ] {
            assert_eq!(unescape(&escape(raw)).unwrap(), raw);
        }
    }

    #[test]
    fn truncated_escape_is_rejected() {
        assert!(unescape("abc%2").is_err());
        assert!(unescape("abc%").is_err());
    }

    #[test]
    fn non_hex_escape_is_rejected() {
        assert!(unescape("abc%zz").is_err());
    }
}
