//! Transport encoding for write payloads.
//!
//! The contents API embeds file bodies as standard base64. Text is always
//! converted to its UTF-8 bytes first, so multi-byte characters survive.

use base64::{engine::general_purpose, Engine as _};

use crate::error::{StoreError, StoreResult};

/// Encode text for a write request.
pub fn encode_text(text: &str) -> String {
    encode_binary(text.as_bytes())
}

/// Encode raw bytes for a write request.
pub fn encode_binary(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode a transport payload. The remote wraps base64 at 60 columns, so
/// ASCII whitespace is ignored.
pub fn decode_binary(encoded: &str) -> StoreResult<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| StoreError::EncodingFailure(format!("invalid base64 payload: {}", e)))
}

/// Decode a transport payload that must hold UTF-8 text.
pub fn decode_text(encoded: &str) -> StoreResult<String> {
    let bytes = decode_binary(encoded)?;
    String::from_utf8(bytes)
        .map_err(|e| StoreError::EncodingFailure(format!("payload is not UTF-8 text: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn text_round_trips_with_multibyte_characters() {
        for text in [
            "",
            "plain ascii",
            "中文博客：第一篇文章",
            "emoji 🎉🚀 and combining e\u{301}",
            "mixed\r\nlines\tand\u{0}nul",
        ] {
            assert_eq!(decode_text(&encode_text(text)).unwrap(), text);
        }
    }

    #[test]
    fn text_is_utf8_before_base64() {
        // "é" as UTF-8 is C3 A9, not the single Latin-1 byte E9.
        assert_eq!(encode_text("é"), "w6k=");
    }

    #[test]
    fn binary_passes_through() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_binary(&encode_binary(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn wrapped_payloads_decode() {
        let wrapped = "5Lit5paH\n5Y2a5a6i\n";
        assert_eq!(decode_text(wrapped).unwrap(), "中文博客");
    }

    #[test]
    fn malformed_payloads_are_encoding_failures() {
        let err = decode_binary("not base64!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingFailure);

        let invalid_utf8 = encode_binary(&[0xff, 0xfe]);
        let err = decode_text(&invalid_utf8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingFailure);
    }
}
