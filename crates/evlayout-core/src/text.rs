//! Text normalization applied when copying text fields.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use evlayout_model::{LayoutError, RawValue, Result};

/// Nonspacing marks (`Mn`). Spacing and enclosing marks are kept.
static NONSPACING_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Mn}").expect("Invalid nonspacing mark regex"));

/// Decompose to NFD and drop nonspacing marks (`"café"` → `"cafe"`).
pub fn strip_accents(text: &str) -> String {
    let decomposed: String = text.nfd().collect();
    NONSPACING_MARK.replace_all(&decomposed, "").into_owned()
}

/// Accent-strip a raw byte string. Fails when the bytes are not UTF-8.
pub fn strip_accents_bytes(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|error| LayoutError::NormalizationFailure {
        message: error.to_string(),
    })?;
    Ok(strip_accents(text))
}

/// Keep only ASCII letters, digits, space, `_`, `.` and `-`.
pub fn filter_safe_chars(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|&&byte| byte.is_ascii_alphanumeric() || matches!(byte, b' ' | b'_' | b'.' | b'-'))
        .map(|&byte| char::from(byte))
        .collect()
}

/// Normalized text for a text or byte-string value, `None` for anything else.
///
/// Byte strings that fail to decode fall back to [`filter_safe_chars`].
pub fn normalize_text(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Text(text) => Some(strip_accents(text)),
        RawValue::Bytes(bytes) => Some(strip_accents_bytes(bytes).unwrap_or_else(|error| {
            debug!(%error, "falling back to character filter");
            filter_safe_chars(bytes)
        })),
        _ => None,
    }
}

/// Cut `text` to at most `width` characters.
pub fn truncate_chars(mut text: String, width: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(width) {
        text.truncate(idx);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_accents() {
        assert_eq!(strip_accents("café"), "cafe");
        assert_eq!(strip_accents("Zürich señor"), "Zurich senor");
        assert_eq!(strip_accents("plain"), "plain");
    }

    #[test]
    fn test_spacing_marks_are_kept() {
        // DEVANAGARI LETTER KA + VOWEL SIGN AA (Mc) + SIGN VIRAMA (Mn)
        assert_eq!(strip_accents("\u{915}\u{93e}"), "\u{915}\u{93e}");
        assert_eq!(strip_accents("\u{915}\u{94d}"), "\u{915}");
        // COMBINING ENCLOSING CIRCLE (Me)
        assert_eq!(strip_accents("a\u{20dd}"), "a\u{20dd}");
    }

    #[test]
    fn test_invalid_bytes_fall_back_to_filter() {
        let value = RawValue::Bytes(vec![b'R', b'1', 0xff, b'_', b'x', b'/', b'.', b'-']);
        assert_eq!(normalize_text(&value), Some("R1_x.-".to_string()));
    }

    #[test]
    fn test_valid_bytes_are_stripped() {
        let value = RawValue::Bytes("café".as_bytes().to_vec());
        assert_eq!(normalize_text(&value), Some("cafe".to_string()));
    }

    #[test]
    fn test_strip_accents_bytes_reports_failure() {
        let err = strip_accents_bytes(&[0xc3]).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef".to_string(), 3), "abc");
        assert_eq!(truncate_chars("ab".to_string(), 3), "ab");
        assert_eq!(truncate_chars("ééé".to_string(), 2), "éé");
    }

    #[test]
    fn test_non_text_is_none() {
        assert_eq!(normalize_text(&RawValue::Int(1)), None);
    }
}
