//! Byte decoding fallback chain
//!
//! UTF-16LE, then UTF-8, then the legacy windows-1251 code page, then
//! lowercase hex. Hex always succeeds, so decoding never fails.

use encoding_rs::{UTF_16LE, WINDOWS_1251};
use ledgerlift_domain::ExtractionMethod;

/// Maximum share of control characters tolerated in decoded text
const MAX_CONTROL_RATIO: f64 = 0.1;

/// Decode raw blob bytes into text
///
/// Returns the decoded text with trailing NUL padding removed, and the
/// decoding that produced it. For non-empty input the text is never empty.
pub fn decode_bytes(bytes: &[u8]) -> (String, ExtractionMethod) {
    if let Some(text) = decode_utf16(bytes) {
        return (text, ExtractionMethod::TextUtf16);
    }
    if let Some(text) = decode_utf8(bytes) {
        return (text, ExtractionMethod::TextUtf8);
    }
    if let Some(text) = decode_cp1251(bytes) {
        return (text, ExtractionMethod::TextCp1251);
    }
    (hex::encode(bytes), ExtractionMethod::Hex)
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let body = match bytes {
        [0xFF, 0xFE, rest @ ..] => rest,
        _ if looks_like_utf16(bytes) => bytes,
        _ => return None,
    };
    if body.len() % 2 != 0 {
        return None;
    }

    let text = UTF_16LE.decode_without_bom_handling_and_without_replacement(body)?;
    accept(&text)
}

/// Even length, and at least half of the high bytes are 0x00 (Latin) or
/// 0x04 (Cyrillic)
fn looks_like_utf16(bytes: &[u8]) -> bool {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }
    let high_bytes = bytes.len() / 2;
    let plausible = bytes
        .iter()
        .skip(1)
        .step_by(2)
        .filter(|b| **b == 0x00 || **b == 0x04)
        .count();
    plausible * 2 >= high_bytes
}

fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(bytes).ok()?;
    accept(text)
}

fn decode_cp1251(bytes: &[u8]) -> Option<String> {
    let text = WINDOWS_1251.decode_without_bom_handling_and_without_replacement(bytes)?;
    accept(&text)
}

/// Trim padding and reject empty or binary-looking text
fn accept(text: &str) -> Option<String> {
    let trimmed = text.trim_end_matches('\0');
    if trimmed.is_empty() {
        return None;
    }

    let total = trimmed.chars().count();
    let control = trimmed
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count();
    if control as f64 / total as f64 > MAX_CONTROL_RATIO {
        return None;
    }

    Some(trimmed.to_string())
}
