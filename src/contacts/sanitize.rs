//! Best-effort text recovery from schema-less blobs
//!
//! Contact names are stored inside serialized blobs whose layout is not
//! decoded here. Decoding the whole blob as UTF-8 and dropping control
//! characters leaves the embedded strings readable; field tags and varint
//! lengths fall out as control bytes or invalid sequences.

/// Characters kept by [`sanitize`] and [`clean_text`]: anything that is not a
/// control character, the usual whitespace controls, and every codepoint at
/// or above 128 so CJK and other non-ASCII text survives.
pub fn is_accepted(c: char) -> bool {
    !c.is_control() || matches!(c, '\t' | '\n' | '\r') || (c as u32) >= 128
}

/// Lossy-decode `bytes` and keep only accepted characters, trimmed.
/// Invalid UTF-8 sequences are dropped. Never fails.
pub fn sanitize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER && is_accepted(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Strip NUL and other unaccepted control characters from already-decoded text.
/// Unlike [`sanitize`], surrounding whitespace is preserved.
pub fn clean_text(text: &str) -> String {
    text.chars().filter(|&c| c != '\0' && is_accepted(c)).collect()
}
