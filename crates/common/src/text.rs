//! Character-aware text helpers.
//!
//! Messaging limits are expressed in characters, not bytes, so these helpers
//! never split a UTF-8 code point.

/// Truncate `text` to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Split `text` into consecutive pieces of at most `max_chars` characters.
///
/// Empty input yields no pieces. A `max_chars` of zero yields no pieces.
#[must_use]
pub fn chunk_chars(text: &str, max_chars: usize) -> Vec<&str> {
    if max_chars == 0 {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let head = truncate_chars(remaining, max_chars);
        chunks.push(head);
        remaining = &remaining[head.len()..];
    }
    chunks
}
