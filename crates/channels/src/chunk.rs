use receptionist_common::text::chunk_chars;

/// Longest body Twilio accepts for a single WhatsApp message.
pub const WHATSAPP_MAX_MESSAGE_CHARS: usize = 1599;

/// Split text into consecutive chunks of at most `max_chars` characters.
///
/// Splits fall on character boundaries only; no attempt is made to keep
/// words together, so the chunks concatenate back to the input exactly.
#[must_use]
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<&str> {
    chunk_chars(text, max_chars)
}
