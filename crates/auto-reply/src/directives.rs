//! Directive grammar.
//!
//! The language model is asked to answer with one of a few fixed command
//! shapes when it wants the bot to act. Its output is untrusted, so anything
//! that does not match a shape exactly is treated as a plain reply.

use std::sync::LazyLock;

use regex::Regex;

const INFO_PREFIX: &str = "INFO:";

#[allow(clippy::expect_used)]
static BOOKING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^APPOINTMENT BOOK PROFESSIONAL ID (\d+) DATESTART (\d{4}-\d{2}-\d{2}) TIMESTART (\d{2}:\d{2}) USERID (\d+)\.?$",
    )
    .expect("booking directive regex")
});

#[allow(clippy::expect_used)]
static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PROFESSIONAL SLOT NEEDED (\d+)\b").expect("slot directive regex")
});

/// A command extracted from model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Book `professional_id` at `date_start` / `time_start` for `user_id`.
    ///
    /// Date and time have the right shape but are not yet calendar-checked.
    BookAppointment {
        professional_id: u64,
        date_start: String,
        time_start: String,
        user_id: u64,
    },
    /// Look up an `info/<endpoint>` page.
    InfoRequest { endpoint: String },
    /// List free slots for a professional.
    SlotQuery { professional_id: u64 },
    /// Send the text as-is.
    PlainReply { text: String },
}

impl Directive {
    /// Parse model output. Never fails; unmatched input is a
    /// [`PlainReply`](Self::PlainReply) of the trimmed text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        parse_info(text)
            .or_else(|| parse_booking(text))
            .or_else(|| parse_slot_query(text))
            .unwrap_or_else(|| Self::PlainReply {
                text: text.to_string(),
            })
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BookAppointment { .. } => "book_appointment",
            Self::InfoRequest { .. } => "info_request",
            Self::SlotQuery { .. } => "slot_query",
            Self::PlainReply { .. } => "plain_reply",
        }
    }
}

fn parse_info(text: &str) -> Option<Directive> {
    let endpoint = text.strip_prefix(INFO_PREFIX)?.trim();
    (!endpoint.is_empty()).then(|| Directive::InfoRequest {
        endpoint: endpoint.to_string(),
    })
}

fn parse_booking(text: &str) -> Option<Directive> {
    let caps = BOOKING_RE.captures(text)?;
    Some(Directive::BookAppointment {
        professional_id: caps[1].parse().ok()?,
        date_start: caps[2].to_string(),
        time_start: caps[3].to_string(),
        user_id: caps[4].parse().ok()?,
    })
}

fn parse_slot_query(text: &str) -> Option<Directive> {
    let caps = SLOT_RE.captures(text)?;
    Some(Directive::SlotQuery {
        professional_id: caps[1].parse().ok()?,
    })
}
