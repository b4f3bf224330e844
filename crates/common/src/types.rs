use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Address prefix WhatsApp transports put in front of phone numbers.
const WHATSAPP_ADDRESS_PREFIX: &str = "whatsapp:";

/// Stable identifier of a conversation participant (a phone number for
/// WhatsApp senders).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderKey(String);

impl SenderKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a key from a channel address such as `whatsapp:+391234567`.
    #[must_use]
    pub fn from_channel_address(address: &str) -> Self {
        let trimmed = address.trim();
        let bare = trimmed
            .strip_prefix(WHATSAPP_ADDRESS_PREFIX)
            .unwrap_or(trimmed);
        Self(bare.trim().to_string())
    }

    /// The channel address for outbound delivery.
    #[must_use]
    pub fn to_channel_address(&self) -> String {
        format!("{WHATSAPP_ADDRESS_PREFIX}{}", self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SenderKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SenderKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SenderKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A normalized inbound message, independent of the transport it arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender: SenderKey,
    /// Message text, already trimmed.
    pub body: String,
}

impl InboundMessage {
    pub fn new(sender: SenderKey, body: impl Into<String>) -> Self {
        Self {
            sender,
            body: body.into().trim().to_string(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
