//! Twilio inbound webhook payload.

use {
    receptionist_common::{InboundMessage, SenderKey},
    serde::Deserialize,
};

/// The subset of Twilio's form-encoded webhook fields the gateway reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioWebhookForm {
    #[serde(rename = "Body", default)]
    pub body: String,
    /// Sender address, e.g. `whatsapp:+391234567`.
    #[serde(rename = "From", default)]
    pub from: String,
}

impl TwilioWebhookForm {
    /// Normalize into an [`InboundMessage`].
    ///
    /// Returns `None` when the body is empty after trimming.
    #[must_use]
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = InboundMessage::new(SenderKey::from_channel_address(&self.from), self.body);
        (!message.is_empty()).then_some(message)
    }
}
