//! WhatsApp channel via Twilio.
//!
//! Inbound messages arrive as form-encoded webhooks (see [`webhook`]);
//! replies go out through the Twilio Messages API (see [`outbound`]).

pub mod outbound;
pub mod webhook;

pub use {outbound::TwilioOutbound, webhook::TwilioWebhookForm};
