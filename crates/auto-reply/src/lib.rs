//! Inbound message processing pipeline, between the channel and the backend.
//!
//! Flow: inbound message → per-sender lock → session credentials → user
//! lookup → (registration flow | context + model prompt) → directive parse →
//! dispatch → reply text.

pub mod directives;
pub mod dispatch;
pub mod error;
pub mod prompt;
pub mod registration;
pub mod reply;
pub mod slots;

#[cfg(test)]
mod test_support;

pub use {
    directives::Directive,
    dispatch::ActionDispatcher,
    error::{Error, Result},
    registration::RegistrationFlow,
    reply::{ChatSettings, ConversationOrchestrator},
    slots::format_slots,
};
