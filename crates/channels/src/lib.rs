//! Outbound messaging channels.
//!
//! A channel delivers reply text to a sender. The WhatsApp implementation
//! lives in `receptionist-whatsapp`; this crate holds the trait, the shared
//! error type and message chunking.

pub mod chunk;
pub mod error;
pub mod plugin;

pub use {
    chunk::{WHATSAPP_MAX_MESSAGE_CHARS, chunk_message},
    error::{Error, Result},
    plugin::ChannelOutbound,
};
