//! Shared types, error helpers and small text utilities used across all receptionist crates.

pub mod error;
pub mod text;
pub mod types;

pub use {
    error::FromMessage,
    types::{InboundMessage, SenderKey},
};
