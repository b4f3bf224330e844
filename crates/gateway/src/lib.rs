//! Webhook gateway: an axum server that turns inbound WhatsApp webhooks into
//! orchestrated replies and hands them to the outbound channel.

pub mod server;
pub mod state;

pub use {
    server::{build_gateway_app, start_gateway},
    state::{GatewayState, build_orchestrator},
};
