//! Per-sender conversation state.
//!
//! Everything here lives for the lifetime of the process: cached backend
//! credentials and instruction overrides ([`SessionStore`]), in-progress
//! registrations ([`RegistrationStore`]) and the per-sender locks that keep
//! two messages from the same sender from interleaving ([`SenderLocks`]).

pub mod lock;
pub mod registration;
pub mod store;

pub use {
    lock::{SenderGuard, SenderLocks},
    registration::{RegistrationForm, RegistrationRecord, RegistrationState, RegistrationStore},
    store::{Credentials, Session, SessionStore},
};
