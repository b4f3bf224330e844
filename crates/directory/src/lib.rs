//! Client for the scheduling backend.
//!
//! [`DirectoryService`] is the seam the conversation engine talks to;
//! [`HttpDirectoryClient`] is the JSON-over-HTTP implementation.

pub mod client;
pub mod error;
pub mod types;

pub use {
    client::{DirectoryService, HttpDirectoryClient},
    error::{Error, Result},
    types::{AuthTokens, BookingRequest, InfoPage, NewUser, SlotMap, UserRecord},
};
