/// Reply when the service account cannot log in.
pub const AUTH_FAILED_REPLY: &str = "Authentication failed. Please try again.";

/// Reply for anything that escapes a stage unhandled.
pub const FALLBACK_REPLY: &str = "Oops! Something went wrong. Try again in a moment. Sorry, our \
                                  system is facing trouble, but I'm here to help!";

/// Reply when the backend cannot be reached for a lookup.
pub const UPSTREAM_REPLY: &str =
    "Sorry, I couldn't reach the booking system right now. Please try again later.";

/// Reply when a booking directive carries an unparseable date or time.
pub const VALIDATION_REPLY: &str = "The date or time format is invalid. Please use YYYY-MM-DD \
                                    for the date and HH:MM for the time.";

/// Reply when the backend rejects a booking because the slot is taken.
pub const SLOT_OCCUPIED_REPLY: &str =
    "The requested time slot is already occupied. Please choose another time.";

/// Failures that end the handling of one message.
///
/// Each variant maps to a fixed text through [`Error::user_message`]; the
/// details only go to the logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("backend authentication failed: {0}")]
    AuthFailure(#[source] receptionist_directory::Error),

    #[error("invalid booking input: {0}")]
    Validation(String),

    #[error("requested slot is already taken")]
    BookingConflict,

    #[error("{operation} failed: {source}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: receptionist_directory::Error,
    },

    #[error("language model call failed: {0}")]
    Model(#[source] anyhow::Error),
}

impl Error {
    /// Classify a backend error raised by `operation`.
    #[must_use]
    pub fn upstream(operation: &'static str, source: receptionist_directory::Error) -> Self {
        match source {
            receptionist_directory::Error::Conflict => Self::BookingConflict,
            source => Self::Upstream { operation, source },
        }
    }

    /// The text sent to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthFailure(_) => AUTH_FAILED_REPLY,
            Self::Validation(_) => VALIDATION_REPLY,
            Self::BookingConflict => SLOT_OCCUPIED_REPLY,
            Self::Upstream { .. } => UPSTREAM_REPLY,
            Self::Model(_) => FALLBACK_REPLY,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
