use receptionist_common::FromMessage;

/// Errors raised while talking to the scheduling backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service account login was rejected or returned no tokens.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend refused a booking because the slot is taken.
    #[error("requested slot is already taken")]
    Conflict,

    /// Any other non-success HTTP status.
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend request timed out")]
    Timeout,

    #[error("invalid info endpoint: {0:?}")]
    InvalidEndpoint(String),

    #[error(transparent)]
    Http(reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(source)
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

receptionist_common::impl_context!();
