//! Per-sender session cache.

use {
    dashmap::DashMap,
    receptionist_common::SenderKey,
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

/// Bearer credentials issued by the scheduling backend.
#[derive(Clone)]
pub struct Credentials {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: Secret::new(refresh_token.into()),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// State owned for one sender.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Set on first successful authentication, replaced on re-authentication.
    pub credentials: Option<Credentials>,
    /// Replaces the default system instruction for this sender.
    pub instruction: Option<String>,
}

/// Concurrent per-sender session map.
///
/// Every mutation replaces a field of the session under the map's shard
/// lock, so readers observe either the old or the new value, never a mix.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SenderKey, Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached credentials for `sender`, if any.
    #[must_use]
    pub fn credentials(&self, sender: &str) -> Option<Credentials> {
        self.sessions
            .get(sender)
            .and_then(|session| session.credentials.clone())
    }

    /// Cache credentials for `sender`, replacing any previous ones.
    pub fn put_credentials(&self, sender: &SenderKey, credentials: Credentials) {
        let mut session = self.sessions.entry(sender.clone()).or_default();
        let replaced = session.credentials.replace(credentials).is_some();
        debug!(sender = %sender, replaced, "cached backend credentials");
    }

    /// Instruction override for `sender`, if one was set.
    #[must_use]
    pub fn instruction(&self, sender: &str) -> Option<String> {
        self.sessions
            .get(sender)
            .and_then(|session| session.instruction.clone())
    }

    pub fn set_instruction(&self, sender: &SenderKey, instruction: impl Into<String>) {
        self.sessions.entry(sender.clone()).or_default().instruction = Some(instruction.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
