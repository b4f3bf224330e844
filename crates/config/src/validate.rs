//! Configuration validation.
//!
//! Reports settings that would make the gateway fail at runtime (missing
//! credentials, empty URLs, zero timeouts) before the server starts.

use std::path::PathBuf;

use secrecy::ExposeSecret;

use crate::schema::ReceptionistConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "directory.username".
    pub path: &'static str,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Validate a loaded configuration.
#[must_use]
pub fn validate(config: &ReceptionistConfig, config_path: Option<PathBuf>) -> ValidationResult {
    let mut diagnostics = Vec::new();
    let mut push = |severity, path, message: &str| {
        diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.to_string(),
        });
    };

    let url_ok = |url: &str| url.starts_with("http://") || url.starts_with("https://");

    if !url_ok(&config.directory.base_url) {
        push(
            Severity::Error,
            "directory.base_url",
            "must be an http(s) URL",
        );
    }
    if config.directory.username.trim().is_empty() {
        push(
            Severity::Error,
            "directory.username",
            "backend service account is not set",
        );
    }
    if config.directory.password.expose_secret().is_empty() {
        push(
            Severity::Error,
            "directory.password",
            "backend service account password is not set",
        );
    }
    if config.llm.api_key.expose_secret().is_empty() {
        push(
            Severity::Error,
            "llm.api_key",
            "language model API key is not set (GOOGLE_API_KEY)",
        );
    }
    if !url_ok(&config.llm.base_url) {
        push(Severity::Error, "llm.base_url", "must be an http(s) URL");
    }
    if config.llm.model.trim().is_empty() {
        push(Severity::Error, "llm.model", "model id is empty");
    }
    if config.whatsapp.account_sid.trim().is_empty()
        || config.whatsapp.auth_token.expose_secret().is_empty()
    {
        push(
            Severity::Warning,
            "whatsapp",
            "Twilio credentials are not set; replies cannot be delivered",
        );
    }
    if config.whatsapp.from_number.trim().is_empty() {
        push(
            Severity::Warning,
            "whatsapp.from_number",
            "sending number is not set (TWILIO_WHATSAPP_NUMBER)",
        );
    }

    for (path, secs) in [
        ("directory.timeout_secs", config.directory.timeout_secs),
        ("llm.timeout_secs", config.llm.timeout_secs),
        ("whatsapp.timeout_secs", config.whatsapp.timeout_secs),
    ] {
        if secs == 0 {
            push(Severity::Error, path, "timeout must be greater than zero");
        }
    }

    if config
        .chat
        .system_instruction
        .as_deref()
        .is_some_and(|s| s.trim().is_empty())
    {
        push(
            Severity::Warning,
            "chat.system_instruction",
            "empty instruction; the built-in instruction is usually what you want",
        );
    }

    ValidationResult {
        diagnostics,
        config_path,
    }
}
