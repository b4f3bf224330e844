//! Config schema types.

use std::collections::HashMap;

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReceptionistConfig {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub llm: LlmConfig,
    pub whatsapp: WhatsAppConfig,
    pub chat: ChatConfig,
}

/// Webhook server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0".
    pub bind: String,
    /// Port to listen on. Defaults to 5000.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

/// Scheduling backend (users, professionals, appointments, slots, info pages).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// API root, e.g. `https://example.com/secureappointment/api/v1`.
    pub base_url: String,
    /// Service account used to obtain bearer tokens.
    pub username: String,
    pub password: Secret<String>,
    /// Group every conversation is scoped to.
    pub group_id: u64,
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bi.siissoft.com/secureappointment/api/v1".into(),
            username: String::new(),
            password: Secret::new(String::new()),
            group_id: 3,
            timeout_secs: 15,
        }
    }
}

/// Language model (Gemini `generateContent`) settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::new(String::new()),
            model: "gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 30,
        }
    }
}

/// Twilio WhatsApp sender account.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    /// Sending number, with or without the `whatsapp:` prefix.
    pub from_number: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: Secret::new(String::new()),
            from_number: String::new(),
            api_base_url: "https://api.twilio.com".into(),
            timeout_secs: 15,
        }
    }
}

/// Which user id a booking is made for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingIdentity {
    /// Use the `USERID` the model wrote into the booking directive.
    #[default]
    Directive,
    /// Use the backend user id of the sender who sent the message.
    Session,
}

/// Conversation behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Replaces the built-in system instruction when set.
    pub system_instruction: Option<String>,
    /// Per-sender instruction overrides, keyed by phone number.
    pub instruction_overrides: HashMap<String, String>,
    pub booking_identity: BookingIdentity,
}
