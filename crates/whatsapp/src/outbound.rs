use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use {
    receptionist_channels::{
        ChannelOutbound, Error, Result, WHATSAPP_MAX_MESSAGE_CHARS, chunk_message,
    },
    receptionist_common::SenderKey,
    receptionist_config::WhatsAppConfig,
};

const WHATSAPP_ADDRESS_PREFIX: &str = "whatsapp:";

/// Outbound sender for a Twilio WhatsApp number.
pub struct TwilioOutbound {
    client: reqwest::Client,
    api_base_url: String,
    account_sid: String,
    auth_token: Secret<String>,
    from: String,
}

impl TwilioOutbound {
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::external("building Twilio HTTP client", e))?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.trim().to_string(),
            auth_token: config.auth_token.clone(),
            from: whatsapp_address(&config.from_number),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        )
    }

    async fn post_message(&self, to: &str, body: &str) -> Result<()> {
        let form = [("To", to), ("From", self.from.as_str()), ("Body", body)];
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::external("posting WhatsApp message", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Twilio send failed");
            return Err(Error::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Ensure a phone number carries the `whatsapp:` prefix.
fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with(WHATSAPP_ADDRESS_PREFIX) {
        number.to_string()
    } else {
        format!("{WHATSAPP_ADDRESS_PREFIX}{number}")
    }
}

#[async_trait]
impl ChannelOutbound for TwilioOutbound {
    fn id(&self) -> &str {
        "whatsapp"
    }

    async fn send_text(&self, to: &SenderKey, text: &str) -> Result<()> {
        if self.account_sid.is_empty() || self.auth_token.expose_secret().is_empty() {
            return Err(Error::unavailable("Twilio credentials are not configured"));
        }
        if to.is_empty() {
            return Err(Error::invalid_input("empty recipient"));
        }
        if text.trim().is_empty() {
            return Err(Error::invalid_input("empty message text"));
        }

        let to = to.to_channel_address();
        let chunks = chunk_message(text, WHATSAPP_MAX_MESSAGE_CHARS);
        debug!(to = %to, chunks = chunks.len(), "sending WhatsApp reply");
        for chunk in chunks {
            self.post_message(&to, chunk).await?;
        }
        Ok(())
    }
}
