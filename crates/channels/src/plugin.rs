use {async_trait::async_trait, receptionist_common::SenderKey};

use crate::error::Result;

/// Send messages to a channel.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Channel identifier (e.g. "whatsapp").
    fn id(&self) -> &str;

    /// Deliver `text` to `to`, splitting it into as many messages as the
    /// channel's length limit requires. Parts are sent in order; the first
    /// failure aborts the remainder.
    async fn send_text(&self, to: &SenderKey, text: &str) -> Result<()>;
}
