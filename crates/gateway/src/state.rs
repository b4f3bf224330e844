use std::sync::Arc;

use {
    receptionist_auto_reply::{ChatSettings, ConversationOrchestrator},
    receptionist_channels::ChannelOutbound,
    receptionist_config::ReceptionistConfig,
    receptionist_directory::{DirectoryService, HttpDirectoryClient},
    receptionist_providers::{GeminiProvider, LanguageModel},
    receptionist_whatsapp::TwilioOutbound,
};

/// Shared state behind every webhook request.
pub struct GatewayState {
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub outbound: Arc<dyn ChannelOutbound>,
}

impl GatewayState {
    pub fn new(
        orchestrator: Arc<ConversationOrchestrator>,
        outbound: Arc<dyn ChannelOutbound>,
    ) -> Arc<Self> {
        Arc::new(Self {
            orchestrator,
            outbound,
        })
    }

    /// Wire the production collaborators described by `config`.
    pub fn from_config(config: &ReceptionistConfig) -> anyhow::Result<Arc<Self>> {
        let orchestrator = build_orchestrator(config)?;
        let outbound: Arc<dyn ChannelOutbound> =
            Arc::new(TwilioOutbound::from_config(&config.whatsapp)?);
        Ok(Self::new(Arc::new(orchestrator), outbound))
    }
}

/// Orchestrator backed by the HTTP directory client and Gemini.
pub fn build_orchestrator(config: &ReceptionistConfig) -> anyhow::Result<ConversationOrchestrator> {
    let directory: Arc<dyn DirectoryService> =
        Arc::new(HttpDirectoryClient::new(&config.directory)?);
    let model: Arc<dyn LanguageModel> = Arc::new(GeminiProvider::from_config(&config.llm)?);
    Ok(ConversationOrchestrator::new(
        directory,
        model,
        ChatSettings::from_config(config),
    ))
}
