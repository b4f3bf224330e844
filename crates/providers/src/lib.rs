//! Language model providers.

pub mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiProvider;

/// Single-turn text generation.
///
/// Output is untrusted free text; callers must not assume it follows any
/// instruction given in the prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name, e.g. "gemini".
    fn name(&self) -> &str;

    /// Model identifier, e.g. "gemini-1.5-flash".
    fn id(&self) -> &str;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
