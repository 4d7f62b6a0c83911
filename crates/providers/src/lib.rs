//! Completion backends and the model alias table.

pub mod aliases;
pub mod error;
pub mod openai_compat;

use std::sync::Arc;

use {
    async_trait::async_trait,
    parley_sessions::{Message, Transcript},
    tracing::debug,
};

pub use {
    aliases::ModelAliases,
    error::{Error, Result},
    openai_compat::OpenAiCompatProvider,
};

/// Shared HTTP client.
///
/// Reused by every backend and extractor that doesn't need custom
/// redirect/proxy settings so they share one connection pool.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}

/// A remote model that turns an ordered message list into one reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `model` is the backend-specific identifier, already resolved.
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String>;
}

/// Resolves aliases and forwards the full transcript to the backend.
///
/// Stateless apart from its configuration; no retries.
#[derive(Clone)]
pub struct CompletionClient {
    aliases: ModelAliases,
    provider: Arc<dyn CompletionProvider>,
}

impl CompletionClient {
    pub fn new(aliases: ModelAliases, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { aliases, provider }
    }

    pub async fn complete(&self, model_alias: &str, transcript: &Transcript) -> Result<String> {
        let model = self.aliases.resolve(model_alias)?;
        debug!(
            alias = model_alias,
            model,
            provider = self.provider.name(),
            messages_count = transcript.len(),
            "completion request"
        );
        self.provider.complete(model, transcript.messages()).await
    }
}
