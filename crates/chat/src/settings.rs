use std::time::Duration;

use parley_config::{ChatConfig, ProviderConfig};

pub const THINKING_NOTICE: &str = "I am thinking...";
pub const HISTORY_CLEARED: &str = "History cleared.";
pub const UNSUPPORTED_FORMAT: &str = "❓ Unsupported file format.";
pub const DEFAULT_IMAGE_PROMPT: &str = "Please analyze the following image.";

pub const IMAGE_REPLY_PREFIX: &str = "Image Analysis:\n";
pub const DOCUMENT_REPLY_PREFIX: &str = "Document Analysis:\n";
pub const IMAGE_HISTORY_PREFIX: &str = "Image analysis result: ";
pub const DOCUMENT_HISTORY_PREFIX: &str = "Document analysis result: ";

/// Default first line for a document sent without a caption.
#[must_use]
pub fn document_prompt(file_name: &str) -> String {
    format!("Please summarize the following document ({file_name}):\n")
}

/// Usage text for `/guideline`.
#[must_use]
pub fn guideline_text(bot_username: &str) -> String {
    let mention = if bot_username.is_empty() {
        "@chatbot_name".to_string()
    } else {
        format!("@{bot_username}")
    };
    format!(
        "How to Use the Bot:\n\n\
         1. Start the Bot: In the chat, type `{mention}`, followed by your question or request.\n\
         2. Ask Questions: You can ask any questions, such as information inquiries, advice, or guidance.\n\
         3. Upload Files: If needed, you can upload images, documents, or links (make sure to include `{mention}`). The Bot will assist based on your uploads.\n\
         4. Get Help: If you forget how to use it, type `/guideline` for usage details.\n\
         5. Start Over: Type `/start` to clear the conversation history."
    )
}

/// Per-turn knobs taken from `[provider]` and `[chat]`.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Alias resolved by the completion client on every turn.
    pub model_alias: String,
    pub max_message_len: usize,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    /// Sent before each completion request; `None` disables it.
    pub thinking_notice: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model_alias: "gpt4".into(),
            max_message_len: 4096,
            chunk_size: 4000,
            chunk_delay: Duration::from_millis(500),
            thinking_notice: Some(THINKING_NOTICE.into()),
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_config(provider: &ProviderConfig, chat: &ChatConfig) -> Self {
        Self {
            model_alias: provider.default_model.clone(),
            max_message_len: chat.max_message_len,
            chunk_size: chat.chunk_size,
            chunk_delay: Duration::from_millis(chat.chunk_delay_ms),
            thinking_notice: Some(chat.thinking_notice.clone()).filter(|n| !n.trim().is_empty()),
        }
    }
}
