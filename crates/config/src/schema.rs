/// Config schema types (telegram, provider, models, chat, upload, audit, media).
use std::{collections::BTreeMap, path::PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub telegram: TelegramSection,
    pub provider: ProviderConfig,
    /// Short model alias → backend model identifier.
    pub models: BTreeMap<String, String>,
    pub chat: ChatConfig,
    pub upload: UploadConfig,
    pub audit: AuditConfig,
    pub media: MediaConfig,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramSection::default(),
            provider: ProviderConfig::default(),
            models: default_models(),
            chat: ChatConfig::default(),
            upload: UploadConfig::default(),
            audit: AuditConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

fn default_models() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("ds".to_string(), "deepseek/deepseek-chat:free".to_string()),
        ("gpt4".to_string(), "openai/gpt-4o-2024-11-20".to_string()),
    ])
}

/// Mention activation mode for group chats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MentionMode {
    /// Bot must be @mentioned to respond.
    #[default]
    Mention,
    /// Bot responds to all messages.
    Always,
    /// Bot does not respond in groups.
    None,
}

/// Telegram bot account settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
    /// Bot username without the leading `@`. Resolved via `getMe` when unset.
    pub bot_username: Option<String>,
    /// Long-polling timeout passed to `getUpdates`.
    pub poll_timeout_secs: u32,
    /// Mention activation mode for groups.
    pub mention_mode: MentionMode,
}

impl std::fmt::Debug for TelegramSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSection")
            .field("token", &"[REDACTED]")
            .field("bot_username", &self.bot_username)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("mention_mode", &self.mention_mode)
            .finish()
    }
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            bot_username: None,
            poll_timeout_secs: 30,
            mention_mode: MentionMode::default(),
        }
    }
}

/// OpenAI-compatible completion backend.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API base URL, without the trailing `/chat/completions`.
    pub base_url: String,
    #[serde(serialize_with = "serialize_secret")]
    pub api_key: Secret<String>,
    /// Alias (key of `[models]`) used for every turn.
    pub default_model: String,
    /// Whole-request timeout for a completion call.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".into(),
            api_key: Secret::new(String::new()),
            default_model: "gpt4".into(),
            timeout_secs: 120,
        }
    }
}

/// Conversation and reply-shaping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Persona/instruction preamble seeded as the first message of every transcript.
    pub system_prompt: String,
    /// Character budget for text extracted from each fetched web page.
    pub web_max_chars: usize,
    /// Transport's single-message size limit.
    pub max_message_len: usize,
    /// Slice size used when a reply exceeds `max_message_len`.
    pub chunk_size: usize,
    /// Pause between consecutive chunks of one reply.
    pub chunk_delay_ms: u64,
    /// Sent before each completion request. Empty disables it.
    pub thinking_notice: String,
    /// Keep only the system message plus this many newest messages.
    /// Unset keeps the full history.
    pub max_history_messages: Option<usize>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".into(),
            web_max_chars: 3000,
            max_message_len: 4096,
            chunk_size: 4000,
            chunk_delay_ms: 500,
            thinking_notice: "I am thinking...".into(),
            max_history_messages: None,
        }
    }
}

/// File-hosting upload used to turn local images into public URLs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    #[serde(serialize_with = "serialize_secret")]
    pub api_key: Secret<String>,
    /// Store endpoint; the API key is appended as the `key` query parameter.
    pub endpoint: String,
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::new(String::new()),
            endpoint: "https://www.filestackapi.com/api/store/S3".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Append-only CSV file receiving one record per inbound event.
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chat_logs.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Where photos and documents are downloaded before extraction.
    pub downloads_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
