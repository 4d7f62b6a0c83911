//! Role-tagged conversation messages.
//!
//! The serde shape is the chat-completions wire format, so a transcript can be
//! sent to the backend as-is: `{"role": "user", "content": ...}` where
//! `content` is either a string or an array of typed parts.

use serde::{Deserialize, Serialize};

/// One entry of a chat transcript.
///
/// System and assistant content is always plain text; only user messages can
/// carry structured parts such as image references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: MessageContent },
    Assistant { content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// User message content: plain text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Multimodal(Vec<ContentBlock>),
}

/// A single part of multimodal content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            content: text.into(),
        }
    }

    /// User message with plain text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message with structured content.
    pub fn user_multimodal(blocks: Vec<ContentBlock>) -> Self {
        Self::User {
            content: MessageContent::Multimodal(blocks),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: text.into(),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
        }
    }

    /// Plain-text content, or `None` for structured user content.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::Assistant { content } => Some(content),
            Self::User {
                content: MessageContent::Text(text),
            } => Some(text),
            Self::User {
                content: MessageContent::Multimodal(_),
            } => None,
        }
    }
}
