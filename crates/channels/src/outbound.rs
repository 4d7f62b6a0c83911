use {async_trait::async_trait, parley_common::types::ChatId};

use crate::Result;

/// How the transport should interpret outbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Transport markup; falls back to plain text if the transport rejects it.
    Markdown,
    Plain,
}

/// Send messages to a chat.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat) -> Result<()>;
}
