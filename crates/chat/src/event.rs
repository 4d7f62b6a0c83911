use std::{path::Path, sync::Arc};

use {async_trait::async_trait, parley_channels::EventContext};

/// A file attached to an inbound event, downloaded on demand.
///
/// Transports implement this so nothing is fetched for events the mention
/// gate suppresses.
#[async_trait]
pub trait FileSource: Send + Sync + std::fmt::Debug {
    /// Transport-assigned identifier, stable across downloads.
    fn file_id(&self) -> &str;

    async fn download_to(&self, dest: &Path) -> parley_channels::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Reset the chat's transcript.
    Start,
    /// Usage instructions.
    Guideline,
}

impl Command {
    /// Parse `/start`, `/guideline@botname args`, ...
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split_once('@').map_or(word, |(name, _)| name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "guideline" => Some(Self::Guideline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EventPayload {
    Text {
        text: String,
    },
    Photo {
        file: Arc<dyn FileSource>,
        caption: Option<String>,
    },
    Document {
        file: Arc<dyn FileSource>,
        file_name: String,
        caption: Option<String>,
    },
    Command {
        command: Command,
        /// Full command message as typed.
        text: String,
    },
}

/// Handler table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Text,
    Photo,
    Document,
    Start,
    Guideline,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Photo => "photo",
            Self::Document => "document",
            Self::Start => "command:start",
            Self::Guideline => "command:guideline",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub context: EventContext,
    pub payload: EventPayload,
}

impl InboundEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::Text { .. } => EventKind::Text,
            EventPayload::Photo { .. } => EventKind::Photo,
            EventPayload::Document { .. } => EventKind::Document,
            EventPayload::Command {
                command: Command::Start,
                ..
            } => EventKind::Start,
            EventPayload::Command {
                command: Command::Guideline,
                ..
            } => EventKind::Guideline,
        }
    }
}
