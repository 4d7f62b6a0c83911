use std::path::Path;

use {
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{ChatKind, MediaKind, MessageKind, PublicChatKind},
    },
    tokio::io::AsyncWriteExt,
    tracing::debug,
};

use {
    parley_channels::{Error as ChannelError, EventContext},
    parley_chat::{Command, EventPayload, FileSource, InboundEvent},
    parley_common::types::ChatType,
};

/// A Telegram file, fetched through `getFile` and the Bot API file endpoint.
#[derive(Clone)]
pub struct TelegramFile {
    bot: Bot,
    file_id: String,
}

impl std::fmt::Debug for TelegramFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramFile")
            .field("file_id", &self.file_id)
            .finish_non_exhaustive()
    }
}

impl TelegramFile {
    pub fn new(bot: Bot, file_id: impl Into<String>) -> Self {
        Self {
            bot,
            file_id: file_id.into(),
        }
    }
}

/// Telegram file URL format: `<api_url>/file/bot<token>/<file_path>`.
fn file_url(api_url: &reqwest::Url, token: &str, file_path: &str) -> String {
    format!(
        "{}/file/bot{token}/{file_path}",
        api_url.as_str().trim_end_matches('/')
    )
}

#[async_trait]
impl FileSource for TelegramFile {
    fn file_id(&self) -> &str {
        &self.file_id
    }

    async fn download_to(&self, dest: &Path) -> parley_channels::Result<()> {
        let file = self
            .bot
            .get_file(&self.file_id)
            .await
            .map_err(|e| ChannelError::external("telegram getFile failed", e))?;

        let url = file_url(&self.bot.api_url(), self.bot.token(), &file.path);
        let response = self
            .bot
            .client()
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ChannelError::external("telegram file download failed", e))?;
        let data = response
            .bytes()
            .await
            .map_err(|e| ChannelError::external("telegram file download failed", e))?;

        let mut out = tokio::fs::File::create(dest).await?;
        out.write_all(&data).await?;
        out.flush().await?;
        debug!(file_id = %self.file_id, bytes = data.len(), "downloaded telegram file");
        Ok(())
    }
}

/// Classify the chat type.
fn classify_chat(msg: &Message) -> ChatType {
    match &msg.chat.kind {
        ChatKind::Private(_) => ChatType::Private,
        ChatKind::Public(p) => match p.kind {
            PublicChatKind::Channel(_) => ChatType::Channel,
            PublicChatKind::Supergroup(_) => ChatType::Supergroup,
            _ => ChatType::Group,
        },
    }
}

fn event_context(msg: &Message) -> EventContext {
    let (user_id, user_name) = msg.from.as_ref().map_or((0, String::new()), |u| {
        (
            u.id.0,
            EventContext::display_name(&u.first_name, u.last_name.as_deref()),
        )
    });
    EventContext {
        chat_id: msg.chat.id.0,
        chat_type: classify_chat(msg),
        chat_title: msg.chat.title().map(String::from),
        user_id,
        user_name,
    }
}

/// Convert a Telegram message into an engine event.
///
/// Photos use the largest size. Messages starting with `/` become commands;
/// unknown commands and other media kinds are ignored.
pub fn event_from_message(msg: &Message, bot: &Bot) -> Option<InboundEvent> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };

    let payload = match &common.media_kind {
        MediaKind::Text(t) if t.text.trim_start().starts_with('/') => {
            let Some(command) = Command::parse(&t.text) else {
                debug!(chat_id = msg.chat.id.0, text = %t.text, "ignoring unknown command");
                return None;
            };
            EventPayload::Command {
                command,
                text: t.text.clone(),
            }
        },
        MediaKind::Text(t) => EventPayload::Text {
            text: t.text.clone(),
        },
        MediaKind::Photo(p) => {
            // largest size is last
            let largest = p.photo.last()?;
            EventPayload::Photo {
                file: std::sync::Arc::new(TelegramFile::new(bot.clone(), largest.file.id.clone())),
                caption: p.caption.clone(),
            }
        },
        MediaKind::Document(d) => EventPayload::Document {
            file: std::sync::Arc::new(TelegramFile::new(
                bot.clone(),
                d.document.file.id.clone(),
            )),
            file_name: d.document.file_name.clone().unwrap_or_default(),
            caption: d.caption.clone(),
        },
        _ => {
            debug!(chat_id = msg.chat.id.0, "ignoring unsupported message kind");
            return None;
        },
    };

    Some(InboundEvent {
        context: event_context(msg),
        payload,
    })
}
