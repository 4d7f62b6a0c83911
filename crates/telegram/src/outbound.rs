use {
    async_trait::async_trait,
    std::{future::Future, time::Duration},
    teloxide::{
        ApiError, RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatId, ParseMode},
    },
    tracing::{debug, warn},
};

use parley_channels::{ChannelOutbound, Error as ChannelError, Result, TextFormat};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Outbound message sender for Telegram.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_markdown_with_fallback(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let bot = &self.bot;
        match run_telegram_request_with_retry(chat_id, "send message (markdown)", || {
            let req = bot
                .send_message(chat_id, text)
                .parse_mode(ParseMode::Markdown);
            async move { req.await }
        })
        .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_markup_rejection(&e) => {
                warn!(
                    chat_id = chat_id.0,
                    error = %e,
                    "telegram rejected Markdown, retrying as plain text"
                );
                self.send_plain(chat_id, text).await
            },
            // may already have been delivered; a resend could duplicate it
            Err(e) => Err(ChannelError::external("telegram send failed", e)),
        }
    }

    async fn send_plain(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let bot = &self.bot;
        run_telegram_request_with_retry(chat_id, "send message (plain)", || {
            let req = bot.send_message(chat_id, text);
            async move { req.await }
        })
        .await
        .map_err(|e| ChannelError::external("telegram send failed", e))?;
        Ok(())
    }
}

async fn run_telegram_request_with_retry<T, F, Fut>(
    chat_id: ChatId,
    operation: &'static str,
    mut request: F,
) -> std::result::Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestError>>,
{
    let mut retries = 0usize;

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = retry_after_duration(&err) else {
                    return Err(err);
                };

                if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                    warn!(
                        chat_id = chat_id.0,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limit persisted after retries"
                    );
                    return Err(err);
                }

                retries += 1;
                warn!(
                    chat_id = chat_id.0,
                    operation,
                    retries,
                    max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                    retry_after_secs = wait.as_secs(),
                    "telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
            },
        }
    }
}

/// The Bot API could not parse the message entities.
fn is_markup_rejection(error: &RequestError) -> bool {
    match error {
        RequestError::Api(ApiError::CantParseEntities(_)) => true,
        RequestError::Api(ApiError::Unknown(description)) => description
            .to_ascii_lowercase()
            .contains("can't parse entities"),
        _ => false,
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[async_trait]
impl ChannelOutbound for TelegramOutbound {
    async fn send_text(&self, chat_id: i64, text: &str, format: TextFormat) -> Result<()> {
        debug!(chat_id, len = text.len(), ?format, "sending telegram message");
        let chat_id = ChatId(chat_id);
        match format {
            TextFormat::Markdown => self.send_markdown_with_fallback(chat_id, text).await,
            TextFormat::Plain => self.send_plain(chat_id, text).await,
        }
    }
}
