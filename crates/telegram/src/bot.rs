use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use parley_config::TelegramSection;

use crate::{
    Result,
    handlers::event_from_message,
    queue::{ChatQueues, EventDispatcher},
};

/// An authenticated bot and the username the mention gate matches against.
#[derive(Clone)]
pub struct TelegramBot {
    pub bot: Bot,
    /// Without the leading `@`; empty when neither configured nor reported
    /// by `getMe`.
    pub username: String,
}

/// Verify credentials, clear any webhook and register the slash commands.
pub async fn connect(config: &TelegramSection) -> Result<TelegramBot> {
    // client timeout must outlast the long-polling timeout
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 15))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    let username = config
        .bot_username
        .as_deref()
        .map(|name| name.trim_start_matches('@'))
        .filter(|name| !name.is_empty())
        .map(String::from)
        .or_else(|| me.username.clone())
        .unwrap_or_default();
    if username.is_empty() {
        warn!("bot username unknown; group messages will never be addressed to the bot");
    }

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Clear the conversation history"),
        BotCommand::new("guideline", "Show how to use the bot"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username, "telegram bot connected (webhook cleared)");
    Ok(TelegramBot { bot, username })
}

/// Start polling for updates.
///
/// Spawns a background task that feeds every message into per-chat queues
/// until the returned `CancellationToken` is cancelled.
pub fn start_polling(
    telegram: &TelegramBot,
    dispatcher: Arc<dyn EventDispatcher>,
    poll_timeout_secs: u32,
) -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let bot = telegram.bot.clone();

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut queues = ChatQueues::new(dispatcher);
        let mut offset: i32 = 0;

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message]);

            let result = tokio::select! {
                () = cancel_clone.cancelled() => {
                    info!("telegram polling stopped");
                    break;
                },
                result = request.send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                if let Some(event) = event_from_message(&msg, &bot) {
                                    queues.push(event);
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another instance is polling with the same token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        warn!(
                            "telegram polling disabled: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = cancel_clone.cancelled() => break,
                        () = tokio::time::sleep(Duration::from_secs(5)) => {},
                    }
                },
            }
        }
    });

    cancel
}
