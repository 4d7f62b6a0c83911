//! Telegram transport: long polling, update conversion, outbound sends and
//! file downloads through the Bot API.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod queue;

pub use {
    bot::{TelegramBot, connect, start_polling},
    error::{Error, Result},
    handlers::{TelegramFile, event_from_message},
    outbound::TelegramOutbound,
    queue::{ChatQueues, EventDispatcher},
};
