//! Per-chat conversation state.
//!
//! A [`HistoryStore`] maps chat ids to [`Transcript`]s. Every transcript starts
//! with the system preamble and grows by one user and one assistant message
//! per turn. Storage is injectable through [`TranscriptStore`]; the default is
//! an in-memory map that lives as long as the process.

pub mod error;
pub mod message;
pub mod store;
pub mod transcript;

pub use {
    error::{Error, Result},
    message::{ContentBlock, ImageUrl, Message, MessageContent, Role},
    store::{ChatTurnGuard, HistoryStore, InMemoryTranscriptStore, TranscriptStore},
    transcript::Transcript,
};
