//! Message orchestration: turns inbound chat events into transcript updates,
//! completion requests, formatted replies and audit records.

pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod normalize;
pub mod router;
pub mod settings;

pub use {
    engine::{ChatEngine, EngineServices},
    error::{Error, Result},
    event::{Command, EventKind, EventPayload, FileSource, InboundEvent},
    format::{ReplyPlan, chunk_text, plan_reply, to_display},
    normalize::{find_urls, normalize_document, normalize_photo, normalize_text, strip_urls},
    router::{EventHandler, Router},
    settings::EngineSettings,
};
