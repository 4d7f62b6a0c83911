//! Transport-facing seams shared by the chat engine and the transports:
//! event context, outbound sending, the group mention gate and the audit log.

pub mod audit;
pub mod context;
pub mod error;
pub mod gating;
pub mod outbound;

pub use {
    audit::{AuditLog, AuditRecord, CsvAuditLog, QueryClass},
    context::EventContext,
    error::{Error, Result},
    gating::MentionGate,
    outbound::{ChannelOutbound, TextFormat},
};
