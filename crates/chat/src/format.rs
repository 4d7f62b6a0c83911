//! Reply formatting and chunking for the transport's message size limit.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("invalid regex"));

/// Rewrite model output for display: `###` headings become a check mark and
/// `**bold**` spans become `[bold]`.
#[must_use]
pub fn to_display(raw: &str) -> String {
    let text = raw.replace("###", "✅");
    BOLD_RE.replace_all(&text, "[${1}]").into_owned()
}

/// Consecutive slices of at most `size` characters. Concatenating the
/// result gives back `text`; empty text yields no chunks.
///
/// `size` must be non-zero (config validation rejects `chat.chunk_size = 0`);
/// a zero size is treated as 1.
#[must_use]
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size.max(1)).map(|c| c.iter().collect()).collect()
}

/// How a display text goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPlan {
    /// One message, sent with Markdown formatting.
    Single(String),
    /// Plain-text chunks sent in order with a pause between them.
    Chunked(Vec<String>),
}

/// A single message when `text` fits in `max_len` characters, otherwise
/// `chunk_size` slices.
#[must_use]
pub fn plan_reply(text: &str, max_len: usize, chunk_size: usize) -> ReplyPlan {
    if text.chars().count() > max_len {
        ReplyPlan::Chunked(chunk_text(text, chunk_size))
    } else {
        ReplyPlan::Single(text.to_string())
    }
}
