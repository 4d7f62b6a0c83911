//! Inbound event → one user-role message.

use std::sync::LazyLock;

use {
    parley_channels::{MentionGate, QueryClass},
    parley_media::WebPageFetcher,
    parley_sessions::{ContentBlock, Message},
    regex::Regex,
    tracing::debug,
};

use crate::settings::{DEFAULT_IMAGE_PROMPT, document_prompt};

#[allow(clippy::expect_used)]
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(?:www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b(?:[-a-zA-Z0-9()@:%_\+.~#?&/=]*)",
    )
    .expect("invalid regex")
});

/// URLs in order of appearance.
#[must_use]
pub fn find_urls(text: &str) -> Vec<&str> {
    URL_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Text with every URL removed, trimmed. Spaces or tabs on both sides of a
/// removed URL collapse to the one before it.
#[must_use]
pub fn strip_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        let mut next = m.end();
        if out.ends_with([' ', '\t']) {
            next += text[next..].len() - text[next..].trim_start_matches([' ', '\t']).len();
        }
        last = next;
    }
    out.push_str(&text[last..]);
    out.trim().to_string()
}

/// Normalize a plain text message.
///
/// With URLs: the free text (URLs removed) followed by each page's extracted
/// text, each page terminated by a newline, in URL order. Classified
/// [`QueryClass::Mixed`]. Without URLs: the text with the bot mention
/// stripped, classified [`QueryClass::Query`].
pub async fn normalize_text(
    text: &str,
    gate: &MentionGate,
    fetcher: &dyn WebPageFetcher,
) -> (Message, QueryClass) {
    let urls = find_urls(text);
    if urls.is_empty() {
        return (Message::user(gate.strip_mention(text)), QueryClass::Query);
    }

    debug!(url_count = urls.len(), "extracting linked pages");
    let mut pages = String::new();
    for url in &urls {
        pages.push_str(&fetcher.page_text(url).await);
        pages.push('\n');
    }

    let remaining = strip_urls(text);
    let content = if remaining.is_empty() {
        pages
    } else {
        format!("{remaining}\n{pages}")
    };
    (Message::user(content), QueryClass::Mixed)
}

/// Caption (or the default prompt) followed by the hosted image reference.
#[must_use]
pub fn normalize_photo(caption: Option<&str>, image_url: &str) -> Message {
    let prompt = caption
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_IMAGE_PROMPT);
    Message::user_multimodal(vec![
        ContentBlock::text(prompt),
        ContentBlock::image_url(image_url),
    ])
}

/// Caption (or the default summarize line) followed by the extracted text.
#[must_use]
pub fn normalize_document(caption: Option<&str>, file_name: &str, extracted: &str) -> String {
    match caption.map(str::trim).filter(|c| !c.is_empty()) {
        Some(caption) => format!("{caption}\n{extracted}"),
        None => format!("{}{extracted}", document_prompt(file_name)),
    }
}
