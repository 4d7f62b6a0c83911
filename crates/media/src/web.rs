//! Web page → plain text.
//!
//! The only extractor that never fails: network errors and non-2xx
//! responses are logged and yield an empty string.

use std::time::Duration;

use {async_trait::async_trait, tracing::{debug, warn}};

#[async_trait]
pub trait WebPageFetcher: Send + Sync {
    /// Visible text of the page at `url`, truncated to the fetcher's budget.
    /// Empty on any failure.
    async fn page_text(&self, url: &str) -> String;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_chars: usize,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(client: reqwest::Client, max_chars: usize) -> Self {
        Self {
            client,
            max_chars,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_body(&self, url: &str) -> reqwest::Result<String> {
        self.client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl WebPageFetcher for HttpPageFetcher {
    async fn page_text(&self, url: &str) -> String {
        match self.fetch_body(url).await {
            Ok(body) => {
                let text = truncate_chars(html_to_text(&body).trim(), self.max_chars);
                debug!(url, chars = text.chars().count(), "fetched page text");
                text
            },
            Err(e) => {
                warn!(url, error = %e, "web fetch failed, continuing with empty text");
                String::new()
            },
        }
    }
}

/// First `max` characters of `s`.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

const BLOCK_TAGS: &[&str] = &[
    "br", "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "title", "section",
    "article", "header", "footer",
];

/// Strip markup from an HTML document.
///
/// Drops `<script>`/`<style>` bodies and comments, turns block-level tags into
/// line breaks, decodes common entities and collapses runs of whitespace.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;
    let mut pending_space = false;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push_text(&mut out, rest, &mut pending_space);
            break;
        };
        push_text(&mut out, &rest[..lt], &mut pending_space);
        rest = &rest[lt..];

        if rest.starts_with("<!--") {
            rest = rest.find("-->").map_or("", |end| &rest[end + 3..]);
            continue;
        }

        let Some(gt) = rest.find('>') else {
            break;
        };
        let tag = &rest[1..gt];
        rest = &rest[gt + 1..];

        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if (name == "script" || name == "style") && !tag.starts_with('/') {
            let close = format!("</{name}");
            rest = find_ignore_ascii_case(rest, &close)
                .and_then(|at| rest[at..].find('>').map(|gt| &rest[at + gt + 1..]))
                .unwrap_or("");
            continue;
        }

        if BLOCK_TAGS.contains(&name.as_str()) {
            while out.ends_with(' ') {
                out.pop();
            }
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            pending_space = false;
        }
    }

    out.trim().to_string()
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

fn push_text(out: &mut String, raw: &str, pending_space: &mut bool) {
    for ch in decode_entities(raw).chars() {
        if ch.is_whitespace() {
            *pending_space = true;
            continue;
        }
        if *pending_space && !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }
        *pending_space = false;
        out.push(ch);
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|semi| *semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" | "#160" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            },
            None => {
                out.push('&');
                rest = &rest[1..];
            },
        }
    }
    out.push_str(rest);
    out
}
