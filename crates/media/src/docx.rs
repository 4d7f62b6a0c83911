use std::{io::Read, path::Path, sync::LazyLock};

use {regex::Regex, tracing::debug};

use crate::error::{Context, Result};

const DOCUMENT_PART: &str = "word/document.xml";

// Self-closing paragraphs come first so `<w:p/>` never opens a span.
#[allow(clippy::expect_used)]
static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>").expect("invalid regex")
});

#[allow(clippy::expect_used)]
static RUN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>")
        .expect("invalid regex")
});

/// Paragraph text in document order, each paragraph followed by `\n`.
///
/// Blocking; callers on the runtime go through [`crate::DocxExtractor`].
pub fn extract_docx_text(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a DOCX archive", path.display()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("{} has no {DOCUMENT_PART}", path.display()))?
        .read_to_string(&mut xml)
        .context("failed to read document body")?;

    let text = document_xml_to_text(&xml);
    debug!(path = %path.display(), chars = text.len(), "extracted DOCX text");
    Ok(text)
}

fn document_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    for paragraph in PARAGRAPH_RE.captures_iter(xml) {
        if let Some(body) = paragraph.get(1) {
            for run in RUN_TEXT_RE.captures_iter(body.as_str()) {
                match run.get(1) {
                    Some(text) => out.push_str(&unescape_xml(text.as_str())),
                    None if run[0].starts_with("<w:tab") => out.push('\t'),
                    None => out.push('\n'),
                }
            }
        }
        out.push('\n');
    }
    out
}

fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
