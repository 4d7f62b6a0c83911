use std::path::Path;

use tracing::debug;

use crate::error::{Context, Result};

/// Text of every page, concatenated in page order.
///
/// Blocking; callers on the runtime go through [`crate::PdfExtractor`].
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path)
        .with_context(|| format!("failed to open PDF {}", path.display()))?;

    let pages = doc.get_pages();
    let mut text = String::new();
    for page_number in pages.keys() {
        let page_text = doc
            .extract_text(&[*page_number])
            .with_context(|| format!("failed to read PDF page {page_number}"))?;
        text.push_str(&page_text);
    }

    debug!(path = %path.display(), pages = pages.len(), chars = text.len(), "extracted PDF text");
    Ok(text)
}
