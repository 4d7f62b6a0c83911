use std::{path::Path, sync::Arc};

use async_trait::async_trait;

use crate::{
    docx::extract_docx_text,
    error::{Error, Result},
    pdf::extract_pdf_text,
};

/// Supported document formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// `None` for anything other than `.pdf` / `.docx` (case-insensitive).
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else if ext.eq_ignore_ascii_case("docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }

    /// Canonical lowercase extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// A file-format parser: local path in, text out.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String>;
}

pub struct PdfExtractor;

pub struct DocxExtractor;

async fn run_blocking(
    path: &Path,
    extract: fn(&Path) -> Result<String>,
) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract(&path))
        .await
        .map_err(|e| Error::external("extraction task failed", e))?
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String> {
        run_blocking(path, extract_pdf_text).await
    }
}

#[async_trait]
impl TextExtractor for DocxExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String> {
        run_blocking(path, extract_docx_text).await
    }
}

/// Routes a document to exactly one extractor by kind.
#[derive(Clone)]
pub struct DocumentExtractors {
    pdf: Arc<dyn TextExtractor>,
    docx: Arc<dyn TextExtractor>,
}

impl Default for DocumentExtractors {
    fn default() -> Self {
        Self::new(Arc::new(PdfExtractor), Arc::new(DocxExtractor))
    }
}

impl DocumentExtractors {
    pub fn new(pdf: Arc<dyn TextExtractor>, docx: Arc<dyn TextExtractor>) -> Self {
        Self { pdf, docx }
    }

    pub async fn extract(&self, kind: DocumentKind, path: &Path) -> Result<String> {
        match kind {
            DocumentKind::Pdf => self.pdf.extract_text(path).await,
            DocumentKind::Docx => self.docx.extract_text(path).await,
        }
    }
}
