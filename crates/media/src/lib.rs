//! Content extractors: web page, PDF and DOCX to text, image to hosted URL,
//! plus the local download store the transport writes into.

pub mod document;
pub mod docx;
pub mod error;
pub mod pdf;
pub mod store;
pub mod upload;
pub mod web;

pub use {
    document::{DocumentExtractors, DocumentKind, DocxExtractor, PdfExtractor, TextExtractor},
    error::{Error, Result},
    store::MediaStore,
    upload::{FileHost, FilestackUploader},
    web::{HttpPageFetcher, WebPageFetcher, html_to_text},
};
