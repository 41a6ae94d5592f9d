//! PDF backend: raw per-page text and document-info properties.
//!
//! The extractor treats the PDF library as a black box behind
//! [`PdfBackend`]. The production implementation drives pdfium through
//! `pdfium-render`; the library is located (and downloaded on first use) by
//! `pdfium-auto`.
//!
//! ## Why a trait?
//!
//! pdfium is a native library that is not available in every build or test
//! environment. Everything downstream of raw text (cleanup, counting,
//! aggregation) is deterministic and worth testing without it.

use crate::error::TopicsError;
use pdfium_render::prelude::*;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Raw content pulled from a PDF, before any normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocument {
    /// Raw text of each page, in document order.
    pub pages: Vec<String>,
    /// Document-info entries keyed by their raw PDF names (`/Author`, …).
    /// A `None` value means the entry is present but empty.
    pub properties: Vec<(String, Option<Value>)>,
}

/// A PDF parsing backend.
///
/// Implementations are blocking; callers run them on a blocking thread.
pub trait PdfBackend: Send + Sync {
    /// Load every page's raw text and the document properties.
    fn load(&self, path: &Path) -> Result<RawDocument, TopicsError>;
}

/// [`PdfBackend`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    password: Option<String>,
}

impl PdfiumBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// User password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Document-info tags read from pdfium, paired with their raw PDF key.
const INFO_TAGS: &[(PdfDocumentMetadataTagType, &str)] = &[
    (PdfDocumentMetadataTagType::Title, "/Title"),
    (PdfDocumentMetadataTagType::Author, "/Author"),
    (PdfDocumentMetadataTagType::Subject, "/Subject"),
    (PdfDocumentMetadataTagType::Keywords, "/Keywords"),
    (PdfDocumentMetadataTagType::Creator, "/Creator"),
    (PdfDocumentMetadataTagType::Producer, "/Producer"),
    (PdfDocumentMetadataTagType::CreationDate, "/CreationDate"),
    (PdfDocumentMetadataTagType::ModificationDate, "/ModDate"),
];

impl PdfBackend for PdfiumBackend {
    fn load(&self, path: &Path) -> Result<RawDocument, TopicsError> {
        let pdfium = pdfium_auto::bind_pdfium_silent()
            .map_err(|e| TopicsError::PdfiumBindingFailed(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_file(path, self.password.as_deref())
            .map_err(|e| TopicsError::CorruptPdf {
                path: path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        let metadata = document.metadata();
        let properties = INFO_TAGS
            .iter()
            .map(|(tag, key)| {
                let value = metadata.get(*tag).and_then(|t| {
                    let v = t.value().to_string();
                    if v.is_empty() {
                        None
                    } else {
                        Some(Value::String(v))
                    }
                });
                (key.to_string(), value)
            })
            .collect();

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| TopicsError::PageTextFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?
                .all();
            debug!("Page {}: {} raw chars", idx + 1, text.len());
            texts.push(text);
        }

        Ok(RawDocument {
            pages: texts,
            properties,
        })
    }
}
