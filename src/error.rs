//! Error types for the pdf-topics library.
//!
//! Two layers reflect two distinct failure scopes:
//!
//! * [`TopicsError`] — **Fatal** for the operation that returned it: a missing
//!   or unreadable PDF, a malformed intermediate document, a chunk whose model
//!   output could not be parsed even after a repair round-trip.
//!
//! * [`ModelError`] — a single call across the model boundary failed
//!   (transport, provider, timeout). The topic extractor decides whether that
//!   drives the fallback path or becomes a [`TopicsError::ModelInvocation`].
//!
//! An under-preserving model reply is *not* an error anywhere in this crate;
//! it is a soft condition handled by the escalated retry.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-topics library.
#[derive(Debug, Error)]
pub enum TopicsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The intermediate JSON document could not be read or does not have
    /// the expected `{ "pages": [...] }` shape.
    #[error("Invalid page document '{path}': {detail}")]
    InvalidDocument { path: PathBuf, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Text extraction failed for a specific page.
    #[error("Text extraction failed for page {page}: {detail}")]
    PageTextFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A model call failed on a path where no fallback remains.
    #[error("Model invocation failed during {stage}: {source}")]
    ModelInvocation {
        stage: &'static str,
        #[source]
        source: ModelError,
    },

    /// Model output did not match the `{topic, content}` schema even after
    /// one repair attempt.
    #[error("Model output does not match the topic schema after repair: {detail}")]
    SchemaParseFailure { detail: String },

    /// A page failed during batch topic extraction.
    #[error("Page {page} failed: {source}")]
    ChunkFailed {
        page: u32,
        #[source]
        source: Box<TopicsError>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed call across the model capability boundary.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The provider returned an error or the transport failed.
    #[error("{0}")]
    Invocation(String),

    /// The call did not complete within the configured timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl TopicsError {
    /// Wrap a model-boundary failure that occurred on a non-recoverable path.
    pub(crate) fn model(stage: &'static str, source: ModelError) -> Self {
        TopicsError::ModelInvocation { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = TopicsError::FileNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        assert!(e.to_string().contains("/tmp/missing.pdf"));
    }

    #[test]
    fn model_invocation_display_names_stage() {
        let e = TopicsError::model("escalated retry", ModelError::Timeout { secs: 30 });
        let msg = e.to_string();
        assert!(msg.contains("escalated retry"), "got: {msg}");
        assert!(msg.contains("30s"), "got: {msg}");
    }

    #[test]
    fn chunk_failed_wraps_inner_error() {
        let e = TopicsError::ChunkFailed {
            page: 4,
            source: Box::new(TopicsError::SchemaParseFailure {
                detail: "missing field `topic`".into(),
            }),
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 4"), "got: {msg}");
        assert!(msg.contains("missing field"), "got: {msg}");
    }

    #[test]
    fn schema_failure_display() {
        let e = TopicsError::SchemaParseFailure {
            detail: "expected value at line 1".into(),
        };
        assert!(e.to_string().contains("after repair"));
    }
}
