//! Pipeline stages for PDF-to-topics conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the PDF and model backends can be swapped without touching the
//! deterministic stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pdf ──▶ normalize/metadata ──▶ persist      (extraction)
//! input ──▶ llm (via crate::topics) ──▶ persist         (topic sorting)
//! ```
//!
//! 1. [`input`]     — validate the PDF path; load the intermediate document
//! 2. [`pdf`]       — raw page text and document properties; pdfium runs on
//!    a blocking thread
//! 3. [`normalize`] — deterministic page-text cleanup and counting
//! 4. [`metadata`]  — canonical property names and ISO-8601 dates
//! 5. [`llm`]       — the model capability boundary; the only stage with
//!    network I/O
//! 6. [`persist`]   — atomic JSON output

pub mod input;
pub mod llm;
pub mod metadata;
pub mod normalize;
pub mod pdf;
pub mod persist;
