//! # pdf-topics
//!
//! Turn a paginated PDF into normalised `(topic, content)` records for
//! downstream indexing.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract   raw page text + document info via pdfium
//!  ├─ 2. Clean     whitespace, transliteration, noise and duplicate tokens
//!  ├─ 3. Describe  per-page counts, document aggregates, ISO-8601 dates
//!  │      └─▶ pages.json  { "pages": [...], "metadata": {...} }
//!  ├─ 4. Topics    one LLM extraction per page, structured call first
//!  ├─ 5. Validate  preservation gate, one escalated retry
//!  └─ 6. Output    topics.json  [ {topic, content, ...}, ... ]
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_topics::{extract_document, run_batch, LlmTopicModel, PdfiumBackend, TopicConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let doc = extract_document("chapter.pdf", Arc::new(PdfiumBackend::new())).await?;
//!
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / ...
//!     let config = TopicConfig::default();
//!     let model = Arc::new(LlmTopicModel::from_config(&config)?);
//!     let records = run_batch(&doc, model, &config).await?;
//!     for r in &records {
//!         println!("{}: {:.0}% preserved", r.topic, r.preservation_ratio * 100.0);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `pdf-topics` binary (clap + anyhow + tracing-subscriber) |
//! | `bundled` | off     | Embed the pdfium shared library at compile time |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod topics;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, run_batch_file};
pub use config::{TopicConfig, TopicConfigBuilder};
pub use error::{ModelError, TopicsError};
pub use extract::{extract_document, extract_to_file};
pub use output::{DocumentMetadata, ExtractedDocument, Page, TopicRecord};
pub use pipeline::llm::{FunctionSchema, LlmTopicModel, StructuredReply, TopicModel};
pub use pipeline::metadata::normalize_metadata;
pub use pipeline::normalize::clean_text;
pub use pipeline::pdf::{PdfBackend, PdfiumBackend, RawDocument};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use topics::TopicExtractor;
