//! Extraction phase: PDF → cleaned pages + normalised metadata.
//!
//! Drives a [`PdfBackend`] over the whole document, runs each page through
//! [`clean_text`], computes per-page counts, and attaches document-level
//! aggregates and file information to the normalised metadata. The result is
//! the intermediate document consumed by [`crate::batch`].

use crate::error::TopicsError;
use crate::output::{DocumentMetadata, ExtractedDocument, Page};
use crate::pipeline::metadata::normalize_metadata;
use crate::pipeline::normalize::{char_count, clean_text, sentence_count, word_count};
use crate::pipeline::pdf::{PdfBackend, RawDocument};
use crate::pipeline::{input, persist};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Extract cleaned pages and metadata from the PDF at `path`.
///
/// # Errors
/// [`TopicsError::FileNotFound`] when the path does not name an existing
/// file; backend errors are propagated unchanged.
pub async fn extract_document(
    path: impl AsRef<Path>,
    backend: Arc<dyn PdfBackend>,
) -> Result<ExtractedDocument, TopicsError> {
    let start = Instant::now();
    let pdf_path = input::resolve_pdf(path)?;
    info!("Extracting text from {}", pdf_path.display());

    let file_size = tokio::fs::metadata(&pdf_path)
        .await
        .map_err(|_| TopicsError::FileNotFound {
            path: pdf_path.clone(),
        })?
        .len();

    let load_path = pdf_path.clone();
    let raw = tokio::task::spawn_blocking(move || backend.load(&load_path))
        .await
        .map_err(|e| TopicsError::Internal(format!("Extraction task panicked: {}", e)))??;

    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let doc = assemble(raw, file_name, file_size);
    info!(
        "Extracted {} pages in {}ms",
        doc.pages.len(),
        start.elapsed().as_millis()
    );
    Ok(doc)
}

/// Extract a PDF and write the intermediate JSON document to `output_path`.
pub async fn extract_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    backend: Arc<dyn PdfBackend>,
) -> Result<ExtractedDocument, TopicsError> {
    let doc = extract_document(path, backend).await?;
    persist::write_json_atomic(output_path, &doc).await?;
    Ok(doc)
}

/// Build pages and metadata from raw backend output.
fn assemble(raw: RawDocument, file_name: String, file_size: u64) -> ExtractedDocument {
    let pages: Vec<Page> = raw
        .pages
        .iter()
        .enumerate()
        .map(|(idx, raw_text)| {
            let text = clean_text(raw_text);
            Page {
                page_number: idx as u32 + 1,
                char_count: char_count(&text),
                word_count: word_count(&text),
                sentence_count: sentence_count(&text),
                text,
            }
        })
        .collect();

    let mut metadata = normalize_metadata(raw.properties);
    attach_statistics(&mut metadata, &pages);
    metadata.insert("file_name".into(), Value::String(file_name));
    metadata.insert("file_size_bytes".into(), json!(file_size));

    ExtractedDocument { pages, metadata }
}

/// Attach page count, totals, and (for non-empty documents) per-page averages.
fn attach_statistics(metadata: &mut DocumentMetadata, pages: &[Page]) {
    let num_pages = pages.len();
    let total_chars: usize = pages.iter().map(|p| p.char_count).sum();
    let total_words: usize = pages.iter().map(|p| p.word_count).sum();
    let total_sentences: usize = pages.iter().map(|p| p.sentence_count).sum();

    metadata.insert("num_pages".into(), json!(num_pages));
    metadata.insert("total_char_count".into(), json!(total_chars));
    metadata.insert("total_word_count".into(), json!(total_words));
    metadata.insert("total_sentence_count".into(), json!(total_sentences));

    if num_pages > 0 {
        let avg = |total: usize| round2(total as f64 / num_pages as f64);
        metadata.insert("avg_chars_per_page".into(), json!(avg(total_chars)));
        metadata.insert("avg_words_per_page".into(), json!(avg(total_words)));
        metadata.insert("avg_sentences_per_page".into(), json!(avg(total_sentences)));
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
