//! Batch driver: run topic extraction over every page of a document.
//!
//! Pages are processed one at a time, in order, and the output vector is
//! positionally aligned with the input pages. The whole result is written in
//! one go after the last page; a fatal page error under the default policy
//! aborts before anything is written.
//!
//! ## Failure policy
//!
//! * **Abort** (default) — the first failing page ends the batch with
//!   [`TopicsError::ChunkFailed`]. Callers get all pages or nothing.
//! * **Isolate** ([`crate::config::TopicConfig::isolate_failures`]) — a
//!   failing page yields a placeholder record carrying the error message and
//!   the batch continues.

use crate::config::TopicConfig;
use crate::error::TopicsError;
use crate::output::{ExtractedDocument, Page, TopicRecord};
use crate::pipeline::llm::TopicModel;
use crate::pipeline::normalize::word_count;
use crate::pipeline::{input, persist};
use crate::topics::TopicExtractor;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Extract one topic record per page, in page order.
pub async fn run_batch(
    document: &ExtractedDocument,
    model: Arc<dyn TopicModel>,
    config: &TopicConfig,
) -> Result<Vec<TopicRecord>, TopicsError> {
    let start = Instant::now();
    let total = document.pages.len();
    let extractor = TopicExtractor::new(model, config);
    info!("Extracting topics from {} pages", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut records = Vec::with_capacity(total);
    for page in &document.pages {
        info!("Processing page {}", page.page_number);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page.page_number, total);
        }

        match extractor.extract(&page.text, Some(page_metadata(page))).await {
            Ok(record) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page.page_number, total, record.preservation_ratio);
                }
                records.push(record);
            }
            Err(e) => {
                let msg = e.to_string();
                error!("Page {}: {}", page.page_number, msg);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page.page_number, total, &msg);
                }
                if !config.isolate_failures {
                    return Err(TopicsError::ChunkFailed {
                        page: page.page_number,
                        source: Box::new(e),
                    });
                }
                records.push(TopicRecord::failed(
                    word_count(&page.text),
                    page_metadata(page),
                    msg,
                ));
            }
        }
    }

    let succeeded = records.iter().filter(|r| !r.is_failed()).count();
    info!(
        "Topic extraction complete: {}/{} pages in {}ms",
        succeeded,
        total,
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    Ok(records)
}

/// Read a page document, run the batch, and write the records as one JSON
/// array.
pub async fn run_batch_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    model: Arc<dyn TopicModel>,
    config: &TopicConfig,
) -> Result<Vec<TopicRecord>, TopicsError> {
    let document = input::read_document(input_path).await?;
    let records = run_batch(&document, model, config).await?;
    persist::write_json_atomic(output_path, &records).await?;
    Ok(records)
}

/// Per-page metadata passed through to the record.
fn page_metadata(page: &Page) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("page_number".into(), json!(page.page_number));
    m.insert("raw_char_count".into(), json!(page.char_count));
    m.insert("raw_word_count".into(), json!(page.word_count));
    m.insert("raw_sentence_count".into(), json!(page.sentence_count));
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_metadata_carries_raw_counts() {
        let page = Page {
            page_number: 7,
            text: "a b c.".into(),
            char_count: 6,
            word_count: 3,
            sentence_count: 2,
        };
        let m = page_metadata(&page);
        assert_eq!(
            Value::Object(m),
            json!({
                "page_number": 7,
                "raw_char_count": 6,
                "raw_word_count": 3,
                "raw_sentence_count": 2
            })
        );
    }
}
