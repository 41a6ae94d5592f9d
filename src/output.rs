//! Data types flowing between the two pipeline phases.
//!
//! Everything here is plain `serde` data: the extraction phase writes an
//! [`ExtractedDocument`] to JSON, the topic phase reads it back and writes a
//! JSON array of [`TopicRecord`]. Field names are the on-disk names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical document properties plus aggregate statistics.
///
/// An ordered JSON object rather than a struct: the key set depends on which
/// info entries the backend reports and which of them are non-empty.
/// [`crate::PdfiumBackend`] reports the eight standard info tags; other
/// backends may report more, and unknown keys are kept under a lower-cased
/// name.
pub type DocumentMetadata = Map<String, Value>;

/// One page of cleaned text with its raw counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed position in the source document.
    pub page_number: u32,
    /// Normalised page text.
    pub text: String,
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
}

/// The intermediate document written by extraction and read by the batch
/// driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub pages: Vec<Page>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// The `(topic, content)` pair extracted from one chunk, with the
/// preservation metrics used to accept or retry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub topic: String,
    pub content: String,
    /// Character length of `content`.
    pub char_count: usize,
    /// Whitespace-delimited tokens in `content`.
    pub word_count: usize,
    /// Whitespace-delimited tokens in the source chunk.
    pub original_word_count: usize,
    /// `word_count / original_word_count`, or `0.0` for an empty chunk.
    pub preservation_ratio: f64,
    /// Caller-supplied metadata, passed through unchanged.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Set only on placeholder records emitted when per-chunk failure
    /// isolation is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TopicRecord {
    /// Build a record, deriving every count from `content` and the source
    /// chunk's word count.
    pub fn new(
        topic: impl Into<String>,
        content: impl Into<String>,
        original_word_count: usize,
        metadata: Map<String, Value>,
    ) -> Self {
        let content = content.into();
        let word_count = crate::pipeline::normalize::word_count(&content);
        Self {
            topic: topic.into(),
            char_count: crate::pipeline::normalize::char_count(&content),
            word_count,
            original_word_count,
            preservation_ratio: preservation_ratio(word_count, original_word_count),
            content,
            metadata,
            error: None,
        }
    }

    /// Placeholder for a chunk whose extraction failed under isolation.
    pub fn failed(original_word_count: usize, metadata: Map<String, Value>, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new("", "", original_word_count, metadata)
        }
    }

    /// Whether this record is an isolation placeholder.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Fraction of the source's words retained; `0.0` when the source is empty.
pub fn preservation_ratio(word_count: usize, original_word_count: usize) -> f64 {
    if original_word_count == 0 {
        0.0
    } else {
        word_count as f64 / original_word_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_counts_derive_from_content() {
        let rec = TopicRecord::new("Reflexes", "a quick reflex arc", 8, Map::new());
        assert_eq!(rec.word_count, 4);
        assert_eq!(rec.char_count, 18);
        assert_eq!(rec.original_word_count, 8);
        assert!((rec.preservation_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_is_zero_for_empty_source() {
        assert_eq!(preservation_ratio(12, 0), 0.0);
        let rec = TopicRecord::new("t", "some words here", 0, Map::new());
        assert_eq!(rec.preservation_ratio, 0.0);
    }

    #[test]
    fn error_field_omitted_for_successful_records() {
        let rec = TopicRecord::new("t", "c", 1, Map::new());
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v.get("error").is_none());
        assert_eq!(v["preservation_ratio"], json!(1.0));
    }

    #[test]
    fn failed_record_is_empty_and_flagged() {
        let mut meta = Map::new();
        meta.insert("page_number".into(), json!(3));
        let rec = TopicRecord::failed(40, meta.clone(), "boom".into());
        assert!(rec.is_failed());
        assert_eq!(rec.word_count, 0);
        assert_eq!(rec.original_word_count, 40);
        assert_eq!(rec.metadata, meta);
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["error"], json!("boom"));
    }

    #[test]
    fn document_metadata_defaults_when_absent() {
        let doc: ExtractedDocument = serde_json::from_value(json!({
            "pages": [{
                "page_number": 1, "text": "x", "char_count": 1,
                "word_count": 1, "sentence_count": 1
            }]
        }))
        .unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.metadata.is_empty());
    }
}
