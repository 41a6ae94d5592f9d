//! Topic extraction: one chunk → one validated [`TopicRecord`].
//!
//! ## Protocol
//!
//! ```text
//! chunk
//!  │
//!  ├─ 1. Structured  generate_structured(TopicContent{topic, content})
//!  │                 ├─ Structured(valid)  ──────────────┐
//!  │                 └─ Unsupported / error / invalid    │
//!  ├─ 2. Fallback    free text + JSON format instructions│
//!  │                 └─ parse ─ fail ─▶ repair ─▶ parse  │
//!  │                                     (fatal on fail) │
//!  ├─ 3. Gate        words < min_preservation × input ? ◀┘
//!  │                 └─ no ─▶ done
//!  └─ 4. Retry       one content-only re-request, result is final
//! ```
//!
//! An empty chunk has zero input words: its ratio is `0.0` and the gate never
//! fires, whatever the model returns.

use crate::config::TopicConfig;
use crate::error::{ModelError, TopicsError};
use crate::output::TopicRecord;
use crate::pipeline::llm::{FunctionSchema, StructuredReply, TopicModel};
use crate::pipeline::normalize::word_count;
use crate::prompts::{self, WordBand, CONTENT_FUNCTION_NAME, TOPIC_FUNCTION_NAME};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The `{topic, content}` pair requested from the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TopicContent {
    topic: String,
    content: String,
}

/// Reply shape of the escalated retry.
#[derive(Debug, Deserialize)]
struct ExtendedContent {
    content: String,
}

/// Extracts topic records from chunks using a [`TopicModel`].
pub struct TopicExtractor<'c> {
    model: Arc<dyn TopicModel>,
    config: &'c TopicConfig,
}

impl<'c> TopicExtractor<'c> {
    pub fn new(model: Arc<dyn TopicModel>, config: &'c TopicConfig) -> Self {
        Self { model, config }
    }

    /// Extract a topic record from `chunk`.
    ///
    /// `metadata` is attached to the record unchanged (empty when `None`).
    ///
    /// # Errors
    /// - [`TopicsError::ModelInvocation`] when the fallback, repair, or retry
    ///   call fails
    /// - [`TopicsError::SchemaParseFailure`] when the fallback reply cannot be
    ///   parsed even after repair
    pub async fn extract(
        &self,
        chunk: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<TopicRecord, TopicsError> {
        let input_words = word_count(chunk);
        let band = WordBand::new(
            input_words,
            self.config.target_lower,
            self.config.target_upper,
        );

        let candidate = self.primary(chunk, band).await?;
        let record = TopicRecord::new(
            candidate.topic,
            candidate.content,
            input_words,
            metadata.unwrap_or_default(),
        );

        if !self.under_preserving(record.word_count, input_words) {
            debug!(
                "Accepted {}/{} words ({:.2})",
                record.word_count, input_words, record.preservation_ratio
            );
            return Ok(record);
        }

        warn!(
            "Content under-preserves: {}/{} words ({:.2} < {:.2}); retrying once",
            record.word_count, input_words, record.preservation_ratio, self.config.min_preservation
        );

        let extended = self
            .escalated_retry(chunk, &record.content, record.word_count, band)
            .await?;
        let retried = TopicRecord::new(record.topic, extended, input_words, record.metadata);

        if self.under_preserving(retried.word_count, input_words) {
            warn!(
                "Retry still under-preserves ({:.2}); keeping it",
                retried.preservation_ratio
            );
        } else {
            info!("Retry accepted ({:.2})", retried.preservation_ratio);
        }
        Ok(retried)
    }

    fn under_preserving(&self, words: usize, input_words: usize) -> bool {
        input_words > 0 && (words as f64) < self.config.min_preservation * input_words as f64
    }

    /// Structured request, falling back to free-text parsing.
    async fn primary(&self, chunk: &str, band: WordBand) -> Result<TopicContent, TopicsError> {
        let system = prompts::system_prompt(band);
        let user = prompts::user_prompt(chunk, band);
        let schema = FunctionSchema::new(
            TOPIC_FUNCTION_NAME,
            "Record the main topic of a text chunk and its preserved content",
            prompts::topic_schema(),
        );

        match self
            .call(self.model.generate_structured(&system, &user, &schema))
            .await
        {
            Ok(StructuredReply::Structured(value)) => {
                match serde_json::from_value::<TopicContent>(value) {
                    Ok(tc) => return Ok(tc),
                    Err(e) => warn!("Structured reply does not match schema ({e}); falling back"),
                }
            }
            Ok(StructuredReply::Unsupported) => {
                info!("Structured generation unavailable; falling back to text parsing")
            }
            Err(e) => warn!("Structured call failed ({e}); falling back to text parsing"),
        }

        self.fallback(chunk, band, &system).await
    }

    /// Free-text generation with one repair round-trip on parse failure.
    async fn fallback(
        &self,
        chunk: &str,
        band: WordBand,
        system: &str,
    ) -> Result<TopicContent, TopicsError> {
        let user = prompts::fallback_prompt(chunk, band);
        let raw = self
            .call(self.model.generate(system, &user))
            .await
            .map_err(|e| TopicsError::model("fallback generation", e))?;

        match parse_json_reply::<TopicContent>(&raw) {
            Ok(tc) => Ok(tc),
            Err(err) => {
                warn!("Fallback reply did not parse ({err}); asking the model to repair it");
                let fixed = self
                    .call(
                        self.model
                            .generate(prompts::REPAIR_SYSTEM_PROMPT, &prompts::repair_prompt(&raw, &err)),
                    )
                    .await
                    .map_err(|e| TopicsError::model("output repair", e))?;
                parse_json_reply(&fixed).map_err(|detail| TopicsError::SchemaParseFailure { detail })
            }
        }
    }

    /// Ask for extended content only. Structured when the model supports
    /// it; otherwise the trimmed free-text reply is the content.
    async fn escalated_retry(
        &self,
        chunk: &str,
        rejected: &str,
        rejected_words: usize,
        band: WordBand,
    ) -> Result<String, TopicsError> {
        let user = prompts::retry_prompt(chunk, rejected, rejected_words, band);
        let schema = FunctionSchema::new(
            CONTENT_FUNCTION_NAME,
            "Record the extended content for the text chunk",
            prompts::content_schema(),
        );

        let reply = self
            .call(
                self.model
                    .generate_structured(prompts::RETRY_SYSTEM_PROMPT, &user, &schema),
            )
            .await
            .map_err(|e| TopicsError::model("escalated retry", e))?;

        if let StructuredReply::Structured(value) = reply {
            match serde_json::from_value::<ExtendedContent>(value) {
                Ok(ext) => return Ok(ext.content),
                Err(e) => warn!("Retry reply does not match schema ({e}); requesting plain text"),
            }
        }

        let text = self
            .call(self.model.generate(prompts::RETRY_SYSTEM_PROMPT, &user))
            .await
            .map_err(|e| TopicsError::model("escalated retry", e))?;
        Ok(text.trim().to_string())
    }

    /// Bound a model call by the configured timeout.
    async fn call<T, F>(&self, fut: F) -> Result<T, ModelError>
    where
        F: Future<Output = Result<T, ModelError>>,
    {
        let secs = self.config.api_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout { secs }),
        }
    }
}

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\n(.*)\n```\s*$").unwrap());

/// Parse a JSON object out of a free-text reply.
///
/// Tolerates a fence wrapping the whole reply and prose before or after the
/// object. Fences inside string values are left alone. The error string is
/// fed back to the model on repair.
fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let trimmed = raw.trim();
    let first_err = match serde_json::from_str::<T>(trimmed) {
        Ok(v) => return Ok(v),
        Err(e) => e.to_string(),
    };

    if let Some(body) = FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        if let Ok(v) = serde_json::from_str::<T>(body.as_str().trim()) {
            return Ok(v);
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<T>(&trimmed[start..=end]).map_err(|e| e.to_string())
        }
        _ => Err(first_err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let tc: TopicContent = parse_json_reply(r#"{"topic": "Reflexes", "content": "fast"}"#).unwrap();
        assert_eq!(tc.topic, "Reflexes");
        assert_eq!(tc.content, "fast");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"topic\": \"Hormones\", \"content\": \"chemical signals\"}\n```";
        let tc: TopicContent = parse_json_reply(raw).unwrap();
        assert_eq!(tc.topic, "Hormones");
    }

    #[test]
    fn parses_json_with_surrounding_prose() {
        let raw = "Here is the extraction:\n{\"topic\": \"Plants\", \"content\": \"tropism\"}\nHope it helps.";
        let tc: TopicContent = parse_json_reply(raw).unwrap();
        assert_eq!(tc.content, "tropism");
    }

    #[test]
    fn fence_inside_content_is_not_stripped() {
        let raw = r#"{"topic": "Loops", "content": "Example: ```python\nfor i in range(3): print(i)\n``` prints three lines."}"#;
        let tc: TopicContent = parse_json_reply(raw).unwrap();
        assert_eq!(tc.topic, "Loops");
        assert!(tc.content.starts_with("Example: ```python\n"));
    }

    #[test]
    fn fenced_reply_with_inner_fence_parses() {
        let raw = "```json\n{\"topic\": \"Loops\", \"content\": \"see ```code``` here\"}\n```";
        let tc: TopicContent = parse_json_reply(raw).unwrap();
        assert_eq!(tc.content, "see ```code``` here");
    }

    #[test]
    fn rejects_missing_field() {
        let err = parse_json_reply::<TopicContent>(r#"{"topic": "only"}"#).unwrap_err();
        assert!(err.contains("content"), "got: {err}");
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_json_reply::<TopicContent>("Topic: Reflexes\nContent: fast").is_err());
    }
}
