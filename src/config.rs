//! Configuration for topic extraction.
//!
//! All model and validation knobs live in [`TopicConfig`], built once at
//! process start via [`TopicConfigBuilder`] and passed by reference into the
//! extractor and batch driver. Nothing reads the environment at call time
//! except provider auto-detection, which happens once in
//! [`crate::pipeline::llm::resolve_provider`].

use crate::error::TopicsError;
use crate::progress::BatchProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for the topic-extraction phase.
///
/// # Example
/// ```rust
/// use pdf_topics::TopicConfig;
///
/// let config = TopicConfig::builder()
///     .model("gpt-4.1-mini")
///     .api_timeout_secs(90)
///     .isolate_failures(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 4000);
/// ```
#[derive(Clone)]
pub struct TopicConfig {
    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0 for reproducible extraction.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 4000.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: 60.
    ///
    /// A call that exceeds it counts as an invocation failure: it triggers
    /// the fallback on the primary attempt and is fatal elsewhere.
    pub api_timeout_secs: u64,

    /// Minimum accepted `content` words as a fraction of the chunk's words.
    /// Replies below it get one escalated retry. Default: 0.70.
    pub min_preservation: f64,

    /// Lower edge of the target band stated in prompts. Default: 0.70.
    pub target_lower: f64,

    /// Upper edge of the target band stated in prompts. Default: 0.85.
    pub target_upper: f64,

    /// Emit a placeholder record for a failing page and continue, instead of
    /// aborting the whole batch. Default: false.
    pub isolate_failures: bool,

    /// Optional per-page progress events.
    pub progress_callback: Option<Arc<dyn BatchProgressCallback>>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4000,
            api_timeout_secs: 60,
            min_preservation: 0.70,
            target_lower: 0.70,
            target_upper: 0.85,
            isolate_failures: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TopicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("min_preservation", &self.min_preservation)
            .field("target_lower", &self.target_lower)
            .field("target_upper", &self.target_upper)
            .field("isolate_failures", &self.isolate_failures)
            .finish()
    }
}

impl TopicConfig {
    /// Create a new builder for `TopicConfig`.
    pub fn builder() -> TopicConfigBuilder {
        TopicConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TopicConfig`].
pub struct TopicConfigBuilder {
    config: TopicConfig,
}

impl TopicConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn min_preservation(mut self, ratio: f64) -> Self {
        self.config.min_preservation = ratio;
        self
    }

    /// Target band stated in prompts, as fractions of the chunk's words.
    pub fn target_band(mut self, lower: f64, upper: f64) -> Self {
        self.config.target_lower = lower;
        self.config.target_upper = upper;
        self
    }

    pub fn isolate_failures(mut self, v: bool) -> Self {
        self.config.isolate_failures = v;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn BatchProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TopicConfig, TopicsError> {
        let c = &self.config;
        if !(c.min_preservation > 0.0 && c.min_preservation <= 1.0) {
            return Err(TopicsError::InvalidConfig(format!(
                "min_preservation must be in (0, 1], got {}",
                c.min_preservation
            )));
        }
        if !(c.target_lower > 0.0 && c.target_lower <= c.target_upper) {
            return Err(TopicsError::InvalidConfig(format!(
                "target band must satisfy 0 < lower ≤ upper, got {}–{}",
                c.target_lower, c.target_upper
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(TopicsError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(TopicsError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

impl fmt::Debug for TopicConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}
