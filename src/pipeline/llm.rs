//! Model capability boundary: free-text and structured generation.
//!
//! The topic extractor only needs two operations from a language model, so
//! it talks to the [`TopicModel`] trait rather than to a provider directly.
//! [`LlmTopicModel`] implements it on top of any `edgequake-llm`
//! [`LLMProvider`]; tests substitute a scripted model.
//!
//! Structured generation answers with an explicit
//! [`StructuredReply::Unsupported`] when the provider cannot do function
//! calling or did not return the requested call, so the caller branches on a
//! value rather than on a failure.

use crate::config::TopicConfig;
use crate::error::{ModelError, TopicsError};
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, LLMProvider, ProviderFactory, ToolChoice, ToolDefinition,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// A named function schema for structured generation.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    /// JSON schema of the function arguments.
    pub parameters: Value,
}

impl FunctionSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Outcome of a structured generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredReply {
    /// The model invoked the function; these are its arguments.
    Structured(Value),
    /// The model cannot, or did not, answer in structured form.
    Unsupported,
}

/// The generation capability the topic extractor depends on.
#[async_trait]
pub trait TopicModel: Send + Sync {
    /// Free-text generation.
    async fn generate(&self, system: &str, user: &str) -> Result<String, ModelError>;

    /// Structured generation bound to `schema`.
    async fn generate_structured(
        &self,
        system: &str,
        user: &str,
        schema: &FunctionSchema,
    ) -> Result<StructuredReply, ModelError>;
}

/// [`TopicModel`] backed by an `edgequake-llm` provider.
pub struct LlmTopicModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmTopicModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &TopicConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Resolve the provider from `config` and wrap it.
    pub fn from_config(config: &TopicConfig) -> Result<Self, TopicsError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }
}

#[async_trait]
impl TopicModel for LlmTopicModel {
    async fn generate(&self, system: &str, user: &str) -> Result<String, ModelError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| ModelError::Invocation(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }

    async fn generate_structured(
        &self,
        system: &str,
        user: &str,
        schema: &FunctionSchema,
    ) -> Result<StructuredReply, ModelError> {
        if !self.provider.supports_function_calling() {
            debug!("Provider '{}' has no function calling", self.provider.name());
            return Ok(StructuredReply::Unsupported);
        }

        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let tools = vec![ToolDefinition::function(
            schema.name.as_str(),
            schema.description.as_str(),
            schema.parameters.clone(),
        )];

        let response = self
            .provider
            .chat_with_tools(
                &messages,
                &tools,
                Some(ToolChoice::function(schema.name.as_str())),
                Some(&self.options),
            )
            .await
            .map_err(|e| ModelError::Invocation(e.to_string()))?;

        let Some(call) = response
            .tool_calls
            .iter()
            .find(|c| c.function.name == schema.name)
        else {
            debug!("No '{}' call in response", schema.name);
            return Ok(StructuredReply::Unsupported);
        };

        match serde_json::from_str::<Value>(&call.function.arguments) {
            Ok(args) => Ok(StructuredReply::Structured(args)),
            Err(e) => {
                warn!("'{}' arguments are not JSON: {}", schema.name, e);
                Ok(StructuredReply::Unsupported)
            }
        }
    }
}

/// Build `CompletionOptions` from the topic config.
fn build_options(config: &TopicConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, TopicsError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        TopicsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`)
/// 2. **Named provider + model** (`config.provider_name`)
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
/// 4. **OpenAI key present** (`OPENAI_API_KEY`)
/// 5. **Full auto-detection** (`ProviderFactory::from_env`)
///
/// Runs once when the model is constructed; nothing is re-read per call.
pub fn resolve_provider(config: &TopicConfig) -> Result<Arc<dyn LLMProvider>, TopicsError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TopicsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = TopicConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(4000));
    }

    #[test]
    fn function_schema_new() {
        let s = FunctionSchema::new("TopicContent", "desc", crate::prompts::topic_schema());
        assert_eq!(s.name, "TopicContent");
        assert_eq!(s.parameters["type"], "object");
    }
}
