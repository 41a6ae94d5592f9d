//! Prompts for topic/content extraction.
//!
//! Every prompt the extractor sends lives here so the wording can be reviewed
//! and unit-tested without a model. All prompts state the same target band
//! (see [`crate::config::TopicConfig::target_lower`] /
//! [`crate::config::TopicConfig::target_upper`]); the acceptance threshold
//! used by the validation gate sits at or below the band's lower edge.

use serde_json::{json, Value};

/// Name of the structured function the model is asked to call.
pub const TOPIC_FUNCTION_NAME: &str = "TopicContent";

/// Name of the structured function used by the escalated retry.
pub const CONTENT_FUNCTION_NAME: &str = "ExtendedContent";

/// Word bounds for a chunk of `input_words` words under a target band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordBand {
    pub input_words: usize,
    pub lower: usize,
    pub upper: usize,
}

impl WordBand {
    pub fn new(input_words: usize, lower_ratio: f64, upper_ratio: f64) -> Self {
        Self {
            input_words,
            lower: (input_words as f64 * lower_ratio).floor() as usize,
            upper: (input_words as f64 * upper_ratio).floor() as usize,
        }
    }
}

/// JSON schema for the `{topic, content}` pair.
pub fn topic_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "topic": {
                "type": "string",
                "description": "The main topic or subject of the text chunk"
            },
            "content": {
                "type": "string",
                "description": "The detailed content of the topic, preserving the information of the original text within the requested word range"
            }
        },
        "required": ["topic", "content"]
    })
}

/// JSON schema for a content-only reply.
pub fn content_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "content": {
                "type": "string",
                "description": "The extended content, and nothing else"
            }
        },
        "required": ["content"]
    })
}

/// System prompt for the primary extraction request.
pub fn system_prompt(band: WordBand) -> String {
    format!(
        r#"You are an expert at analyzing educational text and extracting its main topic and content.

Identify the main topic and write content that keeps most of the original information.

IMPORTANT: The original text is approximately {words} words. Your content must be between {lower} and {upper} words.

Extract and preserve:
- Core concepts and key definitions
- Examples that illustrate the main points
- Relationships and connections between ideas
- Technical details and supporting evidence
- All formulas, equations, numerical data, and technical terms

Guidelines:
- Use only information from the text; do not add external knowledge
- Keep the original logical flow and structure
- Remove only redundant wording; do not drop facts
- Stay inside the requested word range"#,
        words = band.input_words,
        lower = band.lower,
        upper = band.upper,
    )
}

/// User message for the primary structured request.
pub fn user_prompt(chunk: &str, band: WordBand) -> String {
    format!(
        "Analyze the following text ({words} words) and extract its topic and content. \
The content must be between {lower} and {upper} words.\n\n{chunk}",
        words = band.input_words,
        lower = band.lower,
        upper = band.upper,
    )
}

/// User message for the free-text fallback, including JSON format
/// instructions.
pub fn fallback_prompt(chunk: &str, band: WordBand) -> String {
    format!(
        "Text to analyze ({words} words):\n{chunk}\n\n{format}\n\n\
IMPORTANT: The \"content\" value must be between {lower} and {upper} words.",
        words = band.input_words,
        format = format_instructions(),
        lower = band.lower,
        upper = band.upper,
    )
}

/// Instructions describing the expected JSON reply.
pub fn format_instructions() -> String {
    format!(
        "Respond with a single JSON object that conforms to this JSON schema, \
with no surrounding text and no markdown fences:\n{}",
        topic_schema()
    )
}

/// System prompt for the repair request.
pub const REPAIR_SYSTEM_PROMPT: &str = "You fix malformed model output. \
Return only a corrected JSON object, with no commentary and no markdown fences.";

/// User message asking the model to fix output that failed to parse.
pub fn repair_prompt(bad_output: &str, parse_error: &str) -> String {
    format!(
        "The following output does not satisfy the required format.\n\n\
{format}\n\n--------------\nOutput:\n{bad_output}\n--------------\n\
Error:\n{parse_error}\n\nReturn the corrected JSON object.",
        format = format_instructions(),
    )
}

/// System prompt for the escalated retry.
pub const RETRY_SYSTEM_PROMPT: &str = "You extend extracted content so that it preserves the \
information of the original text. You never summarize further.";

/// User message for the escalated retry after an under-preserving reply.
pub fn retry_prompt(chunk: &str, rejected: &str, rejected_words: usize, band: WordBand) -> String {
    let pct = if band.input_words == 0 {
        0
    } else {
        rejected_words * 100 / band.input_words
    };
    format!(
        r#"You MUST extract more comprehensive content from the text. The original text is {words} words, but the previous extraction was only {rejected_words} words ({pct}% of original).

Re-analyze the text and EXTEND the previous extraction to between {lower} and {upper} words.

Original text:
{chunk}

Previous extraction (TOO SHORT):
{rejected}

Guidelines:
- Include MORE details from the original text
- Keep MORE of the examples and explanations
- Preserve MORE of the technical information and terminology
- DO NOT SUMMARIZE: extend the previous extraction instead
- Return ONLY the extended content, with no preamble or commentary"#,
        words = band.input_words,
        lower = band.lower,
        upper = band.upper,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_floors_bounds() {
        let band = WordBand::new(101, 0.70, 0.85);
        assert_eq!(band.lower, 70);
        assert_eq!(band.upper, 85);
        assert_eq!(WordBand::new(0, 0.7, 0.85).upper, 0);
    }

    #[test]
    fn prompts_state_one_consistent_band() {
        let band = WordBand::new(200, 0.70, 0.85);
        for prompt in [
            system_prompt(band),
            user_prompt("text", band),
            fallback_prompt("text", band),
            retry_prompt("text", "short", 50, band),
        ] {
            assert!(prompt.contains("between 140 and 170 words"), "got: {prompt}");
            assert!(!prompt.contains("60-80%"));
        }
    }

    #[test]
    fn retry_prompt_carries_chunk_and_rejected_content() {
        let band = WordBand::new(10, 0.7, 0.85);
        let p = retry_prompt("the original chunk", "the short one", 5, band);
        assert!(p.contains("the original chunk"));
        assert!(p.contains("the short one"));
        assert!(p.contains("(50% of original)"));
        assert!(p.contains("DO NOT SUMMARIZE"));
    }

    #[test]
    fn schemas_require_fields() {
        assert_eq!(topic_schema()["required"], json!(["topic", "content"]));
        assert_eq!(content_schema()["required"], json!(["content"]));
    }

    #[test]
    fn repair_prompt_includes_output_and_error() {
        let p = repair_prompt("{topic: oops", "expected `\"`");
        assert!(p.contains("{topic: oops"));
        assert!(p.contains("expected `\"`"));
        assert!(p.contains("\"required\""));
    }
}
