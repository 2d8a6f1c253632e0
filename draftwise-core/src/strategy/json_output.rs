//! JSON output strategies for different providers.
//!
//! - `JsonObjectStrategy`: providers with a native `json_object` response format
//! - `PromptOnlyStrategy`: providers without one; the request is steered by prompt text
//!
//! Neither strategy is trusted: the coercer parses whatever text comes back.

use crate::types::{ChatCompletionRequest, ContentPart, Message, ResponseFormat, Role};

const JSON_ONLY_REMINDER: &str =
    "Respond with a single valid JSON object only. Do not wrap it in markdown code fences.";

/// Strategy for requesting JSON output in chat completion requests.
pub trait JsonOutputStrategy: Send + Sync {
    /// Get the strategy name for debugging
    fn name(&self) -> &str;

    /// Configure the request so the provider is asked for a JSON object.
    fn apply(&self, req: &mut ChatCompletionRequest);
}

/// Strategy for providers that support `response_format: json_object`.
#[derive(Debug, Clone, Default)]
pub struct JsonObjectStrategy;

impl JsonObjectStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl JsonOutputStrategy for JsonObjectStrategy {
    fn name(&self) -> &str {
        "JsonObjectStrategy"
    }

    fn apply(&self, req: &mut ChatCompletionRequest) {
        req.response_format = Some(ResponseFormat::JsonObject);
    }
}

/// Strategy for providers that only produce free text.
///
/// Leaves the response format as text and appends a JSON-only reminder to the
/// last user message (or adds one if the request has none).
#[derive(Debug, Clone, Default)]
pub struct PromptOnlyStrategy;

impl PromptOnlyStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl JsonOutputStrategy for PromptOnlyStrategy {
    fn name(&self) -> &str {
        "PromptOnlyStrategy"
    }

    fn apply(&self, req: &mut ChatCompletionRequest) {
        req.response_format = Some(ResponseFormat::Text);

        if let Some(last_msg) = req
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::User)
        {
            last_msg.content.push(ContentPart::Text {
                text: format!("\n\n{}", JSON_ONLY_REMINDER),
            });
        } else {
            req.messages.push(Message::user(JSON_ONLY_REMINDER));
        }
    }
}

/// Pick the JSON output strategy for a provider id.
pub fn detect_json_strategy(provider_id: &str) -> Box<dyn JsonOutputStrategy> {
    match provider_id {
        "openai" | "azure" | "deepseek" => Box::new(JsonObjectStrategy::new()),

        // Unknown backends may reject response_format, so only steer via the prompt
        _ => Box::new(PromptOnlyStrategy::new()),
    }
}
