//! RuntimeExecutor implementation.
//!
//! The executor is the model-call collaborator used by the coercer: it turns
//! an [`InvokeRequest`] into a chat completion call against a (possibly
//! layered) provider and hands back the raw text of the first choice.

use crate::error::AiError;
use crate::layer::Layer;
use crate::provider::Provider;
use crate::strategy::{detect_json_strategy, JsonOutputStrategy};
use crate::types::*;
use std::sync::Arc;

/// Type-erased provider that can be shared across threads
type BoxedProvider = Arc<dyn Provider>;

/// Model used when the builder is not given one
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// One model call: prompt, system instruction and sampling settings.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    pub prompt: String,
    pub system_instruction: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the provider for JSON-constrained decoding. Advisory only.
    pub expect_json: bool,
}

/// Builder for composing a provider with layers.
///
/// ```ignore
/// let executor = RuntimeExecutor::builder(provider)
///     .layer(LoggingLayer::new())
///     .model("gpt-4o")
///     .finish();
/// ```
pub struct RuntimeExecutorBuilder<P> {
    provider: P,
    model: String,
    json_strategy: Option<Box<dyn JsonOutputStrategy>>,
}

impl<P: Provider> RuntimeExecutorBuilder<P> {
    /// Create a new builder with a provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
            json_strategy: None,
        }
    }

    /// Add a layer to wrap the provider
    ///
    /// Each call creates a new concrete type by wrapping the previous provider.
    pub fn layer<L>(self, layer: L) -> RuntimeExecutorBuilder<L::LayeredProvider>
    where
        L: Layer<P>,
    {
        RuntimeExecutorBuilder {
            provider: layer.layer(self.provider),
            model: self.model,
            json_strategy: self.json_strategy,
        }
    }

    /// Set the model (or Azure deployment) name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom JSON output strategy
    ///
    /// If not set, the strategy is picked from the provider ID.
    pub fn json_strategy(mut self, strategy: Box<dyn JsonOutputStrategy>) -> Self {
        self.json_strategy = Some(strategy);
        self
    }

    /// Finish building and create a RuntimeExecutor
    pub fn finish(self) -> RuntimeExecutor {
        let provider = Arc::new(self.provider);
        let provider_id = provider.info().id.clone();

        let json_strategy = self
            .json_strategy
            .unwrap_or_else(|| detect_json_strategy(&provider_id));

        RuntimeExecutor {
            provider,
            model: self.model,
            json_strategy,
        }
    }
}

/// Executes model calls against a type-erased provider.
pub struct RuntimeExecutor {
    provider: BoxedProvider,
    model: String,
    json_strategy: Box<dyn JsonOutputStrategy>,
}

impl std::fmt::Debug for RuntimeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeExecutor")
            .field("provider", &self.provider.info().id)
            .field("model", &self.model)
            .field("json_strategy", &self.json_strategy.name())
            .finish()
    }
}

impl RuntimeExecutor {
    /// Create a new builder
    pub fn builder<P: Provider>(provider: P) -> RuntimeExecutorBuilder<P> {
        RuntimeExecutorBuilder::new(provider)
    }

    /// Get provider information
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.provider.info()
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the chat completion request for an invocation
    pub fn build_request(&self, req: &InvokeRequest) -> ChatCompletionRequest {
        let mut chat_req = ChatCompletionRequest::new(
            self.model.clone(),
            vec![
                Message::system(req.system_instruction.clone()),
                Message::user(req.prompt.clone()),
            ],
        )
        .with_temperature(req.temperature)
        .with_max_tokens(req.max_output_tokens);

        if req.expect_json {
            self.json_strategy.apply(&mut chat_req);
        }

        chat_req
    }

    /// Call the model once and return the text of the first choice.
    pub async fn invoke(&self, req: &InvokeRequest) -> Result<String, AiError> {
        let chat_req = self.build_request(req);
        let response = self.provider.chat_completion(chat_req).await?;

        let first_choice = response
            .choices
            .first()
            .ok_or_else(|| AiError::provider("No choices in response"))?;

        Ok(first_choice.message.text())
    }
}
