//! OpenAI-protocol provider built on the async-openai crate.
//!
//! Generic over the async-openai [`Config`], so the same adapter serves
//! api.openai.com, OpenAI-compatible endpoints, and Azure OpenAI deployments.

use async_openai::config::{Config, OpenAIConfig};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    ResponseFormat as OpenAIResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use draftwise_core::error::AiError;
use draftwise_core::provider::Provider;
use draftwise_core::types::*;
use std::sync::Arc;

/// Provider speaking the OpenAI chat completions protocol
#[derive(Clone)]
pub struct OpenAiProvider<C: Config = OpenAIConfig> {
    client: Client<C>,
    info: Arc<ProviderInfo>,
}

impl<C: Config> std::fmt::Debug for OpenAiProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiProvider<OpenAIConfig> {
    /// Create a new OpenAI provider with default configuration
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self::with_client(Client::with_config(config), "openai", "OpenAI")
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }
}

impl<C: Config> OpenAiProvider<C> {
    /// Wrap an already configured async-openai client
    pub fn with_client(
        client: Client<C>,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            info: Arc::new(ProviderInfo {
                id: provider_id.into(),
                name: provider_name.into(),
            }),
        }
    }
}

/// Convert our Message type to OpenAI's ChatCompletionRequestMessage
fn convert_message(msg: &Message) -> Result<ChatCompletionRequestMessage, AiError> {
    let content = msg.text();

    match msg.role {
        Role::System => {
            let msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| AiError::provider(format!("Failed to build system message: {}", e)))?;
            Ok(ChatCompletionRequestMessage::System(msg))
        }
        Role::User => {
            let msg = ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| AiError::provider(format!("Failed to build user message: {}", e)))?;
            Ok(ChatCompletionRequestMessage::User(msg))
        }
        Role::Assistant => {
            let msg = ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| {
                    AiError::provider(format!("Failed to build assistant message: {}", e))
                })?;
            Ok(ChatCompletionRequestMessage::Assistant(msg))
        }
    }
}

fn convert_response_format(format: &ResponseFormat) -> OpenAIResponseFormat {
    match format {
        ResponseFormat::Text => OpenAIResponseFormat::Text,
        ResponseFormat::JsonObject => OpenAIResponseFormat::JsonObject,
    }
}

/// Build CreateChatCompletionRequest from our ChatCompletionRequest
fn build_request(req: &ChatCompletionRequest) -> Result<CreateChatCompletionRequest, AiError> {
    let messages: Result<Vec<_>, _> = req.messages.iter().map(convert_message).collect();

    let mut builder = CreateChatCompletionRequestArgs::default();
    builder.model(&req.model).messages(messages?);

    if let Some(max_tokens) = req.max_tokens {
        builder.max_tokens(max_tokens);
    }
    if let Some(temperature) = req.temperature {
        builder.temperature(temperature);
    }
    if let Some(response_format) = &req.response_format {
        builder.response_format(convert_response_format(response_format));
    }

    builder
        .build()
        .map_err(|e| AiError::invalid_request(format!("Failed to build request: {}", e)))
}

/// Convert OpenAI response to our ChatCompletionResponse
fn convert_response(response: CreateChatCompletionResponse) -> ChatCompletionResponse {
    let choices = response
        .choices
        .into_iter()
        .map(|choice| {
            let role = match choice.message.role {
                async_openai::types::Role::System => Role::System,
                async_openai::types::Role::User => Role::User,
                _ => Role::Assistant,
            };
            let message = Message {
                role,
                content: vec![ContentPart::Text {
                    text: choice.message.content.unwrap_or_default(),
                }],
            };

            let finish_reason = choice
                .finish_reason
                .map_or(FinishReason::Stop, |r| match r {
                    async_openai::types::FinishReason::Stop => FinishReason::Stop,
                    async_openai::types::FinishReason::Length => FinishReason::Length,
                    async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
                    other => FinishReason::Other(format!("{:?}", other)),
                });

            Choice {
                index: choice.index,
                message,
                finish_reason,
            }
        })
        .collect();

    let usage = response.usage.map_or(Usage::default(), |u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    ChatCompletionResponse {
        id: response.id,
        model: response.model,
        choices,
        usage,
        created: Some(response.created as u64),
    }
}

/// Sort async-openai errors into our taxonomy so retry layers can tell
/// transport trouble from everything else.
fn map_error(err: OpenAIError) -> AiError {
    match err {
        OpenAIError::Reqwest(e) if e.is_timeout() => AiError::timeout(e.to_string()),
        OpenAIError::Reqwest(e) => AiError::network(e.to_string()),
        OpenAIError::ApiError(api) => classify_api_message(&api.message),
        other => AiError::provider(format!("OpenAI API error: {}", other)),
    }
}

fn classify_api_message(message: &str) -> AiError {
    let lowered = message.to_lowercase();
    if lowered.contains("rate limit") || lowered.contains("quota") {
        AiError::rate_limit(message)
    } else if lowered.contains("api key") || lowered.contains("unauthorized") {
        AiError::authentication(message)
    } else {
        AiError::provider(format!("OpenAI API error: {}", message))
    }
}

#[async_trait]
impl<C: Config + 'static> Provider for OpenAiProvider<C> {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError> {
        let openai_req = build_request(&req)?;
        tracing::trace!(provider = %self.info.id, model = %req.model, "sending chat completion");

        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(map_error)?;

        Ok(convert_response(response))
    }
}

/// Builder for OpenAI provider with custom configuration
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    org_id: Option<String>,
}

impl OpenAiBuilder {
    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible APIs like DeepSeek)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set organization ID
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<OpenAiProvider, AiError> {
        self.build_with_id("openai", "OpenAI")
    }

    /// Build a provider with a custom provider ID and name
    ///
    /// The ID also selects the JSON output strategy in the runtime.
    pub fn build_with_id(
        self,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Result<OpenAiProvider, AiError> {
        let api_key = self
            .api_key
            .ok_or_else(|| AiError::configuration("API key is required"))?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Some(api_base) = self.api_base {
            config = config.with_api_base(api_base);
        }

        if let Some(org_id) = self.org_id {
            config = config.with_org_id(org_id);
        }

        Ok(OpenAiProvider::with_client(
            Client::with_config(config),
            provider_id,
            provider_name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_api_key() {
        let err = OpenAiProvider::builder().build().unwrap_err();
        assert!(matches!(err, AiError::Configuration(_)));
    }

    #[test]
    fn test_build_with_id_sets_info() {
        let provider = OpenAiProvider::builder()
            .api_key("sk-test")
            .api_base("http://localhost:8080/v1")
            .build_with_id("local", "Local")
            .unwrap();
        assert_eq!(provider.info().id, "local");
        assert_eq!(provider.info().name, "Local");
    }

    #[test]
    fn test_build_request_maps_sampling_and_format() {
        let req = ChatCompletionRequest::new(
            "gpt-4o",
            vec![Message::system("JSON only"), Message::user("Describe")],
        )
        .with_temperature(0.7)
        .with_max_tokens(4000)
        .with_response_format(ResponseFormat::JsonObject);

        let built = build_request(&req).unwrap();

        assert_eq!(built.model, "gpt-4o");
        assert_eq!(built.messages.len(), 2);
        assert_eq!(built.temperature, Some(0.7));
        assert!(matches!(
            built.response_format,
            Some(OpenAIResponseFormat::JsonObject)
        ));
    }

    #[test]
    fn test_api_messages_are_classified() {
        assert!(matches!(
            classify_api_message("Rate limit reached for requests"),
            AiError::RateLimit(_)
        ));
        assert!(matches!(
            classify_api_message("You exceeded your current quota"),
            AiError::RateLimit(_)
        ));
        assert!(matches!(
            classify_api_message("Incorrect API key provided"),
            AiError::Authentication(_)
        ));
        assert!(matches!(
            classify_api_message("The server had an error"),
            AiError::Provider(_)
        ));
    }
}
