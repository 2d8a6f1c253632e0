//! Logging layer for provider operations.

use async_trait::async_trait;
use draftwise_core::error::AiError;
use draftwise_core::impl_layered_provider;
use draftwise_core::layer::{Layer, LayeredProvider};
use draftwise_core::provider::Provider;
use draftwise_core::types::*;
use std::fmt::Debug;

/// Logging layer that logs provider operations.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[draftwise]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

#[async_trait]
impl<P: Provider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError> {
        let provider = self.inner.info().id.clone();
        tracing::debug!(
            "{} chat_completion request: provider={}, model={}, messages={}",
            self.prefix,
            provider,
            req.model,
            req.messages.len()
        );

        let start = tokio::time::Instant::now();
        let result = self.inner.chat_completion(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    "{} chat_completion success: id={}, tokens={}, elapsed={:?}",
                    self.prefix,
                    response.id,
                    response.usage.total_tokens,
                    elapsed
                );
            }
            Err(e) => {
                tracing::warn!(
                    "{} chat_completion error: provider={}, error={}, elapsed={:?}",
                    self.prefix,
                    provider,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

impl_layered_provider!(LoggingProvider);
