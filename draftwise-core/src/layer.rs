//! Layer trait and abstractions.
//!
//! Layers wrap a provider with cross-cutting concerns such as logging or
//! transport retries. Each layer consumes the inner provider and returns a new
//! provider, so a stack is composed with static dispatch at build time.

use crate::error::AiError;
use crate::provider::Provider;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Layer trait for wrapping providers.
pub trait Layer<P: Provider> {
    /// The type of the layered provider
    type LayeredProvider: Provider;

    /// Wrap the inner provider with this layer
    fn layer(&self, inner: P) -> Self::LayeredProvider;
}

/// Helper trait for layered providers.
///
/// Provides forwarding defaults; implementers only override the calls they
/// intercept and then use [`impl_layered_provider!`](crate::impl_layered_provider)
/// to get the [`Provider`] impl.
#[async_trait]
pub trait LayeredProvider: Sized + Provider {
    /// The inner provider type
    type Inner: Provider;

    /// Get a reference to the inner provider
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<ProviderInfo> {
        self.inner().info()
    }

    /// Default implementation for chat_completion - forwards to inner
    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError> {
        self.inner().chat_completion(req).await
    }
}

/// Implement [`Provider`] for a generic layered provider by forwarding to its
/// [`LayeredProvider`] methods.
///
/// ```ignore
/// impl_layered_provider!(LoggingProvider);
/// ```
#[macro_export]
macro_rules! impl_layered_provider {
    ($name:ident) => {
        #[async_trait::async_trait]
        impl<P: $crate::provider::Provider> $crate::provider::Provider for $name<P> {
            fn info(&self) -> std::sync::Arc<$crate::types::ProviderInfo> {
                $crate::layer::LayeredProvider::layered_info(self)
            }

            async fn chat_completion(
                &self,
                req: $crate::types::ChatCompletionRequest,
            ) -> Result<$crate::types::ChatCompletionResponse, $crate::error::AiError> {
                $crate::layer::LayeredProvider::layered_chat_completion(self, req).await
            }
        }
    };
}
