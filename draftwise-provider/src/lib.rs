//! # Draftwise Providers
//!
//! Provider implementations for OpenAI-protocol services.

pub mod azure;
pub mod openai;

// Re-exports
pub use azure::{azure, AzureSettings};
pub use openai::{OpenAiBuilder, OpenAiProvider};

use draftwise_core::error::AiError;

/// Create a DeepSeek provider (OpenAI-compatible)
///
/// ```ignore
/// use draftwise_provider::deepseek;
///
/// let provider = deepseek("your-api-key")?;
/// ```
pub fn deepseek(api_key: impl Into<String>) -> Result<OpenAiProvider, AiError> {
    OpenAiProvider::builder()
        .api_key(api_key)
        .api_base("https://api.deepseek.com/v1")
        .build_with_id("deepseek", "DeepSeek")
}
