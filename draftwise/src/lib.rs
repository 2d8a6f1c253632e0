//! # Draftwise
//!
//! Turn free-form LLM output into structured project documentation records.
//!
//! Draftwise wraps any chat-completion provider behind a [`ResponseCoercer`]
//! that never fails: each call yields a JSON object, either parsed from the
//! model's answer, recovered from a malformed one, or taken from a
//! deterministic fallback template for the prompt's category.
//!
//! ## Features
//!
//! - **Bounded retries**: every prompt gets a fixed number of sequential attempts
//! - **Repair pass**: the final answer is searched for the first complete JSON object
//! - **Fallback templates**: one per document category, so consumers always get a shape
//! - **Composable layers**: logging and transport retry around any provider
//! - **Analysis pipeline**: eight documentation analyses plus a traceability check
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! draftwise = { version = "0.1", features = ["openai", "layers"] }
//! ```
//!
//! ```ignore
//! use draftwise::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = azure(AzureSettings::from_env()?)?;
//! let executor = RuntimeExecutor::builder(provider)
//!     .layer(LoggingLayer::new())
//!     .finish();
//! let coercer = ResponseCoercer::new(executor);
//!
//! let record = coercer
//!     .coerce(&PromptRequest::new("Design the database schema for a bookstore ..."))
//!     .await;
//! println!("{}", record.str_or("database_type", "unknown"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: `openai`, `layers` and `analysis`
//! - `openai`: OpenAI, Azure OpenAI and DeepSeek providers
//! - `providers`: All available providers
//! - `layers`: Built-in layers (logging, retry)
//! - `analysis`: Analysis prompts, sessions, codebase snapshots, traceability
//! - `full`: All features enabled

// Re-export core types and traits
pub use draftwise_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "draftwise-provider")]
pub mod provider {
    //! LLM provider implementations.
    pub use draftwise_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "draftwise-layer")]
pub mod layer {
    //! Built-in provider layers.
    pub use draftwise_layer::*;
}

// Re-export the analysis pipeline under `analysis` module
#[cfg(feature = "draftwise-analysis")]
pub mod analysis {
    //! Project analysis pipeline.
    pub use draftwise_analysis::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use draftwise::prelude::*;
    //! ```

    pub use crate::{
        AiError, CoerceOutcome, CoercerConfig, FallbackCategory, Layer, Message, PromptRequest,
        Provider, RecordExt, ResponseCoercer, Result, Role, RuntimeExecutor, StructuredRecord,
    };

    #[cfg(feature = "draftwise-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "draftwise-layer")]
    pub use crate::layer::*;

    #[cfg(feature = "draftwise-analysis")]
    pub use crate::analysis::{
        AnalysisInput, AnalysisKind, AnalysisSession, Analyzer, CodebaseSnapshot, InputMode,
    };
}
