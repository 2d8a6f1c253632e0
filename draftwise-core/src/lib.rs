//! # Draftwise Core
//!
//! Core abstractions for turning LLM output into structured records.
//!
//! This crate provides the provider and layer traits, the request/response
//! types shared by every provider, and the [`ResponseCoercer`] that forces a
//! model's free-form text into a JSON object with bounded retries and a
//! deterministic fallback.

pub mod coerce;
pub mod diagnostics;
pub mod error;
pub mod layer;
pub mod provider;
pub mod record;
pub mod runtime;
pub mod strategy;
pub mod types;

// Re-exports
pub use coerce::{
    CoerceOutcome, Coerced, CoercerConfig, FallbackCategory, PromptRequest, ResponseCoercer,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, TracingSink};
pub use error::AiError;
pub use layer::{Layer, LayeredProvider};
pub use provider::Provider;
pub use record::{RecordExt, StructuredRecord};
pub use runtime::{InvokeRequest, RuntimeExecutor};
pub use strategy::{JsonObjectStrategy, JsonOutputStrategy, PromptOnlyStrategy};
pub use types::*;

/// Result type alias for draftwise operations
pub type Result<T> = std::result::Result<T, AiError>;
