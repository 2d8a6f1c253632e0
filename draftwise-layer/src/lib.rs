//! # Draftwise Layers
//!
//! Built-in provider layers.
//!
//! - `LoggingLayer`: logs every chat completion with timing and token usage
//! - `RetryLayer`: exponential backoff for network, timeout and rate-limit errors
//!
//! Neither layer is installed by default. A `RetryLayer` retries inside a
//! single coercion attempt, so stacking it multiplies the number of provider
//! calls a coercion can make.
//!
//! ## Usage
//!
//! ```ignore
//! use draftwise_core::RuntimeExecutor;
//! use draftwise_layer::{LoggingLayer, RetryLayer};
//!
//! let executor = RuntimeExecutor::builder(provider)
//!     .layer(RetryLayer::new().with_max_retries(2))
//!     .layer(LoggingLayer::new())
//!     .finish();
//! ```

pub mod logging;
pub mod retry;

// Re-exports
pub use logging::{LoggingLayer, LoggingProvider};
pub use retry::{RetryLayer, RetryProvider};
