//! Runtime layer for draftwise.
//!
//! Sits between the coercer and the provider interface: it assembles chat
//! completion requests, applies the provider's JSON output strategy, and
//! holds the layered provider stack.

pub mod executor;

pub use executor::{InvokeRequest, RuntimeExecutor, RuntimeExecutorBuilder, DEFAULT_MODEL};
