//! Strategy layer for provider-specific behaviors.
//!
//! Providers differ in how (and whether) they can be asked for JSON output.

pub mod json_output;

pub use json_output::{
    detect_json_strategy, JsonObjectStrategy, JsonOutputStrategy, PromptOnlyStrategy,
};
