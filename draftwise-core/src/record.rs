//! Structured records and lenient accessors.
//!
//! Both real model output and fallback templates are only shape-consistent at
//! the top level, so consumers read fields through [`RecordExt`] with defaults.

use serde_json::{Map, Value};

/// A JSON object produced by coercing model output.
pub type StructuredRecord = Map<String, Value>;

/// Read helpers that tolerate missing keys and unexpected types.
pub trait RecordExt {
    /// String value at `key`, or `default` when missing or not a string
    fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str;

    /// List at `key`, empty when missing or not a list
    fn list(&self, key: &str) -> &[Value];

    /// String items of the list at `key`; non-string items are skipped
    fn strings(&self, key: &str) -> Vec<&str>;

    /// Nested object at `key`
    fn object(&self, key: &str) -> Option<&StructuredRecord>;

    /// Integer at `key`, or `default`. Floats are truncated.
    fn i64_or(&self, key: &str, default: i64) -> i64;
}

impl RecordExt for StructuredRecord {
    fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    fn list(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn strings(&self, key: &str) -> Vec<&str> {
        self.list(key).iter().filter_map(Value::as_str).collect()
    }

    fn object(&self, key: &str) -> Option<&StructuredRecord> {
        self.get(key).and_then(Value::as_object)
    }

    fn i64_or(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().map(|f| f as i64))
                .unwrap_or(default),
            None => default,
        }
    }
}
