//! Out-of-band diagnostics for coercion.
//!
//! Attempt failures never change what `coerce` returns; they are reported here
//! so a log, console or UI can surface them.

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What went wrong during an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The model call itself failed (network, auth, quota, timeout)
    Transport,
    /// The model answered with text that is not a JSON object
    MalformedOutput,
    /// The last-attempt repair pass found no parseable object
    RepairFailed,
    /// Retries are exhausted and a template is returned
    FallbackUsed,
}

/// A single advisory notice.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub request_id: String,
    /// 1-based attempt number
    pub attempt: u32,
    pub max_attempts: u32,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Receiver for coercion diagnostics.
pub trait DiagnosticSink: Send + Sync + Debug {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Sink that forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, d: &Diagnostic) {
        match d.kind {
            DiagnosticKind::Transport => tracing::warn!(
                request_id = %d.request_id,
                "LLM call failed (attempt {}/{}): {}",
                d.attempt,
                d.max_attempts,
                d.message
            ),
            DiagnosticKind::MalformedOutput => tracing::warn!(
                request_id = %d.request_id,
                "JSON parsing error (attempt {}/{}): {}",
                d.attempt,
                d.max_attempts,
                d.message
            ),
            DiagnosticKind::RepairFailed => tracing::warn!(
                request_id = %d.request_id,
                "JSON repair failed: {}",
                d.message
            ),
            DiagnosticKind::FallbackUsed => tracing::error!(
                request_id = %d.request_id,
                "{}",
                d.message
            ),
        }
    }
}

/// Sink that keeps diagnostics in memory, e.g. for UI notices.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere must not lose collected notices
    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of everything reported so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Remove and return everything reported so far
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.lock().push(diagnostic.clone());
    }
}
