//! Runs the eight analyses for a project through the response coercer.

use crate::prompts::{AnalysisKind, SYSTEM_INSTRUCTION};
use crate::session::{AnalysisSession, InputMode};
use crate::source::{CodebaseDigest, CodebaseSnapshot};
use draftwise_core::coerce::{CoerceOutcome, Coerced, PromptRequest, ResponseCoercer};
use draftwise_core::error::AiError;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Project context for an analysis run
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Description(String),
    Codebase(CodebaseSnapshot),
}

impl AnalysisInput {
    pub fn mode(&self) -> InputMode {
        match self {
            AnalysisInput::Description(_) => InputMode::Text,
            AnalysisInput::Codebase(_) => InputMode::Upload,
        }
    }
}

enum PreparedInput<'a> {
    Description(&'a str),
    Codebase(CodebaseDigest),
}

/// Progress notification passed to the caller's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub kind: AnalysisKind,
    pub message: &'static str,
    /// 1-based position of this notification
    pub step: usize,
    pub total: usize,
}

impl Progress {
    /// Rough completion percentage, reaching 96 on the last step
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.step * 96 / self.total) as u8
    }
}

/// How each analysis of a run was obtained
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub outcomes: BTreeMap<AnalysisKind, CoerceOutcome>,
    /// Total model calls made
    pub invocations: u32,
}

impl AnalysisReport {
    /// Kinds that ended on their fallback template
    pub fn fallbacks(&self) -> Vec<AnalysisKind> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, CoerceOutcome::Fallback { .. }))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

/// Orchestrates a full analysis run.
///
/// Sequential by default: progress is reported before each analysis starts.
/// With [`Analyzer::concurrent`] all prompts are in flight together and
/// progress is reported as each one finishes.
#[derive(Debug)]
pub struct Analyzer {
    coercer: ResponseCoercer,
    concurrent: bool,
    max_retries: Option<u32>,
}

impl Analyzer {
    pub fn new(coercer: ResponseCoercer) -> Self {
        Self {
            coercer,
            concurrent: false,
            max_retries: None,
        }
    }

    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Override the per-analysis attempt count
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn coercer(&self) -> &ResponseCoercer {
        &self.coercer
    }

    /// Run every analysis and store the results in `session`.
    ///
    /// Previous results in the session are cleared first. Individual model
    /// failures never abort the run; they end on the kind's fallback
    /// template and show up in [`AnalysisReport::fallbacks`]. Only an empty
    /// input is rejected.
    pub async fn run<F>(
        &self,
        session: &mut AnalysisSession,
        input: &AnalysisInput,
        on_progress: F,
    ) -> Result<AnalysisReport, AiError>
    where
        F: Fn(Progress),
    {
        let prepared = match input {
            AnalysisInput::Description(text) if text.trim().is_empty() => {
                return Err(AiError::invalid_request("project description is empty"));
            }
            AnalysisInput::Codebase(snapshot) if snapshot.is_empty() => {
                return Err(AiError::invalid_request("codebase contains no readable source files"));
            }
            AnalysisInput::Description(text) => PreparedInput::Description(text),
            AnalysisInput::Codebase(snapshot) => {
                let digest = snapshot.digest();
                tracing::info!(
                    files = digest.file_count,
                    sampled = digest.sample.len(),
                    "analyzing codebase"
                );
                PreparedInput::Codebase(digest)
            }
        };

        session.reset();
        session.input_mode = input.mode();
        tracing::info!(
            project = %session.project_name,
            mode = ?session.input_mode,
            concurrent = self.concurrent,
            "starting analysis run"
        );

        let results = if self.concurrent {
            self.run_concurrent(&prepared, &on_progress).await
        } else {
            self.run_sequential(&prepared, &on_progress).await
        };

        let mut report = AnalysisReport::default();
        for (kind, coerced) in results {
            report.invocations += coerced.invocations;
            report.outcomes.insert(kind, coerced.outcome);
            session.insert(kind, coerced.record);
        }

        tracing::info!(
            project = %session.project_name,
            invocations = report.invocations,
            fallbacks = report.fallbacks().len(),
            "analysis run finished"
        );
        Ok(report)
    }

    async fn run_sequential<F>(
        &self,
        input: &PreparedInput<'_>,
        on_progress: &F,
    ) -> Vec<(AnalysisKind, Coerced)>
    where
        F: Fn(Progress),
    {
        let total = AnalysisKind::ALL.len();
        let mut results = Vec::with_capacity(total);

        for (i, kind) in AnalysisKind::ALL.into_iter().enumerate() {
            on_progress(Progress {
                kind,
                message: kind.progress_message(),
                step: i + 1,
                total,
            });
            let coerced = self.coercer.coerce_detailed(&self.request(kind, input)).await;
            results.push((kind, coerced));
        }

        results
    }

    async fn run_concurrent<F>(
        &self,
        input: &PreparedInput<'_>,
        on_progress: &F,
    ) -> Vec<(AnalysisKind, Coerced)>
    where
        F: Fn(Progress),
    {
        let total = AnalysisKind::ALL.len();
        let finished = AtomicUsize::new(0);

        let tasks = AnalysisKind::ALL.into_iter().map(|kind| {
            let finished = &finished;
            async move {
                let coerced = self.coercer.coerce_detailed(&self.request(kind, input)).await;
                on_progress(Progress {
                    kind,
                    message: kind.progress_message(),
                    step: finished.fetch_add(1, Ordering::SeqCst) + 1,
                    total,
                });
                (kind, coerced)
            }
        });

        join_all(tasks).await
    }

    fn request(&self, kind: AnalysisKind, input: &PreparedInput<'_>) -> PromptRequest {
        let prompt = match input {
            PreparedInput::Description(text) => kind.text_prompt(text),
            PreparedInput::Codebase(digest) => kind.codebase_prompt(digest),
        };

        let mut request = PromptRequest::new(prompt)
            .with_system_instruction(SYSTEM_INSTRUCTION)
            .with_category(kind.fallback_category());
        if let Some(max_retries) = self.max_retries {
            request = request.with_max_retries(max_retries);
        }
        request
    }
}
