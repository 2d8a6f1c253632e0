//! Response coercion: from untrusted model text to a [`StructuredRecord`].
//!
//! [`ResponseCoercer::coerce`] calls the model up to `max_retries` times, in
//! sequence and without backoff by default. Each answer is trimmed and parsed
//! as a JSON object. A parse failure on a non-final attempt triggers another
//! call; on the final attempt the text gets one repair pass (see
//! [`parse::repair`]). When nothing can be recovered the caller receives the
//! fallback template for the request's category. No error ever escapes;
//! failures go to the [`DiagnosticSink`].

pub mod fallback;
pub mod parse;

pub use fallback::{fallback_for, FallbackCategory};

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
use crate::error::AiError;
use crate::record::StructuredRecord;
use crate::runtime::{InvokeRequest, RuntimeExecutor};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4000;

/// System instruction used when a request does not bring its own.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a business and technical analyst. \
You MUST strictly respond with ONLY valid JSON. Do not include any markdown formatting, \
code blocks, or explanatory text.";

const DIAGNOSTIC_MESSAGE_CHARS: usize = 100;

/// One coercion request.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    /// Prompt text, including the natural-language description of the JSON shape
    pub prompt: String,
    pub system_instruction: String,
    /// Number of model calls allowed. Values below 1 are treated as 1.
    pub max_retries: u32,
    /// Template family used on fallback; sniffed from `prompt` when unset
    pub category: Option<FallbackCategory>,
    /// Overrides [`CoercerConfig::temperature`]
    pub temperature: Option<f32>,
    /// Overrides [`CoercerConfig::attempt_timeout`]
    pub timeout: Option<Duration>,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            category: None,
            temperature: None,
            timeout: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Pin the fallback template instead of sniffing the prompt
    pub fn with_category(mut self, category: FallbackCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Category whose template is returned on fallback
    pub fn fallback_category(&self) -> FallbackCategory {
        self.category
            .unwrap_or_else(|| FallbackCategory::sniff(&self.prompt))
    }
}

/// Sampling and pacing settings shared by every `coerce` call.
#[derive(Debug, Clone)]
pub struct CoercerConfig {
    temperature: f32,
    max_output_tokens: u32,
    expect_json: bool,
    attempt_timeout: Option<Duration>,
    retry_delay: Duration,
}

impl CoercerConfig {
    pub fn new() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            expect_json: true,
            attempt_timeout: None,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Ask the provider for JSON-constrained decoding (on by default)
    pub fn with_expect_json(mut self, expect_json: bool) -> Self {
        self.expect_json = expect_json;
        self
    }

    /// Bound each model call; an expired call counts as a failed attempt
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Pause between attempts. Zero (the default) retries immediately.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn expect_json(&self) -> bool {
        self.expect_json
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Default for CoercerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How a `coerce` call terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceOutcome {
    /// Direct parse succeeded on this (1-based) attempt
    Parsed { attempt: u32 },
    /// The final attempt's text was recovered by the repair pass
    Repaired,
    /// Nothing was recoverable; the category template was returned
    Fallback { category: FallbackCategory },
}

/// A coerced record together with how it was obtained.
#[derive(Debug, Clone)]
pub struct Coerced {
    pub record: StructuredRecord,
    pub outcome: CoerceOutcome,
    /// Number of model calls made
    pub invocations: u32,
    pub request_id: String,
}

impl Coerced {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, CoerceOutcome::Fallback { .. })
    }
}

/// Turns model output into structured records, never failing.
#[derive(Debug)]
pub struct ResponseCoercer {
    executor: RuntimeExecutor,
    config: CoercerConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl ResponseCoercer {
    pub fn new(executor: RuntimeExecutor) -> Self {
        Self {
            executor,
            config: CoercerConfig::default(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_config(mut self, config: CoercerConfig) -> Self {
        self.config = config;
        self
    }

    /// Route diagnostics somewhere other than `tracing`
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn executor(&self) -> &RuntimeExecutor {
        &self.executor
    }

    pub fn config(&self) -> &CoercerConfig {
        &self.config
    }

    /// Coerce the model's answer to `request` into a JSON object.
    pub async fn coerce(&self, request: &PromptRequest) -> StructuredRecord {
        self.coerce_detailed(request).await.record
    }

    /// Like [`coerce`](Self::coerce) but also reports the terminal state.
    pub async fn coerce_detailed(&self, request: &PromptRequest) -> Coerced {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::debug_span!("coerce", request_id = %request_id);
        self.run(request, request_id.clone()).instrument(span).await
    }

    async fn run(&self, request: &PromptRequest, request_id: String) -> Coerced {
        let max_attempts = request.max_retries.max(1);
        let invoke = InvokeRequest {
            prompt: request.prompt.clone(),
            system_instruction: request.system_instruction.clone(),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_output_tokens: self.config.max_output_tokens,
            expect_json: self.config.expect_json,
        };
        let timeout = request.timeout.or(self.config.attempt_timeout);
        let mut invocations = 0;

        for attempt in 1..=max_attempts {
            let is_last = attempt == max_attempts;

            if attempt > 1 && !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            invocations += 1;
            let raw = match self.call_model(&invoke, timeout).await {
                Ok(raw) => raw,
                Err(err) => {
                    self.report(
                        &request_id,
                        attempt,
                        max_attempts,
                        DiagnosticKind::Transport,
                        err.to_string(),
                    );
                    continue;
                }
            };

            let text = raw.trim();
            tracing::debug!(attempt, chars = text.len(), "model responded");

            match parse::parse_object(text) {
                Ok(record) => {
                    return Coerced {
                        record,
                        outcome: CoerceOutcome::Parsed { attempt },
                        invocations,
                        request_id,
                    };
                }
                Err(err) => {
                    self.report(
                        &request_id,
                        attempt,
                        max_attempts,
                        DiagnosticKind::MalformedOutput,
                        err.to_string(),
                    );

                    if is_last {
                        if let Some(record) = parse::repair(text) {
                            tracing::info!(attempt, "recovered JSON object by repair");
                            return Coerced {
                                record,
                                outcome: CoerceOutcome::Repaired,
                                invocations,
                                request_id,
                            };
                        }
                        self.report(
                            &request_id,
                            attempt,
                            max_attempts,
                            DiagnosticKind::RepairFailed,
                            "no complete JSON object found in output".to_string(),
                        );
                    }
                }
            }
        }

        let category = request.fallback_category();
        self.report(
            &request_id,
            max_attempts,
            max_attempts,
            DiagnosticKind::FallbackUsed,
            format!(
                "Failed to parse JSON after {} attempts. Using {} fallback structure.",
                max_attempts, category
            ),
        );

        Coerced {
            record: category.template(),
            outcome: CoerceOutcome::Fallback { category },
            invocations,
            request_id,
        }
    }

    async fn call_model(
        &self,
        invoke: &InvokeRequest,
        timeout: Option<Duration>,
    ) -> Result<String, AiError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.executor.invoke(invoke))
                .await
                .unwrap_or_else(|_| {
                    Err(AiError::timeout(format!("no response within {:?}", limit)))
                }),
            None => self.executor.invoke(invoke).await,
        }
    }

    fn report(
        &self,
        request_id: &str,
        attempt: u32,
        max_attempts: u32,
        kind: DiagnosticKind,
        message: String,
    ) {
        self.sink.report(&Diagnostic {
            request_id: request_id.to_string(),
            attempt,
            max_attempts,
            kind,
            message: parse::truncate(&message, DIAGNOSTIC_MESSAGE_CHARS),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::provider::Provider;
    use crate::record::RecordExt;
    use crate::types::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    /// Plays back replies in order, repeating the last one.
    #[derive(Debug)]
    struct ScriptedProvider {
        replies: Vec<Reply>,
        calls: AtomicU32,
        sampling: Mutex<Vec<(Option<f32>, Option<u32>)>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: AtomicU32::new(0),
                sampling: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn info(&self) -> Arc<ProviderInfo> {
            Arc::new(ProviderInfo {
                id: "scripted".to_string(),
                name: "Scripted".to_string(),
            })
        }

        async fn chat_completion(
            &self,
            req: ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, AiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.sampling
                .lock()
                .unwrap()
                .push((req.temperature, req.max_tokens));
            let reply = self
                .replies
                .get(n)
                .or(self.replies.last())
                .cloned()
                .unwrap_or(Reply::Fail);

            match reply {
                Reply::Text(text) => Ok(ChatCompletionResponse::from_text(req.model, text)),
                Reply::Fail => Err(AiError::network("connection refused")),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ChatCompletionResponse::from_text(req.model, "{}"))
                }
            }
        }
    }

    fn coercer(replies: Vec<Reply>) -> (Arc<ScriptedProvider>, Arc<MemorySink>, ResponseCoercer) {
        let provider = ScriptedProvider::new(replies);
        let sink = Arc::new(MemorySink::new());
        let coercer = ResponseCoercer::new(RuntimeExecutor::builder(provider.clone()).finish())
            .with_sink(sink.clone());
        (provider, sink, coercer)
    }

    fn kinds(sink: &MemorySink) -> Vec<DiagnosticKind> {
        sink.entries().into_iter().map(|d| d.kind).collect()
    }

    #[tokio::test]
    async fn test_valid_json_parsed_on_first_attempt() {
        let (provider, sink, coercer) =
            coercer(vec![Reply::Text(r#"{"business_problem":"Manual reporting","target_users":["Ops"]}"#)]);

        let result = coercer
            .coerce_detailed(&PromptRequest::new("Analyze from a business perspective"))
            .await;

        assert_eq!(result.outcome, CoerceOutcome::Parsed { attempt: 1 });
        assert_eq!(result.invocations, 1);
        assert_eq!(provider.calls(), 1);
        assert_eq!(result.record.str_or("business_problem", ""), "Manual reporting");
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_stripped() {
        let (_, _, coercer) = coercer(vec![Reply::Text("\n   {\"a\": 1}  \n")]);
        let result = coercer.coerce_detailed(&PromptRequest::new("anything")).await;
        assert_eq!(result.outcome, CoerceOutcome::Parsed { attempt: 1 });
    }

    #[tokio::test]
    async fn test_fenced_json_repaired_only_on_final_attempt() {
        let (provider, sink, coercer) = coercer(vec![Reply::Text("```json{\"a\":1}```")]);

        let result = coercer.coerce_detailed(&PromptRequest::new("anything")).await;

        assert_eq!(result.outcome, CoerceOutcome::Repaired);
        assert_eq!(serde_json::Value::Object(result.record), json!({"a": 1}));
        assert_eq!(provider.calls(), 3);
        assert_eq!(
            kinds(&sink),
            vec![DiagnosticKind::MalformedOutput; 3]
        );
    }

    #[tokio::test]
    async fn test_malformed_then_valid_retries_without_repair() {
        let (provider, _, coercer) = coercer(vec![
            Reply::Text("```json{\"a\":1}```"),
            Reply::Text("{\"a\":2}"),
        ]);

        let result = coercer.coerce_detailed(&PromptRequest::new("anything")).await;

        assert_eq!(result.outcome, CoerceOutcome::Parsed { attempt: 2 });
        assert_eq!(result.record["a"], 2);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_failures_exhaust_into_fallback() {
        let (provider, sink, coercer) = coercer(vec![Reply::Fail]);
        let request = PromptRequest::new("Design comprehensive database schema...");

        let result = coercer.coerce_detailed(&request).await;

        assert_eq!(provider.calls(), 3);
        assert_eq!(
            result.outcome,
            CoerceOutcome::Fallback {
                category: FallbackCategory::Database
            }
        );
        assert!(!result.record.str_or("database_type", "").is_empty());
        assert!(!result.record.list("entities").is_empty());
        assert_eq!(
            kinds(&sink),
            vec![
                DiagnosticKind::Transport,
                DiagnosticKind::Transport,
                DiagnosticKind::Transport,
                DiagnosticKind::FallbackUsed,
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_on_last_attempt_skips_repair() {
        let (_, sink, coercer) = coercer(vec![Reply::Text("```json{\"a\":1}```"), Reply::Fail]);
        let request = PromptRequest::new("hello").with_max_retries(2);

        let result = coercer.coerce_detailed(&request).await;

        assert!(result.is_fallback());
        assert!(!kinds(&sink).contains(&DiagnosticKind::RepairFailed));
    }

    #[tokio::test]
    async fn test_business_keywords_take_priority_in_fallback() {
        let (_, _, coercer) = coercer(vec![Reply::Text("not json")]);
        let request =
            PromptRequest::new("Give business value and the architecture_layers of the system");

        let record = coercer.coerce(&request).await;

        assert!(record.contains_key("executive_summary"));
        assert!(!record.contains_key("architecture_layers"));
    }

    #[tokio::test]
    async fn test_explicit_category_overrides_sniffing() {
        let (_, _, coercer) = coercer(vec![Reply::Fail]);
        let request = PromptRequest::new("Create FRD. Include business_rules.")
            .with_category(FallbackCategory::Frd)
            .with_max_retries(1);

        let result = coercer.coerce_detailed(&request).await;

        assert_eq!(
            result.outcome,
            CoerceOutcome::Fallback {
                category: FallbackCategory::Frd
            }
        );
        assert!(result.record.contains_key("functional_requirements"));
    }

    #[tokio::test]
    async fn test_never_fails_on_garbage() {
        let garbage = [
            "",
            "I'm sorry, I cannot help with that.",
            "{\"truncated\": [1, 2",
            "}{",
            "{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{{",
            "[[[[[{\"a\": {\"b\": {\"c\": ",
            "[1, 2, 3]",
            "null",
        ];

        for max_retries in [1, 3, 5] {
            for text in garbage {
                let (provider, _, coercer) = coercer(vec![Reply::Text(text)]);
                let request = PromptRequest::new("Create test scripts").with_max_retries(max_retries);

                let result = coercer.coerce_detailed(&request).await;

                assert!(!result.record.is_empty(), "empty record for {text:?}");
                assert_eq!(provider.calls(), max_retries);
                assert_eq!(
                    result.outcome,
                    CoerceOutcome::Fallback {
                        category: FallbackCategory::Test
                    },
                    "unexpected outcome for {text:?}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_zero_retries_still_calls_once() {
        let (provider, _, coercer) = coercer(vec![Reply::Text("{\"ok\": true}")]);
        let result = coercer
            .coerce_detailed(&PromptRequest::new("x").with_max_retries(0))
            .await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(result.outcome, CoerceOutcome::Parsed { attempt: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_failed_attempt() {
        let (provider, sink, coercer) = coercer(vec![Reply::Hang, Reply::Text("{\"a\": 1}")]);
        let coercer = coercer.with_config(
            CoercerConfig::new().with_attempt_timeout(Duration::from_secs(5)),
        );

        let result = coercer.coerce_detailed(&PromptRequest::new("x")).await;

        assert_eq!(result.outcome, CoerceOutcome::Parsed { attempt: 2 });
        assert_eq!(provider.calls(), 2);
        assert_eq!(kinds(&sink), vec![DiagnosticKind::Transport]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_overrides_config() {
        let (_, _, coercer) = coercer(vec![Reply::Hang]);
        let request = PromptRequest::new("Design comprehensive database schema")
            .with_max_retries(2)
            .with_timeout(Duration::from_millis(50));

        let result = coercer.coerce_detailed(&request).await;

        assert_eq!(result.invocations, 2);
        assert!(result.is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delay_waits_between_attempts() {
        let (_, _, coercer) = coercer(vec![Reply::Fail, Reply::Text("{}")]);
        let coercer =
            coercer.with_config(CoercerConfig::new().with_retry_delay(Duration::from_secs(2)));

        let start = tokio::time::Instant::now();
        let result = coercer.coerce_detailed(&PromptRequest::new("x")).await;

        assert_eq!(result.outcome, CoerceOutcome::Parsed { attempt: 2 });
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_sampling_settings_reach_provider() {
        let (provider, _, coercer) = coercer(vec![Reply::Text("{}")]);
        let coercer = coercer.with_config(CoercerConfig::new().with_max_output_tokens(1200));

        coercer
            .coerce(&PromptRequest::new("x").with_temperature(0.3))
            .await;
        coercer.coerce(&PromptRequest::new("y")).await;

        let seen = provider.sampling.lock().unwrap();
        assert_eq!(seen[0], (Some(0.3), Some(1200)));
        assert_eq!(seen[1], (Some(DEFAULT_TEMPERATURE), Some(1200)));
    }
}
