//! Requirements traceability: how well code and requirement documents line up.

use crate::source::take_chars;
use draftwise_core::coerce::{CoerceOutcome, FallbackCategory, PromptRequest, ResponseCoercer};
use draftwise_core::error::AiError;
use draftwise_core::record::{RecordExt, StructuredRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

pub const TRACEABILITY_SYSTEM_INSTRUCTION: &str =
    "You are a requirements traceability expert. Respond only with valid JSON.";
pub const TRACEABILITY_TEMPERATURE: f32 = 0.3;

/// Each side of the comparison is cut to this many characters
pub const SECTION_CHARS: usize = 15_000;
/// Per-file cap for code excerpts
pub const CODE_FILE_CHARS: usize = 3_000;
/// Per-document cap for requirement text
pub const DOCUMENT_CHARS: usize = 5_000;

const TRACEABILITY_SHAPE: &str = r#"{
    "overall_score": 85,
    "traceability_matrix": [
        {
            "requirement_id": "FR-001",
            "requirement": "User authentication",
            "implementation_status": "Implemented",
            "code_references": ["auth.py:45-89"],
            "coverage_score": 95,
            "notes": "Fully implemented with JWT"
        }
    ],
    "coverage_analysis": {
        "requirements_implemented": 15,
        "requirements_partial": 3,
        "requirements_missing": 2,
        "total_requirements": 20,
        "implementation_percentage": 85
    },
    "quality_metrics": {
        "code_completeness": 85,
        "documentation_alignment": 78,
        "test_coverage_alignment": 65,
        "architecture_compliance": 90
    },
    "gaps_identified": [
        {
            "gap_type": "Missing Feature",
            "requirement": "FR-005: Password reset",
            "severity": "High",
            "recommendation": "Implement password reset flow"
        }
    ],
    "implemented_but_not_documented": [
        {
            "feature": "Two-factor authentication",
            "code_location": "auth.py:120-156",
            "recommendation": "Add to requirements"
        }
    ],
    "recommendations": [
        "Implement missing password reset flow",
        "Add unit tests for authentication"
    ]
}"#;

/// Code and requirement text to compare.
#[derive(Debug, Clone, Default)]
pub struct TraceabilityInput {
    code: Vec<String>,
    documents: Vec<String>,
}

impl TraceabilityInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source file, cut to [`CODE_FILE_CHARS`]
    pub fn add_code_file(&mut self, name: &str, content: &str) -> &mut Self {
        self.code.push(section(name, content, CODE_FILE_CHARS));
        self
    }

    /// Add requirement text, cut to [`DOCUMENT_CHARS`]
    pub fn add_document(&mut self, name: &str, text: &str) -> &mut Self {
        self.documents.push(section(name, text, DOCUMENT_CHARS));
        self
    }

    pub fn code_text(&self) -> String {
        self.code.join("\n")
    }

    pub fn document_text(&self) -> String {
        self.documents.join("\n")
    }

    /// True unless both code and requirement documents are present
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() || self.documents.is_empty()
    }
}

fn section(name: &str, content: &str, max_chars: usize) -> String {
    format!("=== {} ===\n{}\n", name, take_chars(content, max_chars))
}

/// Build the traceability prompt from code and requirement text
pub fn traceability_prompt(code: &str, documents: &str) -> String {
    format!(
        "You are a requirements traceability analyst. Analyze the alignment between the \
provided code and requirement documents.\n\n\
CODE IMPLEMENTATION:\n{}\n\n\
REQUIREMENT DOCUMENTS:\n{}\n\n\
Provide a comprehensive traceability analysis in JSON format:\n{}",
        take_chars(code, SECTION_CHARS),
        take_chars(documents, SECTION_CHARS),
        TRACEABILITY_SHAPE
    )
}

/// Band for an overall traceability score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRating {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl ScoreRating {
    pub fn from_score(score: i64) -> Self {
        match score {
            s if s >= 85 => ScoreRating::Excellent,
            s if s >= 70 => ScoreRating::Good,
            s if s >= 50 => ScoreRating::Moderate,
            _ => ScoreRating::Poor,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScoreRating::Excellent => "Excellent - strong alignment",
            ScoreRating::Good => "Good - minor gaps exist",
            ScoreRating::Moderate => "Moderate - several gaps",
            ScoreRating::Poor => "Poor - major gaps found",
        }
    }
}

impl fmt::Display for ScoreRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Result of a traceability check
#[derive(Debug, Clone)]
pub struct TraceabilityReport {
    pub record: StructuredRecord,
    pub score: i64,
    pub rating: ScoreRating,
    pub outcome: CoerceOutcome,
}

impl TraceabilityReport {
    fn from_record(record: StructuredRecord, outcome: CoerceOutcome) -> Self {
        let score = record.i64_or("overall_score", 0);
        Self {
            rating: ScoreRating::from_score(score),
            score,
            record,
            outcome,
        }
    }

    fn coverage(&self, key: &str) -> i64 {
        self.record
            .object("coverage_analysis")
            .map_or(0, |c| c.i64_or(key, 0))
    }

    fn metric(&self, key: &str) -> i64 {
        self.record
            .object("quality_metrics")
            .map_or(0, |m| m.i64_or(key, 0))
    }

    /// `(implemented, total)` requirement counts
    pub fn requirements_met(&self) -> (i64, i64) {
        (
            self.coverage("requirements_implemented"),
            self.coverage("total_requirements"),
        )
    }

    /// Gaps with the given severity (`High`, `Medium`, `Low`)
    pub fn gaps_with_severity(&self, severity: &str) -> Vec<&StructuredRecord> {
        self.record
            .list("gaps_identified")
            .iter()
            .filter_map(|gap| gap.as_object())
            .filter(|gap| gap.str_or("severity", "") == severity)
            .collect()
    }

    /// Plain-text export of the report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        if self.write_text(&mut out).is_err() {
            out.clear();
        }
        out
    }

    fn write_text(&self, out: &mut String) -> fmt::Result {
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);

        writeln!(out, "REQUIREMENTS TRACEABILITY ANALYSIS REPORT\n{}\n", rule)?;
        writeln!(out, "OVERALL SCORE: {}% ({})\n", self.score, self.rating)?;

        writeln!(out, "COVERAGE ANALYSIS\n{}", thin)?;
        writeln!(out, "Total Requirements: {}", self.coverage("total_requirements"))?;
        writeln!(out, "Implemented: {}", self.coverage("requirements_implemented"))?;
        writeln!(out, "Partial: {}", self.coverage("requirements_partial"))?;
        writeln!(out, "Missing: {}", self.coverage("requirements_missing"))?;
        writeln!(
            out,
            "Implementation %: {}%\n",
            self.coverage("implementation_percentage")
        )?;

        writeln!(out, "QUALITY METRICS\n{}", thin)?;
        writeln!(out, "Code Completeness: {}%", self.metric("code_completeness"))?;
        writeln!(
            out,
            "Documentation Alignment: {}%",
            self.metric("documentation_alignment")
        )?;
        writeln!(out, "Test Coverage: {}%", self.metric("test_coverage_alignment"))?;
        writeln!(
            out,
            "Architecture Compliance: {}%\n",
            self.metric("architecture_compliance")
        )?;

        writeln!(out, "GAPS IDENTIFIED\n{}", thin)?;
        for gap in self
            .record
            .list("gaps_identified")
            .iter()
            .filter_map(|g| g.as_object())
        {
            writeln!(
                out,
                "\n[{}] {}\n  Type: {}\n  Action: {}",
                gap.str_or("severity", "N/A"),
                gap.str_or("requirement", "N/A"),
                gap.str_or("gap_type", "N/A"),
                gap.str_or("recommendation", "N/A")
            )?;
        }

        writeln!(out, "\nRECOMMENDATIONS\n{}", thin)?;
        for (i, rec) in self.record.strings("recommendations").iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, rec)?;
        }

        writeln!(out, "{}", rule)
    }
}

/// Run a traceability check through the coercer.
///
/// A model that never answers usefully yields the generic fallback record,
/// which has no score and therefore rates as [`ScoreRating::Poor`].
/// Input missing either code or requirement documents is rejected before
/// any model call.
pub async fn check_traceability(
    coercer: &ResponseCoercer,
    input: &TraceabilityInput,
) -> Result<TraceabilityReport, AiError> {
    if input.is_empty() {
        return Err(AiError::invalid_request(
            "traceability needs both code files and requirement documents",
        ));
    }

    let request = PromptRequest::new(traceability_prompt(
        &input.code_text(),
        &input.document_text(),
    ))
    .with_system_instruction(TRACEABILITY_SYSTEM_INSTRUCTION)
    .with_temperature(TRACEABILITY_TEMPERATURE)
    .with_category(FallbackCategory::Generic);

    let coerced = coercer.coerce_detailed(&request).await;
    let report = TraceabilityReport::from_record(coerced.record, coerced.outcome);
    tracing::info!(
        score = report.score,
        rating = ?report.rating,
        outcome = ?report.outcome,
        "traceability check finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use draftwise_core::diagnostics::MemorySink;
    use draftwise_core::error::AiError;
    use draftwise_core::provider::Provider;
    use draftwise_core::runtime::RuntimeExecutor;
    use draftwise_core::types::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct FixedProvider {
        reply: String,
        seen: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl FixedProvider {
        fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for FixedProvider {
        fn info(&self) -> Arc<ProviderInfo> {
            Arc::new(ProviderInfo {
                id: "openai".to_string(),
                name: "Fixed".to_string(),
            })
        }

        async fn chat_completion(
            &self,
            req: ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, AiError> {
            let model = req.model.clone();
            self.seen.lock().unwrap().push(req);
            Ok(ChatCompletionResponse::from_text(model, self.reply.clone()))
        }
    }

    fn coercer(provider: Arc<FixedProvider>) -> ResponseCoercer {
        ResponseCoercer::new(RuntimeExecutor::builder(provider).finish())
            .with_sink(Arc::new(MemorySink::new()))
    }

    fn input() -> TraceabilityInput {
        let mut input = TraceabilityInput::new();
        input
            .add_code_file("auth.py", "def login(): ...")
            .add_document("frd.txt", "FR-001 User authentication");
        input
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreRating::from_score(100), ScoreRating::Excellent);
        assert_eq!(ScoreRating::from_score(85), ScoreRating::Excellent);
        assert_eq!(ScoreRating::from_score(84), ScoreRating::Good);
        assert_eq!(ScoreRating::from_score(70), ScoreRating::Good);
        assert_eq!(ScoreRating::from_score(50), ScoreRating::Moderate);
        assert_eq!(ScoreRating::from_score(49), ScoreRating::Poor);
        assert_eq!(ScoreRating::from_score(0), ScoreRating::Poor);
    }

    #[test]
    fn test_prompt_truncates_each_side() {
        let code = "c".repeat(SECTION_CHARS + 100);
        let docs = "d".repeat(SECTION_CHARS + 100);
        let prompt = traceability_prompt(&code, &docs);

        assert!(prompt.contains(&format!("CODE IMPLEMENTATION:\n{}\n\n", "c".repeat(SECTION_CHARS))));
        assert!(!prompt.contains(&"c".repeat(SECTION_CHARS + 1)));
        assert!(!prompt.contains(&"d".repeat(SECTION_CHARS + 1)));
        assert!(prompt.ends_with(TRACEABILITY_SHAPE));
    }

    #[test]
    fn test_input_sections_are_capped() {
        let mut input = TraceabilityInput::new();
        input.add_code_file("big.rs", &"x".repeat(CODE_FILE_CHARS * 2));
        input.add_document("requirements.txt", &"y".repeat(DOCUMENT_CHARS * 2));

        assert_eq!(
            input.code_text(),
            format!("=== big.rs ===\n{}\n", "x".repeat(CODE_FILE_CHARS))
        );
        assert!(input.document_text().starts_with("=== requirements.txt ===\n"));
        assert!(!input.document_text().contains(&"y".repeat(DOCUMENT_CHARS + 1)));
    }

    #[test]
    fn test_shape_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(TRACEABILITY_SHAPE).unwrap();
        assert_eq!(value["overall_score"], 85);
    }

    #[tokio::test]
    async fn test_check_traceability_reads_score_and_gaps() {
        let reply = json!({
            "overall_score": 72.6,
            "coverage_analysis": {"requirements_implemented": 4, "total_requirements": 5},
            "gaps_identified": [
                {"severity": "High", "requirement": "FR-005", "gap_type": "Missing Feature", "recommendation": "Add it"},
                {"severity": "Low", "requirement": "FR-009"}
            ],
            "recommendations": ["Add password reset"]
        });
        let provider = Arc::new(FixedProvider::new(reply.to_string()));
        let report = check_traceability(&coercer(provider.clone()), &input())
            .await
            .unwrap();

        assert_eq!(report.score, 72);
        assert_eq!(report.rating, ScoreRating::Good);
        assert_eq!(report.outcome, CoerceOutcome::Parsed { attempt: 1 });
        assert_eq!(report.requirements_met(), (4, 5));
        assert_eq!(report.gaps_with_severity("High").len(), 1);
        assert!(report.gaps_with_severity("Medium").is_empty());

        let text = report.render_text();
        assert!(text.contains("OVERALL SCORE: 72%"));
        assert!(text.contains("[High] FR-005\n  Type: Missing Feature\n  Action: Add it"));
        assert!(text.contains("1. Add password reset"));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, Some(TRACEABILITY_TEMPERATURE));
        assert_eq!(seen[0].messages[0].text(), TRACEABILITY_SYSTEM_INSTRUCTION);
        assert!(seen[0].messages[1].text().contains("=== auth.py ==="));
    }

    #[tokio::test]
    async fn test_unusable_answers_rate_poor() {
        let provider = Arc::new(FixedProvider::new("I cannot help with that."));
        let report = check_traceability(&coercer(provider), &input())
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            CoerceOutcome::Fallback {
                category: FallbackCategory::Generic
            }
        );
        assert_eq!(report.score, 0);
        assert_eq!(report.rating, ScoreRating::Poor);
        assert_eq!(report.requirements_met(), (0, 0));
    }

    #[tokio::test]
    async fn test_missing_side_is_rejected_without_model_call() {
        let mut code_only = TraceabilityInput::new();
        code_only.add_code_file("auth.py", "def login(): ...");
        let mut docs_only = TraceabilityInput::new();
        docs_only.add_document("frd.txt", "FR-001 User authentication");

        for input in [TraceabilityInput::new(), code_only, docs_only] {
            assert!(input.is_empty());
            let provider = Arc::new(FixedProvider::new(r#"{"overall_score": 90}"#));
            let err = check_traceability(&coercer(provider.clone()), &input)
                .await
                .unwrap_err();

            assert!(matches!(err, AiError::InvalidRequest(_)));
            assert!(provider.seen.lock().unwrap().is_empty());
        }
    }
}
