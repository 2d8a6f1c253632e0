//! # Draftwise Analysis
//!
//! Turns a project description or an extracted codebase into eight
//! structured documentation records: business case, application and
//! technical architecture, database design, UI/UX design, functional
//! requirements, test scripts and a user manual. Each record comes from a
//! [`ResponseCoercer`](draftwise_core::ResponseCoercer) call, so a run always
//! completes, even against a misbehaving model.
//!
//! ```ignore
//! use draftwise_analysis::{AnalysisInput, AnalysisSession, Analyzer, InputMode};
//!
//! let analyzer = Analyzer::new(coercer);
//! let mut session = AnalysisSession::new(InputMode::Text).with_project_name("Bookstore");
//! let report = analyzer
//!     .run(&mut session, &AnalysisInput::Description(text), |p| {
//!         println!("[{:>3}%] {}", p.percent(), p.message)
//!     })
//!     .await?;
//! ```
//!
//! The crate also carries the requirements traceability check, which scores
//! how well a codebase implements a set of requirement documents.

pub mod analyzer;
pub mod prompts;
pub mod session;
pub mod source;
pub mod traceability;

// Re-exports
pub use analyzer::{AnalysisInput, AnalysisReport, Analyzer, Progress};
pub use prompts::{AnalysisKind, SYSTEM_INSTRUCTION};
pub use session::{AnalysisSession, InputMode};
pub use source::{is_code_file, CodebaseDigest, CodebaseSnapshot, SourceFile};
pub use traceability::{
    check_traceability, traceability_prompt, ScoreRating, TraceabilityInput, TraceabilityReport,
};
