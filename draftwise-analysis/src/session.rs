//! Analysis session state.

use crate::prompts::AnalysisKind;
use draftwise_core::record::StructuredRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PROJECT_NAME: &str = "My Project";
pub const DEFAULT_COMPANY_NAME: &str = "Your Company";

/// Where the project context comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// An uploaded codebase
    #[default]
    Upload,
    /// A free-text project description
    Text,
}

/// State of one analysis run, owned by the caller.
///
/// The analyzer takes the session by mutable reference, clears previous
/// results, stores a record per [`AnalysisKind`] and marks it complete once
/// every kind has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub input_mode: InputMode,
    pub project_name: String,
    pub company_name: String,
    analyses: BTreeMap<AnalysisKind, StructuredRecord>,
    complete: bool,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(InputMode::default())
    }
}

impl AnalysisSession {
    pub fn new(input_mode: InputMode) -> Self {
        Self {
            input_mode,
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            analyses: BTreeMap::new(),
            complete: false,
        }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = name.into();
        self
    }

    pub fn record(&self, kind: AnalysisKind) -> Option<&StructuredRecord> {
        self.analyses.get(&kind)
    }

    /// Records in [`AnalysisKind::ALL`] order
    pub fn records(&self) -> impl Iterator<Item = (AnalysisKind, &StructuredRecord)> {
        self.analyses.iter().map(|(kind, record)| (*kind, record))
    }

    pub fn insert(&mut self, kind: AnalysisKind, record: StructuredRecord) {
        self.analyses.insert(kind, record);
        self.complete = self.analyses.len() == AnalysisKind::ALL.len();
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Drop all results, keeping the project settings
    pub fn reset(&mut self) {
        self.analyses.clear();
        self.complete = false;
    }

    /// All records keyed by [`AnalysisKind::key`]
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .analyses
            .iter()
            .map(|(kind, record)| {
                (
                    kind.key().to_string(),
                    serde_json::Value::Object(record.clone()),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str) -> StructuredRecord {
        let mut record = StructuredRecord::new();
        record.insert(key.to_string(), serde_json::Value::Bool(true));
        record
    }

    #[test]
    fn test_defaults() {
        let session = AnalysisSession::default();
        assert_eq!(session.input_mode, InputMode::Upload);
        assert_eq!(session.project_name, DEFAULT_PROJECT_NAME);
        assert_eq!(session.company_name, DEFAULT_COMPANY_NAME);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_complete_once_every_kind_is_stored() {
        let mut session = AnalysisSession::new(InputMode::Text).with_project_name("Shop");

        for kind in &AnalysisKind::ALL[..7] {
            session.insert(*kind, record(kind.key()));
            assert!(!session.is_complete());
        }
        session.insert(AnalysisKind::UserManual, record("manual"));
        assert!(session.is_complete());

        session.reset();
        assert!(!session.is_complete());
        assert!(session.record(AnalysisKind::Business).is_none());
        assert_eq!(session.project_name, "Shop");
    }

    #[test]
    fn test_to_json_uses_keys() {
        let mut session = AnalysisSession::new(InputMode::Text);
        session.insert(AnalysisKind::DatabaseDesign, record("database_type"));

        let json = session.to_json();
        assert_eq!(json["database_design"]["database_type"], true);
    }

    #[test]
    fn test_serde_round_trip_keeps_records() {
        let mut session = AnalysisSession::new(InputMode::Text).with_company_name("Acme");
        session.insert(AnalysisKind::Frd, record("functional_requirements"));

        let text = serde_json::to_string(&session).unwrap();
        let restored: AnalysisSession = serde_json::from_str(&text).unwrap();

        assert_eq!(restored.company_name, "Acme");
        assert_eq!(restored.input_mode, InputMode::Text);
        assert!(restored.record(AnalysisKind::Frd).is_some());
    }
}
