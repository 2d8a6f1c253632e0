//! Analysis prompts.
//!
//! Every prompt has the same layout: a task heading, an optional list of
//! focus points, the project context (free-text description or codebase
//! excerpt) and the JSON shape the answer must follow.

use crate::source::CodebaseDigest;
use draftwise_core::coerce::FallbackCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// System instruction sent with every analysis prompt
pub const SYSTEM_INSTRUCTION: &str = "You are a senior business analyst and solution architect. \
Produce detailed, specific project documentation. You MUST respond with ONLY valid JSON, \
with no markdown fencing and no explanatory text.";

const JSON_DIRECTIVE: &str =
    "Respond strictly in JSON format, without any markdown or explanations, using this structure:";

const BUSINESS_SHAPE: &str = r#"{
    "business_problem": "...",
    "value_propositions": ["..."],
    "target_users": ["..."],
    "business_benefits": ["..."],
    "competitive_advantages": ["..."],
    "executive_summary": "..."
}"#;

const APP_ARCHITECTURE_SHAPE: &str = r#"{
    "architecture_layers": [{"name": "...", "description": "...", "components": ["..."]}],
    "services": [{"name": "...", "type": "...", "responsibility": "...", "technologies": ["..."]}],
    "communication_patterns": ["..."],
    "deployment_model": "...",
    "scalability_approach": "...",
    "performance_optimization": ["..."]
}"#;

const TECH_ARCHITECTURE_SHAPE: &str = r#"{
    "frontend_stack": [{"technology": "...", "purpose": "..."}],
    "backend_stack": [{"technology": "...", "purpose": "..."}],
    "database_stack": [{"technology": "...", "purpose": "..."}],
    "infrastructure": [{"component": "...", "technology": "...", "purpose": "..."}],
    "integration_points": [{"system": "...", "method": "...", "protocol": "..."}],
    "security_layers": ["..."],
    "cicd_pipeline": ["..."],
    "monitoring_tools": ["..."]
}"#;

const DATABASE_SHAPE: &str = r#"{
    "database_type": "...",
    "entities": [{"name": "...", "description": "...", "attributes": [{"name": "...", "type": "...", "constraints": "..."}], "primary_key": "...", "indexes": ["..."]}],
    "relationships": [{"from": "...", "to": "...", "type": "one-to-many/many-to-many", "description": "..."}],
    "optimization_strategies": ["..."],
    "backup_strategy": "...",
    "data_security": ["..."]
}"#;

const UIUX_SHAPE: &str = r#"{
    "user_personas": [{"name": "...", "role": "...", "goals": ["..."], "pain_points": ["..."]}],
    "user_journeys": [{"persona": "...", "journey": "...", "steps": ["..."], "touchpoints": ["..."]}],
    "key_screens": [{"screen_name": "...", "purpose": "...", "components": ["..."], "interactions": ["..."]}],
    "design_system": {"colors": ["..."], "typography": ["..."], "components": ["..."]},
    "accessibility_features": ["..."],
    "responsive_breakpoints": ["..."]
}"#;

const FRD_SHAPE: &str = r#"{
    "functional_requirements": [{"id": "FR-001", "requirement": "...", "priority": "High/Medium/Low", "category": "...", "description": "...", "acceptance_criteria": ["..."]}],
    "use_cases": [{"id": "UC-001", "title": "...", "actor": "...", "description": "...", "preconditions": ["..."], "steps": ["..."], "postconditions": ["..."], "alternate_flows": ["..."]}],
    "business_rules": [{"rule_id": "BR-001", "rule": "...", "rationale": "..."}],
    "data_requirements": [{"entity": "...", "requirements": ["..."]}],
    "interface_requirements": [{"interface": "...", "type": "...", "requirements": ["..."]}],
    "non_functional_requirements": [{"category": "Performance/Security/Usability", "requirement": "...", "metric": "..."}],
    "confidence_score": ["coverage of the use case, out of 100, as a percentage"]
}"#;

const TEST_SHAPE: &str = r#"{
    "test_strategy": "...",
    "test_scenarios": [{"id": "TS-001", "scenario": "...", "type": "Functional/Integration/UI", "priority": "High/Medium/Low"}],
    "test_cases": [{"id": "TC-001", "scenario_id": "TS-001", "title": "...", "preconditions": ["..."], "steps": ["..."], "expected_results": ["..."], "test_data": "..."}],
    "automation_candidates": ["..."],
    "performance_tests": [{"test": "...", "criteria": "...", "expected_result": "..."}],
    "security_tests": [{"test": "...", "description": "..."}]
}"#;

const USER_MANUAL_SHAPE: &str = r#"{
    "introduction": "...",
    "getting_started": [{"step": "...", "description": "...", "screenshot_note": "..."}],
    "features": [{"feature": "...", "description": "...", "how_to_use": ["..."], "tips": ["..."]}],
    "common_tasks": [{"task": "...", "steps": ["..."], "notes": ["..."]}],
    "troubleshooting": [{"issue": "...", "solution": "...", "prevention": "..."}],
    "faq": [{"question": "...", "answer": "..."}],
    "support_info": {"contact": "...", "hours": "...", "resources": ["..."]}
}"#;

const BUSINESS_FOCUS: &[&str] = &[
    "Main business problem it solves",
    "Key value propositions",
    "Target users/stakeholders",
    "Business benefits and ROI potential",
    "Competitive advantages",
];

const ARCHITECTURE_FOCUS: &[&str] = &[
    "Architecture layers and tiers",
    "Application components and services",
    "Communication patterns",
    "Deployment architecture",
    "Scalability and performance design",
];

const TECH_FOCUS: &[&str] = &[
    "Technology stack (frontend, backend, database, infrastructure)",
    "Integration architecture",
    "Security architecture",
    "DevOps and CI/CD pipeline",
    "Monitoring and logging",
];

const DATABASE_FOCUS: &[&str] = &[
    "Entity-Relationship model",
    "Core tables/collections",
    "Relationships and constraints",
    "Indexes and optimization",
    "Data security and backup strategy",
];

const UIUX_FOCUS: &[&str] = &[
    "User personas",
    "User journeys and workflows",
    "Key screens and wireframes description",
    "Design system and components",
    "Accessibility and responsive design",
];

const FRD_COVERAGE_NOTE: &str = "Make sure every aspect of the use case is covered, and report \
in confidence_score how completely the requirements cover it, out of 100, as a percentage.";

/// One of the eight analyses run for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Business,
    AppArchitecture,
    TechArchitecture,
    DatabaseDesign,
    UiuxDesign,
    Frd,
    TestScripts,
    UserManual,
}

impl AnalysisKind {
    /// All kinds in the order they are run
    pub const ALL: [AnalysisKind; 8] = [
        AnalysisKind::Business,
        AnalysisKind::AppArchitecture,
        AnalysisKind::TechArchitecture,
        AnalysisKind::DatabaseDesign,
        AnalysisKind::UiuxDesign,
        AnalysisKind::Frd,
        AnalysisKind::TestScripts,
        AnalysisKind::UserManual,
    ];

    /// Stable key used in sessions and serialized output
    pub fn key(&self) -> &'static str {
        match self {
            AnalysisKind::Business => "business",
            AnalysisKind::AppArchitecture => "app_architecture",
            AnalysisKind::TechArchitecture => "tech_architecture",
            AnalysisKind::DatabaseDesign => "database_design",
            AnalysisKind::UiuxDesign => "uiux_design",
            AnalysisKind::Frd => "frd",
            AnalysisKind::TestScripts => "test_scripts",
            AnalysisKind::UserManual => "user_manual",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn progress_message(&self) -> &'static str {
        match self {
            AnalysisKind::Business => "Analyzing business requirements...",
            AnalysisKind::AppArchitecture => "Designing application architecture...",
            AnalysisKind::TechArchitecture => "Designing technical architecture...",
            AnalysisKind::DatabaseDesign => "Designing database schema...",
            AnalysisKind::UiuxDesign => "Planning UI/UX design...",
            AnalysisKind::Frd => "Generating detailed FRD...",
            AnalysisKind::TestScripts => "Creating test scripts...",
            AnalysisKind::UserManual => "Writing user manual...",
        }
    }

    /// Template used when the model never produces a usable object
    pub fn fallback_category(&self) -> FallbackCategory {
        match self {
            AnalysisKind::Business => FallbackCategory::Business,
            AnalysisKind::AppArchitecture => FallbackCategory::ArchitectureLayers,
            AnalysisKind::TechArchitecture => FallbackCategory::TechnicalArchitecture,
            AnalysisKind::DatabaseDesign => FallbackCategory::Database,
            AnalysisKind::UiuxDesign => FallbackCategory::Uiux,
            AnalysisKind::Frd => FallbackCategory::Frd,
            AnalysisKind::TestScripts => FallbackCategory::Test,
            AnalysisKind::UserManual => FallbackCategory::UserManual,
        }
    }

    /// JSON shape the answer must follow
    pub fn shape(&self) -> &'static str {
        match self {
            AnalysisKind::Business => BUSINESS_SHAPE,
            AnalysisKind::AppArchitecture => APP_ARCHITECTURE_SHAPE,
            AnalysisKind::TechArchitecture => TECH_ARCHITECTURE_SHAPE,
            AnalysisKind::DatabaseDesign => DATABASE_SHAPE,
            AnalysisKind::UiuxDesign => UIUX_SHAPE,
            AnalysisKind::Frd => FRD_SHAPE,
            AnalysisKind::TestScripts => TEST_SHAPE,
            AnalysisKind::UserManual => USER_MANUAL_SHAPE,
        }
    }

    fn focus(&self) -> &'static [&'static str] {
        match self {
            AnalysisKind::Business => BUSINESS_FOCUS,
            AnalysisKind::AppArchitecture => ARCHITECTURE_FOCUS,
            AnalysisKind::TechArchitecture => TECH_FOCUS,
            AnalysisKind::DatabaseDesign => DATABASE_FOCUS,
            AnalysisKind::UiuxDesign => UIUX_FOCUS,
            AnalysisKind::Frd | AnalysisKind::TestScripts | AnalysisKind::UserManual => &[],
        }
    }

    fn text_heading(&self) -> &'static str {
        match self {
            AnalysisKind::Business => {
                "Analyze this project description from a BUSINESS PERSPECTIVE and provide:"
            }
            AnalysisKind::AppArchitecture => "Design detailed application architecture:",
            AnalysisKind::TechArchitecture => "Design comprehensive technical architecture:",
            AnalysisKind::DatabaseDesign => "Design comprehensive database schema and data models:",
            AnalysisKind::UiuxDesign => "Create comprehensive UI/UX design specifications:",
            AnalysisKind::Frd => "Create a comprehensive Functional Requirements Document:",
            AnalysisKind::TestScripts => "Create comprehensive functional test scripts:",
            AnalysisKind::UserManual => "Create comprehensive user manual content:",
        }
    }

    fn codebase_heading(&self) -> &'static str {
        match self {
            AnalysisKind::Business => {
                "Analyze this codebase from a BUSINESS PERSPECTIVE and provide:"
            }
            AnalysisKind::AppArchitecture => "Analyze application architecture from codebase:",
            AnalysisKind::TechArchitecture => "Analyze technical architecture from codebase:",
            AnalysisKind::DatabaseDesign => "Analyze database schema from codebase:",
            AnalysisKind::UiuxDesign => "Analyze UI/UX design from codebase:",
            AnalysisKind::Frd => "Create FRD from codebase analysis:",
            AnalysisKind::TestScripts => "Create test scripts based on codebase:",
            AnalysisKind::UserManual => "Create user manual based on codebase:",
        }
    }

    /// How many sample files the codebase prompt includes
    pub fn sample_files(&self) -> usize {
        match self {
            AnalysisKind::Business
            | AnalysisKind::Frd
            | AnalysisKind::TestScripts
            | AnalysisKind::UserManual => 3,
            AnalysisKind::AppArchitecture
            | AnalysisKind::TechArchitecture
            | AnalysisKind::DatabaseDesign
            | AnalysisKind::UiuxDesign => 5,
        }
    }

    /// Prompt for a free-text project description
    pub fn text_prompt(&self, description: &str) -> String {
        let context = format!("Project Description:\n{}", description);
        self.compose(self.text_heading(), &context)
    }

    /// Prompt for an uploaded codebase
    pub fn codebase_prompt(&self, digest: &CodebaseDigest) -> String {
        let samples = digest.sample.format_for_prompt(self.sample_files());
        let context = match self {
            AnalysisKind::Business => format!(
                "Codebase structure:\n{}\n\nSample files:\n{}",
                digest.summary, samples
            ),
            _ => format!("Files:\n{}", samples),
        };
        self.compose(self.codebase_heading(), &context)
    }

    fn compose(&self, heading: &str, context: &str) -> String {
        let mut prompt = String::from(heading);

        for (i, point) in self.focus().iter().enumerate() {
            prompt.push_str(&format!("\n{}. {}", i + 1, point));
        }

        prompt.push_str("\n\n");
        prompt.push_str(context);

        if *self == AnalysisKind::Frd {
            prompt.push_str("\n\n");
            prompt.push_str(FRD_COVERAGE_NOTE);
        }

        prompt.push_str("\n\n");
        prompt.push_str(JSON_DIRECTIVE);
        prompt.push('\n');
        prompt.push_str(self.shape());
        prompt
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CodebaseSnapshot;

    #[test]
    fn test_keys_round_trip() {
        for kind in AnalysisKind::ALL {
            assert_eq!(AnalysisKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(AnalysisKind::from_key("nope"), None);
    }

    #[test]
    fn test_serde_uses_key() {
        let json = serde_json::to_string(&AnalysisKind::TechArchitecture).unwrap();
        assert_eq!(json, "\"tech_architecture\"");
    }

    #[test]
    fn test_shapes_are_valid_json_objects() {
        for kind in AnalysisKind::ALL {
            let value: serde_json::Value = serde_json::from_str(kind.shape())
                .unwrap_or_else(|e| panic!("{kind} shape: {e}"));
            assert!(value.is_object(), "{kind}");
        }
    }

    #[test]
    fn test_shape_keys_match_fallback_template() {
        for kind in AnalysisKind::ALL {
            let shape: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(kind.shape()).unwrap();
            let template = kind.fallback_category().template();
            for key in template.keys() {
                assert!(shape.contains_key(key), "{kind} shape lacks {key}");
            }
        }
    }

    #[test]
    fn test_text_prompt_layout() {
        let prompt = AnalysisKind::Business.text_prompt("An online bookstore");

        assert!(prompt.starts_with("Analyze this project description from a BUSINESS PERSPECTIVE"));
        assert!(prompt.contains("\n1. Main business problem it solves"));
        assert!(prompt.contains("\n5. Competitive advantages"));
        assert!(prompt.contains("Project Description:\nAn online bookstore"));
        assert!(prompt.ends_with(BUSINESS_SHAPE));
    }

    #[test]
    fn test_frd_prompt_asks_for_coverage() {
        let prompt = AnalysisKind::Frd.text_prompt("Payroll system");
        assert!(prompt.contains("confidence_score"));
        assert!(prompt.contains(FRD_COVERAGE_NOTE));
        assert!(!prompt.contains("\n1. "));
    }

    #[test]
    fn test_codebase_prompt_sample_sizes() {
        let snapshot = CodebaseSnapshot::from_files((0..8).map(|i| (format!("f{i}.py"), "pass")));
        let digest = snapshot.digest();

        let business = AnalysisKind::Business.codebase_prompt(&digest);
        assert!(business.contains("Codebase structure:\nFile: f0.py\nLines: 1"));
        assert!(business.contains("--- f2.py ---"));
        assert!(!business.contains("--- f3.py ---"));

        let database = AnalysisKind::DatabaseDesign.codebase_prompt(&digest);
        assert!(database.starts_with("Analyze database schema from codebase:"));
        assert!(database.contains("--- f4.py ---"));
        assert!(!database.contains("--- f5.py ---"));
        assert!(!database.contains("Codebase structure"));
    }
}
