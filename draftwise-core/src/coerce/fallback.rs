//! Fallback templates used when model output cannot be recovered.
//!
//! Every template is fully populated with placeholder values and carries the
//! same keys, nesting and list/scalar types as the happy-path shape its
//! analysis prompt asks for, so renderers always have something to read.

use crate::record::StructuredRecord;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Template family selected when coercion gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackCategory {
    Business,
    ArchitectureLayers,
    TechnicalArchitecture,
    Database,
    Uiux,
    Frd,
    Test,
    UserManual,
    Generic,
}

/// Keywords in priority order; the first category with a matching
/// marker wins. Markers are matched as lowercase substrings of the prompt.
const SNIFF_ORDER: &[(FallbackCategory, &[&str])] = &[
    (FallbackCategory::Business, &["business", "executive"]),
    (
        FallbackCategory::ArchitectureLayers,
        &["application architecture", "architecture_layers"],
    ),
    (
        FallbackCategory::TechnicalArchitecture,
        &["technical architecture", "technology stack"],
    ),
    (FallbackCategory::Database, &["database"]),
    (FallbackCategory::Uiux, &["ui", "ux"]),
    (FallbackCategory::Frd, &["frd", "functional requirements"]),
    (FallbackCategory::Test, &["test"]),
    (FallbackCategory::UserManual, &["user manual"]),
];

impl FallbackCategory {
    /// All categories, generic last
    pub const ALL: [FallbackCategory; 9] = [
        FallbackCategory::Business,
        FallbackCategory::ArchitectureLayers,
        FallbackCategory::TechnicalArchitecture,
        FallbackCategory::Database,
        FallbackCategory::Uiux,
        FallbackCategory::Frd,
        FallbackCategory::Test,
        FallbackCategory::UserManual,
        FallbackCategory::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackCategory::Business => "business",
            FallbackCategory::ArchitectureLayers => "architecture_layers",
            FallbackCategory::TechnicalArchitecture => "technical_architecture",
            FallbackCategory::Database => "database",
            FallbackCategory::Uiux => "uiux",
            FallbackCategory::Frd => "frd",
            FallbackCategory::Test => "test",
            FallbackCategory::UserManual => "user_manual",
            FallbackCategory::Generic => "generic",
        }
    }

    /// Guess the category from prompt text.
    ///
    /// Compatibility path for callers that do not pass an explicit category.
    /// Note the `ui` keyword matches inside ordinary words such as "build".
    pub fn sniff(prompt: &str) -> Self {
        let lowered = prompt.to_lowercase();
        SNIFF_ORDER
            .iter()
            .find(|(_, markers)| markers.iter().any(|m| lowered.contains(m)))
            .map(|(category, _)| *category)
            .unwrap_or(FallbackCategory::Generic)
    }

    /// A fresh copy of this category's template
    pub fn template(&self) -> StructuredRecord {
        TEMPLATES.get(self).cloned().unwrap_or_default()
    }
}

impl std::fmt::Display for FallbackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template for a prompt, chosen by keyword sniffing.
pub fn fallback_for(prompt: &str) -> StructuredRecord {
    FallbackCategory::sniff(prompt).template()
}

static TEMPLATES: Lazy<HashMap<FallbackCategory, StructuredRecord>> = Lazy::new(|| {
    FallbackCategory::ALL
        .iter()
        .map(|category| (*category, into_record(template_value(*category))))
        .collect()
});

fn into_record(value: Value) -> StructuredRecord {
    match value {
        Value::Object(map) => map,
        _ => StructuredRecord::new(),
    }
}

fn template_value(category: FallbackCategory) -> Value {
    match category {
        FallbackCategory::Business => json!({
            "business_problem": "Analysis in progress - please review generated documents",
            "value_propositions": ["Comprehensive solution", "Scalable architecture", "User-focused design"],
            "target_users": ["End users", "Administrators", "Stakeholders"],
            "business_benefits": ["Improved efficiency", "Cost reduction", "Enhanced user experience"],
            "competitive_advantages": ["Modern technology stack", "Scalable design"],
            "executive_summary": "Comprehensive business solution with modern architecture and user-centric design."
        }),
        FallbackCategory::ArchitectureLayers => json!({
            "architecture_layers": [
                {"name": "Presentation Layer", "description": "User interface and client-side logic", "components": ["Web UI", "Mobile UI"]},
                {"name": "Business Logic Layer", "description": "Core business rules and processing", "components": ["Services", "Controllers"]},
                {"name": "Data Access Layer", "description": "Database operations and data management", "components": ["Repositories", "Data Models"]},
                {"name": "Infrastructure Layer", "description": "Cross-cutting concerns and utilities", "components": ["Logging", "Security", "Caching"]}
            ],
            "services": [
                {"name": "API Service", "type": "REST API", "responsibility": "Handle client requests", "technologies": ["REST", "HTTP"]},
                {"name": "Business Service", "type": "Core Logic", "responsibility": "Process business rules", "technologies": ["Application Framework"]},
                {"name": "Data Service", "type": "Data Access", "responsibility": "Manage data operations", "technologies": ["ORM", "Database"]}
            ],
            "communication_patterns": ["REST API", "Event-driven", "Request-Response"],
            "deployment_model": "Cloud-native containerized deployment",
            "scalability_approach": "Horizontal scaling with load balancing",
            "performance_optimization": ["Caching", "Connection pooling", "Async processing"]
        }),
        FallbackCategory::TechnicalArchitecture => json!({
            "frontend_stack": [
                {"technology": "React/Vue/Angular", "purpose": "Modern web framework"},
                {"technology": "HTML5/CSS3", "purpose": "Markup and styling"}
            ],
            "backend_stack": [
                {"technology": "Node.js/Python/Java", "purpose": "Server-side logic"},
                {"technology": "REST API", "purpose": "API layer"}
            ],
            "database_stack": [
                {"technology": "PostgreSQL/MySQL", "purpose": "Relational data storage"},
                {"technology": "Redis", "purpose": "Caching"}
            ],
            "infrastructure": [
                {"component": "Cloud Platform", "technology": "AWS/Azure/GCP", "purpose": "Hosting infrastructure"},
                {"component": "Container", "technology": "Docker", "purpose": "Application containerization"}
            ],
            "integration_points": [
                {"system": "External API", "method": "REST", "protocol": "HTTPS"}
            ],
            "security_layers": ["Authentication", "Authorization", "Encryption", "Input Validation"],
            "cicd_pipeline": ["Source Control", "Build", "Test", "Deploy"],
            "monitoring_tools": ["Application logs", "Performance metrics", "Error tracking"]
        }),
        FallbackCategory::Database => json!({
            "database_type": "Relational Database (PostgreSQL/MySQL)",
            "entities": [
                {
                    "name": "User",
                    "description": "User account information",
                    "attributes": [
                        {"name": "id", "type": "integer", "constraints": "PRIMARY KEY"},
                        {"name": "username", "type": "varchar(100)", "constraints": "UNIQUE NOT NULL"},
                        {"name": "email", "type": "varchar(255)", "constraints": "UNIQUE NOT NULL"},
                        {"name": "created_at", "type": "timestamp", "constraints": "DEFAULT CURRENT_TIMESTAMP"}
                    ],
                    "primary_key": "id",
                    "indexes": ["idx_username", "idx_email"]
                }
            ],
            "relationships": [
                {"from": "User", "to": "Profile", "type": "one-to-one", "description": "User has one profile"}
            ],
            "optimization_strategies": ["Indexing on frequently queried columns", "Query optimization", "Connection pooling"],
            "backup_strategy": "Daily automated backups with point-in-time recovery",
            "data_security": ["Encryption at rest", "Encryption in transit", "Access control"]
        }),
        FallbackCategory::Uiux => json!({
            "user_personas": [
                {"name": "Primary User", "role": "End User", "goals": ["Accomplish tasks efficiently"], "pain_points": ["Complex interfaces"]}
            ],
            "user_journeys": [
                {"persona": "Primary User", "journey": "Main workflow", "steps": ["Login", "Navigate", "Complete task"], "touchpoints": ["Web interface"]}
            ],
            "key_screens": [
                {"screen_name": "Dashboard", "purpose": "Overview of key information", "components": ["Navigation", "Content area"], "interactions": ["Click", "Scroll"]}
            ],
            "design_system": {
                "colors": ["Primary color", "Secondary color", "Accent color"],
                "typography": ["Heading font", "Body font"],
                "components": ["Buttons", "Forms", "Cards"]
            },
            "accessibility_features": ["Keyboard navigation", "Screen reader support", "Color contrast"],
            "responsive_breakpoints": ["Mobile: 320px-767px", "Tablet: 768px-1023px", "Desktop: 1024px+"]
        }),
        FallbackCategory::Frd => json!({
            "functional_requirements": [
                {"id": "FR-001", "requirement": "User authentication", "priority": "High", "category": "Security",
                 "description": "System shall provide secure user authentication", "acceptance_criteria": ["Users can login", "Passwords are encrypted"]}
            ],
            "use_cases": [
                {"id": "UC-001", "title": "User Login", "actor": "User", "description": "User logs into the system",
                 "preconditions": ["User has account"], "steps": ["Enter credentials", "Submit form", "System validates"],
                 "postconditions": ["User is authenticated"], "alternate_flows": ["Password reset flow"]}
            ],
            "business_rules": [
                {"rule_id": "BR-001", "rule": "Business rule description", "rationale": "Business justification"}
            ],
            "data_requirements": [
                {"entity": "User", "requirements": ["Store user credentials", "Track login history"]}
            ],
            "interface_requirements": [
                {"interface": "Web Interface", "type": "Browser-based", "requirements": ["Responsive design", "Modern browsers"]}
            ],
            "non_functional_requirements": [
                {"category": "Performance", "requirement": "Page load time", "metric": "< 2 seconds"},
                {"category": "Security", "requirement": "Data encryption", "metric": "256-bit AES"}
            ]
        }),
        FallbackCategory::Test => json!({
            "test_strategy": "Comprehensive testing approach including functional, integration, and system testing",
            "test_scenarios": [
                {"id": "TS-001", "scenario": "User login functionality", "type": "Functional", "priority": "High"}
            ],
            "test_cases": [
                {"id": "TC-001", "scenario_id": "TS-001", "title": "Successful login",
                 "preconditions": ["User account exists"], "steps": ["Enter credentials", "Click login"],
                 "expected_results": ["User is logged in"], "test_data": "Valid credentials"}
            ],
            "automation_candidates": ["Login tests", "API tests"],
            "performance_tests": [
                {"test": "Load test", "criteria": "1000 concurrent users", "expected_result": "Response time < 2s"}
            ],
            "security_tests": [
                {"test": "Authentication test", "description": "Verify secure authentication"}
            ]
        }),
        FallbackCategory::UserManual => json!({
            "introduction": "This user manual provides comprehensive guidance on using the system.",
            "getting_started": [
                {"step": "Installation", "description": "Install the application", "screenshot_note": "Installation wizard"}
            ],
            "features": [
                {"feature": "Main Feature", "description": "Primary functionality",
                 "how_to_use": ["Step 1", "Step 2"], "tips": ["Use shortcuts"]}
            ],
            "common_tasks": [
                {"task": "Common task", "steps": ["Step 1", "Step 2"], "notes": ["Important note"]}
            ],
            "troubleshooting": [
                {"issue": "Common issue", "solution": "Solution steps", "prevention": "How to prevent"}
            ],
            "faq": [
                {"question": "Common question", "answer": "Detailed answer"}
            ],
            "support_info": {
                "contact": "support@company.com",
                "hours": "24/7",
                "resources": ["Documentation", "Knowledge base"]
            }
        }),
        FallbackCategory::Generic => json!({
            "message": "Analysis in progress",
            "status": "Please review generated documents for details"
        }),
    }
}
