//! Azure OpenAI deployments.
//!
//! Settings come from the environment:
//!
//! | variable                   | required |
//! |----------------------------|----------|
//! | `AZURE_OPENAI_ENDPOINT`    | yes      |
//! | `AZURE_OPENAI_API_KEY`     | yes      |
//! | `AZURE_OPENAI_DEPLOYMENT`  | yes      |
//! | `AZURE_OPENAI_API_VERSION` | no       |

use crate::openai::OpenAiProvider;
use async_openai::config::AzureConfig;
use async_openai::Client;
use draftwise_core::error::AiError;

/// API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";

pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";

/// Connection settings for one Azure OpenAI deployment
#[derive(Clone, PartialEq, Eq)]
pub struct AzureSettings {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

impl std::fmt::Debug for AzureSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AzureSettings {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, AiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup function
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| {
                AiError::configuration(format!("missing environment variable {}", name))
            })
        };

        Ok(Self {
            endpoint: require(ENDPOINT_VAR)?,
            api_key: require(API_KEY_VAR)?,
            deployment: require(DEPLOYMENT_VAR)?,
            api_version: get(API_VERSION_VAR).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }
}

/// Create an Azure OpenAI provider for a deployment
///
/// The deployment name is part of the request URL, so the runtime model name
/// is only informational for this provider.
pub fn azure(settings: AzureSettings) -> Result<OpenAiProvider<AzureConfig>, AiError> {
    if !settings.endpoint.starts_with("http://") && !settings.endpoint.starts_with("https://") {
        return Err(AiError::configuration(format!(
            "Azure endpoint must be an http(s) URL, got {:?}",
            settings.endpoint
        )));
    }

    tracing::debug!(
        endpoint = %settings.endpoint,
        deployment = %settings.deployment,
        api_version = %settings.api_version,
        "configuring Azure OpenAI provider"
    );

    let config = AzureConfig::new()
        .with_api_base(settings.endpoint)
        .with_api_key(settings.api_key)
        .with_deployment_id(settings.deployment)
        .with_api_version(settings.api_version);

    Ok(OpenAiProvider::with_client(
        Client::with_config(config),
        "azure",
        "Azure OpenAI",
    ))
}
