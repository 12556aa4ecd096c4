use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use super::ProviderKind;

/// Environment-driven configuration for the analysis client.
///
/// A missing API key is not an error here; `SeoAnalyzer::analyze` reports it as
/// `AnalysisError::MissingCredential` before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyzerSettings {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl AnalyzerSettings {
    pub const PROVIDER_ENV: &'static str = "SEO_AUDIT_PROVIDER";
    pub const API_KEY_ENV: &'static str = "SEO_AUDIT_API_KEY";
    pub const ENDPOINT_ENV: &'static str = "SEO_AUDIT_ENDPOINT";
    pub const MODEL_ENV: &'static str = "SEO_AUDIT_MODEL";
    pub const TIMEOUT_ENV: &'static str = "SEO_AUDIT_TIMEOUT_SECS";

    /// Load settings from environment variables.
    ///
    /// * `SEO_AUDIT_PROVIDER` — `gemini` (default) or `openai`.
    /// * `SEO_AUDIT_API_KEY`  — API key for the provider.
    /// * `SEO_AUDIT_ENDPOINT` — Optional custom base URL.
    /// * `SEO_AUDIT_MODEL`    — Optional model override.
    /// * `SEO_AUDIT_TIMEOUT_SECS` — Optional request timeout.
    pub fn from_env() -> Result<Self> {
        Self::from_map(std::env::vars().collect())
    }

    /// Load settings from an arbitrary variable map keyed by the `SEO_AUDIT_*` names.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        let value = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match value(Self::PROVIDER_ENV) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid {} value", Self::PROVIDER_ENV))?,
            None => ProviderKind::default(),
        };
        let timeout_secs = value(Self::TIMEOUT_ENV).and_then(|v| v.parse::<u64>().ok());

        Ok(Self {
            provider,
            api_key: value(Self::API_KEY_ENV),
            endpoint: value(Self::ENDPOINT_ENV),
            model: value(Self::MODEL_ENV),
            timeout_secs,
        })
    }

    /// Model identifier sent with each request.
    pub fn model_id(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
