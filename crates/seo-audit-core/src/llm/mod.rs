mod gemini;
mod openai;
mod settings;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::error::ProviderError;
use crate::prompt::AnalysisRequest;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use settings::AnalyzerSettings;

/// Sampling temperature for every analysis request; kept low to reduce variance.
pub const TEMPERATURE: f64 = 0.2;

const USER_AGENT: &str = concat!("seo-audit/", env!("CARGO_PKG_VERSION"));
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Supported analysis providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown provider `{0}` (expected `gemini` or `openai`)")]
pub struct UnknownProvider(String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            _ => Err(UnknownProvider(raw.to_string())),
        }
    }
}

/// One outbound request: credential, model, sampling settings and the analysis request.
#[derive(Debug, Clone, Copy)]
pub struct ProviderCall<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub temperature: f64,
    pub request: &'a AnalysisRequest,
}

/// Transport seam to the external generative-language service.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Submit one request and return the raw text payload of the reply.
    async fn generate(&self, call: &ProviderCall<'_>) -> Result<String, ProviderError>;
}

/// Construct the provider adapter selected in `settings`.
pub fn provider_for(settings: &AnalyzerSettings) -> Result<Box<dyn AnalysisProvider>> {
    match settings.provider {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(settings)?)),
        ProviderKind::OpenAi => Ok(Box::new(OpenAiProvider::new(settings)?)),
    }
}

fn http_client(settings: &AnalyzerSettings) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(
            settings
                .timeout()
                .unwrap_or(std::time::Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
        )
        .build()
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Turn a non-success response into a `ProviderError`, preferring the provider's own message.
async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(reqwest::Error::without_url);
    ProviderError::Status {
        status,
        message: body_message(body),
    }
}

fn body_message<E: fmt::Display>(body: Result<String, E>) -> String {
    match body {
        Ok(body) => error_message(&body),
        Err(err) => format!("failed to read error body: {err}"),
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(" OpenAI ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        let err = "bard".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn error_message_prefers_provider_payload() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid");
        assert_eq!(error_message("  upstream exploded "), "upstream exploded");
        assert_eq!(error_message(""), "empty response body");
    }

    #[test]
    fn unreadable_error_body_keeps_read_failure() {
        let message = body_message::<&str>(Err("connection reset by peer"));
        assert_eq!(message, "failed to read error body: connection reset by peer");
        assert_eq!(body_message::<&str>(Ok(String::new())), "empty response body");
    }

    #[test]
    fn provider_for_honours_selected_kind() {
        let settings = AnalyzerSettings {
            provider: ProviderKind::OpenAi,
            ..AnalyzerSettings::default()
        };
        assert_eq!(provider_for(&settings).unwrap().name(), "openai");
        assert_eq!(
            provider_for(&AnalyzerSettings::default()).unwrap().name(),
            "gemini"
        );
    }
}
