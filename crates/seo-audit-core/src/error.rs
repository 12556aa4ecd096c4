use std::error::Error as StdError;

use thiserror::Error;

use crate::llm::AnalyzerSettings;
use crate::schema::SchemaError;

/// Failure of a single `analyze` call. Nothing is recovered locally.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },
    #[error("provider credential is not configured; set {}", AnalyzerSettings::API_KEY_ENV)]
    MissingCredential,
    #[error("failed to get SEO analysis: {0}")]
    Provider(#[from] ProviderError),
    #[error("provider response is not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    #[error(transparent)]
    SchemaViolation(#[from] SchemaError),
}

impl AnalysisError {
    pub(crate) fn invalid_url(input: &str, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Transport or provider-side failure. Always carries the underlying message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider reported an error: {0}")]
    Api(String),
    #[error("provider response contained no text: {0}")]
    EmptyResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    /// The request URL is stripped first; it may carry credentials.
    fn from(err: reqwest::Error) -> Self {
        let timed_out = err.is_timeout();
        let message = describe(&err.without_url());
        if timed_out {
            Self::Timeout(message)
        } else {
            Self::Transport(message)
        }
    }
}

/// Render an error together with its source chain.
fn describe(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
