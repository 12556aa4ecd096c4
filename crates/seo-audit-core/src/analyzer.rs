use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info, instrument, warn};

use crate::error::{AnalysisError, ProviderError};
use crate::llm::{provider_for, AnalysisProvider, AnalyzerSettings, ProviderCall, TEMPERATURE};
use crate::prompt::build_request;
use crate::schema::{validate, AnalysisReport};

/// Normalize user input into an absolute URL string.
///
/// Trims whitespace and prepends `https://` unless the input already starts with
/// `http://` or `https://`. The normalized text is returned as-is once it parses.
pub fn normalize_url(input: &str) -> Result<String, AnalysisError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::invalid_url(input, "please enter a URL"));
    }
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    ensure_absolute_url(&candidate)?;
    Ok(candidate)
}

fn ensure_absolute_url(url: &str) -> Result<(), AnalysisError> {
    let parsed = Url::parse(url).map_err(|err| AnalysisError::invalid_url(url, err))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AnalysisError::invalid_url(
            url,
            format!("unsupported scheme `{}`", parsed.scheme()),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AnalysisError::invalid_url(url, "missing host"));
    }
    Ok(())
}

/// Runs one SEO analysis per call against the configured provider.
///
/// Holds no mutable state; concurrent calls are independent.
pub struct SeoAnalyzer {
    provider: Box<dyn AnalysisProvider>,
    api_key: Option<String>,
    model: String,
    timeout: Option<Duration>,
}

impl SeoAnalyzer {
    pub fn new(settings: &AnalyzerSettings, provider: Box<dyn AnalysisProvider>) -> Self {
        Self {
            provider,
            api_key: settings
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: settings.model_id(),
            timeout: settings.timeout(),
        }
    }

    /// Build an analyzer with the provider adapter named in `settings`.
    pub fn from_settings(settings: &AnalyzerSettings) -> anyhow::Result<Self> {
        Ok(Self::new(settings, provider_for(settings)?))
    }

    /// Upper bound on the wait for the provider; exceeding it yields `ProviderError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Analyze an already-normalized absolute URL. Exactly one provider attempt is made.
    #[instrument(skip(self), fields(provider = self.provider.name(), model = %self.model))]
    pub async fn analyze(&self, url: &str) -> Result<AnalysisReport, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalysisError::MissingCredential)?;
        ensure_absolute_url(url)?;

        let request = build_request(url);
        let call = ProviderCall {
            api_key,
            model: &self.model,
            temperature: TEMPERATURE,
            request: &request,
        };

        debug!("dispatching analysis request");
        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.generate(&call))
                .await
                .map_err(|_| {
                    ProviderError::Timeout(format!("no response within {}ms", limit.as_millis()))
                })??,
            None => self.provider.generate(&call).await?,
        };

        let value: serde_json::Value =
            serde_json::from_str(raw.trim()).map_err(AnalysisError::MalformedResponse)?;
        let report = validate(&value).map_err(|err| {
            warn!(violations = err.violations().len(), "provider response violates report schema");
            err
        })?;

        info!(
            categories = report.len(),
            overall_score = report.overall_score(),
            "analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderKind;
    use crate::schema::REQUIRED_CATEGORIES;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Stub transport replaying a canned reply and recording what it saw.
    struct StubProvider {
        reply: Result<String, ProviderError>,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(String, String, f64, String)>>>,
    }

    impl StubProvider {
        fn replying(reply: Result<String, ProviderError>) -> Self {
            Self {
                reply,
                delay: None,
                calls: Arc::default(),
                seen: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl AnalysisProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn generate(&self, call: &ProviderCall<'_>) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((
                call.api_key.to_string(),
                call.model.to_string(),
                call.temperature,
                call.request.instruction.clone(),
            ));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone()
        }
    }

    fn settings(api_key: Option<&str>) -> AnalyzerSettings {
        AnalyzerSettings {
            provider: ProviderKind::Gemini,
            api_key: api_key.map(str::to_string),
            endpoint: None,
            model: Some("stub-model".into()),
            timeout_secs: None,
        }
    }

    fn conformant() -> Value {
        let mut root = serde_json::Map::new();
        for (idx, key) in REQUIRED_CATEGORIES.iter().enumerate() {
            let status = ["pass", "warn", "fail"][idx % 3];
            root.insert(
                key.to_string(),
                json!({
                    "title": format!("{key} checks"),
                    "score": 50 + idx * 5,
                    "items": [{
                        "id": format!("{key}-1"),
                        "name": "Example",
                        "status": status,
                        "value": "42",
                        "description": "Found",
                        "guidance": "Nothing to do."
                    }]
                }),
            );
        }
        Value::Object(root)
    }

    fn analyzer(stub: StubProvider, api_key: Option<&str>) -> SeoAnalyzer {
        SeoAnalyzer::new(&settings(api_key), Box::new(stub))
    }

    #[test]
    fn normalize_prepends_https() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
        assert_eq!(
            normalize_url("  example.com/blog  ").unwrap(),
            "https://example.com/blog"
        );
    }

    #[test]
    fn normalize_keeps_explicit_scheme() {
        assert_eq!(
            normalize_url("http://example.com").unwrap(),
            "http://example.com"
        );
        assert_eq!(
            normalize_url("https://example.com/?q=1").unwrap(),
            "https://example.com/?q=1"
        );
    }

    #[test]
    fn normalize_rejects_unparsable_input() {
        for bad in ["", "   ", "exa mple.com", "https://"] {
            let err = normalize_url(bad).expect_err("input should be rejected");
            assert!(matches!(err, AnalysisError::InvalidUrl { .. }), "{bad:?}: {err}");
        }
    }

    #[tokio::test]
    async fn missing_credential_makes_no_call() {
        let stub = StubProvider::replying(Ok(conformant().to_string()));
        let calls = Arc::clone(&stub.calls);
        let err = analyzer(stub, None)
            .analyze("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_credential_counts_as_missing() {
        let stub = StubProvider::replying(Ok(conformant().to_string()));
        let calls = Arc::clone(&stub.calls);
        let err = analyzer(stub, Some("  "))
            .analyze("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn relative_url_fails_before_dispatch() {
        let stub = StubProvider::replying(Ok(conformant().to_string()));
        let calls = Arc::clone(&stub.calls);
        let err = analyzer(stub, Some("key"))
            .analyze("example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidUrl { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_json_reply_is_malformed() {
        let stub = StubProvider::replying(Ok("Here is your SEO report!".into()));
        let err = analyzer(stub, Some("key"))
            .analyze("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));
        assert!(err.to_string().contains("expected value"));
    }

    #[tokio::test]
    async fn missing_category_is_schema_violation() {
        let mut payload = conformant();
        payload.as_object_mut().unwrap().remove("links");
        let stub = StubProvider::replying(Ok(payload.to_string()));
        let err = analyzer(stub, Some("key"))
            .analyze("https://example.com")
            .await
            .unwrap_err();
        match err {
            AnalysisError::SchemaViolation(schema) => assert!(schema.mentions("links")),
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conformant_reply_round_trips() {
        let payload = conformant();
        let stub = StubProvider::replying(Ok(format!("\n  {}  \n", payload)));
        let calls = Arc::clone(&stub.calls);
        let seen = Arc::clone(&stub.seen);

        let report = analyzer(stub, Some("secret"))
            .analyze("https://example.com/landing")
            .await
            .expect("analysis should succeed");

        assert_eq!(serde_json::to_value(&report).unwrap(), payload);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let seen = seen.lock().unwrap();
        let (api_key, model, temperature, instruction) = &seen[0];
        assert_eq!(api_key, "secret");
        assert_eq!(model, "stub-model");
        assert!((temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(
            instruction,
            &build_request("https://example.com/landing").instruction
        );
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced_once() {
        let stub = StubProvider::replying(Err(ProviderError::Status {
            status: 500,
            message: "internal error".into(),
        }));
        let calls = Arc::clone(&stub.calls);
        let err = analyzer(stub, Some("key"))
            .analyze("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(ProviderError::Status { status: 500, .. })));
        assert!(err.to_string().contains("internal error"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mut stub = StubProvider::replying(Ok(conformant().to_string()));
        stub.delay = Some(Duration::from_secs(5));
        let err = analyzer(stub, Some("key"))
            .with_timeout(Duration::from_millis(20))
            .analyze("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(ProviderError::Timeout(_))));
        assert!(err.to_string().contains("20ms"));
    }
}
