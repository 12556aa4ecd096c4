use super::{http_client, status_error, AnalysisProvider, AnalyzerSettings, ProviderCall};
use crate::error::ProviderError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const SYSTEM_PROMPT: &str = "You are an SEO analysis service. Reply with one JSON object that conforms to this JSON schema and nothing else:";

/// OpenAI chat-completions adapter using JSON-object response mode.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: Client,
    url: String,
}

impl OpenAiProvider {
    pub fn new(settings: &AnalyzerSettings) -> Result<Self> {
        let base = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let url = format!("{}/v1/chat/completions", base.trim_end_matches('/'));
        let http = http_client(settings).context("failed to build OpenAI HTTP client")?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl AnalysisProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, call: &ProviderCall<'_>) -> Result<String, ProviderError> {
        let payload = request_body(call);
        debug!(model = call.model, "sending chat completion request");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(call.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let chat: ChatCompletionResponse = response.json().await?;
        chat.choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::EmptyResponse("OpenAI response missing message content".into())
            })
    }
}

fn request_body<'a>(call: &ProviderCall<'a>) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model: call.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: format!("{SYSTEM_PROMPT}\n{}", call.request.response_schema),
            },
            ChatMessage {
                role: "user",
                content: call.request.instruction.clone(),
            },
        ],
        temperature: call.temperature,
        response_format: json!({ "type": "json_object" }),
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    response_format: serde_json::Value,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
