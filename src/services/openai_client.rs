use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::warn;

use super::gateway::{build_http_client, transport_error, GenerationGateway};
use crate::error::{Result, VegaError};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-4.1-mini";
const MAX_RETRIES: usize = 3;

/// OpenAI-compatible chat completions backend (OpenRouter by default).
///
/// Retries 429 and 5xx responses with exponential backoff, honouring `Retry-After`.
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
    initial_backoff: Duration,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            max_tokens: Some(1500),
            initial_backoff: Duration::from_millis(250),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let request_url = build_chat_url(&self.base_url);
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self
                .http
                .post(&request_url)
                .bearer_auth(&self.api_key)
                .header("X-Title", "vega-rs")
                .json(body)
                .send()
                .await
                .map_err(|err| transport_error("chat completions", err))?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response
                .text()
                .await
                .map_err(|err| transport_error("chat completions", err))?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                if attempt < MAX_RETRIES {
                    warn!(target: "vega::gateway", attempt, ?retry_after, "rate limited, retrying");
                    tokio::time::sleep(retry_after).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(VegaError::RateLimit {
                    retry_after: retry_after.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                warn!(target: "vega::gateway", attempt, %status, "server error, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
                VegaError::GenerationUnavailable(format!(
                    "HTTP {status}: unreadable body ({err}): {response_text}"
                ))
            })?;

            if !status.is_success() {
                let api_message = response_json
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(response_text);

                return Err(VegaError::GenerationUnavailable(format!(
                    "HTTP {} error: {}",
                    status, api_message
                )));
            }

            if let Some(error) = response_json.get("error") {
                let error_message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                return Err(VegaError::GenerationUnavailable(format!(
                    "API error: {}",
                    error_message
                )));
            }

            return Ok(response_json);
        }
    }
}

#[async_trait]
impl GenerationGateway for OpenAIClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, system_directive: &str, task_payload: &str) -> Result<String> {
        let body = ChatCompletionRequest::new(
            self.model.clone(),
            vec![
                json!({ "role": "system", "content": system_directive }),
                json!({ "role": "user", "content": task_payload }),
            ],
        )
        .with_max_tokens(self.max_tokens)
        .into_value();

        let reply = self.chat_completion(&body).await?;

        Ok(reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
        }
    }

    fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
            "stream": false,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(server: &mockito::ServerGuard) -> OpenAIClient {
        OpenAIClient::new("sk-test", "test/model", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url())
            .with_initial_backoff(Duration::from_millis(1))
    }

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://openrouter.ai/api/v1/"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_disables_streaming() {
        let body = ChatCompletionRequest::new("m", vec![json!({ "role": "user", "content": "hi" })])
            .with_max_tokens(Some(10))
            .into_value();
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 10);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn test_reads_first_choice() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "test/model",
                "messages": [
                    { "role": "system", "content": "SYS" },
                    { "role": "user", "content": "TASK" }
                ]
            })))
            .with_status(200)
            .with_body(
                json!({ "choices": [{ "message": { "content": "{\"suggestions\": []}" } }] })
                    .to_string(),
            )
            .create_async()
            .await;

        let text = client(&server).generate("SYS", "TASK").await.unwrap();
        mock.assert_async().await;
        assert_eq!(text, "{\"suggestions\": []}");
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_gives_up() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body(r#"{"error": {"message": "overloaded"}}"#)
            .expect(MAX_RETRIES + 1)
            .create_async()
            .await;

        let err = client(&server).generate("SYS", "TASK").await.unwrap_err();
        mock.assert_async().await;
        assert_eq!(err.error_code(), "GENERATION_UNAVAILABLE");
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("retry-after", "0")
            .with_body("{}")
            .create_async()
            .await;

        let err = client(&server).generate("SYS", "TASK").await.unwrap_err();
        assert!(matches!(err, VegaError::RateLimit { retry_after: 1 }));
    }
}
