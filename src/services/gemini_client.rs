use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::gateway::{build_http_client, combine_prompt, transport_error, GenerationGateway};
use crate::error::{Result, VegaError};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Google Gemini `generateContent` backend.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GenerationGateway for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, system_directive: &str, task_payload: &str) -> Result<String> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": combine_prompt(system_directive, task_payload) }]
            }]
        });

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error("gemini", err))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|err| transport_error("gemini", err))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&response_text)
                .ok()
                .and_then(|reply| {
                    reply
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(response_text);
            return Err(VegaError::GenerationUnavailable(format!(
                "gemini returned HTTP {status}: {message}"
            )));
        }

        let reply: Value = serde_json::from_str(&response_text).map_err(|err| {
            VegaError::GenerationUnavailable(format!(
                "gemini returned an unreadable body ({err}): {response_text}"
            ))
        })?;

        Ok(candidate_text(&reply))
    }
}

/// Concatenated text parts of the first candidate; empty when there is none.
fn candidate_text(reply: &Value) -> String {
    reply
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_candidate_text_joins_parts() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "```json\n{" }, { "text": "}\n```" }] }
            }]
        });
        assert_eq!(candidate_text(&reply), "```json\n{}\n```");
        assert_eq!(candidate_text(&json!({ "candidates": [] })), "");
    }

    #[tokio::test]
    async fn test_passes_key_and_model() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{ "content": { "parts": [{ "text": "{\"suggestions\": []}" }] } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new("secret", "gemini-test", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url());

        let text = client.generate("SYS", "TASK").await.unwrap();
        mock.assert_async().await;
        assert_eq!(text, "{\"suggestions\": []}");
    }

    #[tokio::test]
    async fn test_api_error_message_is_kept() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"message": "API key not valid"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("bad", "gemini-test", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url());

        let err = client.generate("SYS", "TASK").await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_non_json_error_keeps_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_header("content-type", "text/html")
            .with_body("<html><body>Bad Gateway</body></html>")
            .create_async()
            .await;

        let client = GeminiClient::new("key", "gemini-test", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url());

        let err = client.generate("SYS", "TASK").await.unwrap_err();
        assert_eq!(err.error_code(), "GENERATION_UNAVAILABLE");
        let message = err.to_string();
        assert!(message.contains("502"), "{message}");
        assert!(message.contains("Bad Gateway"), "{message}");
    }
}
