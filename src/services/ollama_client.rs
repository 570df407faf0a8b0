use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::gateway::{build_http_client, combine_prompt, transport_error, GenerationGateway};
use crate::error::{Result, VegaError};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "phi3";

/// Local Ollama `/api/generate` backend. No retries.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            url: url.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl GenerationGateway for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, system_directive: &str, task_payload: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "prompt": combine_prompt(system_directive, task_payload),
            "stream": false,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error("ollama", err))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(VegaError::GenerationUnavailable(format!(
                "ollama returned HTTP {status}: {detail}"
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|err| transport_error("ollama", err))?;

        Ok(reply
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_sends_single_shot_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(json!({
                "model": "phi3",
                "stream": false,
                "prompt": "SYS\n\nHere is the specific request:\nTASK"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response": "  {\"suggestions\": []}\n"}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(
            format!("{}/api/generate", server.url()),
            "phi3",
            Duration::from_secs(5),
        )
        .unwrap();

        let text = client.generate("SYS", "TASK").await.unwrap();
        mock.assert_async().await;
        assert_eq!(text, r#"{"suggestions": []}"#);
    }

    #[tokio::test]
    async fn test_missing_response_field_is_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"done": true}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(
            format!("{}/api/generate", server.url()),
            "phi3",
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(client.generate("SYS", "TASK").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let client = OllamaClient::new(
            format!("{}/api/generate", server.url()),
            "phi3",
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client.generate("SYS", "TASK").await.unwrap_err();
        assert_eq!(err.error_code(), "GENERATION_UNAVAILABLE");
        assert!(err.to_string().contains("model not loaded"));
    }
}
