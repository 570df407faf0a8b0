use async_trait::async_trait;
use std::fmt;

use crate::error::{Result, VegaError};

/// Single-shot, stateless access to a text-generation backend.
///
/// One instance is built at startup and shared across requests, so implementations must not
/// mutate state per call. Retry policy, if any, belongs to the implementation.
#[async_trait]
pub trait GenerationGateway: Send + Sync + fmt::Debug {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Generate raw reply text for a (system directive, task payload) pair.
    ///
    /// Transport problems surface as [`VegaError::GenerationUnavailable`],
    /// [`VegaError::Timeout`] or [`VegaError::RateLimit`].
    async fn generate(&self, system_directive: &str, task_payload: &str) -> Result<String>;
}

/// Join the pair for backends that take one prompt text.
pub fn combine_prompt(system_directive: &str, task_payload: &str) -> String {
    format!("{system_directive}\n\nHere is the specific request:\n{task_payload}")
}

pub(crate) fn transport_error(backend: &str, err: reqwest::Error) -> VegaError {
    if err.is_timeout() {
        VegaError::Timeout(format!("{backend} request timed out: {err}"))
    } else {
        VegaError::GenerationUnavailable(format!("{backend} request failed: {err}"))
    }
}

pub(crate) fn build_http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| VegaError::Config(format!("Failed to build HTTP client: {err}")))
}
