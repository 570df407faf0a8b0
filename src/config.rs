//! Environment configuration, read once at startup.

use std::{env, net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use crate::{
    error::{Result, VegaError},
    services::{
        gateway::GenerationGateway,
        gemini_client::{GeminiClient, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL},
        ollama_client::{OllamaClient, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL},
        openai_client::{OpenAIClient, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL},
    },
};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Which generation backend the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ollama,
    Gemini,
    OpenAI,
}

impl Backend {
    fn default_model(self) -> &'static str {
        match self {
            Backend::Ollama => DEFAULT_OLLAMA_MODEL,
            Backend::Gemini => DEFAULT_GEMINI_MODEL,
            Backend::OpenAI => DEFAULT_CHAT_MODEL,
        }
    }
}

impl FromStr for Backend {
    type Err = VegaError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "ollama" => Ok(Backend::Ollama),
            "gemini" => Ok(Backend::Gemini),
            "openai" | "openrouter" => Ok(Backend::OpenAI),
            other => Err(VegaError::Config(format!(
                "unknown VEGA_BACKEND `{other}` (expected ollama, gemini or openai)"
            ))),
        }
    }
}

/// Allowed cross-origin sources for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: Backend,
    pub model: String,
    /// Backend endpoint: the generate URL for Ollama, the API base URL otherwise
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub allowed_origins: AllowedOrigins,
    pub bind: SocketAddr,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match get("VEGA_BACKEND") {
            Some(name) => name.parse()?,
            None => Backend::Ollama,
        };

        let model = get("VEGA_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let (endpoint, api_key) = match backend {
            Backend::Ollama => (
                get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                None,
            ),
            Backend::Gemini => (
                get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                Some(get("GEMINI_API_KEY").ok_or_else(|| missing_key("GEMINI_API_KEY"))?),
            ),
            Backend::OpenAI => (
                get("OPENAI_BASE_URL")
                    .or_else(|| get("OPENROUTER_BASE_URL"))
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                Some(get("OPENAI_API_KEY").ok_or_else(|| missing_key("OPENAI_API_KEY"))?),
            ),
        };

        let timeout_secs = match get("VEGA_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("VEGA_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(VegaError::Config(
                "VEGA_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        let host = get("VEGA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };
        let bind: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|err| VegaError::Config(format!("invalid bind address {host}:{port}: {err}")))?;

        Ok(Self {
            backend,
            model,
            endpoint,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            allowed_origins: parse_origins(get("ALLOWED_ORIGINS").as_deref().unwrap_or("*")),
            bind,
        })
    }

    /// Construct the one gateway shared by every request.
    pub fn build_gateway(&self) -> Result<Arc<dyn GenerationGateway>> {
        let api_key = || {
            self.api_key
                .clone()
                .ok_or_else(|| VegaError::Config("backend requires an API key".to_string()))
        };

        let gateway: Arc<dyn GenerationGateway> = match self.backend {
            Backend::Ollama => Arc::new(OllamaClient::new(
                self.endpoint.clone(),
                self.model.clone(),
                self.timeout,
            )?),
            Backend::Gemini => Arc::new(
                GeminiClient::new(api_key()?, self.model.clone(), self.timeout)?
                    .with_base_url(self.endpoint.clone()),
            ),
            Backend::OpenAI => Arc::new(
                OpenAIClient::new(api_key()?, self.model.clone(), self.timeout)?
                    .with_base_url(self.endpoint.clone()),
            ),
        };
        Ok(gateway)
    }
}

fn missing_key(name: &str) -> VegaError {
    VegaError::Config(format!(
        "{name} not found. Set it in the environment or a .env file"
    ))
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| VegaError::Config(format!("{key}=`{raw}` is not a valid number: {err}")))
}

fn parse_origins(raw: &str) -> AllowedOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        AllowedOrigins::Any
    } else {
        AllowedOrigins::List(origins)
    }
}
