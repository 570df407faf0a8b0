//! vega-rs: per-time-slot activity suggestions for a trip, generated by an LLM.
//!
//! A request is normalized, checked against hard constraints, enriched with country and
//! preference rules, rendered into a prompt, and sent to one generation backend. Whatever
//! comes back is parsed defensively: the caller always gets a well-formed response.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//! use vega_rs::{OllamaClient, TripRequest, VegaPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = OllamaClient::new(
//!         "http://localhost:11434/api/generate",
//!         "phi3",
//!         Duration::from_secs(60),
//!     )?;
//!     let pipeline = VegaPipeline::new(Arc::new(gateway));
//!
//!     let request: TripRequest = serde_json::from_str(
//!         r#"{"trip_id": "t1", "city": "Kyoto", "country": "Japan", "day": 2,
//!             "time_slot": "evening", "total_budget": 2000, "remaining_budget": 800}"#,
//!     )?;
//!
//!     let response = pipeline.suggest(&request).await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

extern crate self as vega_rs;

pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub mod server;
pub(crate) mod services;
pub mod types;

pub use config::{AllowedOrigins, Backend, Settings};
pub use crate::core::{
    assemble_prompt, parse_reply, sanitize_suggestions, ConstrainedContext, CountryPack,
    GenerationGateway, ParsedReply, PlanningContext, PreferenceRule, PromptPayload, RulesEngine,
    VegaPipeline,
};
pub use error::{ConstraintViolation, Result, VegaError};
pub use schemas::{CompletionSchema, SchemaHandle};
pub use services::{
    gemini_client::GeminiClient, ollama_client::OllamaClient, openai_client::OpenAIClient,
};
pub use types::{
    DegradeReason, Generation, SuggestResponse, Suggestion, SuggestionSet, TimeSlot, TripRequest,
};
pub use vega_macros::completion_schema;

pub use schemas as schema;

#[cfg(feature = "cli")]
pub mod cli;
