use super::{
    request::TripRequest,
    suggestion::{Suggestion, SuggestionSet},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run produced zero suggestions without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// The backend could not be reached or answered with an error status
    GenerationUnavailable,
    /// The backend did not answer within the request deadline
    Timeout,
    /// The reply was blank after stripping wrappers
    EmptyReply,
    /// The reply was not JSON
    MalformedJson,
    /// The reply was JSON but not a suggestion list
    SchemaMismatch,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DegradeReason::GenerationUnavailable => "generation unavailable",
            DegradeReason::Timeout => "generation timed out",
            DegradeReason::EmptyReply => "empty reply",
            DegradeReason::MalformedJson => "reply was not valid JSON",
            DegradeReason::SchemaMismatch => "reply did not match the suggestion schema",
        };
        f.write_str(text)
    }
}

/// Internal outcome of a pipeline run that passed the hard constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub suggestions: SuggestionSet,
    /// Set when the suggestions are empty because something downstream degraded
    pub degraded: Option<DegradeReason>,
}

impl Generation {
    pub fn complete(suggestions: SuggestionSet) -> Self {
        Self {
            suggestions,
            degraded: None,
        }
    }

    pub fn degraded(reason: DegradeReason) -> Self {
        Self {
            suggestions: SuggestionSet::empty(),
            degraded: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Outward response: success with zero or more suggestions, or failure with none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub success: bool,
    pub trip_id: String,
    pub city: String,
    pub country: String,
    pub day: i64,
    /// Echoed as sent by the caller
    pub time_slot: String,
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl SuggestResponse {
    pub fn success(request: &TripRequest, suggestions: SuggestionSet) -> Self {
        let suggestions = suggestions.into_vec();
        Self {
            success: true,
            trip_id: request.trip_id.clone(),
            city: request.city.clone(),
            country: request.country.clone(),
            day: request.day,
            time_slot: request.time_slot.clone(),
            message: format!("Generated {} suggestions", suggestions.len()),
            suggestions,
            error: None,
        }
    }

    pub fn failure(request: &TripRequest, cause: impl Into<String>) -> Self {
        Self {
            success: false,
            trip_id: request.trip_id.clone(),
            city: request.city.clone(),
            country: request.country.clone(),
            day: request.day,
            time_slot: request.time_slot.clone(),
            suggestions: Vec::new(),
            error: Some(cause.into()),
            message: "Failed to generate suggestions".to_string(),
        }
    }
}
