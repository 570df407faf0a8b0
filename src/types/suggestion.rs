use crate::completion_schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Most suggestions a single reply may contribute.
pub const MAX_SUGGESTIONS: usize = 5;

/// One advisory activity for the requested day and time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[completion_schema]
pub struct Suggestion {
    /// Activity name
    pub title: String,
    /// Short description of the activity
    pub description: String,
    /// Why it fits the trip, including the constraint or preference it satisfies
    pub reason: String,
    /// Estimated cost for one adult; 0 when free
    pub estimated_price_adult: f64,
    /// Estimated cost for one child; 0 when free or when children are not allowed
    pub estimated_price_child: f64,
    /// Currency code for both prices (e.g., "EUR")
    pub currency: String,
    /// Minimum participant age in years
    pub min_age: u32,
    /// Whether children may take part
    pub is_child_allowed: bool,
}

/// Structured reply the generation backend is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[completion_schema]
pub struct SuggestionSet {
    /// Suggested activities in order of preference
    pub suggestions: Vec<Suggestion>,
}

impl SuggestionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    pub fn into_vec(self) -> Vec<Suggestion> {
        self.suggestions
    }
}
