use crate::types::TripRequest;

/// Canonical per-request snapshot the later stages work from.
///
/// Built by [`PlanningContext::from_request`]; every field is copied verbatim except the time
/// slot, which is lower-cased. Values are not validated here.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningContext {
    pub trip_id: String,
    pub city: String,
    pub country: String,
    pub day: i64,
    pub time_slot: String,
    pub total_budget: f64,
    pub remaining_budget: f64,
    pub preferences: Vec<String>,
    pub adults: i64,
    pub children: i64,
}

impl PlanningContext {
    pub fn from_request(request: &TripRequest) -> Self {
        Self {
            trip_id: request.trip_id.clone(),
            city: request.city.clone(),
            country: request.country.clone(),
            day: request.day,
            time_slot: request.time_slot.to_lowercase(),
            total_budget: request.total_budget,
            remaining_budget: request.remaining_budget,
            preferences: request.preferences.clone().unwrap_or_default(),
            adults: request.adults,
            children: request.children,
        }
    }
}

impl From<&TripRequest> for PlanningContext {
    fn from(request: &TripRequest) -> Self {
        Self::from_request(request)
    }
}
