use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Inbound trip-planning request as received from the caller.
///
/// Nothing is validated at this boundary: out-of-range days or unknown time slots are
/// carried through and rejected by the rules engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    /// Opaque trip identifier, echoed back in the response
    pub trip_id: String,
    pub city: String,
    /// Free-text country name, matched case-insensitively against the country packs
    pub country: String,
    /// 1-based day index within the trip
    pub day: i64,
    /// `morning`, `afternoon` or `evening`, in any case
    pub time_slot: String,
    pub total_budget: f64,
    pub remaining_budget: f64,
    /// Preference tags in caller order; `null` and a missing field both mean "none"
    #[serde(default)]
    pub preferences: Option<Vec<String>>,
    #[serde(default = "default_adults")]
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
}

fn default_adults() -> i64 {
    1
}

/// Part of the day a suggestion is planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Afternoon, TimeSlot::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact match on the lower-case name. Callers lower-case first; see `PlanningContext`.
impl FromStr for TimeSlot {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TimeSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == value)
            .ok_or(())
    }
}
