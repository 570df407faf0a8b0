pub mod request;
pub mod response;
pub mod result;
pub mod suggestion;

pub use request::{TimeSlot, TripRequest};
pub use response::deserialize_structured_response;
pub use result::{DegradeReason, Generation, SuggestResponse};
pub use suggestion::{Suggestion, SuggestionSet, MAX_SUGGESTIONS};
