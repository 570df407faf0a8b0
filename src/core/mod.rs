pub mod context;
pub mod pipeline;
pub mod rules;

pub use context::PlanningContext;
pub use pipeline::VegaPipeline;
pub use rules::{ConstrainedContext, CountryPack, PreferenceRule, RulesEngine};

pub use crate::services::gateway::{combine_prompt, GenerationGateway};
pub use crate::services::prompt::{assemble_prompt, PromptPayload, SAFETY_DIRECTIVE, SYSTEM_DIRECTIVE};
pub use crate::services::response_parser::{parse_reply, sanitize_suggestions, ParsedReply};
