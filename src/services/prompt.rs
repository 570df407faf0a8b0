use super::gateway::combine_prompt;
use crate::{
    core::rules::ConstrainedContext,
    schemas::CompletionSchema,
    types::suggestion::{Suggestion, SuggestionSet},
};

/// Role and boundaries of the assistant, sent as the system side of every request.
pub const SYSTEM_DIRECTIVE: &str = "\
You are Vega, an assistive AI travel planning companion inside the Voyara application.

Your role is to help users think through their travel plans by suggesting options
and explaining why they fit.

STRICT RULES:
- You must never make decisions for the user.
- You must never modify itineraries, budgets, or bookings.
- You must never assume missing information.
- You only suggest and explain.
- All final actions are taken by the user.

You are NOT autonomous.
You do NOT take actions.
You respond only when asked.";

/// Constraints every suggestion must respect, appended to the system directive.
pub const SAFETY_DIRECTIVE: &str = "\
While responding, you must follow these constraints:

- Suggestions must respect the remaining budget.
- Suggestions must match the given time of day.
- Suggestions must respect cultural and country rules.
- Do NOT suggest medical, legal, or emergency actions.
- Do NOT suggest bookings or purchases.

Every suggestion must include:
- Why it fits the user's plan
- Which constraint or preference it satisfies";

const NO_PREFERENCES: &str = "None provided";
const NO_RULES: &str = "No additional rules";

/// The (system, task) pair handed to a generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub system: String,
    pub task: String,
}

impl PromptPayload {
    /// Single-text rendering for backends without a separate system role.
    pub fn combined(&self) -> String {
        combine_prompt(&self.system, &self.task)
    }
}

/// Build the prompt for one constrained request. Pure; no I/O.
pub fn assemble_prompt(constrained: &ConstrainedContext) -> PromptPayload {
    PromptPayload {
        system: format!("{SYSTEM_DIRECTIVE}\n\n{SAFETY_DIRECTIVE}"),
        task: format!("{}\n{}", render_task(constrained), output_instructions()),
    }
}

fn render_task(constrained: &ConstrainedContext) -> String {
    let ctx = constrained.context();

    // Named arguments: a slot without a binding is a compile error, not a blank.
    format!(
        "TASK:
Suggest 3 to 5 suitable activities for the given day and time slot.
You MUST estimate the cost per person in {country}'s local currency or USD.

TRIP CONTEXT:
City: {city}
Country: {country}
Group: {adults} Adults, {children} Children
Day: {day} ({time_slot})
Budget Remaining: {remaining_budget}

USER PREFERENCES:
{preferences}

ENFORCED RULES:
{rules}
",
        city = ctx.city,
        country = ctx.country,
        adults = ctx.adults,
        children = ctx.children,
        day = ctx.day,
        time_slot = constrained.time_slot(),
        remaining_budget = ctx.remaining_budget,
        preferences = join_or(&ctx.preferences, NO_PREFERENCES),
        rules = join_or(constrained.rules(), NO_RULES),
    )
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn output_instructions() -> String {
    let example = SuggestionSet {
        suggestions: vec![Suggestion {
            title: "Activity Name".to_string(),
            description: "Short description".to_string(),
            reason: "Why it fits".to_string(),
            estimated_price_adult: 25.0,
            estimated_price_child: 15.0,
            currency: "EUR".to_string(),
            min_age: 0,
            is_child_allowed: true,
        }],
    };
    let example = serde_json::to_string_pretty(&example)
        .expect("plain struct with string and number fields always serializes");

    format!(
        "OUTPUT INSTRUCTIONS:
Return STRICT JSON only, shaped as {{\"suggestions\": [...]}}.
Every suggestion MUST have exactly these fields: {fields}.
1. Estimate `estimated_price_adult` and `estimated_price_child`.
2. If the activity is free, set the price to 0.
3. If children are NOT allowed (e.g., bars, clubs, 18+), set `is_child_allowed` to false and `estimated_price_child` to 0.
4. Prices are never negative.

JSON Structure:
{example}
",
        fields = Suggestion::field_names().join(", "),
    )
}
