//! Turns untrusted reply text into a typed suggestion set.
//!
//! Parsing never fails: anything that cannot be read as a `SuggestionSet` becomes a
//! [`ParsedReply::Degraded`] carrying the reason, and the raw text is logged for diagnosis.

use serde_json::Value;
use tracing::warn;

use crate::{
    schemas::{validation::validate_structured_payload, CompletionSchema},
    types::{
        deserialize_structured_response, DegradeReason, SuggestionSet, MAX_SUGGESTIONS,
    },
};

/// Outcome of reading one backend reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    /// The reply decoded as a suggestion set, possibly with zero entries
    WellFormed(SuggestionSet),
    /// The reply could not be used
    Degraded(DegradeReason),
}

impl ParsedReply {
    pub fn is_well_formed(&self) -> bool {
        matches!(self, ParsedReply::WellFormed(_))
    }

    /// The decoded suggestions, or an empty set for a degraded reply.
    pub fn into_suggestions(self) -> SuggestionSet {
        match self {
            ParsedReply::WellFormed(set) => set,
            ParsedReply::Degraded(_) => SuggestionSet::empty(),
        }
    }
}

pub fn parse_reply(raw: &str) -> ParsedReply {
    let body = strip_fences(raw);
    if body.is_empty() {
        warn!(target: "vega::parser", raw, "empty reply from generation backend");
        return ParsedReply::Degraded(DegradeReason::EmptyReply);
    }

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(err) => match extract_json_object(body).and_then(|obj| serde_json::from_str(obj).ok()) {
            Some(value) => value,
            None => {
                warn!(target: "vega::parser", error = %err, raw, "reply is not JSON");
                return ParsedReply::Degraded(DegradeReason::MalformedJson);
            }
        },
    };

    let schema = SuggestionSet::schema();
    let decoded = validate_structured_payload(schema, &value)
        .and_then(|()| deserialize_structured_response::<SuggestionSet>(&value, schema));

    match decoded {
        Ok(set) => ParsedReply::WellFormed(set),
        Err(err) => {
            warn!(target: "vega::parser", error = %err, raw, "reply does not match the suggestion schema");
            ParsedReply::Degraded(DegradeReason::SchemaMismatch)
        }
    }
}

/// Trim and drop a leading ```` ```lang ```` line and a trailing ```` ``` ````.
fn strip_fences(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix("```") {
        // Language tag runs to the end of the opening line.
        body = match rest.find('\n') {
            Some(newline) if is_fence_tag(&rest[..newline]) => &rest[newline + 1..],
            None if is_fence_tag(rest) => "",
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }

    body.trim().strip_suffix("```").unwrap_or(body).trim()
}

fn is_fence_tag(line: &str) -> bool {
    line.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// First balanced `{...}` in `raw`, ignoring braces inside JSON strings.
fn extract_json_object(raw: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                start.get_or_insert(idx);
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &raw[s..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Enforce the per-suggestion invariants the prompt asks for.
///
/// Keeps at most [`MAX_SUGGESTIONS`] entries, clamps negative or non-finite prices to zero,
/// and zeroes the child price of activities children cannot join.
pub fn sanitize_suggestions(set: SuggestionSet) -> SuggestionSet {
    let mut suggestions = set.into_vec();

    if suggestions.len() > MAX_SUGGESTIONS {
        warn!(
            target: "vega::parser",
            received = suggestions.len(),
            kept = MAX_SUGGESTIONS,
            "dropping extra suggestions"
        );
        suggestions.truncate(MAX_SUGGESTIONS);
    }

    for suggestion in &mut suggestions {
        for (field, price) in [
            ("estimated_price_adult", &mut suggestion.estimated_price_adult),
            ("estimated_price_child", &mut suggestion.estimated_price_child),
        ] {
            if !price.is_finite() || *price < 0.0 {
                warn!(target: "vega::parser", title = %suggestion.title, field, price = *price, "clamping price to 0");
                *price = 0.0;
            }
        }

        if !suggestion.is_child_allowed && suggestion.estimated_price_child != 0.0 {
            warn!(
                target: "vega::parser",
                title = %suggestion.title,
                price = suggestion.estimated_price_child,
                "child price on an adults-only activity"
            );
            suggestion.estimated_price_child = 0.0;
        }
    }

    SuggestionSet { suggestions }
}
