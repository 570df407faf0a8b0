//! Hard constraints and soft directives applied before a prompt is built.
//!
//! Hard constraints reject the request outright, checked in a fixed order (budget, time slot,
//! day) with the first violation reported. Soft directives are guidance strings looked up in
//! two tables, country packs and preference rules, and appended in table order. Countries
//! match case-insensitively; preference tags must match exactly.

use super::context::PlanningContext;
use crate::{error::ConstraintViolation, types::TimeSlot};
use tracing::debug;

const BUILTIN_COUNTRY_PACKS: &[(&str, &[&str])] = &[
    (
        "japan",
        &["Prefer public transport", "Avoid late-night activities"],
    ),
    (
        "france",
        &["Prefer walkable activities", "Include cultural experiences"],
    ),
    (
        "india",
        &[
            "Avoid long travel during peak heat hours",
            "Prefer local experiences",
        ],
    ),
];

const BUILTIN_PREFERENCE_RULES: &[(&str, &str)] = &[
    ("relaxed", "Avoid tightly packed schedules"),
    ("food", "Include food-related experiences"),
];

/// Directives attached to every request for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryPack {
    country: String,
    rules: Vec<String>,
}

impl CountryPack {
    pub fn new(country: impl Into<String>, rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            country: normalize_key(&country.into()),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, country: &str) -> bool {
        self.country == normalize_key(country)
    }
}

/// Directive attached when the request carries exactly this preference tag.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRule {
    tag: String,
    rule: String,
}

impl PreferenceRule {
    pub fn new(tag: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            rule: rule.into(),
        }
    }

    fn matches(&self, preferences: &[String]) -> bool {
        preferences.iter().any(|pref| pref == &self.tag)
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Table-driven constraint engine. Stateless between calls.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    country_packs: Vec<CountryPack>,
    preference_rules: Vec<PreferenceRule>,
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self {
            country_packs: BUILTIN_COUNTRY_PACKS
                .iter()
                .map(|(country, rules)| CountryPack::new(*country, rules.iter().copied()))
                .collect(),
            preference_rules: BUILTIN_PREFERENCE_RULES
                .iter()
                .map(|(tag, rule)| PreferenceRule::new(*tag, *rule))
                .collect(),
        }
    }
}

impl RulesEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with no soft directives at all; hard constraints still apply.
    pub fn without_directives() -> Self {
        Self {
            country_packs: Vec::new(),
            preference_rules: Vec::new(),
        }
    }

    pub fn with_country_pack(mut self, pack: CountryPack) -> Self {
        self.country_packs.push(pack);
        self
    }

    pub fn with_preference_rule(mut self, rule: PreferenceRule) -> Self {
        self.preference_rules.push(rule);
        self
    }

    /// Check the hard constraints, returning the parsed time slot on success.
    pub fn check(&self, context: &PlanningContext) -> Result<TimeSlot, ConstraintViolation> {
        // NaN budgets fail as well.
        if !(context.remaining_budget > 0.0) {
            return Err(ConstraintViolation::NoRemainingBudget);
        }

        let time_slot = context
            .time_slot
            .parse::<TimeSlot>()
            .map_err(|_| ConstraintViolation::InvalidTimeSlot)?;

        if context.day <= 0 {
            return Err(ConstraintViolation::InvalidDay);
        }

        Ok(time_slot)
    }

    /// Soft directives for a context, rebuilt from scratch on every call.
    pub fn derive_rules(&self, context: &PlanningContext) -> Vec<String> {
        let country_rules = self
            .country_packs
            .iter()
            .filter(|pack| pack.matches(&context.country))
            .flat_map(|pack| pack.rules.iter().cloned());

        let preference_rules = self
            .preference_rules
            .iter()
            .filter(|rule| rule.matches(&context.preferences))
            .map(|rule| rule.rule.clone());

        country_rules.chain(preference_rules).collect()
    }

    pub fn apply(&self, context: &PlanningContext) -> Result<ConstrainedContext, ConstraintViolation> {
        let time_slot = self.check(context)?;
        let rules = self.derive_rules(context);

        debug!(
            target: "vega::rules",
            trip_id = %context.trip_id,
            rules = ?rules,
            "derived soft directives"
        );

        Ok(ConstrainedContext {
            context: context.clone(),
            time_slot,
            rules,
        })
    }
}

/// A context that passed the hard constraints, with its soft directives attached.
///
/// Only the rules engine constructs one, so the prompt assembler can never see a context
/// whose rules were not populated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainedContext {
    context: PlanningContext,
    time_slot: TimeSlot,
    rules: Vec<String>,
}

impl ConstrainedContext {
    pub fn context(&self) -> &PlanningContext {
        &self.context
    }

    pub fn time_slot(&self) -> TimeSlot {
        self.time_slot
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}
