use std::any::TypeId;

use serde_json::Value;

use crate::{
    error::{Result, VegaError},
    schemas::{CompletionSchema, SchemaHandle},
};

/// Decode a schema-checked JSON value into its completion type.
///
/// Errors name the JSON path that failed, e.g. `suggestions[2].min_age`.
pub fn deserialize_structured_response<T>(payload: &Value, schema: &SchemaHandle) -> Result<T>
where
    T: CompletionSchema,
{
    if schema.type_id() != TypeId::of::<T>() {
        return Err(VegaError::Validation(format!(
            "schema `{}` belongs to `{}`, not `{}`",
            schema.schema_name(),
            schema.type_name(),
            std::any::type_name::<T>(),
        )));
    }

    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        VegaError::Validation(format!(
            "failed to deserialize `{}` at {}: {}",
            schema.schema_name(),
            location,
            err.inner()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::suggestion::{Suggestion, SuggestionSet};
    use serde_json::json;

    #[test]
    fn test_rejects_foreign_schema() {
        let err = deserialize_structured_response::<SuggestionSet>(
            &json!({ "suggestions": [] }),
            Suggestion::schema(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("belongs to `Suggestion`"));
    }

    #[test]
    fn test_error_names_failing_path() {
        let payload = json!({
            "suggestions": [{
                "title": "Night market",
                "description": "Street food",
                "reason": "Food preference",
                "estimated_price_adult": 10.0,
                "estimated_price_child": 5.0,
                "currency": "JPY",
                "min_age": -1,
                "is_child_allowed": true
            }]
        });
        let err = deserialize_structured_response::<SuggestionSet>(&payload, SuggestionSet::schema())
            .unwrap_err();
        assert!(err.to_string().contains("suggestions[0].min_age"), "{err}");
    }
}
