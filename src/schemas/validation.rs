use crate::{error::VegaError, schemas::SchemaHandle};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

const MAX_SCHEMA_ERRORS: usize = 3;

/// Validate a decoded model reply against a completion schema.
///
/// The error lists at most the first few violations with their instance paths.
pub(crate) fn validate_structured_payload(
    schema: &SchemaHandle,
    payload: &Value,
) -> std::result::Result<(), VegaError> {
    let validator = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema.schema_json())
        .map_err(|err| {
            VegaError::Validation(format!(
                "Failed to prepare `{}` schema for validation: {}",
                schema.schema_name(),
                err
            ))
        })?;

    let Err(errors) = validator.validate(payload) else {
        return Ok(());
    };

    let mut details = Vec::new();
    let mut truncated = false;

    for (idx, error) in errors.enumerate() {
        if idx == MAX_SCHEMA_ERRORS {
            truncated = true;
            break;
        }
        let path = error.instance_path.to_string();
        let path = if path.is_empty() { "<root>".to_string() } else { path };
        details.push(format!("{}: {}", path, error));
    }

    let mut detail = if details.is_empty() {
        "reply failed schema validation".to_string()
    } else {
        details.join("; ")
    };
    if truncated {
        detail.push_str("; additional errors truncated");
    }

    Err(VegaError::Validation(format!(
        "Reply does not match `{}` schema: {}",
        schema.schema_name(),
        detail
    )))
}
