use schemars::schema::{RootSchema, Schema, SchemaObject};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{any::TypeId, sync::Arc};

/// Cached JSON schema for a structured completion type.
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    schema_name: &'static str,
    type_name: &'static str,
    type_id: TypeId,
    schema_json: Arc<Value>,
}

impl SchemaHandle {
    /// Serialize a generated root schema. Only called from `#[completion_schema]` expansions,
    /// where the schema is built from a derived `JsonSchema` impl and always serializes.
    pub fn from_root_schema<T: 'static>(
        schema_name: &'static str,
        type_name: &'static str,
        root: RootSchema,
    ) -> Self {
        let schema_json = serde_json::to_value(root)
            .unwrap_or_else(|err| panic!("failed to serialize schema for {}: {}", type_name, err));

        Self {
            schema_name,
            type_name,
            type_id: TypeId::of::<T>(),
            schema_json: Arc::new(schema_json),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }
}

/// A type the generation backend is asked to produce as JSON.
///
/// Implemented by `#[completion_schema]`.
pub trait CompletionSchema: DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static SchemaHandle;

    /// Field names in declaration order.
    fn field_names() -> &'static [&'static str];
}

/// Fold doc comments captured by the macro into the generated schema metadata.
pub fn apply_doc_comments(
    root: &mut RootSchema,
    title: &'static str,
    description: Option<&'static str>,
    field_docs: &[(&'static str, &'static str)],
) {
    let schema = &mut root.schema;
    describe(schema, Some(title), description);

    let Some(object) = schema.object.as_mut() else {
        return;
    };

    for (field, doc) in field_docs {
        if let Some(Schema::Object(property)) = object.properties.get_mut(*field) {
            describe(property, None, Some(doc));
        }
    }
}

fn describe(schema: &mut SchemaObject, title: Option<&str>, description: Option<&str>) {
    let metadata = schema.metadata();

    if metadata.title.is_none() {
        metadata.title = title.map(str::to_string);
    }
    if metadata.description.is_none() {
        metadata.description = description.map(str::to_string);
    }
}
