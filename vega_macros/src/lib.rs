//! Procedural macros for `vega-rs`.
//!
//! `#[completion_schema]` turns a named-field struct into a structured completion type: the
//! generated impl builds the struct's JSON schema once, folds the struct and field doc comments
//! into it, and hands out a cached `SchemaHandle` that the response parser validates against.

mod completion_schema;
mod schema_extraction;

use proc_macro::TokenStream;

/// Attach a cached JSON schema to a structured completion type.
///
/// Accepts optional `name = "..."` and `description = "..."` overrides; otherwise the struct
/// name and its doc comment are used.
#[proc_macro_attribute]
pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    completion_schema::completion_schema(attr, item)
}
