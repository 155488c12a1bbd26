// JSON Schema handed to providers as the generation constraint

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::agent::output_types::{ComponentKind, InfoCardVariant, MAX_SUGGESTIONS};

/// Name under which the schema is registered with OpenAI-style providers
pub const RESPONSE_SCHEMA_NAME: &str = "agui_response";

static RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(build_response_schema);

/// Schema of the response envelope, built once per process
pub fn response_schema() -> &'static Value {
    &RESPONSE_SCHEMA
}

fn tagged(kind: ComponentKind, mut properties: Value, required: &[&str]) -> Value {
    if let Some(props) = properties.as_object_mut() {
        props.insert("type".to_string(), json!({ "type": "string", "enum": [kind.as_str()] }));
    }
    let mut required_fields = vec!["type"];
    required_fields.extend_from_slice(required);

    json!({
        "type": "object",
        "properties": properties,
        "required": required_fields
    })
}

/// Schema for one component kind. Matching on the kind keeps this in step
/// with the component union.
fn component_schema(kind: ComponentKind) -> Value {
    match kind {
        ComponentKind::Markdown => tagged(
            kind,
            json!({
                "content": {
                    "type": "string",
                    "description": "Markdown text for paragraphs and long explanations"
                }
            }),
            &["content"],
        ),
        ComponentKind::InfoCard => tagged(
            kind,
            json!({
                "title": { "type": "string", "description": "Short header" },
                "description": {
                    "type": "string",
                    "description": "Body text of the card. Must not be empty."
                },
                "variant": {
                    "type": "string",
                    "enum": InfoCardVariant::ALL.map(|v| v.as_str())
                }
            }),
            &["title", "description", "variant"],
        ),
        ComponentKind::DataList => tagged(
            kind,
            json!({
                "title": { "type": "string" },
                "items": {
                    "type": "array",
                    "description": "Label/value pairs describing a single item",
                    "items": {
                        "type": "object",
                        "properties": {
                            "label": { "type": "string" },
                            "value": { "type": "string" }
                        },
                        "required": ["label", "value"]
                    }
                }
            }),
            &["items"],
        ),
        ComponentKind::StepProcess => tagged(
            kind,
            json!({
                "title": { "type": "string" },
                "steps": {
                    "type": "array",
                    "description": "Ordered steps of a procedure or timeline",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" }
                        },
                        "required": ["title", "description"]
                    }
                }
            }),
            &["steps"],
        ),
        ComponentKind::Table => tagged(
            kind,
            json!({
                "title": { "type": "string" },
                "headers": {
                    "type": "array",
                    "description": "Column names",
                    "items": { "type": "string" }
                },
                "rows": {
                    "type": "array",
                    "description": "Rows with one cell per header",
                    "items": { "type": "array", "items": { "type": "string" } }
                }
            }),
            &["headers", "rows"],
        ),
    }
}

fn build_response_schema() -> Value {
    let variants: Vec<Value> = ComponentKind::ALL.into_iter().map(component_schema).collect();

    json!({
        "type": "object",
        "properties": {
            "components": {
                "type": "array",
                "description": "A list of UI components to render the answer.",
                "items": { "oneOf": variants }
            },
            "suggestions": {
                "type": "array",
                "description": "Suggest exactly 0, 1, or 2 follow-up questions.",
                "items": { "type": "string" },
                "maxItems": MAX_SUGGESTIONS
            }
        },
        "required": ["components", "suggestions"]
    })
}
