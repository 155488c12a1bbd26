//! Validation and normalization of provider output into typed components.
//!
//! Providers are asked to generate output shaped by the response schema, but
//! nothing guarantees they do. Every payload goes through [`validate_envelope`]
//! before it reaches a client. Recoverable deviations (list-valued text,
//! ragged table rows, too many suggestions) are normalized in place; anything
//! structural is reported as a [`ValidationError`].
//!
//! Component validation fails fast: the first invalid component aborts the
//! whole envelope.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::agent::output_types::{
    Component, ComponentKind, DataItem, DataListComponent, InfoCardComponent, InfoCardVariant,
    MarkdownComponent, ResponseEnvelope, StepItem, StepProcessComponent, TableComponent,
    MAX_SUGGESTIONS,
};

const ENVELOPE_PATH: &str = "response";
const COMPONENT_PATH: &str = "component";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// `type` is not one of the known component kinds
    UnknownComponentType,
    /// A required field is absent or null
    MissingField,
    /// A required text field is empty after normalization
    EmptyRequiredField,
    /// A field holds the wrong JSON type
    InvalidType,
    /// A field holds a value outside its allowed set
    InvalidValue,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValidationErrorKind::UnknownComponentType => "unknown component type",
            ValidationErrorKind::MissingField => "missing field",
            ValidationErrorKind::EmptyRequiredField => "empty required field",
            ValidationErrorKind::InvalidType => "invalid type",
            ValidationErrorKind::InvalidValue => "invalid value",
        };
        f.write_str(name)
    }
}

/// Structural defect in a provider payload
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {path}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub field: Option<String>,
    /// Location of the offending object, e.g. `components[2].items[0]`
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(
        kind: ValidationErrorKind,
        path: &str,
        field: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.map(str::to_string),
            path: path.to_string(),
            message: message.into(),
        }
    }

    fn missing(path: &str, field: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingField,
            path,
            Some(field),
            format!("required field `{}` is missing", field),
        )
    }

    fn empty(path: &str, field: &str) -> Self {
        Self::new(
            ValidationErrorKind::EmptyRequiredField,
            path,
            Some(field),
            format!("required field `{}` is empty", field),
        )
    }

    fn invalid_type(path: &str, field: Option<&str>, expected: &str, found: &Value) -> Self {
        let subject = field
            .map(|f| format!("field `{}`", f))
            .unwrap_or_else(|| "value".to_string());
        Self::new(
            ValidationErrorKind::InvalidType,
            path,
            field,
            format!("{} must be {}, found {}", subject, expected, json_type_name(found)),
        )
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Coerce a text-or-list value into a single text value.
///
/// Lists become their stringified elements joined by `\n`, in order; an empty
/// list becomes empty text. Anything else becomes its direct string form.
/// Never fails.
pub fn normalize_text_or_list(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join("\n"),
        other => stringify(other),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // nested containers keep their JSON form
        other => other.to_string(),
    }
}

/// Field accessor over one JSON object that knows where it sits in the payload
struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> ObjectReader<'a> {
    fn new(raw: &'a Value, path: String) -> Result<Self, ValidationError> {
        match raw.as_object() {
            Some(map) => Ok(Self { map, path }),
            None => Err(ValidationError::invalid_type(&path, None, "an object", raw)),
        }
    }

    fn optional(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &str) -> Result<&'a Value, ValidationError> {
        self.optional(field)
            .ok_or_else(|| ValidationError::missing(&self.path, field))
    }

    fn text(&self, field: &str) -> Result<String, ValidationError> {
        let value = self.required(field)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::invalid_type(&self.path, Some(field), "a string", value))
    }

    fn optional_text(&self, field: &str) -> Result<Option<String>, ValidationError> {
        match self.optional(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ValidationError::invalid_type(
                &self.path,
                Some(field),
                "a string",
                other,
            )),
        }
    }

    fn text_or_list(&self, field: &str) -> Result<String, ValidationError> {
        self.required(field).map(normalize_text_or_list)
    }

    fn array(&self, field: &str) -> Result<&'a Vec<Value>, ValidationError> {
        let value = self.required(field)?;
        value
            .as_array()
            .ok_or_else(|| ValidationError::invalid_type(&self.path, Some(field), "an array", value))
    }

    fn element_path(&self, field: &str, index: usize) -> String {
        if self.path == ENVELOPE_PATH {
            format!("{}[{}]", field, index)
        } else {
            format!("{}.{}[{}]", self.path, field, index)
        }
    }
}

/// Validate a single raw component and normalize its fields.
pub fn validate_component(raw: &Value) -> Result<Component, ValidationError> {
    validate_component_at(raw, COMPONENT_PATH.to_string())
}

fn validate_component_at(raw: &Value, path: String) -> Result<Component, ValidationError> {
    let reader = ObjectReader::new(raw, path)?;
    let tag = reader.required("type")?;
    let kind = tag.as_str().and_then(ComponentKind::parse).ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::UnknownComponentType,
            &reader.path,
            Some("type"),
            format!(
                "{} is not one of {}",
                tag,
                ComponentKind::ALL.map(|k| k.as_str()).join(", ")
            ),
        )
    })?;

    match kind {
        ComponentKind::Markdown => Ok(Component::Markdown(MarkdownComponent {
            content: reader.text("content")?,
        })),
        ComponentKind::InfoCard => validate_info_card(&reader).map(Component::InfoCard),
        ComponentKind::DataList => validate_data_list(&reader).map(Component::DataList),
        ComponentKind::StepProcess => validate_step_process(&reader).map(Component::StepProcess),
        ComponentKind::Table => validate_table(&reader).map(Component::Table),
    }
}

fn validate_info_card(reader: &ObjectReader<'_>) -> Result<InfoCardComponent, ValidationError> {
    let title = reader.text("title")?;
    let description = reader.text_or_list("description")?;

    let variant_value = reader.required("variant")?;
    let variant = variant_value
        .as_str()
        .and_then(InfoCardVariant::parse)
        .ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::InvalidValue,
                &reader.path,
                Some("variant"),
                format!(
                    "{} is not one of {}",
                    variant_value,
                    InfoCardVariant::ALL.map(|v| v.as_str()).join(", ")
                ),
            )
        })?;

    if description.is_empty() {
        return Err(ValidationError::empty(&reader.path, "description"));
    }

    Ok(InfoCardComponent {
        title,
        description,
        variant,
    })
}

fn validate_data_list(reader: &ObjectReader<'_>) -> Result<DataListComponent, ValidationError> {
    let title = reader.optional_text("title")?;
    let items = reader
        .array("items")?
        .iter()
        .enumerate()
        .map(|(i, raw)| -> Result<DataItem, ValidationError> {
            let item = ObjectReader::new(raw, reader.element_path("items", i))?;
            Ok(DataItem {
                label: item.text("label")?,
                value: item.text_or_list("value")?,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(DataListComponent { title, items })
}

fn validate_step_process(
    reader: &ObjectReader<'_>,
) -> Result<StepProcessComponent, ValidationError> {
    let title = reader.optional_text("title")?;
    let steps = reader
        .array("steps")?
        .iter()
        .enumerate()
        .map(|(i, raw)| -> Result<StepItem, ValidationError> {
            let step = ObjectReader::new(raw, reader.element_path("steps", i))?;
            Ok(StepItem {
                title: step.text("title")?,
                description: step.text_or_list("description")?,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(StepProcessComponent { title, steps })
}

fn validate_table(reader: &ObjectReader<'_>) -> Result<TableComponent, ValidationError> {
    let title = reader.optional_text("title")?;
    let headers: Vec<String> = reader
        .array("headers")?
        .iter()
        .map(normalize_text_or_list)
        .collect();

    let width = headers.len();
    let mut rows = Vec::new();
    for (i, raw) in reader.array("rows")?.iter().enumerate() {
        let cells = raw.as_array().ok_or_else(|| {
            ValidationError::invalid_type(&reader.element_path("rows", i), None, "an array", raw)
        })?;
        rows.push(fit_row(cells, width, &reader.element_path("rows", i)));
    }

    Ok(TableComponent {
        title,
        headers,
        rows,
    })
}

/// Pad or truncate a row so the table stays rectangular
fn fit_row(cells: &[Value], width: usize, path: &str) -> Vec<String> {
    if cells.len() != width {
        warn!(
            "Table row {} has {} cells but {} headers; fitting to header width",
            path,
            cells.len(),
            width
        );
    }
    let mut row: Vec<String> = cells.iter().take(width).map(normalize_text_or_list).collect();
    row.resize(width, String::new());
    row
}

/// Validate a whole provider payload.
///
/// Suggestions beyond the first two are dropped before the remaining ones
/// are checked; a missing `suggestions` field means no suggestions.
pub fn validate_envelope(raw: &Value) -> Result<ResponseEnvelope, ValidationError> {
    let reader = ObjectReader::new(raw, ENVELOPE_PATH.to_string())?;

    let components = reader
        .array("components")?
        .iter()
        .enumerate()
        .map(|(i, item)| validate_component_at(item, reader.element_path("components", i)))
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let suggestions = match reader.optional("suggestions") {
        None => Vec::new(),
        Some(Value::Array(items)) => {
            if items.len() > MAX_SUGGESTIONS {
                warn!(
                    "Provider returned {} suggestions; keeping the first {}",
                    items.len(),
                    MAX_SUGGESTIONS
                );
            }
            items
                .iter()
                .take(MAX_SUGGESTIONS)
                .enumerate()
                .map(|(i, item)| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ValidationError::invalid_type(
                            &reader.element_path("suggestions", i),
                            None,
                            "a string",
                            item,
                        )
                    })
                })
                .collect::<Result<Vec<_>, ValidationError>>()?
        }
        Some(other) => {
            return Err(ValidationError::invalid_type(
                &reader.path,
                Some("suggestions"),
                "an array",
                other,
            ))
        }
    };

    Ok(ResponseEnvelope {
        components,
        suggestions,
    })
}
