use serde::{Deserialize, Serialize};

use crate::agent::input_types::ChatTurn;

/// Discriminator of a renderable component. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Markdown,
    InfoCard,
    DataList,
    StepProcess,
    Table,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Markdown,
        ComponentKind::InfoCard,
        ComponentKind::DataList,
        ComponentKind::StepProcess,
        ComponentKind::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Markdown => "markdown",
            ComponentKind::InfoCard => "info_card",
            ComponentKind::DataList => "data_list",
            ComponentKind::StepProcess => "step_process",
            ComponentKind::Table => "table",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual style of an info card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoCardVariant {
    Info,
    Warning,
    Success,
    Danger,
}

impl InfoCardVariant {
    pub const ALL: [InfoCardVariant; 4] = [
        InfoCardVariant::Info,
        InfoCardVariant::Warning,
        InfoCardVariant::Success,
        InfoCardVariant::Danger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InfoCardVariant::Info => "info",
            InfoCardVariant::Warning => "warning",
            InfoCardVariant::Success => "success",
            InfoCardVariant::Danger => "danger",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|variant| variant.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownComponent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoCardComponent {
    pub title: String,
    pub description: String,
    pub variant: InfoCardVariant,
}

/// Label/value pair describing one attribute of a single entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataListComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<DataItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepItem {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProcessComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub steps: Vec<StepItem>,
}

/// Comparison table. Every row has exactly `headers.len()` cells once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A renderable UI component, tagged on the wire by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Markdown(MarkdownComponent),
    InfoCard(InfoCardComponent),
    DataList(DataListComponent),
    StepProcess(StepProcessComponent),
    Table(TableComponent),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Markdown(_) => ComponentKind::Markdown,
            Component::InfoCard(_) => ComponentKind::InfoCard,
            Component::DataList(_) => ComponentKind::DataList,
            Component::StepProcess(_) => ComponentKind::StepProcess,
            Component::Table(_) => ComponentKind::Table,
        }
    }
}

/// Top-level structured response sent to the client.
///
/// `components` are in rendering order. `suggestions` never holds more than
/// [`MAX_SUGGESTIONS`] entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub components: Vec<Component>,
    pub suggestions: Vec<String>,
}

pub const MAX_SUGGESTIONS: usize = 2;

/// Result of one completed turn through the chat service.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The turn state, handed back to the caller with `last_output` filled in
    pub turn: ChatTurn,
    pub envelope: ResponseEnvelope,
    /// No further provider calls should be made for this turn
    pub end_invocation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn component_serializes_with_type_tag() {
        let component = Component::InfoCard(InfoCardComponent {
            title: "Heads up".to_string(),
            description: "a\nb".to_string(),
            variant: InfoCardVariant::Warning,
        });

        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "info_card",
                "title": "Heads up",
                "description": "a\nb",
                "variant": "warning"
            })
        );
    }

    #[test]
    fn absent_title_is_omitted() {
        let component = Component::DataList(DataListComponent {
            title: None,
            items: vec![DataItem {
                label: "X".to_string(),
                value: "1".to_string(),
            }],
        });

        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value["type"], "data_list");
        assert!(value.get("title").is_none());
    }

    #[test]
    fn kind_tags_round_trip_through_parse() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ComponentKind::parse("bogus"), None);
    }
}
