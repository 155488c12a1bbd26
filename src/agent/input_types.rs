use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message sent to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request-scoped state of one chat turn.
///
/// Passed by value into the chat service and handed back in the
/// `TurnOutcome`; nothing about a turn outlives the request.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub request_id: Uuid,
    pub prompt: String,
    /// Client-side history, carried along untouched
    pub history: Vec<serde_json::Value>,
    /// Raw provider payload of the last completion, before validation
    pub last_output: Option<serde_json::Value>,
}

impl ChatTurn {
    pub fn new(prompt: impl Into<String>, history: Vec<serde_json::Value>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            prompt: prompt.into(),
            history,
            last_output: None,
        }
    }
}
