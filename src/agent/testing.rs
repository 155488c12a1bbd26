// In-process provider used by unit and router tests

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::input_types::Message;
use crate::agent::stateless_llm::{LLMError, StatelessLLMInterface};

pub enum MockReply {
    Payload(Value),
    Status(u16, &'static str),
    Hang,
}

/// What the provider was called with
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub system: String,
    pub schema: Value,
}

pub struct MockLLM {
    reply: MockReply,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl MockLLM {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(payload: Value) -> Self {
        Self::new(MockReply::Payload(payload))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StatelessLLMInterface for MockLLM {
    fn name(&self) -> &str {
        "mock_llm"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn structured_completion(
        &self,
        messages: Vec<Message>,
        system: &str,
        schema: &Value,
    ) -> Result<Value, LLMError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages,
            system: system.to_string(),
            schema: schema.clone(),
        });

        match &self.reply {
            MockReply::Payload(value) => Ok(value.clone()),
            MockReply::Status(status, body) => Err(LLMError::Status {
                provider: "mock_llm".to_string(),
                status: *status,
                body: body.to_string(),
            }),
            MockReply::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(LLMError::InvalidResponse {
                    provider: "mock_llm".to_string(),
                    reason: "hung call was not cancelled".to_string(),
                })
            }
        }
    }
}
