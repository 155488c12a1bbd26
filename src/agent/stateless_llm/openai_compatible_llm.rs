use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::stateless_llm_interface::{LLMError, StatelessLLMInterface};
use crate::agent::input_types::{Message, Role};
use crate::agent::response_schema::RESPONSE_SCHEMA_NAME;
use crate::agent::transformers::extract_json_payload;

/// llama.cpp server as deployed next to the service
pub const DEFAULT_OPENAI_COMPATIBLE_BASE_URL: &str = "http://localhost:9006/v1";

/// Client for any server speaking the OpenAI chat-completions API with
/// `response_format: json_schema` (llama.cpp server, Ollama, LM Studio, OpenAI).
pub struct OpenAICompatibleLLM {
    client: Client,
    name: String,
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAICompatibleLLM {
    pub fn new(
        client: Client,
        name: String,
        model: String,
        base_url: String,
        api_key: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        info!(
            "Initialized OpenAICompatibleLLM: provider={}, model={}, base_url={}",
            name, model, base_url
        );
        Self {
            client,
            name,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature,
            max_tokens,
        }
    }

    fn build_request_body(&self, messages: &[Message], system: &str, schema: &Value) -> Value {
        let mut chat = vec![json!({ "role": Role::System, "content": system })];
        chat.extend(
            messages
                .iter()
                .map(|m| json!({ "role": m.role, "content": m.content })),
        );

        json!({
            "model": self.model,
            "messages": chat,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": RESPONSE_SCHEMA_NAME,
                    "schema": schema
                }
            }
        })
    }

    fn invalid(&self, reason: impl Into<String>) -> LLMError {
        LLMError::InvalidResponse {
            provider: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn parse_completion(&self, completion: ChatCompletion) -> Result<Value, LLMError> {
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.invalid("no choices in completion"))?;

        if let Some(refusal) = choice.message.refusal.filter(|r| !r.is_empty()) {
            return Err(self.invalid(format!("model refused: {}", refusal)));
        }

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| self.invalid("completion has no content"))?;

        extract_json_payload(&content).map_err(|e| {
            if choice.finish_reason.as_deref() == Some("length") {
                self.invalid(format!("output truncated at max_tokens: {}", e))
            } else {
                self.invalid(format!("content is not JSON: {}", e))
            }
        })
    }
}

#[async_trait]
impl StatelessLLMInterface for OpenAICompatibleLLM {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn structured_completion(
        &self,
        messages: Vec<Message>,
        system: &str,
        schema: &Value,
    ) -> Result<Value, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(&messages, system, schema);
        debug!("POST {} ({} messages)", url, messages.len() + 1);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let transport = |source| LLMError::Transport {
            provider: self.name.clone(),
            source,
        };
        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Status {
                provider: self.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(transport)?;
        self.parse_completion(completion)
    }
}
