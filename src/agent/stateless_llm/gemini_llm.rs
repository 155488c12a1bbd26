use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::stateless_llm_interface::{LLMError, StatelessLLMInterface};
use crate::agent::input_types::{Message, Role};
use crate::agent::transformers::extract_json_payload;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client using JSON-schema constrained output
pub struct GeminiLLM {
    client: Client,
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiLLM {
    pub fn new(
        client: Client,
        model: String,
        base_url: String,
        api_key: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        info!("Initialized GeminiLLM: model={}, base_url={}", model, base_url);
        Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature,
            max_tokens,
        }
    }

    fn build_request_body(&self, messages: &[Message], system: &str, schema: &Value) -> Value {
        let contents: Vec<Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        json!({
            "contents": contents,
            "systemInstruction": { "parts": [{ "text": system }] },
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_tokens,
                "responseMimeType": "application/json",
                "responseJsonSchema": schema
            }
        })
    }

    fn invalid(&self, reason: impl Into<String>) -> LLMError {
        LLMError::InvalidResponse {
            provider: self.name().to_string(),
            reason: reason.into(),
        }
    }

    fn parse_response(&self, response: GenerateContentResponse) -> Result<Value, LLMError> {
        let candidate = match response.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                let feedback = response
                    .prompt_feedback
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "none".to_string());
                return Err(self.invalid(format!("no candidates (prompt feedback: {})", feedback)));
            }
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(self.invalid(format!("empty candidate (finish reason: {})", reason)));
        }

        extract_json_payload(&text).map_err(|e| self.invalid(format!("content is not JSON: {}", e)))
    }
}

#[async_trait]
impl StatelessLLMInterface for GeminiLLM {
    fn name(&self) -> &str {
        "gemini_llm"
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
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request_body(&messages, system, schema);
        debug!("POST {}", url);

        let transport = |source| LLMError::Transport {
            provider: self.name().to_string(),
            source,
        };
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Status {
                provider: self.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(transport)?;
        self.parse_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm() -> GeminiLLM {
        GeminiLLM::new(
            Client::new(),
            "gemini-2.5-flash".to_string(),
            GEMINI_BASE_URL.to_string(),
            "key".to_string(),
            0.7,
            2048,
        )
    }

    #[test]
    fn request_uses_system_instruction_and_json_schema() {
        let schema = json!({"type": "object"});
        let body = llm().build_request_body(&[Message::user("hello")], "be brief", &schema);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseJsonSchema"], schema);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn candidate_parts_are_joined_and_parsed() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "{\"components\": [], "},
                    {"text": "\"suggestions\": []}"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let value = llm().parse_response(response).unwrap();
        assert_eq!(value, json!({"components": [], "suggestions": []}));
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        let err = llm().parse_response(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
