use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::agent::input_types::{ChatTurn, Message};
use crate::agent::output_types::{Component, ResponseEnvelope, TurnOutcome};
use crate::agent::response_schema::response_schema;
use crate::agent::stateless_llm::{LLMError, StatelessLLMInterface};
use crate::agent::system_prompt::build_system_prompt;
use crate::agent::validation::{validate_envelope, ValidationError};
use crate::config::Config;

/// The provider did not produce a payload
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider did not answer within {}s", .0.as_secs_f32())]
    ProviderTimeout(Duration),

    #[error(transparent)]
    ProviderError(#[from] LLMError),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("response violates the component schema: {0}")]
    SchemaViolation(#[from] ValidationError),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Generation(_) => "GenerationError",
            ChatError::SchemaViolation(_) => "SchemaViolation",
        }
    }
}

/// Turns a prompt into a validated [`ResponseEnvelope`].
///
/// Holds only immutable configuration, so one instance is shared by all
/// requests. Each call makes exactly one provider request; there is no retry.
pub struct ChatService {
    llm: Arc<dyn StatelessLLMInterface>,
    system_prompt: String,
    timeout: Duration,
}

impl ChatService {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>, system_prompt: String, timeout: Duration) -> Self {
        Self {
            llm,
            system_prompt,
            timeout,
        }
    }

    pub fn from_config(llm: Arc<dyn StatelessLLMInterface>, config: &Config) -> Self {
        let system_prompt = config
            .agent
            .system_prompt
            .clone()
            .unwrap_or_else(|| build_system_prompt(&config.agent.response_language));
        Self::new(llm, system_prompt, Duration::from_secs(config.llm.timeout_secs))
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Single prompt in, validated envelope out.
    pub async fn handle_chat(&self, prompt: &str) -> Result<ResponseEnvelope, ChatError> {
        self.run_turn(ChatTurn::new(prompt, Vec::new()))
            .await
            .map(|outcome| outcome.envelope)
    }

    /// Run one turn. The turn state is consumed and handed back in the outcome.
    pub async fn run_turn(&self, mut turn: ChatTurn) -> Result<TurnOutcome, ChatError> {
        let started = Instant::now();
        debug!(
            "Turn {}: prompt of {} chars, {} history entries (not forwarded)",
            turn.request_id,
            turn.prompt.chars().count(),
            turn.history.len()
        );

        let messages = vec![Message::user(turn.prompt.clone())];
        let call = self
            .llm
            .structured_completion(messages, &self.system_prompt, response_schema());

        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(GenerationError::ProviderTimeout(self.timeout).into())
            }
            Ok(Err(e)) => return Err(GenerationError::from(e).into()),
            Err(_) => return Err(GenerationError::ProviderTimeout(self.timeout).into()),
        };

        let envelope = match validate_envelope(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Turn {}: rejected payload {}", turn.request_id, raw);
                return Err(e.into());
            }
        };

        debug!(
            "Turn {}: component kinds {:?}",
            turn.request_id,
            envelope.components.iter().map(Component::kind).collect::<Vec<_>>()
        );
        info!(
            "Turn {} completed by {} in {:?}: {} components, {} suggestions",
            turn.request_id,
            self.llm.name(),
            started.elapsed(),
            envelope.components.len(),
            envelope.suggestions.len()
        );

        turn.last_output = Some(raw);
        Ok(TurnOutcome {
            turn,
            envelope,
            end_invocation: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::input_types::Role;
    use crate::agent::stateless_llm_factory::StatelessLLMFactory;
    use crate::agent::testing::{MockLLM, MockReply};
    use crate::agent::validation::ValidationErrorKind;
    use serde_json::json;

    fn service(llm: Arc<MockLLM>, timeout: Duration) -> ChatService {
        ChatService::new(llm, "system rules".to_string(), timeout)
    }

    #[tokio::test]
    async fn provider_output_is_validated_and_normalized() {
        let llm = Arc::new(MockLLM::returning(json!({
            "components": [
                {"type": "info_card", "title": "T", "description": ["a", "b"], "variant": "info"}
            ],
            "suggestions": ["one", "two", "three"]
        })));
        let service = service(llm.clone(), Duration::from_secs(5));

        let envelope = service.handle_chat("tell me").await.unwrap();

        match &envelope.components[0] {
            Component::InfoCard(card) => assert_eq!(card.description, "a\nb"),
            other => panic!("expected info card, got {:?}", other),
        }
        assert_eq!(envelope.suggestions, vec!["one", "two"]);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn provider_receives_prompt_system_and_schema() {
        let llm = Arc::new(MockLLM::returning(json!({"components": [], "suggestions": []})));
        let service = service(llm.clone(), Duration::from_secs(5));

        service.handle_chat("").await.unwrap();

        let calls = llm.calls.lock().unwrap();
        let call = &calls[0];
        assert_eq!(call.system, "system rules");
        assert_eq!(&call.schema, response_schema());
        assert_eq!(call.messages.len(), 1);
        assert_eq!(call.messages[0].role, Role::User);
        assert_eq!(call.messages[0].content, "");
    }

    #[tokio::test]
    async fn turn_state_is_returned_with_termination_signal() {
        let payload = json!({"components": [{"type": "markdown", "content": "hi"}]});
        let llm = Arc::new(MockLLM::returning(payload.clone()));
        let service = service(llm, Duration::from_secs(5));

        let turn = ChatTurn::new("hello", vec![json!({"role": "user", "content": "earlier"})]);
        let request_id = turn.request_id;
        let outcome = service.run_turn(turn).await.unwrap();

        assert!(outcome.end_invocation);
        assert_eq!(outcome.turn.request_id, request_id);
        assert_eq!(outcome.turn.history.len(), 1);
        assert_eq!(outcome.turn.last_output, Some(payload));
    }

    #[tokio::test]
    async fn schema_violation_is_reported() {
        let llm = Arc::new(MockLLM::returning(json!({
            "components": [{"type": "bogus"}],
            "suggestions": []
        })));
        let service = service(llm, Duration::from_secs(5));

        let err = service.handle_chat("hi").await.unwrap_err();
        assert_eq!(err.kind(), "SchemaViolation");
        match err {
            ChatError::SchemaViolation(e) => {
                assert_eq!(e.kind, ValidationErrorKind::UnknownComponentType)
            }
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn provider_error_is_a_generation_error() {
        let llm = Arc::new(MockLLM::new(MockReply::Status(503, "model loading")));
        let service = service(llm.clone(), Duration::from_secs(5));

        let err = service.handle_chat("hi").await.unwrap_err();
        assert_eq!(err.kind(), "GenerationError");
        assert!(matches!(
            err,
            ChatError::Generation(GenerationError::ProviderError(LLMError::Status { status: 503, .. }))
        ));
        assert!(err.to_string().contains("model loading"));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let llm = Arc::new(MockLLM::new(MockReply::Hang));
        let service = service(llm, Duration::from_millis(20));

        let err = service.handle_chat("hi").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Generation(GenerationError::ProviderTimeout(_))
        ));
    }

    #[tokio::test]
    async fn stalled_provider_socket_is_a_timeout() {
        // accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut config = Config::default();
        config.llm.provider = "llama_cpp_llm".to_string();
        config.llm.base_url = Some(format!("http://{}/v1", addr));
        config.llm.timeout_secs = 1;
        let llm = StatelessLLMFactory::create_llm(&config.llm).unwrap();
        let service = ChatService::from_config(llm, &config);

        for _ in 0..3 {
            let err = service.handle_chat("hi").await.unwrap_err();
            assert!(
                matches!(err, ChatError::Generation(GenerationError::ProviderTimeout(_))),
                "unexpected error: {:?}",
                err
            );
        }
    }

    #[test]
    fn config_prompt_override_wins() {
        let llm: Arc<dyn StatelessLLMInterface> =
            Arc::new(MockLLM::returning(json!({"components": []})));
        let mut config = Config::default();
        config.agent.system_prompt = Some("custom".to_string());

        let service = ChatService::from_config(llm.clone(), &config);
        assert_eq!(service.system_prompt, "custom");

        config.agent.system_prompt = None;
        config.agent.response_language = "English".to_string();
        let service = ChatService::from_config(llm, &config);
        assert!(service.system_prompt.contains("ALWAYS reply in English"));
        assert_eq!(service.timeout, Duration::from_secs(30));
    }
}
