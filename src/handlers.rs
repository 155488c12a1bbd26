use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::agent::chat_service::ChatError;
use crate::agent::input_types::ChatTurn;
use crate::agent::output_types::ResponseEnvelope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Passed through to the turn untouched
    #[serde(default)]
    pub history: Option<Vec<Value>>,
}

type ErrorResponse = (StatusCode, Json<Value>);

fn error_response(err: &ChatError) -> ErrorResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": err.to_string() })),
    )
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ResponseEnvelope>, ErrorResponse> {
    let turn = ChatTurn::new(request.message, request.history.unwrap_or_default());
    let request_id = turn.request_id;
    info!("Chat request {} received", request_id);

    match state.chat_service.run_turn(turn).await {
        Ok(outcome) => Ok(Json(outcome.envelope)),
        Err(e) => {
            error!("Chat request {} failed ({}): {}", request_id, e.kind(), e);
            Err(error_response(&e))
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "provider": state.chat_service.provider_name(),
        "model": state.chat_service.model(),
        "timeout_secs": state.config.llm.timeout_secs
    }))
}
