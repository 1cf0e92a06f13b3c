use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::agent::Relay;
use crate::capabilities::CapabilityInvoker;
use crate::llm::provider::{ChatMessage, LlmProvider};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn response(status: StatusCode, error: impl Into<String>) -> Response {
        (
            status,
            Json(Self {
                error: error.into(),
            }),
        )
            .into_response()
    }
}

pub(super) async fn chat<P, C>(
    State(relay): State<Arc<Relay<P, C>>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response
where
    P: LlmProvider + Send + Sync + 'static,
    C: CapabilityInvoker + Send + Sync + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "rejected chat request");
            return ErrorBody::response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match relay
        .run_turn(&request.message, request.conversation_history)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => {
            error!(error = %err, "chat turn failed");
            ErrorBody::response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
