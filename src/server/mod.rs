mod chat;

use std::sync::Arc;

use axum::Router;
use axum::response::Html;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::agent::Relay;
use crate::capabilities::CapabilityInvoker;
use crate::llm::provider::LlmProvider;

pub use chat::{ChatRequest, ErrorBody};

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub fn router<P, C>(relay: Arc<Relay<P, C>>) -> Router
where
    P: LlmProvider + Send + Sync + 'static,
    C: CapabilityInvoker + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat::chat::<P, C>))
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
