use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::dispatch::dispatch_function_call;
use crate::capabilities::{CapabilityInvoker, RegistryError};
use crate::llm::provider::{ChatMessage, CompletionInput, LlmError, LlmProvider, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    Completion(LlmError),
    Registry(RegistryError),
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completion(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RelayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Completion(err) => Some(err),
            Self::Registry(err) => Some(err),
        }
    }
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        Self::Completion(err)
    }
}

impl From<RegistryError> for RelayError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

#[derive(Debug, Clone)]
pub struct Relay<P, C> {
    provider: P,
    capabilities: C,
}

impl<P: LlmProvider, C: CapabilityInvoker> Relay<P, C> {
    pub fn new(provider: P, capabilities: C) -> Self {
        Self {
            provider,
            capabilities,
        }
    }

    pub async fn run_turn(
        &self,
        user_message: &str,
        mut history: Vec<ChatMessage>,
    ) -> Result<TurnOutcome, RelayError> {
        info!(history_len = history.len(), "chat turn started");
        history.push(ChatMessage::user(user_message));

        debug!(messages = history.len(), "requesting completion with function declarations");
        let first = self
            .provider
            .complete(CompletionInput {
                messages: history.clone(),
                functions: self.capabilities.describe(),
            })
            .await?
            .message;

        let Some(call) = first.function_call.clone() else {
            info!("answered without a function call");
            if first.content.is_none() {
                return Err(LlmError::EmptyResponse.into());
            }
            return Ok(finish(history, first));
        };

        let dispatched = dispatch_function_call(&self.capabilities, &call).await?;
        history.push(first);
        history.push(dispatched);

        debug!(messages = history.len(), "requesting completion with function result");
        let second = self
            .provider
            .complete(CompletionInput {
                messages: history.clone(),
                functions: Vec::new(),
            })
            .await?
            .message;

        if let Some(extra) = &second.function_call {
            warn!(function = %extra.name, "ignoring function call in follow-up completion");
        }
        Ok(finish(history, second))
    }
}

// At most one function call is served per turn.
fn finish(mut history: Vec<ChatMessage>, reply: ChatMessage) -> TurnOutcome {
    let response = reply.content.clone().unwrap_or_default();
    history.push(ChatMessage {
        role: Role::Assistant,
        function_call: None,
        ..reply
    });
    TurnOutcome {
        response,
        conversation_history: history,
    }
}
