use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_content(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_content(Role::Assistant, text)
    }

    pub fn assistant_function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: Some(content.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }

    fn with_content(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            name: None,
            function_call: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionInput {
    pub messages: Vec<ChatMessage>,
    pub functions: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutput {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    MissingApiKey,
    HttpStatus { status: u16, body: String },
    Transport(String),
    Parse(String),
    EmptyResponse,
}

impl Display for LlmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "missing OPENAI_API_KEY"),
            Self::HttpStatus { status, body } => {
                write!(f, "completion request failed with status {status}: {body}")
            }
            Self::Transport(msg) => write!(f, "completion transport error: {msg}"),
            Self::Parse(msg) => write!(f, "completion parse error: {msg}"),
            Self::EmptyResponse => write!(f, "completion returned neither text nor a function call"),
        }
    }
}

impl Error for LlmError {}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

pub trait LlmProvider {
    fn complete(
        &self,
        input: CompletionInput,
    ) -> impl std::future::Future<Output = LlmResult<CompletionOutput>> + Send;
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, FunctionCall, Role};
    use serde_json::json;

    #[test]
    fn function_call_message_serializes_null_content() {
        let message = ChatMessage::assistant_function_call(FunctionCall {
            name: "get_joke".to_string(),
            arguments: "{}".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({
                "role": "assistant",
                "content": null,
                "function_call": {"name": "get_joke", "arguments": "{}"}
            })
        );
    }

    #[test]
    fn function_result_message_carries_name() {
        let message = ChatMessage::function_result("get_joke", r#"{"joke":"x"}"#);
        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({"role": "function", "content": "{\"joke\":\"x\"}", "name": "get_joke"})
        );
    }

    #[test]
    fn history_entries_decode_with_missing_optional_fields() {
        let message: ChatMessage =
            serde_json::from_value(json!({"role": "system", "content": "be brief"}))
                .expect("decode");
        assert_eq!(message.role, Role::System);
        assert_eq!(message.content.as_deref(), Some("be brief"));
        assert!(message.function_call.is_none());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let err = serde_json::from_value::<ChatMessage>(json!({"role": "tool", "content": "x"}))
            .expect_err("tool role is not part of this protocol");
        assert!(err.to_string().contains("unknown variant"));
    }
}
