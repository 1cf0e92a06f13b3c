use serde::{Deserialize, Serialize};

use super::provider::{
    ChatMessage, CompletionInput, CompletionOutput, FunctionCall, FunctionDeclaration, LlmError,
    LlmProvider, LlmResult, Role,
};
use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        http: HttpClient,
        api_key: Option<String>,
        model: String,
        base_url: String,
    ) -> LlmResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request<'a>(&'a self, input: &'a CompletionInput) -> ChatCompletionRequest<'a> {
        let declares_functions = !input.functions.is_empty();
        ChatCompletionRequest {
            model: &self.model,
            messages: &input.messages,
            functions: declares_functions.then_some(input.functions.as_slice()),
            function_call: declares_functions.then_some("auto"),
        }
    }

    fn extract_message(resp: ChatCompletionResponse) -> LlmResult<ChatMessage> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        Ok(ChatMessage {
            role: choice.message.role.unwrap_or(Role::Assistant),
            content: choice.message.content,
            name: None,
            function_call: choice.message.function_call,
        })
    }
}

impl LlmProvider for OpenAiProvider {
    async fn complete(&self, input: CompletionInput) -> LlmResult<CompletionOutput> {
        let payload = self.build_request(&input);
        let resp = self
            .http
            .post_json(&self.endpoint(), Some(&self.api_key), &payload)
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !resp.is_success() {
            let body = resp.body.chars().take(400).collect::<String>();
            return Err(LlmError::HttpStatus {
                status: resp.status,
                body,
            });
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let message = Self::extract_message(parsed)?;
        Ok(CompletionOutput { message })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [FunctionDeclaration]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}
