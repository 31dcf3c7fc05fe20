//! OpenAI-compatible completion backend.
//!
//! Sends chat completions with a single forced function so the model returns
//! exactly one structured object. Works with the OpenAI API and compatible
//! servers (vLLM, Ollama, Azure OpenAI).

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::*;

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible backend.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiBackend {
    /// Create a new OpenAI-compatible backend.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Create a backend for OpenAI API.
    pub fn openai(model: &str, api_key: impl Into<String>) -> Self {
        Self::new(OPENAI_BASE_URL, model, Some(api_key.into()))
    }

    /// Share a pooled HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Build the request URL.
    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build authorization header if API key is set.
    fn auth_header(&self) -> Option<String> {
        self.api_key.as_ref().map(|k| format!("Bearer {}", k))
    }
}

/// OpenAI chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolRequest<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSpec,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolChoiceFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ToolChoiceFunction<'a> {
    name: &'a str,
}

/// OpenAI chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<UsageResponse>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallResponse>,
    /// Legacy single function call
    function_call: Option<FunctionCallResponse>,
}

#[derive(Debug, Deserialize)]
struct ToolCallResponse {
    function: FunctionCallResponse,
}

#[derive(Debug, Deserialize)]
struct FunctionCallResponse {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

/// Extract the forced call's arguments from a response message.
fn structured_arguments(
    message: &MessageResponse,
    expected: Option<&str>,
) -> Result<Option<serde_json::Value>, LlmError> {
    let call = message
        .tool_calls
        .iter()
        .map(|call| &call.function)
        .chain(message.function_call.as_ref())
        .find(|call| expected.map_or(true, |name| call.name == name));

    let Some(call) = call else {
        return Ok(None);
    };

    serde_json::from_str(&call.arguments).map(Some).map_err(|e| {
        LlmError::ParseError(format!("arguments of {} are not JSON: {}", call.name, e))
    })
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn id(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        let mut request = self.client.get(&url);

        if let Some(auth) = self.auth_header() {
            request = request.header(header::AUTHORIZATION, auth);
        }

        request
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut messages: Vec<ChatMessage> = Vec::new();

        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }

        for msg in &request.messages {
            messages.push(ChatMessage {
                role: role_name(msg.role),
                content: &msg.content,
            });
        }

        let (tools, tool_choice) = match &request.required_tool {
            Some(tool) => (
                vec![ToolRequest {
                    kind: "function",
                    function: tool,
                }],
                Some(ToolChoice {
                    kind: "function",
                    function: ToolChoiceFunction { name: &tool.name },
                }),
            ),
            None => (Vec::new(), None),
        };

        let chat_request = ChatRequest {
            model: &self.model,
            messages,
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
            tools,
            tool_choice,
        };

        let mut http_request = self.client.post(self.chat_completions_url());

        if let Some(auth) = self.auth_header() {
            http_request = http_request.header(header::AUTHORIZATION, auth);
        }

        let response = http_request
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited { retry_after_ms: None });
            }

            return Err(LlmError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError("No choices in response".to_string()))?;

        let expected = request.required_tool.as_ref().map(|tool| tool.name.as_str());
        let structured = structured_arguments(&choice.message, expected)?;
        if structured.is_none() && expected.is_some() {
            debug!(model = %self.model, "Completion returned no function call");
        }

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        };

        let usage = chat_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            structured,
            finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: serde_json::Value) -> MessageResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_openai_creation() {
        let backend = OpenAiBackend::openai("gpt-4o", "sk-test");
        assert_eq!(backend.id(), "gpt-4o");
        assert_eq!(
            backend.chat_completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(backend.auth_header().as_deref(), Some("Bearer sk-test"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = OpenAiBackend::new("http://localhost:11434/v1/", "llama3.2", None);
        assert_eq!(
            backend.chat_completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
        assert!(backend.auth_header().is_none());
    }

    #[test]
    fn test_tool_call_arguments_extracted() {
        let msg = message(json!({
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "generateStep", "arguments": "{\"name\":\"S\"}"}
            }]
        }));

        let value = structured_arguments(&msg, Some("generateStep")).unwrap();
        assert_eq!(value, Some(json!({"name": "S"})));
    }

    #[test]
    fn test_legacy_function_call_accepted() {
        let msg = message(json!({
            "content": null,
            "function_call": {"name": "generateActivity", "arguments": "{\"name\":\"A\"}"}
        }));

        let value = structured_arguments(&msg, Some("generateActivity")).unwrap();
        assert_eq!(value, Some(json!({"name": "A"})));
    }

    #[test]
    fn test_wrong_function_or_text_only_is_absent() {
        let msg = message(json!({
            "content": "I'd rather chat",
            "tool_calls": [{
                "type": "function",
                "function": {"name": "somethingElse", "arguments": "{}"}
            }]
        }));
        assert_eq!(structured_arguments(&msg, Some("generateStep")).unwrap(), None);

        let msg = message(json!({"content": "Plain text"}));
        assert_eq!(structured_arguments(&msg, Some("generateStep")).unwrap(), None);
    }

    #[test]
    fn test_malformed_arguments_are_parse_errors() {
        let msg = message(json!({
            "tool_calls": [{
                "type": "function",
                "function": {"name": "generateStep", "arguments": "{\"name\": "}
            }]
        }));

        let result = structured_arguments(&msg, Some("generateStep"));
        assert!(matches!(result, Err(LlmError::ParseError(_))));
    }
}
