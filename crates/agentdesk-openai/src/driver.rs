// OpenAI Protocol LLM Driver
//
// Implementation of LlmDriver for OpenAI-compatible chat completion APIs.
// The same driver serves OpenAI, Azure OpenAI (api-key header, deployment URL)
// and hosts that expose the OpenAI protocol (Groq, Mistral, Together, ...).

use async_trait::async_trait;
use eventsource_stream::{Event, Eventsource};
use futures::{stream, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};

use agentdesk_core::error::{AgentError, Result};
use agentdesk_core::llm_drivers::{
    LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmMessage, LlmMessageRole,
    LlmResponseStream, LlmStreamEvent,
};
use agentdesk_core::tool_types::{ToolCall, ToolDefinition};

use crate::types::{
    ChatFunction, ChatFunctionCall, ChatMessage, ChatRequest, ChatTool, ChatToolCall,
    StreamChunk, StreamOptions, Usage,
};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Upper bound on tool calls accepted in one completion
const MAX_TOOL_CALLS: usize = 128;

/// How the API key is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>` (OpenAI and compatible hosts)
    Bearer,
    /// `api-key: <key>` (Azure OpenAI)
    ApiKeyHeader,
}

/// OpenAI Protocol LLM Driver
///
/// Supports streaming responses and tool calls.
///
/// # Example
///
/// ```ignore
/// use agentdesk_openai::OpenAiLlmDriver;
///
/// let driver = OpenAiLlmDriver::new("your-api-key");
/// // or with an OpenAI-compatible endpoint
/// let driver = OpenAiLlmDriver::with_base_url("your-api-key", "https://api.groq.com/openai/v1");
/// // or an Azure deployment
/// let driver = OpenAiLlmDriver::azure("your-api-key", "https://acme.openai.azure.com/openai/deployments/gpt4/chat/completions?api-version=2024-02-01");
/// ```
#[derive(Clone)]
pub struct OpenAiLlmDriver {
    client: Client,
    api_key: String,
    api_url: String,
    auth: AuthScheme,
    stream_usage: bool,
}

impl OpenAiLlmDriver {
    /// Create a driver for api.openai.com
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            auth: AuthScheme::Bearer,
            stream_usage: true,
        }
    }

    /// Create a driver for an OpenAI-compatible endpoint.
    ///
    /// `base_url` may be the API root (`https://host/v1`) or the full
    /// chat completions URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: chat_completions_url(base_url.as_ref()),
            auth: AuthScheme::Bearer,
            stream_usage: false,
        }
    }

    /// Create a driver for an Azure OpenAI deployment URL
    pub fn azure(api_key: impl Into<String>, deployment_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: deployment_url.into(),
            auth: AuthScheme::ApiKeyHeader,
            stream_usage: false,
        }
    }

    /// Ask the server for a final usage chunk (`stream_options.include_usage`)
    pub fn with_stream_usage(mut self, enabled: bool) -> Self {
        self.stream_usage = enabled;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        self.auth
    }

    fn convert_role(role: LlmMessageRole) -> &'static str {
        match role {
            LlmMessageRole::System => "system",
            LlmMessageRole::User => "user",
            LlmMessageRole::Assistant => "assistant",
            LlmMessageRole::Tool => "tool",
        }
    }

    fn convert_message(msg: &LlmMessage) -> ChatMessage {
        ChatMessage {
            role: Self::convert_role(msg.role).to_string(),
            content: Some(msg.content.clone()),
            tool_calls: msg.tool_calls.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|tc| ChatToolCall {
                        id: tc.id.clone(),
                        r#type: "function".to_string(),
                        function: ChatFunctionCall {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
        tools
            .iter()
            .map(|tool| ChatTool {
                r#type: "function".to_string(),
                function: ChatFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect()
    }

    fn build_request(&self, messages: &[LlmMessage], config: &LlmCallConfig) -> ChatRequest {
        ChatRequest {
            model: config.model.clone(),
            messages: messages.iter().map(Self::convert_message).collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: true,
            stream_options: self.stream_usage.then_some(StreamOptions {
                include_usage: true,
            }),
            tools: (!config.tools.is_empty()).then(|| Self::convert_tools(&config.tools)),
        }
    }
}

#[async_trait]
impl LlmDriver for OpenAiLlmDriver {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream> {
        let request = self.build_request(&messages, config);

        let builder = self.client.post(&self.api_url).json(&request);
        let builder = match self.auth {
            AuthScheme::Bearer => builder.bearer_auth(&self.api_key),
            AuthScheme::ApiKeyHeader => builder.header("api-key", &self.api_key),
        };

        tracing::debug!(model = %config.model, url = %self.api_url, "Sending chat completion request");

        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::llm(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::llm(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let mut state = StreamState::new(config.model.clone());
        let events = response
            .bytes_stream()
            .eventsource()
            .flat_map(move |result| stream::iter(state.handle(result)));

        Ok(Box::pin(events))
    }
}

impl std::fmt::Debug for OpenAiLlmDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiLlmDriver")
            .field("api_url", &self.api_url)
            .field("auth", &self.auth)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Normalize an API root or full endpoint into the chat completions URL
pub fn chat_completions_url(base_url: &str) -> String {
    if base_url.contains(CHAT_COMPLETIONS_PATH) {
        return base_url.to_string();
    }
    format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH)
}

// ============================================================================
// Stream decoding
// ============================================================================

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates tool call fragments and usage across SSE chunks
struct StreamState {
    model: String,
    usage: Option<Usage>,
    finish_reason: Option<String>,
    tool_calls: Vec<PartialToolCall>,
}

impl StreamState {
    fn new(model: String) -> Self {
        Self {
            model,
            usage: None,
            finish_reason: None,
            tool_calls: Vec::new(),
        }
    }

    fn handle<E: std::fmt::Display>(
        &mut self,
        result: std::result::Result<Event, E>,
    ) -> Vec<Result<LlmStreamEvent>> {
        let event = match result {
            Ok(event) => event,
            Err(e) => return vec![Ok(LlmStreamEvent::Error(format!("Stream error: {}", e)))],
        };

        if event.data == "[DONE]" {
            return vec![Ok(LlmStreamEvent::Done(self.metadata()))];
        }

        let chunk = match serde_json::from_str::<StreamChunk>(&event.data) {
            Ok(chunk) => chunk,
            Err(e) => {
                return vec![Ok(LlmStreamEvent::Error(format!(
                    "Failed to parse chunk: {}",
                    e
                )))]
            }
        };

        if let Some(model) = chunk.model {
            self.model = model;
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }

        let mut out = Vec::new();
        let Some(choice) = chunk.choices.into_iter().next() else {
            return out;
        };

        if let Some(delta) = choice.delta {
            for tc in delta.tool_calls.unwrap_or_default() {
                let idx = tc.index as usize;
                if idx > self.tool_calls.len() || idx >= MAX_TOOL_CALLS {
                    return vec![Ok(LlmStreamEvent::Error(format!(
                        "Invalid tool call index {} ({} tool calls so far)",
                        tc.index,
                        self.tool_calls.len()
                    )))];
                }
                if idx == self.tool_calls.len() {
                    self.tool_calls.push(PartialToolCall::default());
                }
                let acc = &mut self.tool_calls[idx];
                if let Some(id) = tc.id {
                    acc.id = id;
                }
                if let Some(function) = tc.function {
                    if let Some(name) = function.name {
                        acc.name = name;
                    }
                    if let Some(args) = function.arguments {
                        acc.arguments.push_str(&args);
                    }
                }
            }

            if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                out.push(Ok(LlmStreamEvent::TextDelta(content)));
            }
        }

        if let Some(finish_reason) = choice.finish_reason {
            if !self.tool_calls.is_empty() {
                out.push(Ok(LlmStreamEvent::ToolCalls(self.take_tool_calls())));
            }
            self.finish_reason = Some(finish_reason);
        }

        out
    }

    fn take_tool_calls(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.tool_calls)
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.name,
                arguments: serde_json::from_str::<Value>(&tc.arguments).unwrap_or(json!({})),
            })
            .collect()
    }

    fn metadata(&self) -> LlmCompletionMetadata {
        LlmCompletionMetadata {
            total_tokens: self.usage.map(|u| u.total_tokens),
            prompt_tokens: self.usage.map(|u| u.prompt_tokens),
            completion_tokens: self.usage.map(|u| u.completion_tokens),
            model: Some(self.model.clone()),
            finish_reason: self.finish_reason.clone(),
        }
    }
}
