// Anthropic Claude LLM Driver
//
// Implementation of LlmDriver for Anthropic's Messages API with streaming.
// System messages are lifted into the top-level `system` field; tool results
// are sent back as user messages carrying tool_result blocks.

use async_trait::async_trait;
use eventsource_stream::{Event, Eventsource};
use futures::{stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use agentdesk_core::error::{AgentError, Result};
use agentdesk_core::llm_drivers::{
    BoxedLlmDriver, DriverRegistry, LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmMessage,
    LlmMessageRole, LlmResponseStream, LlmStreamEvent,
};
use agentdesk_core::llm_providers::LlmProviderKind;
use agentdesk_core::tool_types::{ToolCall, ToolDefinition};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic Claude LLM Driver
///
/// # Example
///
/// ```ignore
/// use agentdesk_anthropic::AnthropicLlmDriver;
///
/// let driver = AnthropicLlmDriver::new("your-api-key");
/// // or with custom endpoint
/// let driver = AnthropicLlmDriver::with_base_url("your-api-key", "https://proxy.example.com");
/// ```
#[derive(Clone)]
pub struct AnthropicLlmDriver {
    client: Client,
    api_key: String,
    api_url: String,
}

impl AnthropicLlmDriver {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Create a driver for a custom endpoint.
    ///
    /// `base_url` may be the host root or the full `/v1/messages` URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Self {
        let base_url = base_url.as_ref();
        let api_url = if base_url.contains("/messages") {
            base_url.to_string()
        } else {
            format!("{}/v1/messages", base_url.trim_end_matches('/'))
        };
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn convert_messages(messages: &[LlmMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts = Vec::new();
        let mut converted = Vec::new();

        for msg in messages {
            match msg.role {
                LlmMessageRole::System => system_parts.push(msg.content.clone()),
                LlmMessageRole::Tool => {
                    if let Some(tool_call_id) = &msg.tool_call_id {
                        converted.push(AnthropicMessage {
                            role: "user".to_string(),
                            content: vec![AnthropicContentBlock::ToolResult {
                                tool_use_id: tool_call_id.clone(),
                                content: msg.content.clone(),
                            }],
                        });
                    }
                }
                LlmMessageRole::Assistant => {
                    let mut content = Vec::new();
                    if !msg.content.is_empty() {
                        content.push(AnthropicContentBlock::Text {
                            text: msg.content.clone(),
                        });
                    }
                    for tc in msg.tool_calls.iter().flatten() {
                        content.push(AnthropicContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: tc.arguments.clone(),
                        });
                    }
                    converted.push(AnthropicMessage {
                        role: "assistant".to_string(),
                        content,
                    });
                }
                LlmMessageRole::User => converted.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: vec![AnthropicContentBlock::Text {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        (system, converted)
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|tool| AnthropicTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.parameters.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmDriver for AnthropicLlmDriver {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream> {
        let (system, anthropic_messages) = Self::convert_messages(&messages);

        let request = AnthropicRequest {
            model: config.model.clone(),
            messages: anthropic_messages,
            max_tokens: config
                .max_tokens
                .filter(|tokens| *tokens > 0)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: config.temperature,
            system,
            stream: true,
            tools: (!config.tools.is_empty()).then(|| Self::convert_tools(&config.tools)),
        };

        tracing::debug!(model = %config.model, url = %self.api_url, "Sending messages request");

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::llm(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::llm(format!(
                "Anthropic API error ({}): {}",
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

impl std::fmt::Debug for AnthropicLlmDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicLlmDriver")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Register the Anthropic driver with the driver registry
pub fn register_driver(registry: &mut DriverRegistry) {
    registry.register(LlmProviderKind::Anthropic, |api_key, base_url| {
        let driver = match base_url {
            Some(url) => AnthropicLlmDriver::with_base_url(api_key, url),
            None => AnthropicLlmDriver::new(api_key),
        };
        Box::new(driver) as BoxedLlmDriver
    });
}

// ============================================================================
// Stream decoding
// ============================================================================

struct PendingToolUse {
    id: String,
    name: String,
    input_json: String,
}

struct StreamState {
    model: String,
    input_tokens: u32,
    output_tokens: u32,
    stop_reason: Option<String>,
    current_tool: Option<PendingToolUse>,
    tool_calls: Vec<ToolCall>,
}

impl StreamState {
    fn new(model: String) -> Self {
        Self {
            model,
            input_tokens: 0,
            output_tokens: 0,
            stop_reason: None,
            current_tool: None,
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

        match event.event.as_str() {
            "message_start" => {
                if let Ok(data) = serde_json::from_str::<MessageStart>(&event.data) {
                    if let Some(model) = data.message.model {
                        self.model = model;
                    }
                    if let Some(usage) = data.message.usage {
                        self.input_tokens = usage.input_tokens;
                    }
                }
                Vec::new()
            }
            "content_block_start" => {
                if let Ok(data) = serde_json::from_str::<ContentBlockStart>(&event.data) {
                    if let StartBlock::ToolUse { id, name } = data.content_block {
                        self.current_tool = Some(PendingToolUse {
                            id,
                            name,
                            input_json: String::new(),
                        });
                    }
                }
                Vec::new()
            }
            "content_block_delta" => match serde_json::from_str::<ContentBlockDelta>(&event.data)
            {
                Ok(ContentBlockDelta {
                    delta: BlockDelta::TextDelta { text },
                }) if !text.is_empty() => vec![Ok(LlmStreamEvent::TextDelta(text))],
                Ok(ContentBlockDelta {
                    delta: BlockDelta::InputJsonDelta { partial_json },
                }) => {
                    if let Some(tool) = self.current_tool.as_mut() {
                        tool.input_json.push_str(&partial_json);
                    }
                    Vec::new()
                }
                _ => Vec::new(),
            },
            "content_block_stop" => {
                if let Some(tool) = self.current_tool.take() {
                    let input = if tool.input_json.trim().is_empty() {
                        json!({})
                    } else {
                        serde_json::from_str(&tool.input_json).unwrap_or(json!({}))
                    };
                    self.tool_calls.push(ToolCall {
                        id: tool.id,
                        name: tool.name,
                        arguments: input,
                    });
                }
                Vec::new()
            }
            "message_delta" => {
                let mut out = Vec::new();
                if let Ok(data) = serde_json::from_str::<MessageDelta>(&event.data) {
                    if let Some(usage) = data.usage {
                        self.output_tokens = usage.output_tokens;
                    }
                    if let Some(stop_reason) = data.delta.stop_reason {
                        if !self.tool_calls.is_empty() {
                            out.push(Ok(LlmStreamEvent::ToolCalls(std::mem::take(
                                &mut self.tool_calls,
                            ))));
                        }
                        self.stop_reason = Some(stop_reason);
                    }
                }
                out
            }
            "message_stop" => vec![Ok(LlmStreamEvent::Done(LlmCompletionMetadata {
                total_tokens: Some(self.input_tokens.saturating_add(self.output_tokens)),
                prompt_tokens: Some(self.input_tokens),
                completion_tokens: Some(self.output_tokens),
                model: Some(self.model.clone()),
                finish_reason: self.stop_reason.clone(),
            }))],
            "error" => vec![Ok(LlmStreamEvent::Error(format!(
                "Anthropic stream error: {}",
                event.data
            )))],
            // ping and unknown event types
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct MessageStart {
    message: MessageInfo,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ContentBlockStart {
    content_block: StartBlock,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StartBlock {
    Text {},
    ToolUse { id: String, name: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: BlockDelta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    delta: MessageDeltaData,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaData {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_messages_lifts_system_prompt() {
        let messages = vec![
            LlmMessage::system("You are helpful."),
            LlmMessage::user("Hi"),
            LlmMessage::text(LlmMessageRole::Assistant, "Hello!"),
        ];

        let (system, converted) = AnthropicLlmDriver::convert_messages(&messages);

        assert_eq!(system.as_deref(), Some("You are helpful."));
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "user");
        assert_eq!(converted[1].role, "assistant");
    }

    #[test]
    fn test_base_url_normalization() {
        let driver = AnthropicLlmDriver::with_base_url("k", "https://proxy.example.com/");
        assert_eq!(driver.api_url(), "https://proxy.example.com/v1/messages");

        let driver = AnthropicLlmDriver::with_base_url("k", "https://proxy.example.com/v1/messages");
        assert_eq!(driver.api_url(), "https://proxy.example.com/v1/messages");
    }
}
