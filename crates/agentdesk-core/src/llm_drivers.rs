// LLM Driver Abstractions
//
// This module encapsulates everything needed to talk to an LLM provider:
// - LlmDriver trait and types for provider-agnostic LLM calls
// - DriverRegistry for driver registration at startup
// - Message types for LLM calls
//
// IMPORTANT: API keys come from the LLM record attached to the agent. The
// registry does NOT read environment variables.
//
// Provider crates (agentdesk-openai, agentdesk-anthropic) depend on core and
// register their drivers at startup. Core has no knowledge of concrete providers.

use async_trait::async_trait;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::llm_providers::LlmProviderKind;
use crate::tool_types::{ToolCall, ToolDefinition};

// ============================================================================
// LlmDriver Trait
// ============================================================================

/// Type alias for the LLM response stream
pub type LlmResponseStream = Pin<Box<dyn Stream<Item = Result<LlmStreamEvent>> + Send>>;

/// Events emitted during LLM streaming
#[derive(Debug, Clone)]
pub enum LlmStreamEvent {
    /// Text delta (incremental content)
    TextDelta(String),
    /// Tool calls from the LLM
    ToolCalls(Vec<ToolCall>),
    /// Streaming completed
    Done(LlmCompletionMetadata),
    /// Error during streaming
    Error(String),
}

/// Metadata about LLM completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmCompletionMetadata {
    pub total_tokens: Option<u32>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

/// Trait for LLM drivers
///
/// Implementations handle provider-specific API calls and response parsing.
#[async_trait]
pub trait LlmDriver: Send + Sync {
    /// Call the LLM with streaming response
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream>;

    /// Call the LLM without streaming (convenience method)
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse> {
        use futures::StreamExt;

        let mut stream = self.chat_completion_stream(messages, config).await?;
        let mut text = String::new();
        let mut tool_calls = Vec::new();
        let mut metadata = LlmCompletionMetadata::default();

        while let Some(event) = stream.next().await {
            match event? {
                LlmStreamEvent::TextDelta(delta) => text.push_str(&delta),
                LlmStreamEvent::ToolCalls(calls) => tool_calls = calls,
                LlmStreamEvent::Done(meta) => metadata = meta,
                LlmStreamEvent::Error(err) => return Err(AgentError::llm(err)),
            }
        }

        Ok(LlmResponse {
            text,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            metadata,
        })
    }
}

/// Boxed LLM driver for dynamic dispatch
pub type BoxedLlmDriver = Box<dyn LlmDriver>;

#[async_trait]
impl LlmDriver for Box<dyn LlmDriver> {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream> {
        (**self).chat_completion_stream(messages, config).await
    }

    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse> {
        (**self).chat_completion(messages, config).await
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Message format for LLM calls (provider-agnostic)
#[derive(Debug, Clone, PartialEq)]
pub struct LlmMessage {
    pub role: LlmMessageRole,
    pub content: String,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tool_call_id: Option<String>,
}

impl LlmMessage {
    /// Create a message with text content
    pub fn text(role: LlmMessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(LlmMessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(LlmMessageRole::User, content)
    }
}

/// Message role for LLM calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmMessageRole {
    System,
    User,
    Assistant,
    Tool,
}

// ============================================================================
// Configuration and Response Types
// ============================================================================

/// Configuration for an LLM call
#[derive(Debug, Clone, PartialEq)]
pub struct LlmCallConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Vec<ToolDefinition>,
}

impl LlmCallConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            tools: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Response from an LLM call (non-streaming)
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub metadata: LlmCompletionMetadata,
}

// ============================================================================
// Driver Registry
// ============================================================================

/// Configuration for creating an LLM driver
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: LlmProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: LlmProviderKind) -> Self {
        Self {
            provider,
            api_key: None,
            base_url: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Factory function creating a driver from an API key and optional base URL
pub type DriverFactory = Arc<dyn Fn(&str, Option<&str>) -> BoxedLlmDriver + Send + Sync>;

/// Registry of LLM driver factories keyed by provider
///
/// # Example
///
/// ```ignore
/// use agentdesk_core::llm_drivers::DriverRegistry;
///
/// let mut registry = DriverRegistry::new();
/// agentdesk_openai::register_driver(&mut registry);
/// agentdesk_anthropic::register_driver(&mut registry);
/// ```
#[derive(Clone, Default)]
pub struct DriverRegistry {
    factories: HashMap<LlmProviderKind, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a driver factory for a provider
    pub fn register<F>(&mut self, provider: LlmProviderKind, factory: F)
    where
        F: Fn(&str, Option<&str>) -> BoxedLlmDriver + Send + Sync + 'static,
    {
        self.factories.insert(provider, Arc::new(factory));
    }

    /// Create an LLM driver based on configuration
    ///
    /// Fails when no API key is configured or no driver is registered for the provider.
    pub fn create_driver(&self, config: &ProviderConfig) -> Result<BoxedLlmDriver> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AgentError::config(format!(
                    "API key is required for provider {}. Configure it on the LLM record.",
                    config.provider
                ))
            })?;

        let factory = self
            .factories
            .get(&config.provider)
            .ok_or_else(|| AgentError::driver_not_registered(config.provider.to_string()))?;

        tracing::debug!(provider = %config.provider, base_url = ?config.base_url, "Creating LLM driver");
        Ok(factory(api_key, config.base_url.as_deref()))
    }

    /// Check if a driver is registered for a provider
    pub fn has_driver(&self, provider: &LlmProviderKind) -> bool {
        self.factories.contains_key(provider)
    }

    /// Get the list of registered providers
    pub fn registered_providers(&self) -> Vec<LlmProviderKind> {
        self.factories.keys().copied().collect()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("providers", &self.registered_providers())
            .finish()
    }
}
