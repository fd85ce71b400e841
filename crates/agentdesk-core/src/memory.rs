// In-memory implementations for examples and testing
//
// These implementations keep all data in memory, which makes them useful for:
// - Running agents without a database
// - Unit and integration tests
// - Bridging streaming callbacks to a channel

use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::agent::AgentDefinition;
use crate::error::{AgentError, Result};
use crate::events::AgentEvent;
use crate::llm_drivers::{
    LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmMessage, LlmResponseStream,
    LlmStreamEvent,
};
use crate::message::Message;
use crate::tool_types::ToolCall;
use crate::traits::{AgentStore, EventEmitter, MessageStore};

// ============================================================================
// InMemoryAgentStore
// ============================================================================

/// In-memory agent store keyed by agent id
#[derive(Debug, Default, Clone)]
pub struct InMemoryAgentStore {
    agents: Arc<RwLock<HashMap<Uuid, AgentDefinition>>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an agent definition
    pub async fn add_agent(&self, definition: AgentDefinition) {
        self.agents
            .write()
            .await
            .insert(definition.agent.id, definition);
    }

    pub async fn agent_ids(&self) -> Vec<Uuid> {
        self.agents.read().await.keys().copied().collect()
    }

    pub async fn clear(&self) {
        self.agents.write().await.clear();
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn get_agent_definition(&self, agent_id: Uuid) -> Result<Option<AgentDefinition>> {
        Ok(self.agents.read().await.get(&agent_id).cloned())
    }
}

// ============================================================================
// InMemoryMessageStore
// ============================================================================

/// In-memory message store keyed by session id
#[derive(Debug, Default, Clone)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sessions(&self) -> Vec<String> {
        self.messages.read().await.keys().cloned().collect()
    }

    /// Pre-populate a session (useful for testing)
    pub async fn seed(&self, session_id: impl Into<String>, messages: Vec<Message>) {
        self.messages
            .write()
            .await
            .insert(session_id.into(), messages);
    }

    pub async fn clear_session(&self, session_id: &str) {
        self.messages.write().await.remove(session_id);
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn store(&self, session_id: &str, message: Message) -> Result<()> {
        self.messages
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// Event emitters
// ============================================================================

/// Collects emitted events in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventEmitter {
    events: Arc<RwLock<Vec<AgentEvent>>>,
}

impl InMemoryEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AgentEvent> {
        self.events.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventEmitter for InMemoryEventEmitter {
    async fn emit(&self, event: AgentEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

/// Forwards emitted events into an unbounded channel
///
/// The receiving side can be consumed as a `Stream` for SSE-style delivery.
#[derive(Debug, Clone)]
pub struct ChannelEventEmitter {
    sender: mpsc::UnboundedSender<AgentEvent>,
}

impl ChannelEventEmitter {
    /// Create an emitter and the stream of events it produces
    pub fn new() -> (Self, UnboundedReceiverStream<AgentEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, UnboundedReceiverStream::new(receiver))
    }
}

#[async_trait]
impl EventEmitter for ChannelEventEmitter {
    async fn emit(&self, event: AgentEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| AgentError::event("event receiver dropped"))
    }
}

/// Discards all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventEmitter;

#[async_trait]
impl EventEmitter for NoopEventEmitter {
    async fn emit(&self, _event: AgentEvent) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// MockLlmDriver - Returns predefined responses
// ============================================================================

/// A mock LLM response
#[derive(Debug, Clone)]
pub struct MockLlmResponse {
    pub text: String,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl MockLlmResponse {
    /// Create a text-only response
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: None,
        }
    }

    /// Create a response with tool calls
    pub fn with_tools(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Some(tool_calls),
        }
    }
}

/// Mock LLM driver for testing
///
/// Returns predefined responses in sequence and records every call. Clones
/// share state, so a test can keep a handle while the registry owns another.
#[derive(Debug, Default, Clone)]
pub struct MockLlmDriver {
    responses: Arc<RwLock<Vec<MockLlmResponse>>>,
    call_index: Arc<RwLock<usize>>,
    call_log: Arc<RwLock<Vec<(Vec<LlmMessage>, LlmCallConfig)>>>,
}

impl MockLlmDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver that always has the given responses queued
    pub fn with_responses(responses: Vec<MockLlmResponse>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(responses)),
            ..Self::default()
        }
    }

    pub async fn add_response(&self, response: MockLlmResponse) {
        self.responses.write().await.push(response);
    }

    /// Messages and call configuration of every call, in order
    pub async fn calls(&self) -> Vec<(Vec<LlmMessage>, LlmCallConfig)> {
        self.call_log.read().await.clone()
    }
}

#[async_trait]
impl LlmDriver for MockLlmDriver {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream> {
        self.call_log.write().await.push((messages, config.clone()));

        let mut index = self.call_index.write().await;
        let response = self
            .responses
            .read()
            .await
            .get(*index)
            .cloned()
            .unwrap_or_else(|| MockLlmResponse::text("Mock response (no more responses configured)"));
        *index += 1;
        drop(index);

        let mut events = Vec::new();
        // Split text into word-sized deltas so streaming consumers see several chunks
        for chunk in response.text.split_inclusive(' ') {
            events.push(Ok(LlmStreamEvent::TextDelta(chunk.to_string())));
        }
        if let Some(tool_calls) = response.tool_calls {
            events.push(Ok(LlmStreamEvent::ToolCalls(tool_calls)));
        }
        events.push(Ok(LlmStreamEvent::Done(LlmCompletionMetadata {
            model: Some(config.model.clone()),
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        })));

        Ok(Box::pin(stream::iter(events)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_in_memory_message_store() {
        let store = InMemoryMessageStore::new();

        store.store("s1", Message::user("Hello")).await.unwrap();
        store.store("s1", Message::assistant("Hi!")).await.unwrap();

        let messages = store.load("s1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hi!");
        assert!(store.load("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_channel_event_emitter_streams_events() {
        let (emitter, mut stream) = ChannelEventEmitter::new();

        emitter.emit(AgentEvent::text_delta("a", "x")).await.unwrap();
        emitter.emit(AgentEvent::run_completed("a", None)).await.unwrap();
        drop(emitter);

        let events: Vec<_> = stream.by_ref().collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[tokio::test]
    async fn test_channel_event_emitter_fails_when_receiver_dropped() {
        let (emitter, stream) = ChannelEventEmitter::new();
        drop(stream);

        let result = emitter.emit(AgentEvent::text_delta("a", "x")).await;
        assert!(matches!(result, Err(AgentError::EventEmission(_))));
    }

    #[tokio::test]
    async fn test_mock_driver_returns_responses_in_order() {
        let driver = MockLlmDriver::with_responses(vec![
            MockLlmResponse::text("first answer"),
            MockLlmResponse::text("second"),
        ]);
        let config = LlmCallConfig::new("mock-model");

        let first = driver
            .chat_completion(vec![LlmMessage::user("1")], &config)
            .await
            .unwrap();
        let second = driver
            .chat_completion(vec![LlmMessage::user("2")], &config)
            .await
            .unwrap();

        assert_eq!(first.text, "first answer");
        assert_eq!(second.text, "second");
        assert_eq!(first.metadata.model.as_deref(), Some("mock-model"));
        assert_eq!(driver.calls().await.len(), 2);
    }
}
