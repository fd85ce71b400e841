// Core traits for pluggable backends
//
// These traits keep agent resolution independent of where records live:
// - In-memory implementations for examples and testing
// - Database implementations for production
// - Channel-based implementations for streaming

use async_trait::async_trait;

use crate::agent::AgentDefinition;
use crate::error::Result;
use crate::events::AgentEvent;
use crate::message::Message;
use uuid::Uuid;

// ============================================================================
// AgentStore - For loading agent definitions
// ============================================================================

/// Trait for loading agents together with their relations
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Load an agent with its LLMs, tools and datasources.
    ///
    /// Returns `Ok(None)` when no agent has this id.
    async fn get_agent_definition(&self, agent_id: Uuid) -> Result<Option<AgentDefinition>>;
}

// ============================================================================
// EventEmitter - For streaming events during execution
// ============================================================================

/// Trait for emitting events while an agent request runs
///
/// Implementations can:
/// - Send events to a channel for SSE streaming
/// - Collect events in memory for testing
/// - Do nothing (no-op implementation)
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Emit a single event
    async fn emit(&self, event: AgentEvent) -> Result<()>;
}

// ============================================================================
// MessageStore - For session history
// ============================================================================

/// Trait for storing and retrieving session history
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a message
    async fn store(&self, session_id: &str, message: Message) -> Result<()>;

    /// Store multiple messages
    async fn store_batch(&self, session_id: &str, messages: Vec<Message>) -> Result<()> {
        for message in messages {
            self.store(session_id, message).await?;
        }
        Ok(())
    }

    /// Load all messages for a session
    async fn load(&self, session_id: &str) -> Result<Vec<Message>>;
}
