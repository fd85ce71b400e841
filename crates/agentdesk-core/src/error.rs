// Error types for agent resolution and execution

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while resolving or running an agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Agent store / message store error
    #[error("Store error: {0}")]
    Store(String),

    /// Event emission error
    #[error("Event emission error: {0}")]
    EventEmission(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Agent not found
    #[error("Agent not found: {0}")]
    AgentNotFound(Uuid),

    /// Agent has no LLM attached
    #[error("Agent {0} has no LLM attached")]
    NoLlmAttached(Uuid),

    /// No driver registered for the provider
    #[error("No LLM driver registered for provider: {0}")]
    DriverNotRegistered(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AgentError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        AgentError::Llm(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        AgentError::Store(msg.into())
    }

    /// Create an event emission error
    pub fn event(msg: impl Into<String>) -> Self {
        AgentError::EventEmission(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Configuration(msg.into())
    }

    /// Create an agent not found error
    pub fn agent_not_found(agent_id: Uuid) -> Self {
        AgentError::AgentNotFound(agent_id)
    }

    /// Create a driver not registered error
    pub fn driver_not_registered(provider: impl Into<String>) -> Self {
        AgentError::DriverNotRegistered(provider.into())
    }
}
