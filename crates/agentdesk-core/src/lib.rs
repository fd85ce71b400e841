// AgentDesk core
//
// DB-agnostic building blocks shared by storage, provider drivers and the runner:
// - Agent records (Agent, Llm, Tool, Datasource) and the AgentDefinition aggregate
// - LlmDriver trait with a DriverRegistry populated by provider crates at startup
// - AgentStore / MessageStore / EventEmitter traits for pluggable backends
// - In-memory implementations for tests and database-less runs

pub mod agent;
pub mod error;
pub mod events;
pub mod llm_drivers;
pub mod llm_providers;
pub mod message;
pub mod tool_types;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use agent::{
    Agent, AgentDatasource, AgentDefinition, AgentLlm, AgentTool, Datasource, Llm, Tool,
};
pub use error::{AgentError, Result};
pub use events::AgentEvent;
pub use llm_drivers::{
    BoxedLlmDriver, DriverRegistry, LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmMessage,
    LlmMessageRole, LlmResponse, LlmResponseStream, LlmStreamEvent, ProviderConfig,
};
pub use llm_providers::{resolve_model_name, LlmProviderKind};
pub use message::{Message, MessageRole};
pub use tool_types::{ToolCall, ToolDefinition};
pub use traits::{AgentStore, EventEmitter, MessageStore};
