// AgentDesk runner
//
// Turns a persisted agent into something that can answer a request:
// - AgentBase: loads the agent definition and picks a back end
// - OpenAiAgent / GenericAgent: build an executor for their provider family
// - LlmAgentExecutor: runs the request and streams events to the callback

pub mod backend;
pub mod base;
pub mod executor;
pub mod generic;
pub mod openai;
pub mod prompt;
pub mod tools;

pub use backend::{AgentBackend, BackendKind, RunOptions};
pub use base::{AgentBase, AgentBaseBuilder};
pub use executor::{AgentExecutor, AgentOutput, LlmAgentExecutor};
pub use generic::GenericAgent;
pub use openai::{OpenAiAgent, DEFAULT_OPENAI_MODEL};
pub use prompt::DEFAULT_PROMPT;
