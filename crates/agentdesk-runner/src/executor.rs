// Agent executor
//
// The object a back end hands back to the factory's caller. It runs one
// request against the LLM:
// - Loads session history from the MessageStore
// - Streams the completion, forwarding deltas to the callback
// - Stores the exchange back to the session
//
// Tool calls requested by the model are returned to the caller, never executed.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agentdesk_core::error::{AgentError, Result};
use agentdesk_core::events::AgentEvent;
use agentdesk_core::llm_drivers::{
    BoxedLlmDriver, LlmCallConfig, LlmCompletionMetadata, LlmMessage, LlmStreamEvent,
};
use agentdesk_core::message::Message;
use agentdesk_core::tool_types::ToolCall;
use agentdesk_core::traits::{EventEmitter, MessageStore};

use crate::backend::{BackendKind, RunOptions};

/// Result of one agent request
#[derive(Debug, Clone, Default)]
pub struct AgentOutput {
    /// Final assistant text
    pub text: String,
    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    pub metadata: LlmCompletionMetadata,
}

/// Executes agent requests
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Back end that built this executor
    fn backend(&self) -> BackendKind;

    /// Run one request with the given user input
    async fn invoke(&self, input: &str) -> Result<AgentOutput>;
}

/// Executor backed by an LLM driver
pub struct LlmAgentExecutor {
    agent_id: Uuid,
    backend: BackendKind,
    driver: BoxedLlmDriver,
    config: LlmCallConfig,
    system_prompt: String,
    options: RunOptions,
    memory: Arc<dyn MessageStore>,
}

impl LlmAgentExecutor {
    pub fn new(
        agent_id: Uuid,
        backend: BackendKind,
        driver: BoxedLlmDriver,
        config: LlmCallConfig,
        system_prompt: String,
        options: RunOptions,
        memory: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            agent_id,
            backend,
            driver,
            config,
            system_prompt,
            options,
            memory,
        }
    }

    pub fn agent_id(&self) -> Uuid {
        self.agent_id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn call_config(&self) -> &LlmCallConfig {
        &self.config
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Callback to stream to, only when streaming is enabled
    fn streaming_emitter(&self) -> Option<&dyn EventEmitter> {
        if self.options.enable_streaming {
            self.options.callback.as_deref()
        } else {
            None
        }
    }

    async fn build_messages(&self, input: &str) -> Result<Vec<LlmMessage>> {
        let mut messages = vec![LlmMessage::system(self.system_prompt.clone())];

        if let Some(session_id) = &self.options.session_id {
            let history = self.memory.load(session_id).await?;
            debug!(
                agent_id = %self.agent_id,
                session_id = %session_id,
                history = history.len(),
                "Loaded session history"
            );
            messages.extend(history.iter().map(LlmMessage::from));
        }

        messages.push(LlmMessage::user(input));
        Ok(messages)
    }

    async fn run(&self, input: &str, emitter: Option<&dyn EventEmitter>) -> Result<AgentOutput> {
        let messages = self.build_messages(input).await?;

        let mut stream = self
            .driver
            .chat_completion_stream(messages, &self.config)
            .await?;

        let mut output = AgentOutput::default();
        while let Some(event) = stream.next().await {
            match event? {
                LlmStreamEvent::TextDelta(delta) => {
                    if delta.is_empty() {
                        continue;
                    }
                    output.text.push_str(&delta);
                    if let Some(emitter) = emitter {
                        emitter
                            .emit(AgentEvent::text_delta(self.agent_id.to_string(), delta))
                            .await?;
                    }
                }
                LlmStreamEvent::ToolCalls(calls) => output.tool_calls = calls,
                LlmStreamEvent::Done(metadata) => {
                    output.metadata = metadata;
                    break;
                }
                LlmStreamEvent::Error(err) => return Err(AgentError::llm(err)),
            }
        }

        if let Some(session_id) = &self.options.session_id {
            self.memory
                .store_batch(
                    session_id,
                    vec![Message::user(input), Message::assistant(output.text.clone())],
                )
                .await?;
        }

        Ok(output)
    }
}

#[async_trait]
impl AgentExecutor for LlmAgentExecutor {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    async fn invoke(&self, input: &str) -> Result<AgentOutput> {
        info!(
            agent_id = %self.agent_id,
            backend = %self.backend,
            model = %self.config.model,
            tools = self.config.tools.len(),
            "Invoking agent"
        );

        let emitter = self.streaming_emitter();
        if let Some(emitter) = emitter {
            emitter
                .emit(AgentEvent::run_started(
                    self.agent_id.to_string(),
                    self.options.session_id.clone(),
                ))
                .await?;
        }

        match self.run(input, emitter).await {
            Ok(output) => {
                if let Some(emitter) = emitter {
                    emitter
                        .emit(AgentEvent::run_completed(
                            self.agent_id.to_string(),
                            output.metadata.finish_reason.clone(),
                        ))
                        .await?;
                }
                info!(
                    agent_id = %self.agent_id,
                    chars = output.text.len(),
                    tool_calls = output.tool_calls.len(),
                    "Agent request completed"
                );
                Ok(output)
            }
            Err(err) => {
                warn!(agent_id = %self.agent_id, error = %err, "Agent request failed");
                if let Some(emitter) = emitter {
                    if let Err(emit_err) = emitter
                        .emit(AgentEvent::run_failed(self.agent_id.to_string(), err.to_string()))
                        .await
                    {
                        warn!(error = %emit_err, "Failed to emit run failure");
                    }
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for LlmAgentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgentExecutor")
            .field("agent_id", &self.agent_id)
            .field("backend", &self.backend)
            .field("model", &self.config.model)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
