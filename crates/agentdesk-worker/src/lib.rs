// AgentDesk worker
//
// Wires the runner to real collaborators:
// - DriverRegistry populated by every provider crate
// - DbAgentStore reading agent definitions from Postgres
// - DbMessageStore persisting session history across runs
// - ChannelEventEmitter printing deltas when streaming is requested

pub mod cli;

use anyhow::Result;
use futures::StreamExt;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use agentdesk_core::memory::ChannelEventEmitter;
use agentdesk_core::{AgentEvent, AgentStore, DriverRegistry, MessageStore, ToolCall};
use agentdesk_runner::{AgentBase, AgentOutput};

use crate::cli::RunArgs;

/// Registry with every driver linked into the worker
pub fn build_driver_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    agentdesk_openai::register_driver(&mut registry);
    agentdesk_anthropic::register_driver(&mut registry);
    registry
}

/// Result printed by the worker
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub agent_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

impl RunReport {
    pub fn new(args: &RunArgs, output: AgentOutput) -> Self {
        Self {
            agent_id: args.agent_id,
            session_id: args.session_id.clone(),
            text: output.text,
            tool_calls: output.tool_calls,
            model: output.metadata.model,
            finish_reason: output.metadata.finish_reason,
            total_tokens: output.metadata.total_tokens,
        }
    }
}

/// Run one agent request
///
/// With `--stream`, text deltas are written to stdout while the request runs.
/// History for `--session-id` is read from and appended to `memory`.
pub async fn run_agent(
    args: &RunArgs,
    store: Arc<dyn AgentStore>,
    memory: Arc<dyn MessageStore>,
    drivers: Arc<DriverRegistry>,
) -> Result<AgentOutput> {
    let mut builder = AgentBase::builder(args.agent_id, store, drivers)
        .enable_streaming(args.stream)
        .memory(memory);
    if let Some(session_id) = &args.session_id {
        builder = builder.session_id(session_id.clone());
    }
    if let Some(schema) = &args.output_schema {
        builder = builder.output_schema(schema.clone());
    }

    if !args.stream {
        let executor = builder.build().get_agent().await?;
        return Ok(executor.invoke(&args.input).await?);
    }

    let (emitter, events) = ChannelEventEmitter::new();
    let printer = tokio::spawn(print_events(events));

    let result = async {
        let executor = builder.callback(Arc::new(emitter)).build().get_agent().await?;
        executor.invoke(&args.input).await
    }
    .await;

    // Every emitter clone is dropped by now, so the printer sees the end of the stream
    printer.await??;
    Ok(result?)
}

async fn print_events(mut events: UnboundedReceiverStream<AgentEvent>) -> Result<()> {
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        match event {
            AgentEvent::TextDelta { delta, .. } => {
                write!(stdout, "{}", delta)?;
                stdout.flush()?;
            }
            AgentEvent::RunCompleted { .. } => writeln!(stdout)?,
            AgentEvent::RunFailed { error, .. } => {
                writeln!(stdout)?;
                tracing::error!(error = %error, "Agent run failed");
            }
            AgentEvent::RunStarted { .. } => {}
        }
    }
    Ok(())
}
