// Agent factory
//
// AgentBase is the single entry point for running an agent:
// 1. Load the agent definition (agent + llms + tools + datasources)
// 2. Pick a back end from the provider of the first attached LLM
// 3. Hand the request options to that back end and return its executor

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agentdesk_core::agent::AgentDefinition;
use agentdesk_core::error::{AgentError, Result};
use agentdesk_core::llm_drivers::DriverRegistry;
use agentdesk_core::memory::InMemoryMessageStore;
use agentdesk_core::traits::{AgentStore, EventEmitter, MessageStore};

use crate::backend::{AgentBackend, BackendKind, RunOptions};
use crate::executor::AgentExecutor;
use crate::generic::GenericAgent;
use crate::openai::OpenAiAgent;

/// Resolves an agent id into a ready-to-run executor
pub struct AgentBase {
    agent_id: Uuid,
    options: RunOptions,
    store: Arc<dyn AgentStore>,
    drivers: Arc<DriverRegistry>,
    memory: Arc<dyn MessageStore>,
}

impl AgentBase {
    /// Start building a factory for an agent
    pub fn builder(
        agent_id: Uuid,
        store: Arc<dyn AgentStore>,
        drivers: Arc<DriverRegistry>,
    ) -> AgentBaseBuilder {
        AgentBaseBuilder {
            agent_id,
            options: RunOptions::default(),
            store,
            drivers,
            memory: None,
        }
    }

    pub fn agent_id(&self) -> Uuid {
        self.agent_id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.options.session_id.as_deref()
    }

    pub fn enable_streaming(&self) -> bool {
        self.options.enable_streaming
    }

    pub fn output_schema(&self) -> Option<&str> {
        self.options.output_schema.as_deref()
    }

    pub fn callback(&self) -> Option<&Arc<dyn EventEmitter>> {
        self.options.callback.as_ref()
    }

    /// Back end for a loaded definition, decided by its first LLM
    pub fn backend_for(definition: &AgentDefinition) -> Result<BackendKind> {
        definition
            .primary_llm()
            .map(|llm| BackendKind::for_provider(llm.provider))
            .ok_or(AgentError::NoLlmAttached(definition.agent.id))
    }

    /// Load the agent and build its executor
    pub async fn get_agent(&self) -> Result<Box<dyn AgentExecutor>> {
        let definition = self
            .store
            .get_agent_definition(self.agent_id)
            .await?
            .ok_or_else(|| {
                warn!(agent_id = %self.agent_id, "Agent not found");
                AgentError::agent_not_found(self.agent_id)
            })?;

        debug!(
            agent_id = %self.agent_id,
            llms = definition.llms.len(),
            tools = definition.tools.len(),
            datasources = definition.datasources.len(),
            "Loaded agent definition"
        );

        let kind = Self::backend_for(&definition)?;
        if let Some(llm) = definition.primary_llm() {
            info!(
                agent_id = %self.agent_id,
                provider = %llm.provider,
                backend = %kind,
                streaming = self.options.enable_streaming,
                "Selected agent back end"
            );
        }

        self.backend(kind).get_agent(&definition).await
    }

    fn backend(&self, kind: BackendKind) -> Box<dyn AgentBackend> {
        let options = self.options.clone();
        match kind {
            BackendKind::OpenAi => Box::new(OpenAiAgent::new(
                options,
                self.drivers.clone(),
                self.memory.clone(),
            )),
            BackendKind::Generic => Box::new(GenericAgent::new(
                options,
                self.drivers.clone(),
                self.memory.clone(),
            )),
        }
    }
}

impl std::fmt::Debug for AgentBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBase")
            .field("agent_id", &self.agent_id)
            .field("options", &self.options)
            .field("drivers", &self.drivers)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AgentBase`]
pub struct AgentBaseBuilder {
    agent_id: Uuid,
    options: RunOptions,
    store: Arc<dyn AgentStore>,
    drivers: Arc<DriverRegistry>,
    memory: Option<Arc<dyn MessageStore>>,
}

impl AgentBaseBuilder {
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.options.session_id = Some(session_id.into());
        self
    }

    pub fn enable_streaming(mut self, enable_streaming: bool) -> Self {
        self.options.enable_streaming = enable_streaming;
        self
    }

    pub fn output_schema(mut self, output_schema: impl Into<String>) -> Self {
        self.options.output_schema = Some(output_schema.into());
        self
    }

    pub fn callback(mut self, callback: Arc<dyn EventEmitter>) -> Self {
        self.options.callback = Some(callback);
        self
    }

    /// Session history store; an in-memory store is used when unset
    pub fn memory(mut self, memory: Arc<dyn MessageStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn build(self) -> AgentBase {
        AgentBase {
            agent_id: self.agent_id,
            options: self.options,
            store: self.store,
            drivers: self.drivers,
            memory: self
                .memory
                .unwrap_or_else(|| Arc::new(InMemoryMessageStore::new())),
        }
    }
}
