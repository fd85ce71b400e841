// Generic back end
//
// Runs agents on every provider outside the OpenAI family. The model must be
// named explicitly; tools and ready datasources are described in the system
// prompt instead of being sent as function definitions.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use agentdesk_core::agent::{AgentDefinition, Llm};
use agentdesk_core::error::{AgentError, Result};
use agentdesk_core::llm_drivers::DriverRegistry;
use agentdesk_core::llm_providers::resolve_model_name;
use agentdesk_core::traits::MessageStore;

use crate::backend::{
    agent_model, call_config, create_driver, primary_llm, AgentBackend, BackendKind, RunOptions,
};
use crate::executor::{AgentExecutor, LlmAgentExecutor};
use crate::prompt::{base_prompt, render_datasources, render_tools, PromptBuilder};
use crate::tools::ready_datasources;

/// Prompt-based back end for non-OpenAI providers
pub struct GenericAgent {
    options: RunOptions,
    drivers: Arc<DriverRegistry>,
    memory: Arc<dyn MessageStore>,
}

impl GenericAgent {
    pub fn new(
        options: RunOptions,
        drivers: Arc<DriverRegistry>,
        memory: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            options,
            drivers,
            memory,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// The LLM's `model` option first, then the agent alias
    pub fn model_for(definition: &AgentDefinition, llm: &Llm) -> Result<String> {
        llm.option_str("model")
            .map(str::to_string)
            .or_else(|| agent_model(definition).map(resolve_model_name))
            .ok_or_else(|| {
                AgentError::config(format!(
                    "No model configured for agent {}: set llm_model on the agent or a model option on LLM {}",
                    definition.agent.id, llm.id
                ))
            })
    }
}

#[async_trait]
impl AgentBackend for GenericAgent {
    fn kind(&self) -> BackendKind {
        BackendKind::Generic
    }

    async fn get_agent(&self, definition: &AgentDefinition) -> Result<Box<dyn AgentExecutor>> {
        let llm = primary_llm(definition)?;
        let model = Self::model_for(definition, llm)?;
        let driver = create_driver(&self.drivers, llm)?;

        let datasources = ready_datasources(definition);
        debug!(
            agent_id = %definition.agent.id,
            provider = %llm.provider,
            model = %model,
            tools = definition.tools.len(),
            datasources = datasources.len(),
            "Building generic agent"
        );

        let system_prompt = PromptBuilder::new(base_prompt(definition.agent.prompt.as_deref()))
            .section(render_tools(&definition.tools))
            .section(render_datasources(&datasources))
            .output_schema(self.options.output_schema.as_deref())
            .build();

        Ok(Box::new(LlmAgentExecutor::new(
            definition.agent.id,
            BackendKind::Generic,
            driver,
            call_config(model, llm),
            system_prompt,
            self.options.clone(),
            self.memory.clone(),
        )))
    }
}
