// OpenAI back end
//
// Runs agents whose first LLM is OpenAI or Azure OpenAI. Tools and ready
// datasources are passed to the model as native function definitions.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use agentdesk_core::agent::{AgentDefinition, Llm};
use agentdesk_core::error::Result;
use agentdesk_core::llm_drivers::DriverRegistry;
use agentdesk_core::llm_providers::resolve_model_name;
use agentdesk_core::traits::MessageStore;

use crate::backend::{
    agent_model, call_config, create_driver, primary_llm, AgentBackend, BackendKind, RunOptions,
};
use crate::executor::{AgentExecutor, LlmAgentExecutor};
use crate::prompt::{base_prompt, PromptBuilder};
use crate::tools::tool_definitions;

/// Model used when neither the agent nor the LLM names one
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Native function-calling back end
pub struct OpenAiAgent {
    options: RunOptions,
    drivers: Arc<DriverRegistry>,
    memory: Arc<dyn MessageStore>,
}

impl OpenAiAgent {
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

    /// Agent alias first, then the LLM's `model` option, then the default
    pub fn model_for(definition: &AgentDefinition, llm: &Llm) -> String {
        agent_model(definition)
            .map(resolve_model_name)
            .or_else(|| llm.option_str("model").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())
    }
}

#[async_trait]
impl AgentBackend for OpenAiAgent {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }

    async fn get_agent(&self, definition: &AgentDefinition) -> Result<Box<dyn AgentExecutor>> {
        let llm = primary_llm(definition)?;
        let driver = create_driver(&self.drivers, llm)?;

        let tools = tool_definitions(definition);
        let model = Self::model_for(definition, llm);
        debug!(
            agent_id = %definition.agent.id,
            model = %model,
            tools = tools.len(),
            "Building OpenAI agent"
        );

        let system_prompt = PromptBuilder::new(base_prompt(definition.agent.prompt.as_deref()))
            .output_schema(self.options.output_schema.as_deref())
            .build();

        Ok(Box::new(LlmAgentExecutor::new(
            definition.agent.id,
            BackendKind::OpenAi,
            driver,
            call_config(model, llm).with_tools(tools),
            system_prompt,
            self.options.clone(),
            self.memory.clone(),
        )))
    }
}
