// Agent back ends
//
// A back end turns an AgentDefinition into an executor. Both back ends share
// the request options handed down by the factory and resolve their LLM driver
// through the DriverRegistry.

use async_trait::async_trait;
use std::sync::Arc;

use agentdesk_core::agent::{AgentDefinition, Llm};
use agentdesk_core::error::{AgentError, Result};
use agentdesk_core::llm_drivers::{BoxedLlmDriver, DriverRegistry, LlmCallConfig, ProviderConfig};
use agentdesk_core::llm_providers::LlmProviderKind;
use agentdesk_core::traits::EventEmitter;
use serde_json::Value;

use crate::executor::AgentExecutor;

// ============================================================================
// BackendKind
// ============================================================================

/// Which back end runs an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Native function calling (OpenAI, Azure OpenAI)
    OpenAi,
    /// Every other provider
    Generic,
}

impl BackendKind {
    pub fn for_provider(provider: LlmProviderKind) -> Self {
        if provider.is_openai_family() {
            BackendKind::OpenAi
        } else {
            BackendKind::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RunOptions
// ============================================================================

/// Request options forwarded unchanged from the factory to the back end
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Session whose history is loaded and extended
    pub session_id: Option<String>,
    /// Emit streaming events to the callback
    pub enable_streaming: bool,
    /// JSON schema the answer must follow
    pub output_schema: Option<String>,
    /// Receives streaming events; honoured by both the OpenAI and generic back ends
    pub callback: Option<Arc<dyn EventEmitter>>,
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("session_id", &self.session_id)
            .field("enable_streaming", &self.enable_streaming)
            .field("output_schema", &self.output_schema)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

// ============================================================================
// AgentBackend trait
// ============================================================================

/// Builds an executor for an agent definition
#[async_trait]
pub trait AgentBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn get_agent(&self, definition: &AgentDefinition) -> Result<Box<dyn AgentExecutor>>;
}

// ============================================================================
// Shared helpers
// ============================================================================

/// First attached LLM, or NoLlmAttached
pub(crate) fn primary_llm(definition: &AgentDefinition) -> Result<&Llm> {
    definition
        .primary_llm()
        .ok_or(AgentError::NoLlmAttached(definition.agent.id))
}

/// Create the driver for an LLM record
pub(crate) fn create_driver(drivers: &DriverRegistry, llm: &Llm) -> Result<BoxedLlmDriver> {
    let mut config = ProviderConfig::new(llm.provider);
    if let Some(api_key) = &llm.api_key {
        config = config.with_api_key(api_key.clone());
    }
    match llm.base_url() {
        Some(base_url) => config = config.with_base_url(base_url),
        None if llm.provider == LlmProviderKind::AzureOpenAi => {
            return Err(AgentError::config(format!(
                "LLM {} is missing azure_endpoint or azure_deployment options",
                llm.id
            )));
        }
        None => {}
    }
    drivers.create_driver(&config)
}

/// Call configuration with sampling options read from the LLM record
pub(crate) fn call_config(model: String, llm: &Llm) -> LlmCallConfig {
    let mut config = LlmCallConfig::new(model);
    if let Some(temperature) = llm.options.get("temperature").and_then(Value::as_f64) {
        config = config.with_temperature(temperature as f32);
    }
    if let Some(max_tokens) = llm
        .options
        .get("max_tokens")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
    {
        config = config.with_max_tokens(max_tokens);
    }
    config
}

/// Non-blank model alias stored on the agent record
pub(crate) fn agent_model(definition: &AgentDefinition) -> Option<&str> {
    definition
        .agent
        .llm_model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn make_llm(provider: LlmProviderKind, options: Value) -> Llm {
        Llm {
            id: Uuid::now_v7(),
            provider,
            api_key: Some("key".to_string()),
            options,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_backend_kind_for_provider() {
        assert_eq!(
            BackendKind::for_provider(LlmProviderKind::OpenAi),
            BackendKind::OpenAi
        );
        assert_eq!(
            BackendKind::for_provider(LlmProviderKind::AzureOpenAi),
            BackendKind::OpenAi
        );
        for provider in LlmProviderKind::ALL
            .into_iter()
            .filter(|p| !p.is_openai_family())
        {
            assert_eq!(BackendKind::for_provider(provider), BackendKind::Generic);
        }
        assert_eq!(BackendKind::Generic.to_string(), "generic");
    }

    #[test]
    fn test_call_config_reads_sampling_options() {
        let llm = make_llm(
            LlmProviderKind::Groq,
            json!({"temperature": 0.2, "max_tokens": 512}),
        );
        let config = call_config("mixtral".to_string(), &llm);
        assert_eq!(config.model, "mixtral");
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_tokens, Some(512));

        let config = call_config("m".to_string(), &make_llm(LlmProviderKind::Groq, Value::Null));
        assert!(config.temperature.is_none());
        assert!(config.max_tokens.is_none());
    }

    #[test]
    fn test_azure_without_deployment_is_rejected() {
        let mut registry = DriverRegistry::new();
        registry.register(LlmProviderKind::AzureOpenAi, |_, _| {
            Box::new(agentdesk_core::memory::MockLlmDriver::new())
        });
        let llm = make_llm(
            LlmProviderKind::AzureOpenAi,
            json!({"azure_endpoint": "https://acme.openai.azure.com"}),
        );

        let err = create_driver(&registry, &llm).err().expect("config error");
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let mut registry = DriverRegistry::new();
        registry.register(LlmProviderKind::Mistral, |_, _| {
            Box::new(agentdesk_core::memory::MockLlmDriver::new())
        });
        let mut llm = make_llm(LlmProviderKind::Mistral, Value::Null);
        llm.api_key = None;

        let err = create_driver(&registry, &llm).err().expect("config error");
        assert!(matches!(err, AgentError::Configuration(_)));
    }
}
