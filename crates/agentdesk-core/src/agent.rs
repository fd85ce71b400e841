// Agent domain records
//
// These records are owned and mutated by the admin service; the runner only
// reads them. An AgentDefinition is an agent loaded together with its LLM,
// tool and datasource relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::llm_providers::LlmProviderKind;

/// Agent record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// System prompt; the default prompt is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Model alias or raw model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// LLM binding (provider + credentials)
///
/// The API key is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Llm {
    pub id: Uuid,
    pub provider: LlmProviderKind,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    /// Provider specific options (base_url, azure_endpoint, model, ...)
    #[serde(default)]
    pub options: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Llm {
    /// Read a string option
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Endpoint override for the driver, if any.
    ///
    /// Azure deployments are addressed by endpoint + deployment + API version;
    /// every other provider reads `base_url` directly.
    pub fn base_url(&self) -> Option<String> {
        match self.provider {
            LlmProviderKind::AzureOpenAi => {
                let endpoint = self.option_str("azure_endpoint")?.trim_end_matches('/');
                let deployment = self.option_str("azure_deployment")?;
                let api_version = self
                    .option_str("api_version")
                    .unwrap_or(DEFAULT_AZURE_API_VERSION);
                Some(format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint, deployment, api_version
                ))
            }
            _ => self.option_str("base_url").map(str::to_string),
        }
    }
}

const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLlm {
    pub agent_id: Uuid,
    pub llm_id: Uuid,
    pub llm: Llm,
}

/// Tool record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Tool kind as persisted (e.g. "BROWSER", "CODE_EXECUTOR", "HTTP")
    pub tool_type: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub return_direct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTool {
    pub agent_id: Uuid,
    pub tool_id: Uuid,
    pub tool: Tool,
}

/// Datasource record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datasource {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Datasource kind as persisted (e.g. "PDF", "WEBPAGE", "CSV")
    pub datasource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDatasource {
    pub agent_id: Uuid,
    pub datasource_id: Uuid,
    pub datasource: Datasource,
}

/// Agent with all relations needed to build a runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub agent: Agent,
    #[serde(default)]
    pub llms: Vec<AgentLlm>,
    #[serde(default)]
    pub tools: Vec<AgentTool>,
    #[serde(default)]
    pub datasources: Vec<AgentDatasource>,
}

impl AgentDefinition {
    /// The LLM that decides which back end runs the agent.
    ///
    /// Only the first attached LLM is consulted.
    pub fn primary_llm(&self) -> Option<&Llm> {
        self.llms.first().map(|agent_llm| &agent_llm.llm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_llm(provider: LlmProviderKind, options: Value) -> Llm {
        Llm {
            id: Uuid::now_v7(),
            provider,
            api_key: Some("secret".to_string()),
            options,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_azure_base_url_from_options() {
        let llm = make_llm(
            LlmProviderKind::AzureOpenAi,
            json!({
                "azure_endpoint": "https://acme.openai.azure.com/",
                "azure_deployment": "gpt4",
                "api_version": "2024-02-01"
            }),
        );

        assert_eq!(
            llm.base_url().as_deref(),
            Some("https://acme.openai.azure.com/openai/deployments/gpt4/chat/completions?api-version=2024-02-01")
        );
    }

    #[test]
    fn test_azure_base_url_requires_deployment() {
        let llm = make_llm(
            LlmProviderKind::AzureOpenAi,
            json!({ "azure_endpoint": "https://acme.openai.azure.com" }),
        );
        assert!(llm.base_url().is_none());
    }

    #[test]
    fn test_base_url_ignores_blank_values() {
        let llm = make_llm(LlmProviderKind::Groq, json!({ "base_url": "  " }));
        assert!(llm.base_url().is_none());

        let llm = make_llm(
            LlmProviderKind::Groq,
            json!({ "base_url": "http://localhost:8080/v1" }),
        );
        assert_eq!(llm.base_url().as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let llm = make_llm(LlmProviderKind::OpenAi, Value::Null);
        let json = serde_json::to_value(&llm).unwrap();
        assert!(json.get("api_key").is_none());
        assert_eq!(json["provider"], "OPENAI");
    }
}
