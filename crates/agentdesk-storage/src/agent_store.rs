// Database-backed AgentStore implementation
//
// This module implements the core AgentStore trait by loading an agent row
// and its LLM, tool and datasource relations into an AgentDefinition.

use async_trait::async_trait;
use agentdesk_core::{
    agent::{Agent, AgentDatasource, AgentDefinition, AgentLlm, AgentTool, Datasource, Llm, Tool},
    llm_providers::LlmProviderKind,
    traits::AgentStore,
    AgentError, Result,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::{AgentDatasourceRow, AgentLlmRow, AgentRow, AgentToolRow};
use crate::repositories::Database;

// ============================================================================
// DbAgentStore - Retrieves agent definitions from the database
// ============================================================================

/// Database-backed agent store
#[derive(Clone)]
pub struct DbAgentStore {
    db: Database,
}

impl DbAgentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AgentStore for DbAgentStore {
    async fn get_agent_definition(&self, agent_id: Uuid) -> Result<Option<AgentDefinition>> {
        let agent_row = self
            .db
            .get_agent(agent_id)
            .await
            .map_err(|e| AgentError::store(e.to_string()))?;

        let Some(agent_row) = agent_row else {
            return Ok(None);
        };

        let (llm_rows, tool_rows, datasource_rows) = tokio::try_join!(
            self.db.get_agent_llms(agent_id),
            self.db.get_agent_tools(agent_id),
            self.db.get_agent_datasources(agent_id),
        )
        .map_err(|e| AgentError::store(e.to_string()))?;

        debug!(
            agent_id = %agent_id,
            llms = llm_rows.len(),
            tools = tool_rows.len(),
            datasources = datasource_rows.len(),
            "Loaded agent relations"
        );

        Ok(Some(AgentDefinition {
            agent: agent_from_row(agent_row),
            llms: llm_rows
                .into_iter()
                .map(agent_llm_from_row)
                .collect::<Result<_>>()?,
            tools: tool_rows.into_iter().map(agent_tool_from_row).collect(),
            datasources: datasource_rows
                .into_iter()
                .map(agent_datasource_from_row)
                .collect(),
        }))
    }
}

// ============================================================================
// Row conversion
// ============================================================================

fn agent_from_row(row: AgentRow) -> Agent {
    Agent {
        id: row.id,
        name: row.name,
        description: row.description,
        prompt: row.prompt,
        llm_model: row.llm_model,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn agent_llm_from_row(row: AgentLlmRow) -> Result<AgentLlm> {
    let provider: LlmProviderKind = row
        .provider
        .parse()
        .map_err(|e: String| AgentError::store(format!("LLM {}: {}", row.llm_id, e)))?;

    Ok(AgentLlm {
        agent_id: row.agent_id,
        llm_id: row.llm_id,
        llm: Llm {
            id: row.llm_id,
            provider,
            api_key: row.api_key,
            options: row.options.unwrap_or(Value::Null),
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
    })
}

fn agent_tool_from_row(row: AgentToolRow) -> AgentTool {
    AgentTool {
        agent_id: row.agent_id,
        tool_id: row.tool_id,
        tool: Tool {
            id: row.tool_id,
            name: row.name,
            description: row.description,
            tool_type: row.tool_type,
            metadata: row.metadata.unwrap_or(Value::Null),
            return_direct: row.return_direct,
        },
    }
}

fn agent_datasource_from_row(row: AgentDatasourceRow) -> AgentDatasource {
    AgentDatasource {
        agent_id: row.agent_id,
        datasource_id: row.datasource_id,
        datasource: Datasource {
            id: row.datasource_id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            datasource_type: row.datasource_type,
            url: row.url,
            status: row.status,
        },
    }
}

// ============================================================================
// Factory functions
// ============================================================================

/// Create a database-backed agent store
pub fn create_db_agent_store(db: Database) -> DbAgentStore {
    DbAgentStore::new(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn llm_row(provider: &str) -> AgentLlmRow {
        AgentLlmRow {
            agent_id: Uuid::now_v7(),
            llm_id: Uuid::now_v7(),
            provider: provider.to_string(),
            api_key: Some("sk-test".to_string()),
            options: Some(json!({"model": "gpt-4"})),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_llm_row_parses_provider() {
        let agent_llm = agent_llm_from_row(llm_row("AZURE_OPENAI")).unwrap();
        assert_eq!(agent_llm.llm.provider, LlmProviderKind::AzureOpenAi);
        assert_eq!(agent_llm.llm.id, agent_llm.llm_id);
        assert_eq!(agent_llm.llm.option_str("model"), Some("gpt-4"));
    }

    #[test]
    fn test_unknown_provider_is_a_store_error() {
        let row = llm_row("COHERE");
        let llm_id = row.llm_id;

        match agent_llm_from_row(row) {
            Err(AgentError::Store(message)) => {
                assert!(message.contains(&llm_id.to_string()));
                assert!(message.contains("COHERE"));
            }
            other => panic!("expected store error, got ok={}", other.is_ok()),
        }
    }

    #[test]
    fn test_missing_json_columns_become_null() {
        let mut row = llm_row("GROQ");
        row.options = None;
        assert_eq!(agent_llm_from_row(row).unwrap().llm.options, Value::Null);

        let tool = agent_tool_from_row(AgentToolRow {
            agent_id: Uuid::now_v7(),
            tool_id: Uuid::now_v7(),
            name: "Browser".to_string(),
            description: "Browse the web".to_string(),
            tool_type: "BROWSER".to_string(),
            metadata: None,
            return_direct: false,
        });
        assert_eq!(tool.tool.metadata, Value::Null);
        assert_eq!(tool.tool.id, tool.tool_id);
    }

    #[test]
    fn test_datasource_row_defaults_description() {
        let ds = agent_datasource_from_row(AgentDatasourceRow {
            agent_id: Uuid::now_v7(),
            datasource_id: Uuid::now_v7(),
            name: "Handbook".to_string(),
            description: None,
            datasource_type: "PDF".to_string(),
            url: Some("https://example.com/handbook.pdf".to_string()),
            status: "DONE".to_string(),
        });
        assert_eq!(ds.datasource.description, "");
        assert_eq!(ds.datasource.status, "DONE");
    }
}
