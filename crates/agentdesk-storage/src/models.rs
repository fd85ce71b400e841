// Database models (internal, mapped to core records by the agent store)
//
// Tables and columns follow the admin service schema: PascalCase tables with
// camelCase columns, aliased to snake_case in the queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct AgentRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub llm_model: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// LLM joined through AgentLLM
#[derive(Debug, Clone, FromRow)]
pub struct AgentLlmRow {
    pub agent_id: Uuid,
    pub llm_id: Uuid,
    pub provider: String,
    pub api_key: Option<String>,
    pub options: Option<sqlx::types::JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tool joined through AgentTool
#[derive(Debug, Clone, FromRow)]
pub struct AgentToolRow {
    pub agent_id: Uuid,
    pub tool_id: Uuid,
    pub name: String,
    pub description: String,
    pub tool_type: String,
    pub metadata: Option<sqlx::types::JsonValue>,
    pub return_direct: bool,
}

/// Datasource joined through AgentDatasource
#[derive(Debug, Clone, FromRow)]
pub struct AgentDatasourceRow {
    pub agent_id: Uuid,
    pub datasource_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub datasource_type: String,
    pub url: Option<String>,
    pub status: String,
}

// ============================================
// Session messages (owned by this crate)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct SessionMessageRow {
    pub id: Uuid,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSessionMessage {
    pub id: Uuid,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
