// Repository layer for database operations
//
// Read-only queries over the agent tables. Relations are ordered by the time
// they were attached so that the first LLM is stable across reads.
//
// Ids are TEXT columns holding UUID strings. Filters compare on `::text` and
// selected ids are cast to `::uuid`, so the queries also work against native
// UUID columns.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

pub(crate) const AGENT_QUERY: &str = r#"
    SELECT id::uuid AS id, name, description, prompt,
           "llmModel"::text AS llm_model, "isActive" AS is_active,
           "createdAt" AS created_at, "updatedAt" AS updated_at
    FROM "Agent"
    WHERE id::text = $1
"#;

pub(crate) const AGENT_LLMS_QUERY: &str = r#"
    SELECT al."agentId"::uuid AS agent_id, al."llmId"::uuid AS llm_id,
           l.provider::text AS provider, l."apiKey" AS api_key, l.options,
           l."createdAt" AS created_at, l."updatedAt" AS updated_at
    FROM "AgentLLM" al
    JOIN "LLM" l ON l.id = al."llmId"
    WHERE al."agentId"::text = $1
    ORDER BY al."createdAt" ASC, l.id ASC
"#;

pub(crate) const AGENT_TOOLS_QUERY: &str = r#"
    SELECT agt."agentId"::uuid AS agent_id, agt."toolId"::uuid AS tool_id,
           t.name, t.description, t.type::text AS tool_type, t.metadata,
           t."returnDirect" AS return_direct
    FROM "AgentTool" agt
    JOIN "Tool" t ON t.id = agt."toolId"
    WHERE agt."agentId"::text = $1
    ORDER BY agt."createdAt" ASC, t.id ASC
"#;

pub(crate) const AGENT_DATASOURCES_QUERY: &str = r#"
    SELECT ad."agentId"::uuid AS agent_id, ad."datasourceId"::uuid AS datasource_id,
           d.name, d.description, d.type::text AS datasource_type, d.url,
           d.status::text AS status
    FROM "AgentDatasource" ad
    JOIN "Datasource" d ON d.id = ad."datasourceId"
    WHERE ad."agentId"::text = $1
    ORDER BY ad."createdAt" ASC, d.id ASC
"#;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Create database connection with a bounded pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Agents
    // ============================================

    pub async fn get_agent(&self, id: Uuid) -> Result<Option<AgentRow>> {
        let row = sqlx::query_as::<_, AgentRow>(AGENT_QUERY)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    // ============================================
    // Agent relations
    // ============================================

    pub async fn get_agent_llms(&self, agent_id: Uuid) -> Result<Vec<AgentLlmRow>> {
        let rows = sqlx::query_as::<_, AgentLlmRow>(AGENT_LLMS_QUERY)
            .bind(agent_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get_agent_tools(&self, agent_id: Uuid) -> Result<Vec<AgentToolRow>> {
        let rows = sqlx::query_as::<_, AgentToolRow>(AGENT_TOOLS_QUERY)
            .bind(agent_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get_agent_datasources(&self, agent_id: Uuid) -> Result<Vec<AgentDatasourceRow>> {
        let rows = sqlx::query_as::<_, AgentDatasourceRow>(AGENT_DATASOURCES_QUERY)
            .bind(agent_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    // ============================================
    // Session messages
    // ============================================

    /// Apply the migrations for tables owned by this crate
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn create_session_message(
        &self,
        input: CreateSessionMessage,
    ) -> Result<SessionMessageRow> {
        let row = sqlx::query_as::<_, SessionMessageRow>(
            r#"
            INSERT INTO agentdesk_session_messages (id, session_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, session_id, role, content, created_at
            "#,
        )
        .bind(input.id)
        .bind(&input.session_id)
        .bind(&input.role)
        .bind(&input.content)
        .bind(input.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_session_messages(&self, session_id: &str) -> Result<Vec<SessionMessageRow>> {
        let rows = sqlx::query_as::<_, SessionMessageRow>(
            r#"
            SELECT id, session_id, role, content, created_at
            FROM agentdesk_session_messages
            WHERE session_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT_QUERIES: [&str; 4] = [
        AGENT_QUERY,
        AGENT_LLMS_QUERY,
        AGENT_TOOLS_QUERY,
        AGENT_DATASOURCES_QUERY,
    ];

    #[test]
    fn test_agent_filters_compare_ids_as_text() {
        for query in AGENT_QUERIES {
            assert!(query.contains("::text = $1"), "{}", query);
            assert!(!query.contains("\" = $1"), "{}", query);
        }
    }

    #[test]
    fn test_selected_ids_are_cast_to_uuid() {
        assert!(AGENT_QUERY.contains("id::uuid AS id"));
        assert!(AGENT_LLMS_QUERY.contains("\"llmId\"::uuid AS llm_id"));
        assert!(AGENT_TOOLS_QUERY.contains("\"toolId\"::uuid AS tool_id"));
        assert!(AGENT_DATASOURCES_QUERY.contains("\"datasourceId\"::uuid AS datasource_id"));
        for query in AGENT_QUERIES {
            assert!(query.contains("::uuid AS agent_id") || query == AGENT_QUERY);
        }
    }
}
