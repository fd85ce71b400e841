// Database-backed MessageStore implementation
//
// Session history lives in agentdesk_session_messages, a table owned by this
// crate (see migrations/). Messages are returned in insertion order.

use async_trait::async_trait;
use agentdesk_core::{traits::MessageStore, AgentError, Message, MessageRole, Result};
use uuid::Uuid;

use crate::models::{CreateSessionMessage, SessionMessageRow};
use crate::repositories::Database;

// ============================================================================
// DbMessageStore - Stores session history in the database
// ============================================================================

/// Database-backed message store
#[derive(Clone)]
pub struct DbMessageStore {
    db: Database,
}

impl DbMessageStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MessageStore for DbMessageStore {
    async fn store(&self, session_id: &str, message: Message) -> Result<()> {
        self.db
            .create_session_message(message_to_row(session_id, message))
            .await
            .map_err(|e| AgentError::store(e.to_string()))?;
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        let rows = self
            .db
            .list_session_messages(session_id)
            .await
            .map_err(|e| AgentError::store(e.to_string()))?;

        rows.into_iter().map(message_from_row).collect()
    }
}

// ============================================================================
// Row conversion
// ============================================================================

fn role_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn message_to_row(session_id: &str, message: Message) -> CreateSessionMessage {
    CreateSessionMessage {
        id: Uuid::now_v7(),
        session_id: session_id.to_string(),
        role: role_str(message.role).to_string(),
        content: message.content,
        created_at: message.created_at,
    }
}

fn message_from_row(row: SessionMessageRow) -> Result<Message> {
    let role = match row.role.as_str() {
        "user" => MessageRole::User,
        "assistant" => MessageRole::Assistant,
        other => {
            return Err(AgentError::store(format!(
                "Session message {} has unknown role: {}",
                row.id, other
            )))
        }
    };

    Ok(Message {
        role,
        content: row.content,
        created_at: row.created_at,
    })
}

// ============================================================================
// Factory functions
// ============================================================================

/// Create a database-backed message store
pub fn create_db_message_store(db: Database) -> DbMessageStore {
    DbMessageStore::new(db)
}
