// Session messages
//
// Conversation history kept per session so that consecutive requests with the
// same session id share context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm_drivers::{LlmMessage, LlmMessageRole};

/// Message role in session history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A message in session history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

impl From<&Message> for LlmMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::User => LlmMessageRole::User,
            MessageRole::Assistant => LlmMessageRole::Assistant,
        };
        LlmMessage::text(role, msg.content.clone())
    }
}
