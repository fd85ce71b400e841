// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - DbAgentStore: implements AgentStore by reading agents and their relations
// - DbMessageStore: implements MessageStore for session history

pub mod agent_store;
pub mod message_store;
pub mod models;
pub mod repositories;

pub use agent_store::{create_db_agent_store, DbAgentStore};
pub use message_store::{create_db_message_store, DbMessageStore};
pub use models::*;
pub use repositories::*;
