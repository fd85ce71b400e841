// Agent run events for streaming
//
// AgentEvent is what a streaming caller receives through its EventEmitter:
// run lifecycle and incremental text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted while an agent request runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Request started
    RunStarted {
        agent_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// LLM streaming text delta
    TextDelta {
        agent_id: String,
        delta: String,
        timestamp: DateTime<Utc>,
    },

    /// Request completed
    RunCompleted {
        agent_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Request failed
    RunFailed {
        agent_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl AgentEvent {
    /// Create a run started event
    pub fn run_started(agent_id: impl Into<String>, session_id: Option<String>) -> Self {
        AgentEvent::RunStarted {
            agent_id: agent_id.into(),
            session_id,
            timestamp: Utc::now(),
        }
    }

    /// Create a text delta event
    pub fn text_delta(agent_id: impl Into<String>, delta: impl Into<String>) -> Self {
        AgentEvent::TextDelta {
            agent_id: agent_id.into(),
            delta: delta.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a run completed event
    pub fn run_completed(agent_id: impl Into<String>, finish_reason: Option<String>) -> Self {
        AgentEvent::RunCompleted {
            agent_id: agent_id.into(),
            finish_reason,
            timestamp: Utc::now(),
        }
    }

    /// Create a run failed event
    pub fn run_failed(agent_id: impl Into<String>, error: impl Into<String>) -> Self {
        AgentEvent::RunFailed {
            agent_id: agent_id.into(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this event terminates the run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentEvent::RunCompleted { .. } | AgentEvent::RunFailed { .. }
        )
    }
}
