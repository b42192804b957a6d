//! Ephemeral in-flight status of a mission, separate from its durable Trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an in-flight (or just-finished) mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwarmState {
    Pending,
    Running,
    Synthesizing,
    Completed,
    Failed,
}

impl SwarmState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Per-agent status line within a SwarmStatus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub id: String,
    pub status: AgentState,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Ephemeral view of a mission in progress. Lives only while the mission is
/// in flight, plus a short grace period after it terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmStatus {
    pub trace_id: Uuid,
    pub status: SwarmState,
    pub agents: Vec<AgentStatus>,
    pub current_iteration: u32,
    pub progress: u8,
    pub message: String,
    #[serde(skip)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SwarmStatus {
    pub fn pending(trace_id: Uuid, agent_ids: &[String]) -> Self {
        Self {
            trace_id,
            status: SwarmState::Pending,
            agents: agent_ids
                .iter()
                .map(|id| AgentStatus {
                    id: id.clone(),
                    status: AgentState::Pending,
                    model: String::new(),
                    confidence: None,
                    latency_ms: None,
                })
                .collect(),
            current_iteration: 0,
            progress: 0,
            message: "queued".into(),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
