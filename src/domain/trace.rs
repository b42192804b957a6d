//! The persisted lifecycle record of one mission.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentResponse;
use super::cost::CostEstimate;
use super::safety::RedTeamFlag;

/// Normalized agent-id → weight mapping. Sums to 1 when non-empty.
pub type PosteriorWeights = HashMap<String, f64>;

/// One critique round's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iteration {
    pub iteration_id: u32,
    pub agent_responses: Vec<AgentResponse>,
    pub consensus_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Terminal and non-terminal states of a Trace's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TraceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The complete, persisted record of one mission's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mission: String,
    pub iterations: Vec<Iteration>,
    /// Declared for forward compatibility; never populated by this engine.
    #[serde(default)]
    pub branch_scores: HashMap<String, f64>,
    pub red_team_flags: Vec<RedTeamFlag>,
    pub final_posterior_weights: PosteriorWeights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_result: Option<String>,
    pub cost_estimate: CostEstimate,
    pub actual_cost: f64,
    pub duration_ms: u64,
    pub status: TraceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Trace {
    pub fn new(trace_id: Uuid, mission: String, cost_estimate: CostEstimate) -> Self {
        Self {
            trace_id,
            timestamp: Utc::now(),
            mission,
            iterations: Vec::new(),
            branch_scores: HashMap::new(),
            red_team_flags: Vec::new(),
            final_posterior_weights: HashMap::new(),
            synthesis_result: None,
            cost_estimate,
            actual_cost: 0.0,
            duration_ms: 0,
            status: TraceStatus::Running,
            error: None,
        }
    }

    /// Once terminal, a Trace may never move back to a non-terminal status.
    pub fn set_status(&mut self, status: TraceStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.set_status(TraceStatus::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trace() -> Trace {
        Trace::new(
            Uuid::new_v4(),
            "do a thing".into(),
            CostEstimate {
                input_tokens: 10,
                expected_output_tokens: 500,
                swarm_cost: 0.0,
                synthesis_cost: 0.01,
                total_cost: 0.01,
                within_budget: true,
            },
        )
    }

    #[test]
    fn terminal_status_is_sticky() {
        let mut t = sample_trace();
        t.set_status(TraceStatus::Completed);
        t.set_status(TraceStatus::Running);
        assert_eq!(t.status, TraceStatus::Completed);
    }

    #[test]
    fn fail_sets_error_and_terminal_status() {
        let mut t = sample_trace();
        t.fail("cancelled");
        assert_eq!(t.status, TraceStatus::Failed);
        assert_eq!(t.error.as_deref(), Some("cancelled"));
    }

    #[test]
    fn json_roundtrip_preserves_fields() {
        let t = sample_trace();
        let json = serde_json::to_string(&t).unwrap();
        let back: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.trace_id, t.trace_id);
        assert_eq!(back.mission, t.mission);
        assert!(back.branch_scores.is_empty());
    }
}
