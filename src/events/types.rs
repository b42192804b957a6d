//! Event payloads published over the Event Bus: per-agent streaming text
//! ("thoughts") and swarm-lifecycle milestones ("swarm events").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Streaming agent-level text, tagged with the phase it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThoughtEvent {
    Thinking {
        trace_id: Uuid,
        agent_id: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    Response {
        trace_id: Uuid,
        agent_id: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    Critique {
        trace_id: Uuid,
        agent_id: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    Refined {
        trace_id: Uuid,
        agent_id: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
}

impl ThoughtEvent {
    pub fn trace_id(&self) -> Uuid {
        match self {
            ThoughtEvent::Thinking { trace_id, .. }
            | ThoughtEvent::Response { trace_id, .. }
            | ThoughtEvent::Critique { trace_id, .. }
            | ThoughtEvent::Refined { trace_id, .. } => *trace_id,
        }
    }
}

/// Swarm lifecycle milestones, published as a mission progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwarmEvent {
    AgentStart {
        trace_id: Uuid,
        agent_id: String,
        model: String,
        timestamp: DateTime<Utc>,
    },
    AgentThought {
        trace_id: Uuid,
        agent_id: String,
        preview: String,
        timestamp: DateTime<Utc>,
    },
    AgentComplete {
        trace_id: Uuid,
        agent_id: String,
        confidence: f64,
        latency_ms: u64,
        errored: bool,
        timestamp: DateTime<Utc>,
    },
    CritiqueStart {
        trace_id: Uuid,
        iteration: u32,
        agent_count: usize,
        timestamp: DateTime<Utc>,
    },
    CritiqueComplete {
        trace_id: Uuid,
        iteration: u32,
        timestamp: DateTime<Utc>,
    },
    SynthesisStart {
        trace_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    SynthesisComplete {
        trace_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    ConsensusUpdate {
        trace_id: Uuid,
        iteration: u32,
        consensus_score: f64,
        threshold: f64,
        guardian_fail: bool,
        timestamp: DateTime<Utc>,
    },
}

impl SwarmEvent {
    pub fn trace_id(&self) -> Uuid {
        match self {
            SwarmEvent::AgentStart { trace_id, .. }
            | SwarmEvent::AgentThought { trace_id, .. }
            | SwarmEvent::AgentComplete { trace_id, .. }
            | SwarmEvent::CritiqueStart { trace_id, .. }
            | SwarmEvent::CritiqueComplete { trace_id, .. }
            | SwarmEvent::SynthesisStart { trace_id, .. }
            | SwarmEvent::SynthesisComplete { trace_id, .. }
            | SwarmEvent::ConsensusUpdate { trace_id, .. } => *trace_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            SwarmEvent::AgentStart { .. } => "agent_start",
            SwarmEvent::AgentThought { .. } => "agent_thought",
            SwarmEvent::AgentComplete { .. } => "agent_complete",
            SwarmEvent::CritiqueStart { .. } => "critique_start",
            SwarmEvent::CritiqueComplete { .. } => "critique_complete",
            SwarmEvent::SynthesisStart { .. } => "synthesis_start",
            SwarmEvent::SynthesisComplete { .. } => "synthesis_complete",
            SwarmEvent::ConsensusUpdate { .. } => "consensus_update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swarm_event_type_names_match_taxonomy() {
        let trace_id = Uuid::new_v4();
        let ev = SwarmEvent::ConsensusUpdate {
            trace_id,
            iteration: 1,
            consensus_score: 0.5,
            threshold: 0.92,
            guardian_fail: false,
            timestamp: Utc::now(),
        };
        assert_eq!(ev.event_type(), "consensus_update");
        assert_eq!(ev.trace_id(), trace_id);
    }

    #[test]
    fn thought_event_carries_trace_id() {
        let trace_id = Uuid::new_v4();
        let ev = ThoughtEvent::Critique {
            trace_id,
            agent_id: "reviewer".to_string(),
            text: "looks good".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(ev.trace_id(), trace_id);
    }

    #[test]
    fn serde_tag_is_snake_case() {
        let ev = SwarmEvent::AgentStart {
            trace_id: Uuid::new_v4(),
            agent_id: "agent-1".to_string(),
            model: "swarm-free".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "agent_start");
    }
}
