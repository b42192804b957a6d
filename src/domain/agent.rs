//! Per-agent response and token accounting.

use serde::{Deserialize, Serialize};

/// Token counts billed for a single call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

/// One agent's opinion on a mission, for one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: String,
    pub model: String,
    pub response: String,
    pub confidence: f64,
    pub latency_ms: u64,
    pub tokens: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }

    /// A response qualifies for posterior weighting and synthesis billing
    /// when it didn't error and carries positive confidence.
    pub fn qualifies(&self) -> bool {
        !self.is_errored() && self.confidence > 0.0
    }

    pub fn failed(agent_id: impl Into<String>, model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            model: model.into(),
            response: String::new(),
            confidence: 0.0,
            latency_ms: 0,
            tokens: TokenUsage::default(),
            error: Some(error.into()),
        }
    }
}

/// Clamp a raw confidence value, defaulting to 0.5 when absent or out of range.
pub fn clamp_confidence(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        Some(v) => v.clamp(0.0, 1.0),
        None => 0.5,
    }
}
