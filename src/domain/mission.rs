//! Mission input and the tier decision made about it.

use serde::{Deserialize, Serialize};

/// Maximum accepted mission length, in characters.
pub const MAX_MISSION_LEN: usize = 10_000;

/// A decision tier for an incoming mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Handled locally, for free, with no swarm invocation.
    Task,
    /// Routed to the swarm engine.
    Mission,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Mission => write!(f, "mission"),
        }
    }
}

/// Result of classifying a mission into a tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDecision {
    pub tier: Tier,
    pub confidence: f64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_handler: Option<String>,
}

impl TierDecision {
    pub fn task(confidence: f64, reason: impl Into<String>, handler: Option<&str>) -> Self {
        Self {
            tier: Tier::Task,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            local_handler: handler.map(str::to_string),
        }
    }

    pub fn mission(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            tier: Tier::Mission,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            local_handler: None,
        }
    }
}
