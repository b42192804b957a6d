//! Core value types shared across the orchestration components.

pub mod agent;
pub mod cost;
pub mod mission;
pub mod safety;
pub mod swarm_status;
pub mod trace;

pub use agent::{clamp_confidence, AgentResponse, TokenUsage};
pub use cost::CostEstimate;
pub use mission::{Tier, TierDecision, MAX_MISSION_LEN};
pub use safety::{highest_severity, should_block, FlagSource, RedTeamFlag, Severity};
pub use swarm_status::{AgentState, AgentStatus, SwarmState, SwarmStatus};
pub use trace::{Iteration, PosteriorWeights, Trace, TraceStatus};
