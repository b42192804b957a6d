//! Cost estimate shape shared by the estimator and the Trace record.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input_tokens: u64,
    pub expected_output_tokens: u64,
    pub swarm_cost: f64,
    pub synthesis_cost: f64,
    pub total_cost: f64,
    pub within_budget: bool,
}
