//! Bayesian posterior weighting over a round's agent responses.

use crate::domain::{AgentResponse, PosteriorWeights};

/// Compute normalized posterior weights over non-errored, positive-confidence
/// responses. Empty if none qualify.
pub fn compute(responses: &[AgentResponse]) -> PosteriorWeights {
    let qualifying: Vec<&AgentResponse> = responses.iter().filter(|r| r.qualifies()).collect();
    if qualifying.is_empty() {
        return PosteriorWeights::new();
    }

    let confidence_sum: f64 = qualifying.iter().map(|r| r.confidence).sum();
    if confidence_sum <= 0.0 {
        return PosteriorWeights::new();
    }

    let raw: Vec<(String, f64)> = qualifying
        .iter()
        .map(|r| {
            let base = r.confidence / confidence_sum;
            let latency_factor = 1.0 / (1.0 + (r.latency_ms as f64) / 10_000.0);
            let weight = base * (0.8 + 0.2 * latency_factor);
            (r.agent_id.clone(), weight)
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return PosteriorWeights::new();
    }

    raw.into_iter().map(|(id, w)| (id, w / total)).collect()
}
