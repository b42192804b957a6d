//! Token-count heuristic and per-model cost estimation. No I/O.

use crate::config::Config;
use crate::domain::CostEstimate;

const EXPECTED_OUTPUT_TOKENS: u64 = 500;
const SYNTHESIS_OUTPUT_TOKENS: u64 = 1000;

fn chars_to_tokens(chars: usize) -> u64 {
    ((chars as f64) / 4.0).ceil() as u64
}

/// Estimate the cost of running a mission through the swarm, without making
/// any calls.
pub fn estimate(mission: &str, swarm_size: usize, config: &Config) -> CostEstimate {
    let input_tokens = chars_to_tokens(mission.chars().count());

    let swarm_rate = config.rate_for(&config.swarm_model);
    let swarm_cost = swarm_size as f64
        * ((input_tokens as f64 / 1000.0) * swarm_rate.input_per_1k
            + (EXPECTED_OUTPUT_TOKENS as f64 / 1000.0) * swarm_rate.output_per_1k);

    let synthesis_input_tokens = input_tokens + (swarm_size as u64) * EXPECTED_OUTPUT_TOKENS;
    let synthesis_rate = config.rate_for(&config.synthesis_model);
    let synthesis_cost = (synthesis_input_tokens as f64 / 1000.0) * synthesis_rate.input_per_1k
        + (SYNTHESIS_OUTPUT_TOKENS as f64 / 1000.0) * synthesis_rate.output_per_1k;

    let total_cost = swarm_cost + synthesis_cost;

    CostEstimate {
        input_tokens,
        expected_output_tokens: EXPECTED_OUTPUT_TOKENS,
        swarm_cost,
        synthesis_cost,
        total_cost,
        within_budget: false,
    }
}

/// Estimate and apply a budget check in one step.
pub fn estimate_within_budget(mission: &str, swarm_size: usize, max_budget: f64, config: &Config) -> CostEstimate {
    let mut est = estimate(mission, swarm_size, config);
    est.within_budget = est.total_cost <= max_budget;
    est
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_swarm_model_has_zero_swarm_cost() {
        let config = Config::default();
        let est = estimate("hello there", 8, &config);
        assert_eq!(est.swarm_cost, 0.0);
        assert!(est.synthesis_cost > 0.0);
    }

    #[test]
    fn token_heuristic_rounds_up() {
        // 5 chars -> ceil(5/4) = 2 tokens.
        let config = Config::default();
        let est = estimate("hello", 1, &config);
        assert_eq!(est.input_tokens, 2);
    }

    #[test]
    fn within_budget_reflects_threshold() {
        let config = Config::default();
        let cheap = estimate_within_budget("hi", 1, 5.0, &config);
        assert!(cheap.within_budget);
        let tight = estimate_within_budget(&"x".repeat(9_000), 20, 0.01, &config);
        assert!(!tight.within_budget);
    }

    #[test]
    fn total_cost_is_sum_of_components() {
        let config = Config::default();
        let est = estimate("a mission description of modest length", 4, &config);
        assert!((est.total_cost - (est.swarm_cost + est.synthesis_cost)).abs() < 1e-12);
    }
}
