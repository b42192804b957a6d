//! JSON shaping for the external HTTP contract. Kept separate from the
//! internal (snake_case) domain types so the wire format can evolve
//! independently of storage.

use serde_json::{json, Value};

use crate::domain::{CostEstimate, Trace};
use crate::error::CoreError;
use crate::swarm::MissionOutcome;

pub fn error_body(err: &CoreError) -> Value {
    json!({
        "error": err.to_string(),
        "code": err.code(),
    })
}

pub fn cost_estimate_body(estimate: &CostEstimate) -> Value {
    json!({
        "inputTokens": estimate.input_tokens,
        "expectedOutputTokens": estimate.expected_output_tokens,
        "swarmCost": estimate.swarm_cost,
        "synthesisCost": estimate.synthesis_cost,
        "totalCost": estimate.total_cost,
        "withinBudget": estimate.within_budget,
    })
}

fn trace_body(trace: &Trace) -> Value {
    json!({
        "traceId": trace.trace_id,
        "timestamp": trace.timestamp,
        "mission": trace.mission,
        "iterations": trace.iterations.iter().map(iteration_body).collect::<Vec<_>>(),
        "branchScores": trace.branch_scores,
        "redTeamFlags": trace.red_team_flags.iter().map(flag_body).collect::<Vec<_>>(),
        "finalPosteriorWeights": trace.final_posterior_weights,
        "synthesisResult": trace.synthesis_result,
        "costEstimate": cost_estimate_body(&trace.cost_estimate),
        "actualCost": trace.actual_cost,
        "durationMs": trace.duration_ms,
        "status": trace.status,
        "error": trace.error,
    })
}

fn iteration_body(iteration: &crate::domain::Iteration) -> Value {
    json!({
        "iterationId": iteration.iteration_id,
        "agentResponses": iteration.agent_responses.iter().map(agent_response_body).collect::<Vec<_>>(),
        "consensusScore": iteration.consensus_score,
        "timestamp": iteration.timestamp,
    })
}

fn agent_response_body(response: &crate::domain::AgentResponse) -> Value {
    json!({
        "agentId": response.agent_id,
        "model": response.model,
        "response": response.response,
        "confidence": response.confidence,
        "latencyMs": response.latency_ms,
        "tokens": {"input": response.tokens.input, "output": response.tokens.output},
        "error": response.error,
    })
}

fn flag_body(flag: &crate::domain::RedTeamFlag) -> Value {
    json!({
        "flagId": flag.flag_id,
        "severity": flag.severity,
        "categories": flag.categories,
        "explanation": flag.explanation,
        "source": flag.source,
        "content": flag.content,
    })
}

/// Shape a `MissionOutcome` into the `POST /api/mission/execute` response body.
pub fn execute_body(outcome: &MissionOutcome) -> Value {
    match outcome {
        MissionOutcome::Task { trace_id, reason, result, .. } => json!({
            "traceId": trace_id,
            "synthesis": result,
            "iterations": [],
            "cost": 0.0,
            "durationMs": 0,
            "redTeamFlags": [],
            "tier": "task",
            "tierReason": reason,
        }),
        MissionOutcome::Mission(trace) => json!({
            "traceId": trace.trace_id,
            "synthesis": trace.synthesis_result,
            "iterations": trace.iterations.iter().map(iteration_body).collect::<Vec<_>>(),
            "cost": trace.actual_cost,
            "durationMs": trace.duration_ms,
            "redTeamFlags": trace.red_team_flags.iter().map(flag_body).collect::<Vec<_>>(),
            "tier": "mission",
            "tierReason": "routed to swarm",
        }),
    }
}

pub fn trace_list_body(items: &[Trace], total: usize) -> Value {
    json!({
        "traces": items.iter().map(trace_body).collect::<Vec<_>>(),
        "total": total,
    })
}

pub fn full_trace_body(trace: &Trace) -> Value {
    trace_body(trace)
}

pub fn swarm_status_body(status: &crate::domain::SwarmStatus) -> Value {
    json!({
        "traceId": status.trace_id,
        "status": status.status,
        "agents": status.agents,
        "currentIteration": status.current_iteration,
        "progress": status.progress,
        "message": status.message,
    })
}
