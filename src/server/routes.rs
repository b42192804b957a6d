use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

use super::responses::{cost_estimate_body, error_body, execute_body, full_trace_body, swarm_status_body, trace_list_body};
use super::state::AppState;
use super::validation;

fn error_response(err: CoreError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error_body(&err))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub mission: String,
    pub content: Option<String>,
    #[serde(rename = "swarmSize")]
    pub swarm_size: Option<i64>,
    #[serde(rename = "maxBudget")]
    pub max_budget: Option<f64>,
}

pub async fn execute_mission(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<ExecuteRequest>,
) -> Response {
    if let Err(retry_after) = state.rate_limiter.check(addr.ip()) {
        let body = json!({
            "error": "rate limited",
            "code": "RATE_LIMITED",
            "retryAfter": retry_after,
        });
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", retry_after.to_string())],
            Json(body),
        )
            .into_response();
    }

    if let Err(e) = validation::validate_mission(&req.mission) {
        return error_response(e);
    }
    let swarm_size = match validation::validate_swarm_size(req.swarm_size) {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };
    let max_budget = match validation::validate_max_budget(req.max_budget) {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };

    let cancel = CancellationToken::new();
    match state
        .orchestrator
        .execute(req.mission, req.content, swarm_size, max_budget, cancel)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(execute_body(&outcome))).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub mission: String,
    #[serde(rename = "swarmSize")]
    pub swarm_size: Option<i64>,
}

pub async fn estimate_mission(State(state): State<AppState>, Json(req): Json<EstimateRequest>) -> Response {
    if let Err(e) = validation::validate_mission(&req.mission) {
        return error_response(e);
    }
    let config = state.orchestrator.engine().config();
    let swarm_size = match validation::validate_swarm_size(req.swarm_size) {
        Ok(v) => v.unwrap_or(config.default_swarm_size),
        Err(e) => return error_response(e),
    };

    let estimate = crate::cost::estimate(&req.mission, swarm_size, config);
    (StatusCode::OK, Json(cost_estimate_body(&estimate))).into_response()
}

pub async fn get_trace(State(state): State<AppState>, Path(trace_id): Path<String>) -> Response {
    let trace_id = match validation::validate_trace_id(&trace_id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match state.trace_store.get(trace_id).await {
        Some(trace) => (StatusCode::OK, Json(full_trace_body(&trace))).into_response(),
        None => error_response(CoreError::NotFound),
    }
}

pub async fn get_mission_status(State(state): State<AppState>, Path(trace_id): Path<String>) -> Response {
    let trace_id = match validation::validate_trace_id(&trace_id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    if let Some(status) = state.orchestrator.engine().status_registry.get(trace_id) {
        return (StatusCode::OK, Json(swarm_status_body(&status))).into_response();
    }

    match state.trace_store.get(trace_id).await {
        Some(trace) => {
            let degenerate = json!({
                "traceId": trace.trace_id,
                "status": trace.status,
                "agents": [],
                "currentIteration": trace.iterations.len(),
                "progress": if trace.status.is_terminal() { 100 } else { 0 },
                "message": "status reconstructed from persisted trace",
            });
            (StatusCode::OK, Json(degenerate)).into_response()
        }
        None => error_response(CoreError::NotFound),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_traces(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let (limit, offset) = match validation::validate_pagination(query.limit, query.offset) {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };
    let page = state.trace_store.list(limit, offset).await;
    (StatusCode::OK, Json(trace_list_body(&page.items, page.total))).into_response()
}

pub async fn active_swarms(State(state): State<AppState>) -> Response {
    let active: Vec<Value> = state
        .orchestrator
        .engine()
        .status_registry
        .active()
        .iter()
        .map(swarm_status_body)
        .collect();
    (StatusCode::OK, Json(active)).into_response()
}

pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now(),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
        .into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [("Content-Type", crate::metrics::CONTENT_TYPE)],
        state.metrics.expose(),
    )
        .into_response()
}
