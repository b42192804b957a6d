//! WebSocket compatibility shim: subscribe to a mission's live status,
//! streaming thoughts, or lifecycle events over a single connection.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::state::AppState;

const STATUS_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { #[serde(rename = "traceId")] trace_id: String },
    StreamThoughts { #[serde(rename = "traceId")] trace_id: String },
    StreamEvents { #[serde(rename = "traceId")] trace_id: String },
}

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    loop {
        let Some(Ok(message)) = socket.recv().await else {
            return;
        };
        let WsMessage::Text(text) = message else {
            continue;
        };
        let Ok(client_message) = serde_json::from_str::<ClientMessage>(&text) else {
            continue;
        };

        let stopped = match client_message {
            ClientMessage::Subscribe { trace_id } => stream_status(&mut socket, &state, &trace_id).await,
            ClientMessage::StreamThoughts { trace_id } => stream_thoughts(&mut socket, &state, &trace_id).await,
            ClientMessage::StreamEvents { trace_id } => stream_events(&mut socket, &state, &trace_id).await,
        };
        if stopped {
            return;
        }
    }
}

fn parse_trace_id(socket_raw: &str) -> Option<Uuid> {
    Uuid::parse_str(socket_raw).ok()
}

/// Returns `true` when the connection should close.
async fn stream_status(socket: &mut WebSocket, state: &AppState, trace_id: &str) -> bool {
    let Some(trace_id) = parse_trace_id(trace_id) else {
        return send_error(socket, "invalid traceId").await;
    };

    loop {
        let status = state.orchestrator.engine().status_registry.get(trace_id);
        let Some(status) = status else {
            return send_error(socket, "trace not found or no longer active").await;
        };
        let payload = json!({
            "type": "swarm_update",
            "data": {
                "traceId": status.trace_id,
                "status": status.status,
                "agents": status.agents,
                "currentIteration": status.current_iteration,
                "progress": status.progress,
                "message": status.message,
            },
        });
        if socket.send(WsMessage::Text(payload.to_string().into())).await.is_err() {
            return true;
        }
        if status.status.is_terminal() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(STATUS_POLL_INTERVAL) => {}
            incoming = socket.recv() => {
                if incoming.is_none() {
                    return true;
                }
            }
        }
    }
}

async fn stream_thoughts(socket: &mut WebSocket, state: &AppState, trace_id: &str) -> bool {
    let Some(trace_id) = parse_trace_id(trace_id) else {
        return send_error(socket, "invalid traceId").await;
    };
    let mut rx = state.event_bus.subscribe_thoughts(trace_id);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return false,
                };
                let payload = thought_payload(&event);
                if socket.send(WsMessage::Text(payload.to_string().into())).await.is_err() {
                    return true;
                }
            }
            incoming = socket.recv() => {
                if incoming.is_none() {
                    return true;
                }
            }
        }
    }
}

async fn stream_events(socket: &mut WebSocket, state: &AppState, trace_id: &str) -> bool {
    let Some(trace_id) = parse_trace_id(trace_id) else {
        return send_error(socket, "invalid traceId").await;
    };
    let mut rx = state.event_bus.subscribe_events(trace_id);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return false,
                };
                let payload = json!({
                    "type": "swarm_event",
                    "eventType": event.event_type(),
                    "data": event,
                    "timestamp": chrono::Utc::now(),
                });
                if socket.send(WsMessage::Text(payload.to_string().into())).await.is_err() {
                    return true;
                }
            }
            incoming = socket.recv() => {
                if incoming.is_none() {
                    return true;
                }
            }
        }
    }
}

fn thought_payload(event: &crate::events::ThoughtEvent) -> serde_json::Value {
    use crate::events::ThoughtEvent::*;
    let (thought_type, agent_id, text, timestamp, trace_id) = match event {
        Thinking { agent_id, text, timestamp, trace_id, .. } => ("thinking", agent_id, text, timestamp, trace_id),
        Response { agent_id, text, timestamp, trace_id, .. } => ("response", agent_id, text, timestamp, trace_id),
        Critique { agent_id, text, timestamp, trace_id, .. } => ("critique", agent_id, text, timestamp, trace_id),
        Refined { agent_id, text, timestamp, trace_id, .. } => ("refined", agent_id, text, timestamp, trace_id),
    };
    json!({
        "type": "agent_thought",
        "traceId": trace_id,
        "agentId": agent_id,
        "thoughtType": thought_type,
        "content": text,
        "timestamp": timestamp,
    })
}

/// Sends a terminal error frame and reports the connection should close.
async fn send_error(socket: &mut WebSocket, message: &str) -> bool {
    let payload = json!({"type": "error", "message": message});
    let _ = socket.send(WsMessage::Text(payload.to_string().into())).await;
    true
}
