//! HTTP and WebSocket surface over the orchestration core.

mod rate_limit;
mod responses;
mod routes;
mod state;
mod validation;
mod ws;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use rate_limit::RateLimiter;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/mission/execute", post(routes::execute_mission))
        .route("/api/mission/estimate", post(routes::estimate_mission))
        .route("/api/mission/{traceId}", get(routes::get_trace))
        .route("/api/mission/{traceId}/status", get(routes::get_mission_status))
        .route("/api/traces", get(routes::list_traces))
        .route("/api/swarms/active", get(routes::active_swarms))
        .route("/api/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .route("/ws", get(ws::upgrade))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve, shutting down cleanly on Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "mission core listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining connections");
}
