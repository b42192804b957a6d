use std::sync::Arc;

use clap::Parser;
use mission_core::config::{Args, Config};
use mission_core::events::EventBus;
use mission_core::metrics::MetricsRegistry;
use mission_core::server::{self, AppState, RateLimiter};
use mission_core::swarm::{MissionOrchestrator, SwarmEngine};
use mission_core::trace_store::TraceStore;
use mission_core::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mission_core=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::default().with_args(&args);

    let metrics = Arc::new(MetricsRegistry::new());
    let trace_store = Arc::new(TraceStore::new(config.trace_dir.clone()));
    let event_bus = Arc::new(EventBus::new());
    let upstream = Arc::new(UpstreamClient::new(&config));

    let bind_addr = config.bind_addr.parse()?;

    let engine = SwarmEngine::new(config, metrics.clone(), trace_store.clone(), event_bus.clone(), upstream);
    let orchestrator = Arc::new(MissionOrchestrator::new(engine));

    let state = AppState {
        orchestrator,
        metrics,
        trace_store,
        event_bus,
        rate_limiter: Arc::new(RateLimiter::new(10.0, 1.0)),
    };

    server::serve(bind_addr, state).await
}
