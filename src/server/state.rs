use std::sync::Arc;

use crate::events::EventBus;
use crate::metrics::MetricsRegistry;
use crate::swarm::MissionOrchestrator;
use crate::trace_store::TraceStore;

use super::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<MissionOrchestrator>,
    pub metrics: Arc<MetricsRegistry>,
    pub trace_store: Arc<TraceStore>,
    pub event_bus: Arc<EventBus>,
    pub rate_limiter: Arc<RateLimiter>,
}
