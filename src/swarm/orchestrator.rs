//! Top-level request dispatch: tiering decides whether a mission is a free
//! local task or gets routed into the swarm engine.

use tokio_util::sync::CancellationToken;

use crate::classifier;
use crate::domain::{Tier, Trace};
use crate::error::CoreResult;

use super::engine::SwarmEngine;

/// What `MissionOrchestrator::execute` produced, shaped for direct response
/// serialization by the HTTP layer.
pub enum MissionOutcome {
    Task {
        trace_id: String,
        confidence: f64,
        reason: String,
        result: String,
    },
    Mission(Box<Trace>),
}

pub struct MissionOrchestrator {
    engine: SwarmEngine,
}

impl MissionOrchestrator {
    pub fn new(engine: SwarmEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SwarmEngine {
        &self.engine
    }

    /// Classify the mission and either run it locally (task tier) or hand it
    /// to the swarm engine (mission tier).
    pub async fn execute(
        &self,
        mission: String,
        content: Option<String>,
        swarm_size: Option<usize>,
        max_budget: Option<f64>,
        cancel: CancellationToken,
    ) -> CoreResult<MissionOutcome> {
        let decision = classifier::classify(&mission);

        match decision.tier {
            Tier::Task => {
                let subject = content.unwrap_or_else(|| mission.clone());
                let result = match &decision.local_handler {
                    Some(handler) => classifier::apply_local_handler(handler, &subject),
                    None => subject,
                };
                let trace_id = format!("task-{}", unix_millis());
                Ok(MissionOutcome::Task {
                    trace_id,
                    confidence: decision.confidence,
                    reason: decision.reason,
                    result,
                })
            }
            Tier::Mission => {
                let trace = self.engine.execute_mission(mission, swarm_size, max_budget, cancel).await?;
                Ok(MissionOutcome::Mission(Box::new(trace)))
            }
        }
    }
}

fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::EventBus;
    use crate::metrics::MetricsRegistry;
    use crate::trace_store::TraceStore;
    use crate::upstream::UpstreamClient;
    use std::sync::Arc;

    fn test_orchestrator(dir: &std::path::Path) -> MissionOrchestrator {
        let config = Config::default();
        let metrics = Arc::new(MetricsRegistry::new());
        let trace_store = Arc::new(TraceStore::new(dir));
        let event_bus = Arc::new(EventBus::new());
        let upstream = Arc::new(UpstreamClient::new(&config));
        let engine = SwarmEngine::new(config, metrics, trace_store, event_bus, upstream);
        MissionOrchestrator::new(engine)
    }

    #[tokio::test]
    async fn task_tier_mission_resolves_locally_without_calling_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = test_orchestrator(dir.path());
        let outcome = orchestrator
            .execute("clean spelling".to_string(), None, None, None, CancellationToken::new())
            .await
            .expect("task-tier mission should resolve locally");
        match outcome {
            MissionOutcome::Task { trace_id, result, .. } => {
                assert!(trace_id.starts_with("task-"));
                assert_eq!(result, "clean spelling");
            }
            MissionOutcome::Mission(_) => panic!("expected task outcome"),
        }
    }
}
