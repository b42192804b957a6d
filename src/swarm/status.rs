//! Ephemeral registry of in-flight `SwarmStatus` records, with a grace-period
//! eviction after a mission reaches a terminal state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use crate::domain::{AgentState, SwarmState, SwarmStatus};

const EVICTION_GRACE: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct SwarmStatusRegistry {
    inner: Mutex<HashMap<Uuid, SwarmStatus>>,
}

impl SwarmStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, status: SwarmStatus) {
        self.inner.lock().expect("status registry mutex poisoned").insert(status.trace_id, status);
    }

    pub fn update<F>(&self, trace_id: Uuid, f: F)
    where
        F: FnOnce(&mut SwarmStatus),
    {
        let mut guard = self.inner.lock().expect("status registry mutex poisoned");
        if let Some(status) = guard.get_mut(&trace_id) {
            f(status);
            status.touch();
        }
    }

    pub fn get(&self, trace_id: Uuid) -> Option<SwarmStatus> {
        self.inner.lock().expect("status registry mutex poisoned").get(&trace_id).cloned()
    }

    pub fn active(&self) -> Vec<SwarmStatus> {
        self.inner
            .lock()
            .expect("status registry mutex poisoned")
            .values()
            .filter(|s| !s.status.is_terminal())
            .cloned()
            .collect()
    }

    fn evict(&self, trace_id: Uuid) {
        self.inner.lock().expect("status registry mutex poisoned").remove(&trace_id);
    }

    /// Schedule removal of a terminal trace's status after the grace period.
    pub fn schedule_eviction(registry: Arc<SwarmStatusRegistry>, trace_id: Uuid) {
        tokio::spawn(async move {
            tokio::time::sleep(EVICTION_GRACE).await;
            registry.evict(trace_id);
        });
    }
}

impl SwarmStatus {
    pub fn mark_agent(&mut self, agent_id: &str, state: AgentState, confidence: Option<f64>, latency_ms: Option<u64>) {
        if let Some(agent) = self.agents.iter_mut().find(|a| a.id == agent_id) {
            agent.status = state;
            if confidence.is_some() {
                agent.confidence = confidence;
            }
            if latency_ms.is_some() {
                agent.latency_ms = latency_ms;
            }
        }
    }

    pub fn set_state(&mut self, state: SwarmState, progress: u8, message: impl Into<String>) {
        self.status = state;
        self.progress = progress;
        self.message = message.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_status() -> SwarmStatus {
        SwarmStatus::pending(Uuid::new_v4(), &["agent-1".to_string(), "agent-2".to_string()])
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let registry = SwarmStatusRegistry::new();
        let status = sample_status();
        let id = status.trace_id;
        registry.insert(status);
        assert!(registry.get(id).is_some());
    }

    #[test]
    fn active_excludes_terminal_statuses() {
        let registry = SwarmStatusRegistry::new();
        let mut status = sample_status();
        let id = status.trace_id;
        status.set_state(SwarmState::Completed, 100, "done");
        registry.insert(status);
        assert!(registry.active().is_empty());
        assert!(registry.get(id).is_some());
    }

    #[test]
    fn mark_agent_updates_matching_entry_only() {
        let registry = SwarmStatusRegistry::new();
        let status = sample_status();
        let id = status.trace_id;
        registry.insert(status);
        registry.update(id, |s| s.mark_agent("agent-1", AgentState::Completed, Some(0.9), Some(500)));
        let updated = registry.get(id).unwrap();
        let agent1 = updated.agents.iter().find(|a| a.id == "agent-1").unwrap();
        let agent2 = updated.agents.iter().find(|a| a.id == "agent-2").unwrap();
        assert_eq!(agent1.status, AgentState::Completed);
        assert_eq!(agent2.status, AgentState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_eviction_removes_after_grace_period() {
        let registry = Arc::new(SwarmStatusRegistry::new());
        let status = sample_status();
        let id = status.trace_id;
        registry.insert(status);
        SwarmStatusRegistry::schedule_eviction(registry.clone(), id);
        tokio::time::advance(EVICTION_GRACE + Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(registry.get(id).is_none());
    }
}
