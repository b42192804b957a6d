//! Two-tier Trace Store: an authoritative in-memory map backed by a
//! best-effort JSON-per-trace directory on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use crate::domain::Trace;

pub struct TraceStore {
    dir: PathBuf,
    memory: Mutex<HashMap<Uuid, Trace>>,
    disk_disabled: AtomicBool,
}

pub struct TracePage {
    pub items: Vec<Trace>,
    pub total: usize,
}

impl TraceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(error = %e, dir = %dir.display(), "could not create trace directory, falling back to memory-only");
        }
        Self {
            dir,
            memory: Mutex::new(HashMap::new()),
            disk_disabled: AtomicBool::new(false),
        }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Writes one trace to disk, returning the error on failure without logging it.
    fn write_to_disk(dir: &Path, trace: &Trace) -> Result<(), String> {
        let path = dir.join(format!("{}.json", trace.trace_id));
        serde_json::to_vec_pretty(trace)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(|e| e.to_string()))
    }

    /// Persist a trace to memory and, best-effort, to disk.
    pub async fn save(&self, trace: Trace) {
        self.memory
            .lock()
            .expect("trace store mutex poisoned")
            .insert(trace.trace_id, trace.clone());

        if self.disk_disabled.load(Ordering::Relaxed) {
            return;
        }
        // spawn_blocking so the filesystem write never stalls the async executor.
        let dir = self.dir.clone();
        let trace_clone = trace.clone();
        let result = tokio::task::spawn_blocking(move || Self::write_to_disk(&dir, &trace_clone))
            .await
            .unwrap_or_else(|e| Err(e.to_string()));

        if let Err(e) = result {
            if !self.disk_disabled.swap(true, Ordering::Relaxed) {
                tracing::warn!(error = %e, "trace store disk write failed, switching to memory-only");
            }
        }
    }

    fn load_from_disk(&self, id: Uuid) -> Option<Trace> {
        let path = self.path_for(id);
        let bytes = std::fs::read(&path).ok()?;
        match serde_json::from_slice::<Trace>(&bytes) {
            Ok(trace) => Some(trace),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "skipping corrupt trace file");
                None
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<Trace> {
        if let Some(trace) = self.memory.lock().expect("trace store mutex poisoned").get(&id).cloned() {
            return Some(trace);
        }
        let hydrated = self.load_from_disk(id)?;
        self.memory
            .lock()
            .expect("trace store mutex poisoned")
            .insert(id, hydrated.clone());
        Some(hydrated)
    }

    fn all_disk_ids(&self) -> Vec<Uuid> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.path().file_stem().and_then(|s| s.to_str()).and_then(|s| Uuid::parse_str(s).ok()))
            .collect()
    }

    /// List traces, memory entries winning ties with disk, newest first.
    pub async fn list(&self, limit: usize, offset: usize) -> TracePage {
        let mut merged: HashMap<Uuid, Trace> = HashMap::new();
        for id in self.all_disk_ids() {
            if let Some(trace) = self.load_from_disk(id) {
                merged.insert(id, trace);
            }
        }
        for (id, trace) in self.memory.lock().expect("trace store mutex poisoned").iter() {
            merged.insert(*id, trace.clone());
        }

        let mut items: Vec<Trace> = merged.into_values().collect();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = items.len();
        let page = items.into_iter().skip(offset).take(limit.min(100)).collect();
        TracePage { items: page, total }
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        let removed_from_memory = self.memory.lock().expect("trace store mutex poisoned").remove(&id).is_some();
        let path = self.path_for(id);
        let removed_from_disk = std::fs::remove_file(&path).is_ok();
        removed_from_memory || removed_from_disk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CostEstimate;

    fn sample_trace() -> Trace {
        let estimate = CostEstimate {
            input_tokens: 10,
            expected_output_tokens: 500,
            swarm_cost: 0.0,
            synthesis_cost: 0.01,
            total_cost: 0.01,
            within_budget: true,
        };
        Trace::new(Uuid::new_v4(), "do a thing".to_string(), estimate)
    }

    #[tokio::test]
    async fn save_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::new(dir.path());
        let trace = sample_trace();
        let id = trace.trace_id;
        store.save(trace).await;
        let fetched = store.get(id).await.expect("trace should be found");
        assert_eq!(fetched.trace_id, id);
    }

    #[tokio::test]
    async fn get_hydrates_from_disk_on_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let trace = sample_trace();
        let id = trace.trace_id;
        {
            let store = TraceStore::new(dir.path());
            store.save(trace).await;
        }
        let fresh_store = TraceStore::new(dir.path());
        let fetched = fresh_store.get(id).await.expect("trace should hydrate from disk");
        assert_eq!(fetched.trace_id, id);
    }

    #[tokio::test]
    async fn list_sorts_newest_first_and_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::new(dir.path());
        for _ in 0..3 {
            store.save(sample_trace()).await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let page = store.list(2, 0).await;
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
        assert!(page.items[0].timestamp >= page.items[1].timestamp);
    }

    #[tokio::test]
    async fn corrupt_disk_file_is_skipped_not_panicking() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{}.json", Uuid::new_v4())), b"not json").unwrap();
        let store = TraceStore::new(dir.path());
        let page = store.list(10, 0).await;
        assert_eq!(page.items.len(), 0);
    }

    #[tokio::test]
    async fn delete_removes_from_memory_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::new(dir.path());
        let trace = sample_trace();
        let id = trace.trace_id;
        store.save(trace).await;
        assert!(store.delete(id).await);
        assert!(store.get(id).await.is_none());
    }
}
