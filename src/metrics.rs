//! Process-wide counters, a gauge, and a duration-quantile ring buffer,
//! exposed in a minimal Prometheus-compatible text format.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

const RING_CAPACITY: usize = 1000;

#[derive(Debug, Default)]
struct DurationRing {
    buf: Vec<u64>,
    next: usize,
}

impl DurationRing {
    fn push(&mut self, value_ms: u64) {
        if self.buf.len() < RING_CAPACITY {
            self.buf.push(value_ms);
        } else {
            self.buf[self.next] = value_ms;
            self.next = (self.next + 1) % RING_CAPACITY;
        }
    }

    fn quantile(&self, q: f64) -> u64 {
        if self.buf.is_empty() {
            return 0;
        }
        let mut sorted = self.buf.clone();
        sorted.sort_unstable();
        let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
        sorted[idx]
    }
}

/// Process-wide metrics singleton. Constructed once in `main` and shared as
/// an `Arc` — never a global static, per the injected-dependencies design.
#[derive(Debug)]
pub struct MetricsRegistry {
    missions_total: AtomicU64,
    missions_success: AtomicU64,
    missions_failed: AtomicU64,
    red_team_flags_total: AtomicU64,
    cost_total_micros: AtomicU64,
    swarm_agents_active: AtomicI64,
    durations: Mutex<DurationRing>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            missions_total: AtomicU64::new(0),
            missions_success: AtomicU64::new(0),
            missions_failed: AtomicU64::new(0),
            red_team_flags_total: AtomicU64::new(0),
            cost_total_micros: AtomicU64::new(0),
            swarm_agents_active: AtomicI64::new(0),
            durations: Mutex::new(DurationRing::default()),
        }
    }

    pub fn inc_missions_total(&self) {
        self.missions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_missions_success(&self) {
        self.missions_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_missions_failed(&self) {
        self.missions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_red_team_flags(&self, count: u64) {
        self.red_team_flags_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_cost(&self, usd: f64) {
        let micros = (usd * 1_000_000.0).round() as u64;
        self.cost_total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn agent_started(&self) {
        self.swarm_agents_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn agent_finished(&self) {
        self.swarm_agents_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn swarm_agents_active(&self) -> i64 {
        self.swarm_agents_active.load(Ordering::Relaxed)
    }

    pub fn record_duration(&self, ms: u64) {
        self.durations.lock().expect("metrics mutex poisoned").push(ms);
    }

    /// Render the registry in a minimal `# HELP`/`# TYPE` text exposition
    /// format, suitable for `/metrics`.
    pub fn expose(&self) -> String {
        let durations = self.durations.lock().expect("metrics mutex poisoned");
        let p50 = durations.quantile(0.50);
        let p90 = durations.quantile(0.90);
        let p99 = durations.quantile(0.99);
        drop(durations);

        let cost_total = self.cost_total_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;

        let mut out = String::new();
        out.push_str("# HELP missions_total Total missions received.\n");
        out.push_str("# TYPE missions_total counter\n");
        out.push_str(&format!(
            "missions_total {}\n",
            self.missions_total.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP missions_success Missions that completed successfully.\n");
        out.push_str("# TYPE missions_success counter\n");
        out.push_str(&format!(
            "missions_success {}\n",
            self.missions_success.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP missions_failed Missions that terminated in failure.\n");
        out.push_str("# TYPE missions_failed counter\n");
        out.push_str(&format!(
            "missions_failed {}\n",
            self.missions_failed.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP red_team_flags_total Safety-scanner flags raised.\n");
        out.push_str("# TYPE red_team_flags_total counter\n");
        out.push_str(&format!(
            "red_team_flags_total {}\n",
            self.red_team_flags_total.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP cost_total Cumulative actual cost in USD.\n");
        out.push_str("# TYPE cost_total counter\n");
        out.push_str(&format!("cost_total {cost_total}\n"));

        out.push_str("# HELP swarm_agents_active Agents currently executing.\n");
        out.push_str("# TYPE swarm_agents_active gauge\n");
        out.push_str(&format!("swarm_agents_active {}\n", self.swarm_agents_active()));

        out.push_str("# HELP mission_duration_ms Mission end-to-end duration in milliseconds.\n");
        out.push_str("# TYPE mission_duration_ms summary\n");
        out.push_str(&format!("mission_duration_ms{{quantile=\"0.5\"}} {p50}\n"));
        out.push_str(&format!("mission_duration_ms{{quantile=\"0.9\"}} {p90}\n"));
        out.push_str(&format!("mission_duration_ms{{quantile=\"0.99\"}} {p99}\n"));

        out
    }
}

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let m = MetricsRegistry::new();
        m.inc_missions_total();
        m.inc_missions_total();
        m.inc_missions_success();
        assert_eq!(m.missions_total.load(Ordering::Relaxed), 2);
        assert_eq!(m.missions_success.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn gauge_tracks_active_agents() {
        let m = MetricsRegistry::new();
        m.agent_started();
        m.agent_started();
        assert_eq!(m.swarm_agents_active(), 2);
        m.agent_finished();
        assert_eq!(m.swarm_agents_active(), 1);
    }

    #[test]
    fn expose_contains_help_and_type_lines() {
        let m = MetricsRegistry::new();
        m.inc_missions_total();
        let text = m.expose();
        assert!(text.contains("# HELP missions_total"));
        assert!(text.contains("# TYPE missions_total counter"));
        assert!(text.contains("missions_total 1"));
    }

    #[test]
    fn quantiles_computed_from_ring_buffer() {
        let m = MetricsRegistry::new();
        for ms in [10, 20, 30, 40, 50] {
            m.record_duration(ms);
        }
        let text = m.expose();
        assert!(text.contains("mission_duration_ms{quantile=\"0.5\"} 30"));
    }

    #[test]
    fn ring_buffer_wraps_at_capacity() {
        let mut ring = DurationRing::default();
        for i in 0..(RING_CAPACITY + 10) {
            ring.push(i as u64);
        }
        assert_eq!(ring.buf.len(), RING_CAPACITY);
    }
}
