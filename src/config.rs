//! Process configuration: environment-sourced defaults plus CLI overrides.

use std::path::PathBuf;

use clap::Parser;

/// Command-line overrides for the mission-core binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "Mission orchestration core server", long_about = None)]
pub struct Args {
    /// Address to bind the HTTP/WebSocket server to.
    #[arg(long)]
    pub bind_addr: Option<String>,

    /// Directory where per-trace JSON files are written.
    #[arg(long)]
    pub trace_dir: Option<PathBuf>,

    /// Default maximum budget (USD) applied when a request omits maxBudget.
    #[arg(long)]
    pub max_budget: Option<f64>,
}

/// Per-model cost, in USD per 1000 tokens.
#[derive(Debug, Clone, Copy)]
pub struct ModelRate {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Resolved process configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub trace_dir: PathBuf,
    pub upstream_base_url: String,
    pub upstream_api_key: Option<String>,
    pub upstream_referrer: Option<String>,

    pub swarm_model: String,
    pub reviewer_model: String,
    pub synthesis_model: String,
    pub fallback_model: String,

    pub default_swarm_size: usize,
    pub max_agents: usize,
    pub default_max_budget: f64,
    pub throttle_ms: u64,

    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            trace_dir: std::env::var("TRACE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./traces")),
            upstream_base_url: std::env::var("UPSTREAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.upstream.example/v1/chat/completions".to_string()),
            upstream_api_key: std::env::var("UPSTREAM_API_KEY").ok(),
            upstream_referrer: std::env::var("UPSTREAM_REFERRER").ok(),

            swarm_model: "swarm-free".to_string(),
            reviewer_model: "reviewer-pro".to_string(),
            synthesis_model: "synthesis-pro".to_string(),
            fallback_model: "synthesis-fallback".to_string(),

            default_swarm_size: 8,
            max_agents: 20,
            // Open question in the source spec resolved to 1.25 (see DESIGN.md).
            default_max_budget: 1.25,
            throttle_ms: 6_000,

            max_retries: 5,
            base_backoff_ms: 1_000,
            max_backoff_ms: 32_000,
        }
    }
}

impl Config {
    pub fn rate_for(&self, model: &str) -> ModelRate {
        if model == self.swarm_model {
            ModelRate {
                input_per_1k: 0.0,
                output_per_1k: 0.0,
            }
        } else if model == self.reviewer_model {
            ModelRate {
                input_per_1k: 0.003,
                output_per_1k: 0.015,
            }
        } else {
            ModelRate {
                input_per_1k: 0.005,
                output_per_1k: 0.015,
            }
        }
    }

    /// Apply CLI overrides on top of the environment-derived defaults.
    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(bind_addr) = &args.bind_addr {
            self.bind_addr = bind_addr.clone();
        }
        if let Some(trace_dir) = &args.trace_dir {
            self.trace_dir = trace_dir.clone();
        }
        if let Some(max_budget) = args.max_budget {
            self.default_max_budget = max_budget;
        }
        self
    }
}
