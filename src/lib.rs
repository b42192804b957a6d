pub mod classifier;
pub mod config;
pub mod cost;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod safety;
pub mod server;
pub mod swarm;
pub mod trace_store;
pub mod upstream;
