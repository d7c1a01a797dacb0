//! Cluster access: resolving credentials and listing deployments.
mod client;
mod config;
mod exec;

pub use client::{Client, DEFAULT_PAGE_SIZE};
pub use config::resolve_cluster_config;
