//! Tick ingestion for the cluster-shaper system.
//!
//! This crate handles:
//! - Price quantization into levels relative to a bar's open
//! - Cluster (bar) aggregation keyed by caller-supplied bar keys
//! - Synchronous dispatch of closed and in-progress clusters to observers

pub mod quantizer;
pub mod cluster_shaper;

pub use quantizer::{checked_level_of, level_of, Quantizer, MAX_LEVEL_OFFSET};
pub use cluster_shaper::{ClusterCallback, ClusterShaper};

/// Alias for [`ClusterShaper`] using bar vocabulary.
pub type BarAggregator = ClusterShaper;
