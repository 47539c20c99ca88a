//! Core types and configuration for the cluster-shaper system.
//!
//! This crate provides shared types used across all other crates:
//! - Tick and bar-key types
//! - The price cluster (bar) and its profile statistics
//! - Configuration structures
//! - Common error types

pub mod cluster;
pub mod config;
pub mod error;
pub mod types;

pub use cluster::Cluster;
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Alias for [`Cluster`] using bar vocabulary.
pub type Bar = Cluster;
