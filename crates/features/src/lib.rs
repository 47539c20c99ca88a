//! Profile analysis for the cluster-shaper system.
//!
//! This crate handles:
//! - Shape-comparison primitives (triangular references, cosine similarity,
//!   Euclidean distance)
//! - Auction-shape classification of closed clusters
//! - Per-cluster Value Area computation (POC, VAH, VAL)
//! - The profile engine tying aggregation and analysis together

pub mod shape;
pub mod classifier;
pub mod value_area;
pub mod engine;

pub use shape::{cosine_similarity, euclidean_distance, normalize, triangular_distribution};
pub use classifier::ShapeClassifier;
pub use value_area::ValueAreaComputer;
pub use engine::ProfileEngine;
