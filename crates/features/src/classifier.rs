//! Auction-shape classification of closed clusters.
//!
//! A cluster's normalized profile is compared with three triangular references
//! (peak at the center, at the lowest level, at the highest level). For an even
//! number of levels the centered reference averages the two middle peaks. The most
//! similar reference decides the shape when the similarity is strong enough;
//! otherwise the normalized center of mass decides.

use crate::shape::{cosine_similarity, euclidean_distance, normalize, triangular_distribution};
use cluster_core::{config::ShapeConfig, Cluster, ProfileShape, Result, ShapeReport};
use ordered_float::OrderedFloat;
use tracing::warn;

/// Shape classifier.
#[derive(Debug, Clone)]
pub struct ShapeClassifier {
    config: ShapeConfig,
}

impl ShapeClassifier {
    /// Create a new classifier.
    pub fn new(config: ShapeConfig) -> Self {
        Self { config }
    }

    /// Classify a cluster.
    ///
    /// Empty clusters and clusters narrower than `min_levels` are `Undefined`.
    pub fn classify(&self, cluster: &Cluster) -> ShapeReport {
        let center_of_mass = cluster.center_of_mass();
        let center_of_mass_norm = cluster.center_of_mass_normalized();

        let width = cluster.width();
        if width == 0 || width < self.config.min_levels {
            return ShapeReport::undefined(center_of_mass, center_of_mass_norm);
        }

        let profile = cluster.normalized_array();
        match self.classify_profile(&profile, center_of_mass, center_of_mass_norm) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, width, "shape comparison failed");
                ShapeReport::undefined(center_of_mass, center_of_mass_norm)
            }
        }
    }

    /// Classify a normalized dense profile.
    pub fn classify_profile(
        &self,
        profile: &[f64],
        center_of_mass: f64,
        center_of_mass_norm: f64,
    ) -> Result<ShapeReport> {
        let n = profile.len();
        if n == 0 {
            return Ok(ShapeReport::undefined(center_of_mass, center_of_mass_norm));
        }

        let references = [
            (ProfileShape::Balanced, balanced_reference(n)?),
            (ProfileShape::LowSkewed, triangular_distribution(n, 0)?),
            (ProfileShape::HighSkewed, triangular_distribution(n, n - 1)?),
        ];

        let mut similarities = [0.0; 3];
        for (slot, (_, reference)) in similarities.iter_mut().zip(&references) {
            *slot = cosine_similarity(profile, reference)?;
        }

        // Ties go to the earlier reference (balanced first)
        let (best_idx, best_similarity) = similarities
            .iter()
            .copied()
            .enumerate()
            .rev()
            .max_by_key(|&(_, sim)| OrderedFloat(sim))
            .unwrap_or((0, 0.0));

        let shape = if best_similarity >= self.config.min_similarity {
            references[best_idx].0
        } else {
            self.shape_from_center(center_of_mass_norm)
        };

        let reference = references
            .iter()
            .find(|(s, _)| *s == shape)
            .map(|(_, r)| r.as_slice())
            .unwrap_or(references[0].1.as_slice());
        let reference_distance = euclidean_distance(profile, reference)?;

        Ok(ShapeReport {
            shape,
            center_of_mass,
            center_of_mass_norm,
            balanced_similarity: similarities[0],
            low_skew_similarity: similarities[1],
            high_skew_similarity: similarities[2],
            reference_distance,
            matches_reference: reference_distance <= self.config.max_distance,
        })
    }

    /// Shape implied by the normalized center of mass alone.
    pub fn shape_from_center(&self, center_of_mass_norm: f64) -> ProfileShape {
        let threshold = self.config.skew_center_threshold;
        if center_of_mass_norm.is_nan() {
            ProfileShape::Undefined
        } else if center_of_mass_norm < threshold {
            ProfileShape::LowSkewed
        } else if center_of_mass_norm > 1.0 - threshold {
            ProfileShape::HighSkewed
        } else {
            ProfileShape::Balanced
        }
    }
}

/// Triangular reference peaking at the middle level, symmetric for every width.
fn balanced_reference(length: usize) -> Result<Vec<f64>> {
    let lower = triangular_distribution(length, length.saturating_sub(1) / 2)?;
    if length % 2 == 1 {
        return Ok(lower);
    }

    let upper = triangular_distribution(length, length / 2)?;
    let averaged: Vec<f64> = lower.iter().zip(&upper).map(|(l, u)| (l + u) / 2.0).collect();
    Ok(normalize(&averaged))
}

impl Default for ShapeClassifier {
    fn default() -> Self {
        Self::new(ShapeConfig::default())
    }
}
