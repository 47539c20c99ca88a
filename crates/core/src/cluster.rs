//! Price cluster (bar) with a dwell-count histogram over quantized levels.
//!
//! A cluster counts how many ticks landed on each price level while it was open.
//! The histogram is stored sparse and rendered dense only when a derived statistic
//! is requested.

use crate::types::PriceLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One aggregation window's accumulated price histogram.
///
/// Levels are relative to the cluster's open price: level `k` covers prices near
/// `open + k * resolution`.
///
/// Deserialization rebuilds the level range from the distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClusterSnapshot")]
pub struct Cluster {
    /// First price observed (meaningful once `has_price` is set).
    open: f64,
    /// Most recent price observed.
    close: f64,
    /// Quantization width the levels were computed with.
    resolution: f64,
    /// Dwell counts by level.
    distribution: BTreeMap<PriceLevel, u64>,
    /// Lowest and highest level seen so far.
    #[serde(skip)]
    level_range: Option<(PriceLevel, PriceLevel)>,
    /// Whether `open` has been set.
    has_price: bool,
}

/// Serialized form of a [`Cluster`]; everything but the derived level range.
#[derive(Deserialize)]
struct ClusterSnapshot {
    open: f64,
    close: f64,
    resolution: f64,
    distribution: BTreeMap<PriceLevel, u64>,
    has_price: bool,
}

impl From<ClusterSnapshot> for Cluster {
    fn from(snapshot: ClusterSnapshot) -> Self {
        let mut distribution = snapshot.distribution;
        distribution.retain(|_, count| *count > 0);

        let level_range = match (distribution.first_key_value(), distribution.last_key_value()) {
            (Some((&lo, _)), Some((&hi, _))) => Some((lo, hi)),
            _ => None,
        };

        Self {
            open: snapshot.open,
            close: snapshot.close,
            resolution: snapshot.resolution,
            distribution,
            level_range,
            has_price: snapshot.has_price,
        }
    }
}

impl Cluster {
    /// Create an empty cluster for the given quantization width.
    pub fn new(resolution: f64) -> Self {
        Self {
            open: 0.0,
            close: 0.0,
            resolution,
            distribution: BTreeMap::new(),
            level_range: None,
            has_price: false,
        }
    }

    /// Open price (NaN before the first price).
    #[inline]
    pub fn open(&self) -> f64 {
        if self.has_price {
            self.open
        } else {
            f64::NAN
        }
    }

    /// Close price (NaN before the first price).
    #[inline]
    pub fn close(&self) -> f64 {
        if self.has_price {
            self.close
        } else {
            f64::NAN
        }
    }

    /// Quantization width.
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Sparse histogram, ordered by level.
    #[inline]
    pub fn distribution(&self) -> &BTreeMap<PriceLevel, u64> {
        &self.distribution
    }

    /// Dwell count at a level (0 if never visited).
    pub fn count_at(&self, level: PriceLevel) -> u64 {
        self.distribution.get(&level).copied().unwrap_or(0)
    }

    /// Record a price: always updates close, sets open only on the first call.
    pub fn record_price(&mut self, price: f64) {
        if !self.has_price {
            self.open = price;
            self.has_price = true;
        }
        self.close = price;
    }

    /// Add one tick of dwell time at `level`.
    pub fn accumulate(&mut self, level: PriceLevel) {
        *self.distribution.entry(level).or_insert(0) += 1;
        self.level_range = Some(match self.level_range {
            Some((lo, hi)) => (lo.min(level), hi.max(level)),
            None => (level, level),
        });
    }

    /// Lowest level observed.
    #[inline]
    pub fn min_level(&self) -> Option<PriceLevel> {
        self.level_range.map(|(lo, _)| lo)
    }

    /// Highest level observed.
    #[inline]
    pub fn max_level(&self) -> Option<PriceLevel> {
        self.level_range.map(|(_, hi)| hi)
    }

    /// Number of levels in `[min_level, max_level]` (0 when empty).
    pub fn width(&self) -> usize {
        match self.level_range {
            Some((lo, hi)) => usize::try_from(hi.abs_diff(lo))
                .unwrap_or(usize::MAX)
                .saturating_add(1),
            None => 0,
        }
    }

    /// Total number of ticks accumulated.
    pub fn tick_count(&self) -> u64 {
        self.distribution.values().sum()
    }

    /// True when no tick has been accumulated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distribution.is_empty()
    }

    /// Price at the center of a level.
    #[inline]
    pub fn level_price(&self, level: PriceLevel) -> f64 {
        self.open() + level as f64 * self.resolution
    }

    /// Price of the highest level observed.
    pub fn high(&self) -> Option<f64> {
        self.max_level().map(|level| self.level_price(level))
    }

    /// Price of the lowest level observed.
    pub fn low(&self) -> Option<f64> {
        self.min_level().map(|level| self.level_price(level))
    }

    /// Point of control: level with the highest count, lowest level on ties.
    pub fn poc_level(&self) -> Option<PriceLevel> {
        let mut best: Option<(PriceLevel, u64)> = None;
        for (&level, &count) in &self.distribution {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((level, count)),
            }
        }
        best.map(|(level, _)| level)
    }

    /// Dense histogram over `[min_level, max_level]`, zero-filled for unseen levels.
    pub fn raw_array(&self) -> Vec<u64> {
        let Some((lo, _)) = self.level_range else {
            return Vec::new();
        };

        let mut dense = vec![0u64; self.width()];
        for (&level, &count) in &self.distribution {
            dense[level.abs_diff(lo) as usize] = count;
        }
        dense
    }

    /// Dense histogram divided by its sum (zero vector when the sum is zero).
    pub fn normalized_array(&self) -> Vec<f64> {
        let raw = self.raw_array();
        let total: u64 = raw.iter().sum();
        if total == 0 {
            return vec![0.0; raw.len()];
        }

        let total = total as f64;
        raw.into_iter().map(|count| count as f64 / total).collect()
    }

    /// Count-weighted mean index over `raw_array()`. NaN when empty.
    pub fn center_of_mass(&self) -> f64 {
        let Some((lo, _)) = self.level_range else {
            return f64::NAN;
        };

        let mut weighted = 0.0;
        let mut total = 0.0;
        for (&level, &count) in &self.distribution {
            let count = count as f64;
            weighted += level.abs_diff(lo) as f64 * count;
            total += count;
        }

        if total > 0.0 {
            weighted / total
        } else {
            f64::NAN
        }
    }

    /// Center of mass mapped into `[0, 1]`: 0 = all mass at the lowest level,
    /// 1 = all mass at the highest.
    ///
    /// A single-level cluster is perfectly balanced and returns 0.5. NaN when empty.
    pub fn center_of_mass_normalized(&self) -> f64 {
        match self.width() {
            0 => f64::NAN,
            1 => 0.5,
            width => self.center_of_mass() / (width - 1) as f64,
        }
    }

    /// Reset to the initial empty state, keeping the resolution.
    pub fn clear(&mut self) {
        self.open = 0.0;
        self.close = 0.0;
        self.distribution.clear();
        self.level_range = None;
        self.has_price = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_cluster(levels: &[PriceLevel]) -> Cluster {
        let mut cluster = Cluster::new(0.1);
        cluster.record_price(1.0);
        for &level in levels {
            cluster.accumulate(level);
        }
        cluster
    }

    #[test]
    fn test_empty_cluster() {
        let cluster = Cluster::new(0.1);

        assert!(cluster.is_empty());
        assert_eq!(cluster.width(), 0);
        assert_eq!(cluster.tick_count(), 0);
        assert!(cluster.raw_array().is_empty());
        assert!(cluster.normalized_array().is_empty());
        assert!(cluster.center_of_mass().is_nan());
        assert!(cluster.center_of_mass_normalized().is_nan());
        assert!(cluster.poc_level().is_none());
        assert!(cluster.open().is_nan());
    }

    #[test]
    fn test_record_price_sets_open_once() {
        let mut cluster = Cluster::new(0.1);
        cluster.record_price(1.0);
        cluster.record_price(1.3);
        cluster.record_price(0.9);

        assert_eq!(cluster.open(), 1.0);
        assert_eq!(cluster.close(), 0.9);
    }

    #[test]
    fn test_accumulate_tracks_range() {
        let cluster = make_cluster(&[0, 2, -3, 2]);

        assert_eq!(cluster.min_level(), Some(-3));
        assert_eq!(cluster.max_level(), Some(2));
        assert_eq!(cluster.width(), 6);
        assert_eq!(cluster.tick_count(), 4);
        assert_eq!(cluster.count_at(2), 2);
        assert_eq!(cluster.count_at(1), 0);
    }

    #[test]
    fn test_raw_array_zero_fills_gaps() {
        let cluster = make_cluster(&[-1, 2, 2, 0]);
        // Levels -1..=2
        assert_eq!(cluster.raw_array(), vec![1, 1, 0, 2]);
    }

    #[test]
    fn test_normalized_array_sums_to_one() {
        let cluster = make_cluster(&[0, 0, 1, 3, 3, 3, 4]);
        let normalized = cluster.normalized_array();

        assert_eq!(normalized.len(), 5);
        assert_relative_eq!(normalized.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(normalized[3], 3.0 / 7.0);
        assert_eq!(normalized[2], 0.0);
    }

    #[test]
    fn test_center_of_mass() {
        let cluster = make_cluster(&[0, 1, 2]);
        assert_eq!(cluster.center_of_mass(), 1.0);
        assert_eq!(cluster.center_of_mass_normalized(), 0.5);

        // Offsets are taken from the lowest level, not from zero.
        let cluster = make_cluster(&[-2, -2, -2, 1]);
        assert!((cluster.center_of_mass() - 0.75).abs() < 1e-12);
        assert!((cluster.center_of_mass_normalized() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_center_of_mass_normalized_extremes() {
        // All mass at the minimum except a single tick at the top.
        let low = make_cluster(&[0, 0, 0, 0, 5]);
        assert!(low.center_of_mass_normalized() < 0.5);

        let high = make_cluster(&[0, 5, 5, 5, 5]);
        assert!(high.center_of_mass_normalized() > 0.5);

        for cluster in [&low, &high] {
            let c = cluster.center_of_mass_normalized();
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_single_level_is_balanced() {
        let cluster = make_cluster(&[4, 4, 4]);
        assert_eq!(cluster.width(), 1);
        assert_eq!(cluster.center_of_mass(), 0.0);
        assert_eq!(cluster.center_of_mass_normalized(), 0.5);
    }

    #[test]
    fn test_derived_values_are_repeatable() {
        let cluster = make_cluster(&[0, 3, 1, 1, -2, 3, 3]);

        assert_eq!(cluster.raw_array(), cluster.raw_array());
        assert_eq!(
            cluster.center_of_mass().to_bits(),
            cluster.center_of_mass().to_bits()
        );
        assert_eq!(cluster.normalized_array(), cluster.normalized_array());
    }

    #[test]
    fn test_poc_and_prices() {
        let cluster = make_cluster(&[-1, 1, 1, 2, 2]);

        // Tie between 1 and 2 resolves to the lower level.
        assert_eq!(cluster.poc_level(), Some(1));
        assert_relative_eq!(cluster.level_price(1), 1.1, epsilon = 1e-12);
        assert_relative_eq!(cluster.high().unwrap(), 1.2, epsilon = 1e-12);
        assert_relative_eq!(cluster.low().unwrap(), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_clear() {
        let mut cluster = make_cluster(&[0, 1, 2]);
        cluster.clear();

        assert!(cluster.is_empty());
        assert_eq!(cluster.width(), 0);
        assert!(cluster.open().is_nan());
        assert_eq!(cluster.resolution(), 0.1);

        cluster.record_price(2.0);
        assert_eq!(cluster.open(), 2.0);
    }

    #[test]
    fn test_empty_cluster_serializes() {
        let cluster = Cluster::new(0.5);
        let json = serde_json::to_string(&cluster).unwrap();
        let back: Cluster = serde_json::from_str(&json).unwrap();
        assert!(back.is_empty());
        assert!(back.open().is_nan());
        assert_eq!(back.resolution(), 0.5);
    }

    #[test]
    fn test_width_of_extreme_levels_does_not_overflow() {
        let mut cluster = Cluster::new(1.0);
        cluster.record_price(0.0);
        cluster.accumulate(PriceLevel::MIN);
        cluster.accumulate(PriceLevel::MAX);

        assert_eq!(cluster.width(), usize::MAX);
        assert_eq!(cluster.center_of_mass_normalized(), 0.5);
    }

    #[test]
    fn test_deserialize_rebuilds_level_range() {
        // A stale level range in the payload is ignored.
        let json = r#"{
            "open": 1.0,
            "close": 1.5,
            "resolution": 0.1,
            "distribution": {"0": 1, "5": 2, "7": 0},
            "level_range": [0, 1],
            "has_price": true
        }"#;
        let cluster: Cluster = serde_json::from_str(json).unwrap();

        assert_eq!(cluster.min_level(), Some(0));
        assert_eq!(cluster.max_level(), Some(5));
        assert_eq!(cluster.width(), 6);
        assert_eq!(cluster.raw_array(), vec![1, 0, 0, 0, 0, 2]);
        assert_eq!(cluster.tick_count(), 3);

        let serialized = serde_json::to_value(&cluster).unwrap();
        assert!(serialized.get("level_range").is_none());
    }

    #[test]
    fn test_serde_round_trip_preserves_distribution() {
        let cluster = make_cluster(&[-1, 0, 0, 3]);
        let json = serde_json::to_string(&cluster).unwrap();
        let back: Cluster = serde_json::from_str(&json).unwrap();

        assert_eq!(back.distribution(), cluster.distribution());
        assert_eq!(back.raw_array(), cluster.raw_array());
    }
}
