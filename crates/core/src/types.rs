//! Core data types for the cluster-shaper system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Caller-supplied identifier grouping ticks into the same bar.
pub type BarKey = i64;

/// Quantized price bucket index within a bar, relative to the bar's open.
pub type PriceLevel = i64;

/// Bar key for a timestamp: index of the `bar_duration_ms` window containing it.
///
/// Uses floor division so timestamps before the epoch land in the right window.
#[inline]
pub fn bar_key_for(ts_ms: TimestampMs, bar_duration_ms: i64) -> BarKey {
    ts_ms.div_euclid(bar_duration_ms)
}

/// A single price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Timestamp in milliseconds.
    pub ts_ms: TimestampMs,
    /// Observed price.
    pub price: f64,
}

impl Tick {
    /// Create a tick.
    pub fn new(ts_ms: TimestampMs, price: f64) -> Self {
        Self { ts_ms, price }
    }

    /// Timestamp as a UTC datetime, `None` if out of chrono's range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.ts_ms)
    }

    /// Bar key of this tick for the given bar length.
    #[inline]
    pub fn bar_key(&self, bar_duration_ms: i64) -> BarKey {
        bar_key_for(self.ts_ms, bar_duration_ms)
    }
}

/// Auction shape of a closed cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileShape {
    /// Mass concentrated around the middle of the range.
    Balanced,
    /// Mass concentrated at the low end ("b" profile).
    LowSkewed,
    /// Mass concentrated at the high end ("P" profile).
    HighSkewed,
    /// Too few levels to tell.
    Undefined,
}

impl ProfileShape {
    /// Is this a skewed shape?
    pub fn is_skewed(self) -> bool {
        matches!(self, ProfileShape::LowSkewed | ProfileShape::HighSkewed)
    }

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileShape::Balanced => "balanced",
            ProfileShape::LowSkewed => "low_skewed",
            ProfileShape::HighSkewed => "high_skewed",
            ProfileShape::Undefined => "undefined",
        }
    }
}

/// Value Area of a single cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    /// Level with the highest count.
    pub poc_level: PriceLevel,
    /// Point of Control price.
    pub poc: f64,
    /// Value Area High (price of the highest included level).
    pub vah: f64,
    /// Value Area Low (price of the lowest included level).
    pub val: f64,
    /// Fraction of ticks inside the VA.
    pub coverage: f64,
    /// Number of levels in the VA.
    pub level_count: u32,
    /// Total ticks in the cluster.
    pub total_count: u64,
    /// Whether the VA is valid (enough levels).
    pub is_valid: bool,
}

impl ValueArea {
    /// Create an invalid/empty VA.
    pub fn invalid() -> Self {
        Self {
            poc_level: 0,
            poc: 0.0,
            vah: 0.0,
            val: 0.0,
            coverage: 0.0,
            level_count: 0,
            total_count: 0,
            is_valid: false,
        }
    }
}

/// Result of comparing a cluster's profile with the triangular references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeReport {
    /// Classified shape.
    pub shape: ProfileShape,
    /// Center of mass in levels from the lowest level.
    pub center_of_mass: f64,
    /// Center of mass in `[0, 1]`.
    pub center_of_mass_norm: f64,
    /// Cosine similarity with the centered reference.
    pub balanced_similarity: f64,
    /// Cosine similarity with the reference peaking at the lowest level.
    pub low_skew_similarity: f64,
    /// Cosine similarity with the reference peaking at the highest level.
    pub high_skew_similarity: f64,
    /// Euclidean distance to the reference of the classified shape.
    pub reference_distance: f64,
    /// Whether `reference_distance` is within the configured maximum.
    pub matches_reference: bool,
}

impl ShapeReport {
    /// Report for a cluster too narrow to classify.
    pub fn undefined(center_of_mass: f64, center_of_mass_norm: f64) -> Self {
        Self {
            shape: ProfileShape::Undefined,
            center_of_mass,
            center_of_mass_norm,
            balanced_similarity: 0.0,
            low_skew_similarity: 0.0,
            high_skew_similarity: 0.0,
            reference_distance: f64::NAN,
            matches_reference: false,
        }
    }
}

/// Complete feature set for a closed cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterFeatures {
    /// Key of the closed cluster.
    pub bar_key: BarKey,
    /// Open price.
    pub open: f64,
    /// Close price.
    pub close: f64,
    /// Price of the highest level.
    pub high: f64,
    /// Price of the lowest level.
    pub low: f64,
    /// Ticks accumulated.
    pub tick_count: u64,
    /// Levels spanned.
    pub width: usize,
    /// Shape classification.
    pub shape: ShapeReport,
    /// Value Area.
    pub value_area: ValueArea,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_bar_key_for_minutes() {
        // 2024-01-01 00:01:30.500 -> minute 28401121
        let ts = 1704067290500i64;
        assert_eq!(bar_key_for(ts, 60_000), 1704067260000 / 60_000);
        assert_eq!(bar_key_for(59_999, 60_000), 0);
        assert_eq!(bar_key_for(60_000, 60_000), 1);
    }

    #[test]
    fn test_bar_key_for_negative_timestamp() {
        assert_eq!(bar_key_for(-1, 60_000), -1);
        assert_eq!(bar_key_for(-60_000, 60_000), -1);
        assert_eq!(bar_key_for(-60_001, 60_000), -2);
    }

    #[test]
    fn test_profile_shape_names() {
        assert!(ProfileShape::LowSkewed.is_skewed());
        assert!(ProfileShape::HighSkewed.is_skewed());
        assert!(!ProfileShape::Balanced.is_skewed());
        assert_eq!(ProfileShape::HighSkewed.as_str(), "high_skewed");
    }

    #[test]
    fn test_invalid_value_area() {
        let va = ValueArea::invalid();
        assert!(!va.is_valid);
        assert_eq!(va.level_count, 0);
    }

    #[test]
    fn test_tick_datetime() {
        let tick = Tick::new(1704067290500, 1.2345);
        let dt = tick.datetime().unwrap();
        assert_eq!(dt.minute(), 1);
        assert_eq!(dt.second(), 30);
        assert_eq!(tick.bar_key(60_000), bar_key_for(1704067290500, 60_000));
    }
}
