//! Value Area computation (POC, VAH, VAL) for a single cluster.
//!
//! Expands outward from the Point of Control over the cluster's dense profile.

use cluster_core::{config::ValueAreaConfig, Cluster, ValueArea};

/// Value Area computer.
#[derive(Debug, Clone)]
pub struct ValueAreaComputer {
    config: ValueAreaConfig,
}

impl ValueAreaComputer {
    /// Create a new Value Area computer.
    pub fn new(config: ValueAreaConfig) -> Self {
        Self { config }
    }

    /// Compute the Value Area of a cluster.
    pub fn compute(&self, cluster: &Cluster) -> ValueArea {
        let (Some(min_level), Some(poc_level)) = (cluster.min_level(), cluster.poc_level()) else {
            return ValueArea::invalid();
        };

        let counts = cluster.raw_array();
        if counts.len() < self.config.min_levels {
            return ValueArea::invalid();
        }

        let total_count: u64 = counts.iter().sum();
        if total_count == 0 {
            return ValueArea::invalid();
        }

        let target = total_count as f64 * self.config.va_fraction;
        let poc_idx = (poc_level - min_level) as usize;

        // Expand outward from POC
        let mut cumulative = counts[poc_idx];
        let mut low_idx = poc_idx;
        let mut high_idx = poc_idx;
        let mut included_levels = 1u32;

        while (cumulative as f64) < target {
            let next_low = low_idx.checked_sub(1);
            let next_high = (high_idx + 1 < counts.len()).then_some(high_idx + 1);

            // Expand toward the heavier neighbour, downward on ties
            let next = match (next_low, next_high) {
                (Some(l), Some(h)) if counts[l] >= counts[h] => l,
                (Some(_), Some(h)) => h,
                (Some(l), None) => l,
                (None, Some(h)) => h,
                (None, None) => break,
            };

            if next < low_idx {
                low_idx = next;
            } else {
                high_idx = next;
            }
            cumulative += counts[next];
            included_levels += 1;
        }

        let level_at = |idx: usize| min_level + idx as i64;

        ValueArea {
            poc_level,
            poc: cluster.level_price(poc_level),
            vah: cluster.level_price(level_at(high_idx)),
            val: cluster.level_price(level_at(low_idx)),
            coverage: cumulative as f64 / total_count as f64,
            level_count: included_levels,
            total_count,
            is_valid: true,
        }
    }
}

impl Default for ValueAreaComputer {
    fn default() -> Self {
        Self::new(ValueAreaConfig::default())
    }
}
