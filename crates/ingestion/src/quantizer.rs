//! Price quantization.
//!
//! Maps raw prices to integer levels relative to a bar's open price.

use cluster_core::{Error, PriceLevel, Result};

/// Largest level offset from the open a cluster accepts, in either direction.
pub const MAX_LEVEL_OFFSET: PriceLevel = 1 << 22;

/// Level of `price` in a bar opened at `bar_open`.
///
/// `level = round((price - bar_open) / resolution)`, ties to even.
/// NaN maps to level 0; infinite or huge offsets saturate at the `i64` bounds.
/// Use [`checked_level_of`] to reject those.
#[inline]
pub fn level_of(price: f64, bar_open: f64, resolution: f64) -> PriceLevel {
    ((price - bar_open) / resolution).round_ties_even() as PriceLevel
}

/// Like [`level_of`], but `None` when the offset is not finite or lies beyond
/// [`MAX_LEVEL_OFFSET`].
#[inline]
pub fn checked_level_of(price: f64, bar_open: f64, resolution: f64) -> Option<PriceLevel> {
    let offset = ((price - bar_open) / resolution).round_ties_even();
    if offset.is_finite() && offset.abs() <= MAX_LEVEL_OFFSET as f64 {
        Some(offset as PriceLevel)
    } else {
        None
    }
}

/// Quantizer with a validated resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    resolution: f64,
}

impl Quantizer {
    /// Create a quantizer. Fails if `resolution` is not a positive finite number.
    pub fn new(resolution: f64) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(Error::config(format!(
                "resolution must be a positive finite number, got {}",
                resolution
            )));
        }
        Ok(Self { resolution })
    }

    /// Quantization width.
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Level of `price` in a bar opened at `bar_open`.
    #[inline]
    pub fn level_of(&self, price: f64, bar_open: f64) -> PriceLevel {
        level_of(price, bar_open, self.resolution)
    }

    /// Level of `price`, `None` when out of the accepted range.
    #[inline]
    pub fn checked_level_of(&self, price: f64, bar_open: f64) -> Option<PriceLevel> {
        checked_level_of(price, bar_open, self.resolution)
    }
}
