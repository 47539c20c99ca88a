//! Tick-to-cluster aggregation.
//!
//! Routes each tick into the currently open cluster and closes it when the
//! caller-supplied bar key changes.

use crate::quantizer::Quantizer;
use cluster_core::{config::ShaperConfig, BarKey, Cluster, Error, Result};
use std::fmt;
use tracing::{debug, trace, warn};

/// Observer invoked with a read-only view of a cluster.
pub type ClusterCallback = Box<dyn FnMut(&Cluster) + Send>;

/// Aggregates a tick stream into price clusters.
///
/// Every call to [`update`](Self::update) runs on the caller's thread and
/// dispatches callbacks inline before returning. Callbacks must not drive the
/// same shaper. A shaper is meant to be owned by one stream; share it across
/// threads only behind external synchronization.
pub struct ClusterShaper {
    /// Price-to-level mapping.
    quantizer: Quantizer,
    /// Expected profile width (sizing hint, not a cap).
    period: usize,
    /// Whether `on_unformed_bar` is dispatched.
    notify_unformed: bool,
    /// Key of the open cluster, `None` until the first tick.
    current_bar_key: Option<BarKey>,
    /// Cluster being built. Reused across bars.
    active_bar: Cluster,
    /// Number of clusters handed to `on_close_bar`.
    closed_count: u64,
    on_close_bar: Option<ClusterCallback>,
    on_unformed_bar: Option<ClusterCallback>,
}

impl ClusterShaper {
    /// Create a shaper.
    ///
    /// `period` is the expected profile width in levels and `resolution` the
    /// quantization width. Both must be positive.
    pub fn new(period: usize, resolution: f64) -> Result<Self> {
        if period == 0 {
            return Err(Error::config("period must be positive"));
        }
        let quantizer = Quantizer::new(resolution)?;

        Ok(Self {
            quantizer,
            period,
            notify_unformed: true,
            current_bar_key: None,
            active_bar: Cluster::new(resolution),
            closed_count: 0,
            on_close_bar: None,
            on_unformed_bar: None,
        })
    }

    /// Create a shaper from configuration.
    pub fn from_config(config: &ShaperConfig) -> Result<Self> {
        config.validate()?;
        let mut shaper = Self::new(config.period, config.resolution)?;
        shaper.notify_unformed = config.notify_unformed;
        Ok(shaper)
    }

    /// Register the observer for completed clusters.
    pub fn on_close_bar<F>(&mut self, callback: F)
    where
        F: FnMut(&Cluster) + Send + 'static,
    {
        self.on_close_bar = Some(Box::new(callback));
    }

    /// Register the observer for progress on the open cluster.
    pub fn on_unformed_bar<F>(&mut self, callback: F)
    where
        F: FnMut(&Cluster) + Send + 'static,
    {
        self.on_unformed_bar = Some(Box::new(callback));
    }

    /// Enable or disable progress notifications.
    pub fn set_notify_unformed(&mut self, enabled: bool) {
        self.notify_unformed = enabled;
    }

    /// Process a tick.
    ///
    /// A tick with the same key as the open cluster is accumulated into it and
    /// reported through `on_unformed_bar`. A tick with a different key (in
    /// either direction) closes the open cluster through `on_close_bar` and
    /// starts a new one with this tick. Keys are expected in non-decreasing
    /// order; out-of-order keys are not corrected.
    ///
    /// Non-finite prices are dropped without touching any state. A price too
    /// far from the open cluster's open to be quantized is dropped as well.
    pub fn update(&mut self, price: f64, bar_key: BarKey) {
        if !price.is_finite() {
            warn!(bar_key, price, "non-finite price, tick dropped");
            return;
        }

        match self.current_bar_key {
            None => {
                trace!(bar_key, price, "opening first cluster");
                self.current_bar_key = Some(bar_key);
                self.add_price(price);
            }
            Some(current) if current == bar_key => {
                if !self.add_price(price) {
                    return;
                }
                if self.notify_unformed {
                    if let Some(callback) = self.on_unformed_bar.as_mut() {
                        callback(&self.active_bar);
                    }
                }
            }
            Some(current) => {
                if bar_key < current {
                    warn!(current, bar_key, "bar key moved backwards, closing cluster anyway");
                }
                self.close_active(current);
                trace!(bar_key, price, "opening cluster");
                self.current_bar_key = Some(bar_key);
                self.add_price(price);
            }
        }
    }

    /// Record the price in the open cluster and accumulate its level.
    ///
    /// Returns false, leaving the cluster untouched, when the level is out of range.
    fn add_price(&mut self, price: f64) -> bool {
        let open = if self.active_bar.is_empty() {
            price
        } else {
            self.active_bar.open()
        };
        let Some(level) = self.quantizer.checked_level_of(price, open) else {
            warn!(price, open, "price out of quantizable range, tick dropped");
            return false;
        };

        self.active_bar.record_price(price);
        self.active_bar.accumulate(level);
        true
    }

    /// Hand the open cluster to `on_close_bar` and reset it.
    fn close_active(&mut self, bar_key: BarKey) {
        debug!(
            bar_key,
            open = self.active_bar.open(),
            close = self.active_bar.close(),
            width = self.active_bar.width(),
            ticks = self.active_bar.tick_count(),
            "closing cluster"
        );

        if let Some(callback) = self.on_close_bar.as_mut() {
            callback(&self.active_bar);
        }
        self.closed_count += 1;
        self.active_bar.clear();
    }

    /// The open cluster, `None` before the first tick.
    ///
    /// The last cluster of a stream is never flushed automatically; read it here.
    pub fn active_bar(&self) -> Option<&Cluster> {
        self.current_bar_key.map(|_| &self.active_bar)
    }

    /// Key of the open cluster.
    #[inline]
    pub fn current_bar_key(&self) -> Option<BarKey> {
        self.current_bar_key
    }

    /// Whether at least one tick has been seen since construction or `clear`.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.current_bar_key.is_some()
    }

    /// Number of clusters closed so far.
    #[inline]
    pub fn closed_count(&self) -> u64 {
        self.closed_count
    }

    /// Expected profile width.
    #[inline]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Quantization width.
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.quantizer.resolution()
    }

    /// Discard the open cluster and return to the uninitialized state.
    ///
    /// Registered callbacks are kept.
    pub fn clear(&mut self) {
        self.active_bar.clear();
        self.current_bar_key = None;
        self.closed_count = 0;
    }
}

impl fmt::Debug for ClusterShaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterShaper")
            .field("quantizer", &self.quantizer)
            .field("period", &self.period)
            .field("notify_unformed", &self.notify_unformed)
            .field("current_bar_key", &self.current_bar_key)
            .field("active_bar", &self.active_bar)
            .field("closed_count", &self.closed_count)
            .field("on_close_bar", &self.on_close_bar.is_some())
            .field("on_unformed_bar", &self.on_unformed_bar.is_some())
            .finish()
    }
}
