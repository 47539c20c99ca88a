//! Profile feature engine.
//!
//! Drives a [`ClusterShaper`] and analyses every cluster it closes.

use crate::{classifier::ShapeClassifier, value_area::ValueAreaComputer};
use cluster_core::{BarKey, Cluster, ClusterFeatures, Config, Result, Tick};
use cluster_ingestion::ClusterShaper;
use std::sync::mpsc::{self, Receiver};
use tracing::debug;

/// Profile feature engine.
///
/// Closed clusters are delivered from the shaper's `on_close_bar` observer over
/// a channel and turned into [`ClusterFeatures`] on the calling thread.
///
/// Observers are `'static` and cannot borrow the engine, so the channel carries
/// the closed cluster out of the callback. Sender and receiver both live on the
/// calling thread and at most one cluster is in flight per `update`.
#[derive(Debug)]
pub struct ProfileEngine {
    /// Cluster aggregator.
    shaper: ClusterShaper,
    /// Clusters handed over by `on_close_bar`.
    closed: Receiver<Cluster>,
    /// Shape classifier.
    classifier: ShapeClassifier,
    /// Value Area computer.
    va_computer: ValueAreaComputer,
    /// Bar length for timestamped ticks.
    bar_duration_ms: i64,
}

impl ProfileEngine {
    /// Create a new engine from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut shaper = ClusterShaper::from_config(&config.shaper)?;
        let (tx, closed) = mpsc::channel();
        shaper.on_close_bar(move |cluster| {
            // The receiver lives as long as the engine that owns this shaper.
            let _ = tx.send(cluster.clone());
        });

        Ok(Self {
            shaper,
            closed,
            classifier: ShapeClassifier::new(config.shape.clone()),
            va_computer: ValueAreaComputer::new(config.value_area.clone()),
            bar_duration_ms: config.shaper.bar_duration_ms,
        })
    }

    /// Register a progress observer for the cluster being built.
    pub fn on_unformed_bar<F>(&mut self, callback: F)
    where
        F: FnMut(&Cluster) + Send + 'static,
    {
        self.shaper.on_unformed_bar(callback);
    }

    /// Process a price with an explicit bar key.
    ///
    /// Returns the features of the cluster closed by this call, if any.
    pub fn update(&mut self, price: f64, bar_key: BarKey) -> Option<ClusterFeatures> {
        let closing_key = self.shaper.current_bar_key();
        self.shaper.update(price, bar_key);

        let cluster = self.closed.try_recv().ok()?;
        let closing_key = closing_key?;
        Some(self.compute_features(closing_key, &cluster))
    }

    /// Process a timestamped tick, keyed by `bar_duration_ms` windows.
    pub fn add_tick(&mut self, tick: &Tick) -> Option<ClusterFeatures> {
        self.update(tick.price, tick.bar_key(self.bar_duration_ms))
    }

    /// Process multiple ticks, returning features of every cluster they closed.
    pub fn add_ticks(&mut self, ticks: &[Tick]) -> Vec<ClusterFeatures> {
        ticks.iter().filter_map(|tick| self.add_tick(tick)).collect()
    }

    /// Compute features for a cluster.
    pub fn compute_features(&self, bar_key: BarKey, cluster: &Cluster) -> ClusterFeatures {
        let shape = self.classifier.classify(cluster);
        let value_area = self.va_computer.compute(cluster);

        debug!(
            bar_key,
            shape = shape.shape.as_str(),
            center = shape.center_of_mass_norm,
            poc = value_area.poc,
            "cluster analysed"
        );

        ClusterFeatures {
            bar_key,
            open: cluster.open(),
            close: cluster.close(),
            high: cluster.high().unwrap_or(f64::NAN),
            low: cluster.low().unwrap_or(f64::NAN),
            tick_count: cluster.tick_count(),
            width: cluster.width(),
            shape,
            value_area,
        }
    }

    /// Features of the cluster still being built (never flushed automatically).
    pub fn current_features(&self) -> Option<ClusterFeatures> {
        let bar_key = self.shaper.current_bar_key()?;
        let cluster = self.shaper.active_bar()?;
        Some(self.compute_features(bar_key, cluster))
    }

    /// The cluster still being built.
    pub fn active_bar(&self) -> Option<&Cluster> {
        self.shaper.active_bar()
    }

    /// Number of clusters closed so far.
    pub fn closed_count(&self) -> u64 {
        self.shaper.closed_count()
    }

    /// Clear all state.
    pub fn clear(&mut self) {
        self.shaper.clear();
        while self.closed.try_recv().is_ok() {}
    }
}
