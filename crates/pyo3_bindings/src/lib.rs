//! PyO3 bindings for cluster-shaper Rust components.
//!
//! Exposes to Python:
//! - Cluster snapshots and their profile statistics
//! - The cluster shaper with Python callables as observers
//! - The profile engine (shape classification, value area)
//! - Shape-comparison functions

use std::collections::BTreeMap;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use cluster_core::{
    Cluster as RustCluster,
    ClusterFeatures as RustClusterFeatures,
    Config as RustConfig,
    Error as RustError,
    Tick as RustTick,
};
use cluster_features::{shape, ProfileEngine};
use cluster_ingestion::ClusterShaper;

fn to_py_err(err: RustError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// Snapshot of a price cluster.
#[pyclass]
#[derive(Clone)]
pub struct Cluster {
    inner: RustCluster,
}

#[pymethods]
impl Cluster {
    #[getter]
    fn open(&self) -> f64 {
        self.inner.open()
    }

    #[getter]
    fn close(&self) -> f64 {
        self.inner.close()
    }

    #[getter]
    fn resolution(&self) -> f64 {
        self.inner.resolution()
    }

    /// Sparse histogram as a level -> count dict.
    #[getter]
    fn distribution(&self) -> BTreeMap<i64, u64> {
        self.inner.distribution().clone()
    }

    #[getter]
    fn tick_count(&self) -> u64 {
        self.inner.tick_count()
    }

    #[getter]
    fn width(&self) -> usize {
        self.inner.width()
    }

    #[getter]
    fn poc_level(&self) -> Option<i64> {
        self.inner.poc_level()
    }

    fn raw_array(&self) -> Vec<u64> {
        self.inner.raw_array()
    }

    fn normalized_array(&self) -> Vec<f64> {
        self.inner.normalized_array()
    }

    fn center_of_mass(&self) -> f64 {
        self.inner.center_of_mass()
    }

    fn center_of_mass_normalized(&self) -> f64 {
        self.inner.center_of_mass_normalized()
    }

    fn level_price(&self, level: i64) -> f64 {
        self.inner.level_price(level)
    }

    fn __len__(&self) -> usize {
        self.inner.width()
    }

    fn __repr__(&self) -> String {
        format!(
            "Cluster(open={}, close={}, width={}, ticks={})",
            self.inner.open(),
            self.inner.close(),
            self.inner.width(),
            self.inner.tick_count()
        )
    }
}

impl From<&RustCluster> for Cluster {
    fn from(c: &RustCluster) -> Self {
        Cluster { inner: c.clone() }
    }
}

/// Features of a closed cluster.
#[pyclass]
#[derive(Clone)]
pub struct ClusterFeatures {
    #[pyo3(get)]
    pub bar_key: i64,
    #[pyo3(get)]
    pub open: f64,
    #[pyo3(get)]
    pub close: f64,
    #[pyo3(get)]
    pub high: f64,
    #[pyo3(get)]
    pub low: f64,
    #[pyo3(get)]
    pub tick_count: u64,
    #[pyo3(get)]
    pub width: usize,
    #[pyo3(get)]
    pub shape: String,
    #[pyo3(get)]
    pub center_of_mass: f64,
    #[pyo3(get)]
    pub center_of_mass_norm: f64,
    #[pyo3(get)]
    pub balanced_similarity: f64,
    #[pyo3(get)]
    pub low_skew_similarity: f64,
    #[pyo3(get)]
    pub high_skew_similarity: f64,
    #[pyo3(get)]
    pub reference_distance: f64,
    #[pyo3(get)]
    pub matches_reference: bool,
    #[pyo3(get)]
    pub poc: f64,
    #[pyo3(get)]
    pub vah: f64,
    #[pyo3(get)]
    pub val: f64,
    #[pyo3(get)]
    pub va_coverage: f64,
    #[pyo3(get)]
    pub va_is_valid: bool,
}

#[pymethods]
impl ClusterFeatures {
    fn __repr__(&self) -> String {
        format!(
            "ClusterFeatures(bar_key={}, shape={}, center={:.3}, poc={})",
            self.bar_key, self.shape, self.center_of_mass_norm, self.poc
        )
    }
}

impl From<RustClusterFeatures> for ClusterFeatures {
    fn from(f: RustClusterFeatures) -> Self {
        ClusterFeatures {
            bar_key: f.bar_key,
            open: f.open,
            close: f.close,
            high: f.high,
            low: f.low,
            tick_count: f.tick_count,
            width: f.width,
            shape: f.shape.shape.as_str().to_string(),
            center_of_mass: f.shape.center_of_mass,
            center_of_mass_norm: f.shape.center_of_mass_norm,
            balanced_similarity: f.shape.balanced_similarity,
            low_skew_similarity: f.shape.low_skew_similarity,
            high_skew_similarity: f.shape.high_skew_similarity,
            reference_distance: f.shape.reference_distance,
            matches_reference: f.shape.matches_reference,
            poc: f.value_area.poc,
            vah: f.value_area.vah,
            val: f.value_area.val,
            va_coverage: f.value_area.coverage,
            va_is_valid: f.value_area.is_valid,
        }
    }
}

// ============================================================================
// Python-exposed Engines
// ============================================================================

/// Wrap a Python callable as a cluster observer. Exceptions are printed, not raised.
fn py_observer(callback: PyObject) -> impl FnMut(&RustCluster) + Send + 'static {
    move |cluster: &RustCluster| {
        Python::with_gil(|py| {
            if let Err(err) = callback.call1(py, (Cluster::from(cluster),)) {
                err.print(py);
            }
        })
    }
}

/// Tick-to-cluster aggregator.
#[pyclass]
pub struct PyClusterShaper {
    inner: ClusterShaper,
}

#[pymethods]
impl PyClusterShaper {
    #[new]
    fn new(period: usize, resolution: f64) -> PyResult<Self> {
        let inner = ClusterShaper::new(period, resolution).map_err(to_py_err)?;
        Ok(PyClusterShaper { inner })
    }

    /// Register a callable receiving each closed Cluster.
    fn on_close_bar(&mut self, callback: PyObject) {
        self.inner.on_close_bar(py_observer(callback));
    }

    /// Register a callable receiving the Cluster still being built.
    fn on_unformed_bar(&mut self, callback: PyObject) {
        self.inner.on_unformed_bar(py_observer(callback));
    }

    /// Enable or disable progress notifications.
    fn set_notify_unformed(&mut self, enabled: bool) {
        self.inner.set_notify_unformed(enabled);
    }

    /// Process a tick.
    fn update(&mut self, price: f64, bar_key: i64) {
        self.inner.update(price, bar_key);
    }

    /// Process a batch of (price, bar_key) pairs.
    fn update_batch(&mut self, ticks: Vec<(f64, i64)>) {
        for (price, bar_key) in ticks {
            self.inner.update(price, bar_key);
        }
    }

    /// The cluster still being built.
    fn active_bar(&self) -> Option<Cluster> {
        self.inner.active_bar().map(Cluster::from)
    }

    #[getter]
    fn current_bar_key(&self) -> Option<i64> {
        self.inner.current_bar_key()
    }

    #[getter]
    fn closed_count(&self) -> u64 {
        self.inner.closed_count()
    }

    /// Clear all state.
    fn clear(&mut self) {
        self.inner.clear();
    }
}

/// Profile feature engine.
#[pyclass]
pub struct PyProfileEngine {
    inner: ProfileEngine,
}

#[pymethods]
impl PyProfileEngine {
    /// Create from an optional JSON configuration.
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => RustConfig::from_json_str(json).map_err(to_py_err)?,
            None => RustConfig::default(),
        };
        let inner = ProfileEngine::new(&config).map_err(to_py_err)?;
        Ok(PyProfileEngine { inner })
    }

    /// Process a price with an explicit bar key.
    fn update(&mut self, price: f64, bar_key: i64) -> Option<ClusterFeatures> {
        self.inner.update(price, bar_key).map(|f| f.into())
    }

    /// Process a timestamped tick.
    fn add_tick(&mut self, ts_ms: i64, price: f64) -> Option<ClusterFeatures> {
        self.inner.add_tick(&RustTick::new(ts_ms, price)).map(|f| f.into())
    }

    /// Process a batch of (ts_ms, price) ticks.
    fn add_ticks(&mut self, ticks: Vec<(i64, f64)>) -> Vec<ClusterFeatures> {
        let rust_ticks: Vec<RustTick> = ticks
            .into_iter()
            .map(|(ts_ms, price)| RustTick::new(ts_ms, price))
            .collect();
        self.inner
            .add_ticks(&rust_ticks)
            .into_iter()
            .map(|f| f.into())
            .collect()
    }

    /// Features of the cluster still being built.
    fn current_features(&self) -> Option<ClusterFeatures> {
        self.inner.current_features().map(|f| f.into())
    }

    #[getter]
    fn closed_count(&self) -> u64 {
        self.inner.closed_count()
    }

    /// Clear all state.
    fn clear(&mut self) {
        self.inner.clear();
    }
}

// ============================================================================
// Shape Functions
// ============================================================================

/// Triangular reference distribution of `length` points peaking at `peak_index`.
#[pyfunction]
fn triangular_distribution(length: usize, peak_index: usize) -> PyResult<Vec<f64>> {
    shape::triangular_distribution(length, peak_index).map_err(to_py_err)
}

/// Cosine similarity of two equal-length sequences.
#[pyfunction]
fn cosine_similarity(a: Vec<f64>, b: Vec<f64>) -> PyResult<f64> {
    shape::cosine_similarity(&a, &b).map_err(to_py_err)
}

/// Euclidean distance between two equal-length sequences.
#[pyfunction]
fn euclidean_distance(a: Vec<f64>, b: Vec<f64>) -> PyResult<f64> {
    shape::euclidean_distance(&a, &b).map_err(to_py_err)
}

/// Divide each value by the sum.
#[pyfunction]
fn normalize(values: Vec<f64>) -> Vec<f64> {
    shape::normalize(&values)
}

// ============================================================================
// Module Definition
// ============================================================================

/// Cluster Shaper - price-profile bars and shape analysis for Python.
#[pymodule]
fn cluster_shaper(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Route Rust logs to stderr, filtered by RUST_LOG
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    // Types
    m.add_class::<Cluster>()?;
    m.add_class::<ClusterFeatures>()?;

    // Engine classes
    m.add_class::<PyClusterShaper>()?;
    m.add_class::<PyProfileEngine>()?;

    // Functions
    m.add_function(wrap_pyfunction!(triangular_distribution, m)?)?;
    m.add_function(wrap_pyfunction!(cosine_similarity, m)?)?;
    m.add_function(wrap_pyfunction!(euclidean_distance, m)?)?;
    m.add_function(wrap_pyfunction!(normalize, m)?)?;

    Ok(())
}
