// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied: PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Rust Attractor Kernel.
//!
//! Exposes `AttractorConfig`, `Trajectory`, `Raster` and the four
//! pipeline entry points `search_attractor`, `compute_attractor`,
//! `render_attractor` and `generate_attractor`.
//!
//! # FFI Safety
//!
//! - The GIL is released (`allow_threads`) around search, iteration and
//!   rendering; only owned Rust data crosses into those closures.
//! - Kernel errors become Python exceptions: `ValueError` for bad input
//!   or configuration, `RuntimeError` for divergence, degenerate bounds,
//!   worker failures and exhausted searches.
//! - All config validated before storage (`AttractorConfig::validate()`).
//!
//! Install: `pip install -e crates/attractor-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from attractor_kernel import AttractorConfig, generate_attractor
//!
//! cfg = AttractorConfig(width=600, height=400, render_iterations=1_000_000)
//! out = generate_attractor(dimension=2, seed=1, config=cfg)
//! rgb = out["image"].to_rgb8()
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

use attractor_core::{
    AttractorGenerator, AttractorSearch, Discovery, RayonPool, RenderPipeline, RenderSettings,
    TrajectoryCompute,
};
use attractor_types::{AttractorConfig, AttractorError, Raster, RenderMode, Trajectory};

fn to_py_err(e: AttractorError) -> PyErr {
    match e {
        AttractorError::Config(_) | AttractorError::Validation(_) => {
            PyValueError::new_err(e.to_string())
        }
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

fn parse_mode(mode: &str) -> PyResult<RenderMode> {
    match mode {
        "auto" => Ok(RenderMode::Auto),
        "one_pass" => Ok(RenderMode::OnePass),
        "sharded" => Ok(RenderMode::Sharded),
        other => Err(PyValueError::new_err(format!(
            "render_mode must be 'auto', 'one_pass' or 'sharded', got {other:?}"
        ))),
    }
}

fn mode_name(mode: RenderMode) -> &'static str {
    match mode {
        RenderMode::Auto => "auto",
        RenderMode::OnePass => "one_pass",
        RenderMode::Sharded => "sharded",
    }
}

fn resolve(config: Option<PyAttractorConfig>) -> AttractorConfig {
    config.map(|c| c.inner).unwrap_or_default()
}

fn discovery_dict<'py>(py: Python<'py>, d: &Discovery) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("dimension", d.dimension)?;
    dict.set_item("seed", d.seed)?;
    dict.set_item("coefficients", d.coefficients.clone())?;
    dict.set_item("initial_state", d.initial_state.clone())?;
    dict.set_item("attempts", d.attempts)?;
    dict.set_item("rejected_diverged", d.rejected_diverged)?;
    dict.set_item("rejected_sparse", d.rejected_sparse)?;
    dict.set_item("elapsed_ms", d.elapsed_ms)?;
    Ok(dict)
}

// ─── PyAttractorConfig ──────────────────────────────────────────────

/// Python-visible configuration for the Attractor Kernel.
#[pyclass(name = "AttractorConfig")]
#[derive(Clone)]
struct PyAttractorConfig {
    inner: AttractorConfig,
}

#[pymethods]
impl PyAttractorConfig {
    #[new]
    #[pyo3(signature = (
        search_iterations = 2000,
        search_max_attempts = Some(1_000_000),
        search_timeout_ms = None,
        density_resolution = 320,
        min_fill_percent = 1.5,
        render_iterations = 10_000_000,
        check_ratio = 0.01,
        shard_count = 6,
        width = 3508,
        height = 2480,
        alpha = 0.025,
        margin = 1.1,
        transient_skip = 10_000,
        one_pass_threshold = 10_000_000,
        render_mode = "auto",
        background = [0.9, 0.9, 0.85],
        burn_factors = [0.75, 1.0, 1.25],
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        search_iterations: usize,
        search_max_attempts: Option<u64>,
        search_timeout_ms: Option<u64>,
        density_resolution: usize,
        min_fill_percent: f64,
        render_iterations: usize,
        check_ratio: f64,
        shard_count: usize,
        width: usize,
        height: usize,
        alpha: f64,
        margin: f64,
        transient_skip: usize,
        one_pass_threshold: usize,
        render_mode: &str,
        background: [f64; 3],
        burn_factors: [f64; 3],
    ) -> PyResult<Self> {
        let config = AttractorConfig {
            search_iterations,
            search_max_attempts,
            search_timeout_ms,
            density_resolution,
            min_fill_percent,
            render_iterations,
            check_ratio,
            shard_count,
            width,
            height,
            alpha,
            margin,
            transient_skip,
            one_pass_threshold,
            render_mode: parse_mode(render_mode)?,
            background,
            burn_factors,
            ..AttractorConfig::default()
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = AttractorConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    #[getter]
    fn width(&self) -> usize {
        self.inner.width
    }

    #[getter]
    fn height(&self) -> usize {
        self.inner.height
    }

    #[getter]
    fn render_iterations(&self) -> usize {
        self.inner.render_iterations
    }

    #[getter]
    fn shard_count(&self) -> usize {
        self.inner.shard_count
    }

    #[getter]
    fn background(&self) -> [f64; 3] {
        self.inner.background
    }

    #[getter]
    fn burn_factors(&self) -> [f64; 3] {
        self.inner.burn_factors
    }

    #[getter]
    fn render_mode(&self) -> &'static str {
        mode_name(self.inner.render_mode)
    }

    fn __repr__(&self) -> String {
        format!(
            "AttractorConfig({}x{}, render_iterations={}, shard_count={}, render_mode={})",
            self.inner.width,
            self.inner.height,
            self.inner.render_iterations,
            self.inner.shard_count,
            mode_name(self.inner.render_mode)
        )
    }
}

// ─── PyTrajectory ───────────────────────────────────────────────────

/// Dense `len × (dimension + 1)` trajectory, kept on the Rust side.
#[pyclass(name = "Trajectory")]
struct PyTrajectory {
    inner: Trajectory,
}

#[pymethods]
impl PyTrajectory {
    #[getter]
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    #[getter]
    fn width(&self) -> usize {
        self.inner.width()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// State at `index`, or the last state when omitted.
    #[pyo3(signature = (index = None))]
    fn row(&self, index: Option<usize>) -> PyResult<Vec<f64>> {
        let len = self.inner.len();
        let i = index.unwrap_or(len.saturating_sub(1));
        if i >= len {
            return Err(PyValueError::new_err(format!(
                "row {i} out of range for {len} states"
            )));
        }
        Ok(self.inner.row(i).to_vec())
    }

    /// One component across all states, after skipping `skip` rows.
    #[pyo3(signature = (component, skip = 0))]
    fn column(&self, component: usize, skip: usize) -> PyResult<Vec<f64>> {
        if component >= self.inner.width() {
            return Err(PyValueError::new_err(format!(
                "component {component} out of range for width {}",
                self.inner.width()
            )));
        }
        Ok(self.inner.column(component, skip))
    }

    fn terminal_is_finite(&self) -> bool {
        self.inner.terminal_is_finite()
    }

    /// Serialise to the little-endian array format.
    fn to_bytes<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let mut buf = Vec::new();
        self.inner.write_to(&mut buf).map_err(to_py_err)?;
        Ok(PyBytes::new(py, &buf))
    }

    #[staticmethod]
    fn from_bytes(data: &[u8]) -> PyResult<Self> {
        let inner = Trajectory::read_from(data).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "Trajectory(len={}, dimension={})",
            self.inner.len(),
            self.inner.dimension()
        )
    }
}

// ─── PyRaster ───────────────────────────────────────────────────────

/// Rendered `height × width × 3` image with channels in [0, 1].
#[pyclass(name = "Raster")]
struct PyRaster {
    inner: Raster,
}

#[pymethods]
impl PyRaster {
    #[getter]
    fn shape(&self) -> (usize, usize, usize) {
        self.inner.shape()
    }

    /// Row-major flat channel values.
    fn to_list(&self) -> Vec<f64> {
        self.inner.as_slice().to_vec()
    }

    /// Row-major 8-bit RGB, ready for an image writer.
    fn to_rgb8<'py>(&self, py: Python<'py>) -> Bound<'py, PyBytes> {
        PyBytes::new(py, &self.inner.to_rgb8())
    }

    fn pixel(&self, row: usize, col: usize) -> PyResult<Vec<f64>> {
        if row >= self.inner.height() || col >= self.inner.width() {
            return Err(PyValueError::new_err(format!(
                "pixel ({row}, {col}) out of range for {}x{}",
                self.inner.width(),
                self.inner.height()
            )));
        }
        Ok(self.inner.pixel(row, col).to_vec())
    }

    fn __repr__(&self) -> String {
        format!(
            "Raster({}x{})",
            self.inner.width(),
            self.inner.height()
        )
    }
}

// ─── Pipeline Functions ─────────────────────────────────────────────

/// Search for a coefficient table producing a dense attractor.
///
/// Returns a dict with `seed`, `coefficients`, `initial_state` and
/// rejection statistics.
#[pyfunction]
#[pyo3(signature = (dimension, seed = None, config = None))]
fn search_attractor<'py>(
    py: Python<'py>,
    dimension: usize,
    seed: Option<u64>,
    config: Option<PyAttractorConfig>,
) -> PyResult<Bound<'py, PyDict>> {
    let config = resolve(config);
    let found = py
        .allow_threads(|| AttractorSearch::from_config(&config, dimension)?.discover(seed))
        .map_err(to_py_err)?;
    discovery_dict(py, &found)
}

/// Iterate a coefficient table for the full render length.
#[pyfunction]
#[pyo3(signature = (coefficients, dimension, render_iterations = None, seed = None, config = None))]
fn compute_attractor(
    py: Python<'_>,
    coefficients: Vec<f64>,
    dimension: usize,
    render_iterations: Option<usize>,
    seed: Option<u64>,
    config: Option<PyAttractorConfig>,
) -> PyResult<PyTrajectory> {
    let config = resolve(config);
    let n = render_iterations.unwrap_or(config.render_iterations);
    let inner = py
        .allow_threads(|| {
            let pool = RayonPool::new(config.shard_count)?;
            let mut compute = TrajectoryCompute::from_config(&pool, &config);
            if let Some(seed) = seed {
                compute = compute.with_seed(seed);
            }
            compute.compute(&coefficients, n, dimension)
        })
        .map_err(to_py_err)?;
    Ok(PyTrajectory { inner })
}

/// Render a trajectory to a shaded raster.
#[pyfunction]
#[pyo3(signature = (trajectory, config = None))]
fn render_attractor(
    py: Python<'_>,
    trajectory: PyRef<'_, PyTrajectory>,
    config: Option<PyAttractorConfig>,
) -> PyResult<PyRaster> {
    let config = resolve(config);
    let traj = &trajectory.inner;
    let inner = py
        .allow_threads(|| {
            let pool = RayonPool::new(config.shard_count)?;
            RenderPipeline::new(RenderSettings::from_config(&config), &pool)?.render(traj)
        })
        .map_err(to_py_err)?;
    Ok(PyRaster { inner })
}

/// search → compute → render in one call.
///
/// Returns the `search_attractor` dict plus `image` (a `Raster`).
#[pyfunction]
#[pyo3(signature = (dimension = None, seed = None, config = None))]
fn generate_attractor<'py>(
    py: Python<'py>,
    dimension: Option<usize>,
    seed: Option<u64>,
    config: Option<PyAttractorConfig>,
) -> PyResult<Bound<'py, PyDict>> {
    let config = resolve(config);
    let generated = py
        .allow_threads(|| AttractorGenerator::new(config)?.generate(dimension, seed))
        .map_err(to_py_err)?;
    let dict = discovery_dict(py, &generated.discovery)?;
    dict.set_item("total_ms", generated.elapsed_ms)?;
    dict.set_item(
        "image",
        Py::new(
            py,
            PyRaster {
                inner: generated.image,
            },
        )?,
    )?;
    Ok(dict)
}

// ─── Module Registration ────────────────────────────────────────────

/// Attractor Kernel: strange-attractor discovery and rendering.
///
/// - `AttractorConfig`: configuration
/// - `Trajectory`: computed trajectory
/// - `Raster`: rendered image
/// - `search_attractor`, `compute_attractor`, `render_attractor`,
///   `generate_attractor`: pipeline stages
#[pymodule]
fn attractor_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<PyAttractorConfig>()?;
    m.add_class::<PyTrajectory>()?;
    m.add_class::<PyRaster>()?;
    // Pipeline
    m.add_function(wrap_pyfunction!(search_attractor, m)?)?;
    m.add_function(wrap_pyfunction!(compute_attractor, m)?)?;
    m.add_function(wrap_pyfunction!(render_attractor, m)?)?;
    m.add_function(wrap_pyfunction!(generate_attractor, m)?)?;
    Ok(())
}
