//! hypertime — periodicity-augmented mixture models for long-horizon state
//! prediction, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the temporal models to Python via the `_hypertime` extension module. When
//! the `python-bindings` feature is enabled, this module defines the
//! Python-facing classes and submodules used by the `hypertime` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`temporal`, `models`, `mixture`,
//!   `spectral`, `io`) as the public crate surface.
//! - Define the `TemporalPredictor` `#[pyclass]` and the `#[pymodule]`
//!   initializer for the `_hypertime` Python extension.
//! - Register the `temporal` submodule under `hypertime` so that
//!   dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner Rust modules; this file performs
//!   only FFI glue, input validation, and error mapping.
//! - A `TemporalPredictor` is bound to the interpreter thread that created
//!   it (`unsendable`); training and querying never overlap.
//!
//! Conventions
//! -----------
//! - Timestamps cross the boundary as `int64` seconds and states as
//!   `float64`; values above `0.5` count as positive observations.
//! - Errors from core Rust code are carried as [`TemporalError`] internally
//!   and converted to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should build models through
//!   [`temporal::ModelFactory`] and drive them through
//!   [`temporal::TemporalModel`].
//! - The `hypertime` binary (`src/bin/hypertime.rs`) wraps the same API for
//!   file-based training and batch prediction.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   the scenario tests under `tests/`.
//!
//! [`TemporalError`]: crate::temporal::TemporalError

pub mod io;
pub mod mixture;
pub mod models;
pub mod spectral;
pub mod temporal;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use std::path::PathBuf;

#[cfg(feature = "python-bindings")]
use crate::{
    temporal::{ModelFactory, Temporal, TemporalKind, TemporalModel},
    utils::{build_config, extract_array1},
};

/// TemporalPredictor — Python-facing wrapper around any temporal strategy.
///
/// Purpose
/// -------
/// Expose the [`TemporalModel`] contract to Python callers while keeping the
/// strategy selection and validation on the Rust side.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `TemporalPredictor(kind="HyT-EM", max_period=None, element_budget=None,
/// class_count=None, sample_capacity=None)`:
/// - `kind`: `str`
///   Strategy name (`"None"`, `"Mean"`, `"Hist"`, `"FreMEn"`, `"HyT-EM"`,
///   `"VonMises"`, ...). Unknown or unimplemented names yield the no-op
///   strategy.
/// - `max_period`: `Option<u32>`
///   Longest period considered, in seconds; defaults to one week.
/// - `element_budget`: `Option<usize>`
///   Number of candidate periods / retained elements; defaults to `10`.
/// - `class_count`: `Option<usize>`
///   Number of state classes; defaults to `1`.
/// - `sample_capacity`: `Option<usize>`
///   Maximum number of stored observations.
///
/// Errors
/// ------
/// - `ValueError` for invalid configuration values, mismatched input lengths,
///   full sample storage, failed training, or failed persistence.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "hypertime.temporal", unsendable)]
pub struct TemporalPredictor {
    inner: Temporal,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TemporalPredictor {
    #[new]
    #[pyo3(
        text_signature = "(kind='HyT-EM', /, max_period=None, element_budget=None, class_count=None, sample_capacity=None)",
        signature = (kind = "HyT-EM", max_period = None, element_budget = None, class_count = None, sample_capacity = None)
    )]
    pub fn new(
        kind: &str, max_period: Option<u32>, element_budget: Option<usize>,
        class_count: Option<usize>, sample_capacity: Option<usize>,
    ) -> PyResult<TemporalPredictor> {
        let config = build_config(max_period, element_budget, class_count, sample_capacity)?;
        Ok(TemporalPredictor { inner: ModelFactory::new().create_by_name(kind, config) })
    }

    /// Record one observation.
    pub fn add(&mut self, timestamp: i64, state: f64) -> PyResult<()> {
        Ok(self.inner.add(timestamp, state)?)
    }

    /// Record paired arrays of timestamps and states.
    pub fn add_many<'py>(
        &mut self, py: Python<'py>, timestamps: &Bound<'py, PyAny>, states: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let timestamps: PyReadonlyArray1<i64> = extract_array1(py, timestamps, "timestamps")?;
        let states: PyReadonlyArray1<f64> = extract_array1(py, states, "states")?;
        let (timestamps, states) = (timestamps.as_slice()?, states.as_slice()?);
        if timestamps.len() != states.len() {
            return Err(PyValueError::new_err(format!(
                "timestamps and states differ in length ({} vs {})",
                timestamps.len(),
                states.len()
            )));
        }
        for (&t, &s) in timestamps.iter().zip(states) {
            self.inner.add(t, s)?;
        }
        Ok(())
    }

    /// Retrain from every stored observation.
    pub fn update(&mut self, order: usize) -> PyResult<()> {
        Ok(self.inner.update(order)?)
    }

    /// Probability in `[0, 1]` that the state holds at `timestamp`.
    pub fn predict(&self, timestamp: i64) -> f64 {
        self.inner.predict(timestamp)
    }

    pub fn predict_many<'py>(
        &self, py: Python<'py>, timestamps: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let timestamps: PyReadonlyArray1<i64> = extract_array1(py, timestamps, "timestamps")?;
        let out: Vec<f64> = timestamps.as_slice()?.iter().map(|&t| self.inner.predict(t)).collect();
        Ok(out.into_pyarray(py))
    }

    pub fn save(&self, path: PathBuf) -> PyResult<()> {
        Ok(self.inner.save(&path)?)
    }

    pub fn load(&mut self, path: PathBuf) -> PyResult<()> {
        Ok(self.inner.load(&path)?)
    }

    /// Export the trained state into a list of at most `capacity` floats.
    pub fn export_to_array(&self, capacity: usize) -> PyResult<Vec<f64>> {
        let mut buffer = vec![0.0; capacity];
        let used = self.inner.export_to_array(&mut buffer)?;
        buffer.truncate(used);
        Ok(buffer)
    }

    pub fn import_from_array<'py>(
        &mut self, py: Python<'py>, buffer: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let buffer: PyReadonlyArray1<f64> = extract_array1(py, buffer, "buffer")?;
        Ok(self.inner.import_from_array(buffer.as_slice()?)?)
    }

    #[pyo3(signature = (verbose = false))]
    pub fn summary(&self, verbose: bool) -> String {
        self.inner.summary(verbose)
    }

    /// Canonical name of the strategy actually in use.
    #[getter]
    pub fn kind(&self) -> &'static str {
        self.inner.kind().name()
    }

    #[getter]
    pub fn is_trained(&self) -> bool {
        self.inner.is_trained()
    }

    /// Periods selected by the last hypertime update; `None` for other
    /// strategies.
    #[getter]
    pub fn active_periods(&self) -> Option<Vec<u32>> {
        self.inner.as_hypertime().map(|m| m.active_periods().to_vec())
    }

    /// Per-round RMS errors of the last hypertime update.
    #[getter]
    pub fn error_history(&self) -> Option<Vec<f64>> {
        self.inner.as_hypertime().map(|m| m.error_history().to_vec())
    }
}

/// Names of every strategy kind, in id order.
#[cfg(feature = "python-bindings")]
#[pyfunction]
fn model_kinds() -> Vec<&'static str> {
    TemporalKind::ALL.iter().map(|k| k.name()).collect()
}

/// _hypertime — PyO3 module initializer for the Python extension.
///
/// Creates the `temporal` submodule, attaches it to `_hypertime`, and
/// registers it in `sys.modules` as `hypertime.temporal` so it is importable
/// via dotted paths.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _hypertime<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let temporal_mod = PyModule::new(_py, "temporal")?;
    temporal(_py, m, &temporal_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("hypertime.temporal", temporal_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn temporal<'py>(
    _py: Python, hypertime: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<TemporalPredictor>()?;
    m.add_function(wrap_pyfunction!(model_kinds, m)?)?;
    hypertime.add_submodule(m)?;
    Ok(())
}
