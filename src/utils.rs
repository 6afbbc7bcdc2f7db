//! Python-boundary helpers: array extraction and configuration building.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::{Element, IntoPyArray, PyArrayMethods, PyReadonlyArray1};

#[cfg(feature = "python-bindings")]
use crate::temporal::{TemporalConfig, TemporalResult};

/// Borrow a contiguous 1-D array of `T` from a numpy array, a pandas Series
/// (via `to_numpy`), or copy it from any Python sequence.
#[cfg(feature = "python-bindings")]
pub fn extract_array1<'py, T>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, what: &str,
) -> PyResult<PyReadonlyArray1<'py, T>>
where
    T: Element + for<'a> FromPyObject<'a>,
{
    if let Ok(array) = raw_data.extract::<PyReadonlyArray1<T>>() {
        if array.as_slice().is_ok() {
            return Ok(array);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series) = obj.extract::<PyReadonlyArray1<T>>() {
            if series.as_slice().is_ok() {
                return Ok(series);
            }
        }
    }

    let values: Vec<T> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(format!(
            "{what}: expected a 1-D numpy.ndarray, pandas.Series, or sequence"
        ))
    })?;
    Ok(values.into_pyarray(py).readonly())
}

/// Build a validated configuration, filling unset fields with defaults.
#[cfg(feature = "python-bindings")]
pub fn build_config(
    max_period: Option<u32>, element_budget: Option<usize>, class_count: Option<usize>,
    sample_capacity: Option<usize>,
) -> TemporalResult<TemporalConfig> {
    let defaults = TemporalConfig::default();
    let config = TemporalConfig::new(
        max_period.unwrap_or(defaults.max_period),
        element_budget.unwrap_or(defaults.element_budget),
        class_count.unwrap_or(defaults.class_count),
    )?;
    match sample_capacity {
        Some(capacity) => config.with_sample_capacity(capacity),
        None => Ok(config),
    }
}
