//! Errors for temporal models (configuration, training, persistence, array
//! interchange, and text input).
//!
//! [`TemporalError`] is the single error surface of every strategy behind the
//! [`TemporalModel`](super::TemporalModel) contract. Algorithmic stop
//! conditions inside `update` (error regression, dimension budget) are not
//! errors; they are reported through the update report of the estimator.
//!
//! ## Conventions
//! - Line numbers in [`TemporalError::MalformedInput`] are 1-based, matching
//!   what editors show.
//! - I/O failures are flattened to strings so the enum stays `Clone` and
//!   `PartialEq` like the rest of the crate's errors.
//! - Mixture failures are wrapped, not re-mapped, so the original cause is
//!   preserved in `Display`.
use crate::mixture::MixtureError;
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for temporal-model operations that may produce
/// [`TemporalError`].
pub type TemporalResult<T> = Result<T, TemporalError>;

/// Unified error type for temporal state models.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalError {
    // ---- Configuration ----
    /// A configuration value is out of range.
    InvalidConfig { name: &'static str, value: f64, reason: &'static str },

    /// Mixture order passed to `update` is zero.
    InvalidOrder { order: usize },

    /// Name does not appear in the model kind table.
    UnknownKind { name: String },

    // ---- Training ----
    /// A class has no more samples than mixture components.
    InsufficientSamples { positives: usize, negatives: usize, order: usize },

    /// Sample storage or an output buffer is full.
    CapacityExceeded { needed: usize, capacity: usize },

    /// Density estimation failed.
    Mixture(MixtureError),

    // ---- Persistence ----
    /// A persisted artifact is missing or unreadable.
    PersistenceUnavailable { path: String, reason: String },

    /// A persisted artifact could not be written.
    PersistenceFailed { path: String, reason: String },

    /// Persisted artifacts disagree with each other or with the model.
    InconsistentState { reason: String },

    // ---- Array interchange ----
    /// Header value (kind discriminant or format version) does not match.
    FormatMismatch { field: &'static str, expected: f64, found: f64 },

    /// Buffer ends before the declared fields do.
    TruncatedArray { needed: usize, len: usize },

    // ---- Text input ----
    /// A line of a training or query file could not be parsed.
    MalformedInput { line: usize, content: String },

    // ---- Strategy support ----
    /// The strategy does not implement the requested operation.
    Unsupported { kind: &'static str, operation: &'static str },
}

impl std::error::Error for TemporalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemporalError::Mixture(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for TemporalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            TemporalError::InvalidConfig { name, value, reason } => {
                write!(f, "Invalid configuration {name} = {value}: {reason}")
            }
            TemporalError::InvalidOrder { order } => {
                write!(f, "Model order must be at least 1; got: {order}")
            }
            TemporalError::UnknownKind { name } => {
                write!(f, "Unknown temporal model kind: {name:?}")
            }
            // ---- Training ----
            TemporalError::InsufficientSamples { positives, negatives, order } => {
                write!(
                    f,
                    "Not enough samples for order {order}: {positives} positives, \
                     {negatives} negatives (each class needs more than {order})."
                )
            }
            TemporalError::CapacityExceeded { needed, capacity } => {
                write!(f, "Capacity exceeded: need {needed}, capacity is {capacity}.")
            }
            TemporalError::Mixture(err) => write!(f, "Density estimation failed: {err}"),
            // ---- Persistence ----
            TemporalError::PersistenceUnavailable { path, reason } => {
                write!(f, "Cannot read persisted model {path}: {reason}")
            }
            TemporalError::PersistenceFailed { path, reason } => {
                write!(f, "Cannot write persisted model {path}: {reason}")
            }
            TemporalError::InconsistentState { reason } => {
                write!(f, "Inconsistent persisted state: {reason}")
            }
            // ---- Array interchange ----
            TemporalError::FormatMismatch { field, expected, found } => {
                write!(f, "Array {field} mismatch: expected {expected}, found {found}")
            }
            TemporalError::TruncatedArray { needed, len } => {
                write!(f, "Array truncated: need {needed} elements, buffer has {len}")
            }
            // ---- Text input ----
            TemporalError::MalformedInput { line, content } => {
                write!(f, "Malformed input on line {line}: {content:?}")
            }
            // ---- Strategy support ----
            TemporalError::Unsupported { kind, operation } => {
                write!(f, "{kind} models do not support {operation}.")
            }
        }
    }
}

impl From<MixtureError> for TemporalError {
    fn from(err: MixtureError) -> Self {
        TemporalError::Mixture(err)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<TemporalError> for PyErr {
    fn from(err: TemporalError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
