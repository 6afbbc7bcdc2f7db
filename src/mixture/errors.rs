//! Errors for Gaussian mixture fitting and scoring.
//!
//! [`MixtureError`] covers option validation, training-data validation, EM
//! numerical failures and inconsistent persisted records. Persisted records
//! are rebuilt through `TryFrom`, so a corrupt record surfaces here rather
//! than as a panic during scoring.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for mixture operations that may produce [`MixtureError`].
pub type MixtureResult<T> = Result<T, MixtureError>;

/// Unified error type for the Gaussian mixture density estimator.
#[derive(Debug, Clone, PartialEq)]
pub enum MixtureError {
    // ---- Options ----
    /// Mixture order must be at least one component.
    InvalidOrder { order: usize },

    /// A numeric option is out of range.
    InvalidOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Training data ----
    /// Training matrix has no columns.
    EmptyFeatureSpace,

    /// Fewer rows than mixture components.
    TooFewRows { rows: usize, order: usize },

    /// A training value is NaN/±inf.
    NonFiniteData { row: usize, col: usize, value: f64 },

    // ---- Numerics ----
    /// A component covariance could not be Cholesky-factorized.
    SingularCovariance { component: usize },

    // ---- Scoring ----
    /// Mixture has not been fitted.
    NotFitted,

    /// Query vector length differs from the fitted dimension.
    DimensionMismatch { expected: usize, actual: usize },

    // ---- Persisted records ----
    /// Stored component arrays disagree with each other or with the order.
    InconsistentRecord { reason: String },
}

impl std::error::Error for MixtureError {}

impl std::fmt::Display for MixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Options ----
            MixtureError::InvalidOrder { order } => {
                write!(f, "Mixture order must be at least 1; got: {order}")
            }
            MixtureError::InvalidOption { name, value, reason } => {
                write!(f, "Invalid mixture option {name} = {value}: {reason}")
            }
            // ---- Training data ----
            MixtureError::EmptyFeatureSpace => {
                write!(f, "Training matrix has no feature columns.")
            }
            MixtureError::TooFewRows { rows, order } => {
                write!(f, "Cannot fit {order} components to {rows} rows.")
            }
            MixtureError::NonFiniteData { row, col, value } => {
                write!(f, "Training value at ({row}, {col}) is non-finite: {value}")
            }
            // ---- Numerics ----
            MixtureError::SingularCovariance { component } => {
                write!(f, "Covariance of component {component} is not positive definite.")
            }
            // ---- Scoring ----
            MixtureError::NotFitted => write!(f, "Mixture hasn't been fitted yet."),
            MixtureError::DimensionMismatch { expected, actual } => {
                write!(f, "Feature vector length mismatch: expected {expected}, got {actual}")
            }
            // ---- Persisted records ----
            MixtureError::InconsistentRecord { reason } => {
                write!(f, "Inconsistent mixture record: {reason}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<MixtureError> for PyErr {
    fn from(err: MixtureError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
