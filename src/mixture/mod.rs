//! mixture — Gaussian mixture density estimation.
//!
//! Purpose
//! -------
//! Provide the class-conditional density estimator used by the temporal
//! models: EM-fitted Gaussian mixtures with validated options, typed errors
//! and serde persistence.
//!
//! Key behaviors
//! -------------
//! - [`GaussianMixture`] fits `order` components to an `n × d` matrix and
//!   scores `ln p(x)` for single feature vectors.
//! - [`MixtureOptions`] / [`CovarianceKind`] configure EM (full vs diagonal
//!   covariance, iteration cap, tolerance, ridge).
//! - [`MixtureError`] / [`MixtureResult`] form the error surface of this
//!   layer; temporal models wrap it in their own error type.
//!
//! Conventions
//! -----------
//! - The mixture layer performs no I/O. Persistence goes through serde and
//!   is orchestrated by the model that owns the mixture.
pub mod errors;
pub mod gmm;
pub mod options;

pub use self::errors::{MixtureError, MixtureResult};
pub use self::gmm::{FitSummary, GaussianMixture};
pub use self::options::{CovarianceKind, MixtureOptions};

pub mod prelude {
    pub use super::errors::{MixtureError, MixtureResult};
    pub use super::gmm::{FitSummary, GaussianMixture};
    pub use super::options::{CovarianceKind, MixtureOptions};
}
