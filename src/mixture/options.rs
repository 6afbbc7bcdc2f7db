//! Mixture options — EM configuration for [`GaussianMixture`](super::GaussianMixture).
//!
//! Options are plain data validated once at construction. The defaults match
//! the classic OpenCV EM setup used for hypertime models: full covariance,
//! at most 100 EM iterations, and a small ridge on every covariance diagonal
//! so that constant feature columns (the state column of a single class)
//! stay positive definite.
use crate::mixture::errors::{MixtureError, MixtureResult};
use serde::{Deserialize, Serialize};

/// Default cap on EM iterations.
pub const DEFAULT_MAX_ITER: usize = 100;

/// Default relative tolerance on the mean log-likelihood between EM steps.
pub const DEFAULT_TOL: f64 = 1e-6;

/// Default ridge added to every covariance diagonal.
pub const DEFAULT_REG_COVAR: f64 = 1e-6;

/// Covariance structure of each mixture component.
///
/// - `Full`: generic symmetric covariance, captures cross-feature correlation
///   between harmonic dimensions.
/// - `Diagonal`: independent features; off-diagonal terms are dropped after
///   every M-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceKind {
    Full,
    Diagonal,
}

/// EM configuration.
///
/// Fields:
/// - `covariance` — component covariance structure.
/// - `max_iter` — hard cap on EM iterations (`> 0`).
/// - `tol` — stop when `|ℓ̄ₖ − ℓ̄ₖ₋₁| ≤ tol · max(1, |ℓ̄ₖ|)` (finite, `> 0`).
/// - `reg_covar` — ridge added to covariance diagonals (finite, `> 0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixtureOptions {
    pub covariance: CovarianceKind,
    pub max_iter: usize,
    pub tol: f64,
    pub reg_covar: f64,
}

impl MixtureOptions {
    /// Construct validated options.
    ///
    /// # Errors
    /// - [`MixtureError::InvalidOption`] if `max_iter == 0` or if `tol` /
    ///   `reg_covar` are non-finite or non-positive.
    pub fn new(
        covariance: CovarianceKind, max_iter: usize, tol: f64, reg_covar: f64,
    ) -> MixtureResult<Self> {
        if max_iter == 0 {
            return Err(MixtureError::InvalidOption {
                name: "max_iter",
                value: 0.0,
                reason: "EM needs at least one iteration.",
            });
        }
        verify_positive("tol", tol)?;
        verify_positive("reg_covar", reg_covar)?;
        Ok(Self { covariance, max_iter, tol, reg_covar })
    }

    /// Default options with a different covariance structure.
    pub fn with_covariance(covariance: CovarianceKind) -> Self {
        Self { covariance, ..Self::default() }
    }
}

impl Default for MixtureOptions {
    fn default() -> Self {
        Self {
            covariance: CovarianceKind::Full,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
            reg_covar: DEFAULT_REG_COVAR,
        }
    }
}

fn verify_positive(name: &'static str, value: f64) -> MixtureResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MixtureError::InvalidOption {
            name,
            value,
            reason: "Value must be finite and strictly positive.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Confirm that invalid EM settings are rejected at construction.
    //
    // Given
    // -----
    // - max_iter = 0, tol = NaN, reg_covar = -1.
    //
    // Expect
    // ------
    // - Each variant returns `MixtureError::InvalidOption` naming the field.
    fn mixture_options_new_rejects_invalid_values() {
        // Act
        let zero_iter = MixtureOptions::new(CovarianceKind::Full, 0, 1e-6, 1e-6);
        let nan_tol = MixtureOptions::new(CovarianceKind::Full, 10, f64::NAN, 1e-6);
        let neg_reg = MixtureOptions::new(CovarianceKind::Diagonal, 10, 1e-6, -1.0);

        // Assert
        assert!(matches!(zero_iter, Err(MixtureError::InvalidOption { name: "max_iter", .. })));
        assert!(matches!(nan_tol, Err(MixtureError::InvalidOption { name: "tol", .. })));
        assert!(matches!(neg_reg, Err(MixtureError::InvalidOption { name: "reg_covar", .. })));
    }

    #[test]
    // Purpose
    // -------
    // Check the documented defaults and the covariance override helper.
    fn mixture_options_defaults_are_documented_values() {
        let opts = MixtureOptions::default();
        assert_eq!(opts.covariance, CovarianceKind::Full);
        assert_eq!(opts.max_iter, DEFAULT_MAX_ITER);
        assert_eq!(opts.tol, DEFAULT_TOL);
        assert_eq!(opts.reg_covar, DEFAULT_REG_COVAR);

        let diag = MixtureOptions::with_covariance(CovarianceKind::Diagonal);
        assert_eq!(diag.covariance, CovarianceKind::Diagonal);
        assert_eq!(diag.max_iter, DEFAULT_MAX_ITER);
    }
}
