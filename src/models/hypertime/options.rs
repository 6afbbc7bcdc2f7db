//! Hypertime options — expansion budget and mixture configuration.
use crate::mixture::MixtureOptions;
use crate::temporal::errors::{TemporalError, TemporalResult};
use serde::{Deserialize, Serialize};

/// Default cap on harmonic feature columns (five periods).
pub const DEFAULT_MAX_TIME_DIMENSION: usize = 10;

/// Configuration of the periodicity-expansion loop.
///
/// Fields:
/// - `max_time_dimension` — expansion stops once `2 · #periods` reaches this
///   value (`> 0`).
/// - `mixture` — EM options for both class mixtures. The default uses full
///   covariance so that cross-harmonic correlation is captured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HypertimeOptions {
    pub max_time_dimension: usize,
    pub mixture: MixtureOptions,
}

impl HypertimeOptions {
    /// # Errors
    /// - [`TemporalError::InvalidConfig`] if `max_time_dimension == 0`.
    pub fn new(max_time_dimension: usize, mixture: MixtureOptions) -> TemporalResult<Self> {
        if max_time_dimension == 0 {
            return Err(TemporalError::InvalidConfig {
                name: "max_time_dimension",
                value: 0.0,
                reason: "At least one harmonic pair must be allowed.",
            });
        }
        Ok(Self { max_time_dimension, mixture })
    }
}

impl Default for HypertimeOptions {
    fn default() -> Self {
        Self { max_time_dimension: DEFAULT_MAX_TIME_DIMENSION, mixture: MixtureOptions::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixture::CovarianceKind;

    #[test]
    fn defaults_and_validation() {
        let opts = HypertimeOptions::default();
        assert_eq!(opts.max_time_dimension, 10);
        assert_eq!(opts.mixture.covariance, CovarianceKind::Full);
        assert!(matches!(
            HypertimeOptions::new(0, MixtureOptions::default()),
            Err(TemporalError::InvalidConfig { name: "max_time_dimension", .. })
        ));
    }
}
