//! spectral — dominant-period extraction for residual signals.
//!
//! [`FrequencyDetector`] accumulates a signal incrementally over a fixed grid
//! of candidate periods and ranks them by amplitude. It is used by the
//! hypertime expansion loop (next harmonic feature) and by the FreMEn
//! strategy (retained components).
pub mod detector;

pub use self::detector::{FrequencyDetector, SpectralComponent};
