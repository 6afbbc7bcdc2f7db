//! models — temporal model strategies.
//!
//! Purpose
//! -------
//! House every concrete implementation of
//! [`TemporalModel`](crate::temporal::TemporalModel):
//!
//! - [`hypertime`]: periodicity-augmented Gaussian mixtures with greedy,
//!   residual-driven period selection (the main estimator).
//! - [`mises`]: Gaussian mixtures over fixed daily and weekly harmonics.
//! - [`fremen`]: mean plus strongest spectral components.
//! - [`baseline`]: constant, running-mean and periodic-histogram baselines.
//! - [`delegated`]: pass-through to a caller-supplied external backend.
//!
//! Conventions
//! -----------
//! - Strategies are constructed from a validated
//!   [`TemporalConfig`](crate::temporal::TemporalConfig) and are normally
//!   obtained through [`ModelFactory`](crate::temporal::ModelFactory).
//! - Every strategy clamps its public estimate to `[0, 1]`.
pub mod baseline;
pub mod delegated;
pub mod fremen;
pub mod hypertime;
pub mod mises;

pub use self::baseline::{HistogramModel, MeanModel, NoneModel};
pub use self::delegated::{DelegatedModel, ExternalModel};
pub use self::fremen::FremenModel;
pub use self::hypertime::{HypertimeEstimator, HypertimeOptions, StopReason, UpdateReport};
pub use self::mises::MisesModel;
