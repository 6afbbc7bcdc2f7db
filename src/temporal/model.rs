//! temporal::model — the temporal state model contract and its closed set of
//! strategies.
//!
//! Purpose
//! -------
//! Define the one interface every estimator strategy implements
//! ([`TemporalModel`]) and the tagged union ([`Temporal`]) the factory
//! returns, so callers can train, query and persist any strategy the same
//! way.
//!
//! Key behaviors
//! -------------
//! - `add` appends an observation and fails only when sample storage is full.
//! - `update(order)` retrains from all stored observations and supersedes any
//!   previous trained state.
//! - `estimate` / `predict` never fail and always return a value in
//!   `[0, 1]`; untrained strategies return a documented prior.
//! - `save` / `load` round-trip the full trained state through files;
//!   `export_to_array` / `import_from_array` do the same through a flat
//!   `f64` buffer (see [`interchange`](super::interchange)).
//!
//! Invariants & assumptions
//! ------------------------
//! - The configuration is fixed at construction.
//! - Queries take `&self` and training takes `&mut self`, so a model cannot
//!   be queried while an update is in flight.
//!
//! Conventions
//! -----------
//! - Timestamps are integer seconds (`i64`); states are `f64` with values
//!   above `0.5` counting as positive.
use crate::models::{
    baseline::{HistogramModel, MeanModel, NoneModel},
    delegated::DelegatedModel,
    fremen::FremenModel,
    hypertime::HypertimeEstimator,
    mises::MisesModel,
};
use crate::temporal::{config::TemporalConfig, errors::TemporalResult, kind::TemporalKind};
use std::path::Path;

/// Capability set shared by every temporal strategy.
pub trait TemporalModel {
    fn kind(&self) -> TemporalKind;

    fn config(&self) -> &TemporalConfig;

    /// `true` once an `update` has succeeded (or trained state was loaded).
    fn is_trained(&self) -> bool;

    /// Record that `state` was observed at `timestamp`.
    ///
    /// # Errors
    /// - [`CapacityExceeded`](crate::temporal::TemporalError::CapacityExceeded)
    ///   when sample storage is full.
    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()>;

    /// Retrain from every stored observation.
    ///
    /// `order` is strategy specific: mixture components for the mixture
    /// models, retained spectral components for FreMEn, ignored by the
    /// baselines.
    fn update(&mut self, order: usize) -> TemporalResult<()>;

    /// Probability that the state holds at `timestamp`, in `[0, 1]`.
    fn estimate(&self, timestamp: i64) -> f64;

    fn predict(&self, timestamp: i64) -> f64 {
        self.estimate(timestamp)
    }

    /// Human-readable diagnostics.
    fn summary(&self, verbose: bool) -> String;

    fn print(&self, verbose: bool) {
        println!("{}", self.summary(verbose));
    }

    fn save(&self, path: &Path) -> TemporalResult<()>;

    fn load(&mut self, path: &Path) -> TemporalResult<()>;

    /// Write the trained state into `buffer`; returns the number of elements
    /// used.
    fn export_to_array(&self, buffer: &mut [f64]) -> TemporalResult<usize>;

    fn import_from_array(&mut self, buffer: &[f64]) -> TemporalResult<()>;
}

/// Every strategy the factory can produce.
#[derive(Debug)]
pub enum Temporal {
    None(NoneModel),
    Mean(MeanModel),
    Histogram(HistogramModel),
    FreMEn(FremenModel),
    HyperTime(HypertimeEstimator),
    VonMises(MisesModel),
    Delegated(DelegatedModel),
}

macro_rules! dispatch {
    ($self:expr, $model:ident => $body:expr) => {
        match $self {
            Temporal::None($model) => $body,
            Temporal::Mean($model) => $body,
            Temporal::Histogram($model) => $body,
            Temporal::FreMEn($model) => $body,
            Temporal::HyperTime($model) => $body,
            Temporal::VonMises($model) => $body,
            Temporal::Delegated($model) => $body,
        }
    };
}

impl Temporal {
    /// The hypertime estimator, if this is one.
    pub fn as_hypertime(&self) -> Option<&HypertimeEstimator> {
        match self {
            Temporal::HyperTime(model) => Some(model),
            _ => None,
        }
    }
}

impl TemporalModel for Temporal {
    fn kind(&self) -> TemporalKind {
        dispatch!(self, m => m.kind())
    }

    fn config(&self) -> &TemporalConfig {
        dispatch!(self, m => m.config())
    }

    fn is_trained(&self) -> bool {
        dispatch!(self, m => m.is_trained())
    }

    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()> {
        dispatch!(self, m => m.add(timestamp, state))
    }

    fn update(&mut self, order: usize) -> TemporalResult<()> {
        dispatch!(self, m => m.update(order))
    }

    fn estimate(&self, timestamp: i64) -> f64 {
        dispatch!(self, m => m.estimate(timestamp))
    }

    fn predict(&self, timestamp: i64) -> f64 {
        dispatch!(self, m => m.predict(timestamp))
    }

    fn summary(&self, verbose: bool) -> String {
        dispatch!(self, m => m.summary(verbose))
    }

    fn save(&self, path: &Path) -> TemporalResult<()> {
        dispatch!(self, m => m.save(path))
    }

    fn load(&mut self, path: &Path) -> TemporalResult<()> {
        dispatch!(self, m => m.load(path))
    }

    fn export_to_array(&self, buffer: &mut [f64]) -> TemporalResult<usize> {
        dispatch!(self, m => m.export_to_array(buffer))
    }

    fn import_from_array(&mut self, buffer: &[f64]) -> TemporalResult<()> {
        dispatch!(self, m => m.import_from_array(buffer))
    }
}

/// Clamp a raw estimate into `[0, 1]`, replacing non-finite values by
/// `fallback`.
pub(crate) fn clamp_probability(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { fallback.clamp(0.0, 1.0) }
}
