//! Baseline strategies: constant prior, running mean, and periodic histogram.
//!
//! These carry no periodicity search. They exist as comparison points for
//! the mixture models and as the factory's safe default (`None`).
//!
//! - [`NoneModel`] always predicts `0.5`.
//! - [`MeanModel`] predicts the mean state seen up to the last `update`.
//! - [`HistogramModel`] folds time on `max_period`, splits the fold into
//!   `element_budget` equal bins and predicts the mean state of the bin;
//!   empty bins fall back to the overall mean.
use crate::temporal::{
    config::TemporalConfig,
    errors::{TemporalError, TemporalResult},
    interchange,
    kind::TemporalKind,
    model::{clamp_probability, TemporalModel},
    storage,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const PRIOR: f64 = 0.5;

fn check_capacity(stored: usize, config: &TemporalConfig) -> TemporalResult<()> {
    if stored >= config.sample_capacity {
        return Err(TemporalError::CapacityExceeded {
            needed: stored + 1,
            capacity: config.sample_capacity,
        });
    }
    Ok(())
}

// ---- None ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct NoneState {
    observations: usize,
}

/// Constant `0.5` strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct NoneModel {
    config: TemporalConfig,
    state: NoneState,
}

impl NoneModel {
    pub fn new(config: TemporalConfig) -> Self {
        Self { config, state: NoneState::default() }
    }
}

impl TemporalModel for NoneModel {
    fn kind(&self) -> TemporalKind {
        TemporalKind::None
    }

    fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn add(&mut self, _timestamp: i64, _state: f64) -> TemporalResult<()> {
        check_capacity(self.state.observations, &self.config)?;
        self.state.observations += 1;
        Ok(())
    }

    fn update(&mut self, _order: usize) -> TemporalResult<()> {
        Ok(())
    }

    fn estimate(&self, _timestamp: i64) -> f64 {
        PRIOR
    }

    fn summary(&self, _verbose: bool) -> String {
        format!("{}: constant {PRIOR}, {} observations", self.kind(), self.state.observations)
    }

    fn save(&self, path: &Path) -> TemporalResult<()> {
        storage::write_record(path, &self.state)
    }

    fn load(&mut self, path: &Path) -> TemporalResult<()> {
        self.state = storage::read_record(path)?;
        Ok(())
    }

    fn export_to_array(&self, buffer: &mut [f64]) -> TemporalResult<usize> {
        interchange::export_record(self.kind(), &self.state, buffer)
    }

    fn import_from_array(&mut self, buffer: &[f64]) -> TemporalResult<()> {
        self.state = interchange::import_record(self.kind(), buffer)?;
        Ok(())
    }
}

// ---- Mean ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct MeanState {
    sum: f64,
    count: usize,
    mean: Option<f64>,
}

/// Running-mean strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanModel {
    config: TemporalConfig,
    state: MeanState,
}

impl MeanModel {
    pub fn new(config: TemporalConfig) -> Self {
        Self { config, state: MeanState::default() }
    }
}

impl TemporalModel for MeanModel {
    fn kind(&self) -> TemporalKind {
        TemporalKind::Mean
    }

    fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn is_trained(&self) -> bool {
        self.state.mean.is_some()
    }

    fn add(&mut self, _timestamp: i64, state: f64) -> TemporalResult<()> {
        check_capacity(self.state.count, &self.config)?;
        self.state.sum += state;
        self.state.count += 1;
        Ok(())
    }

    fn update(&mut self, _order: usize) -> TemporalResult<()> {
        self.state.mean =
            (self.state.count > 0).then(|| self.state.sum / self.state.count as f64);
        Ok(())
    }

    fn estimate(&self, _timestamp: i64) -> f64 {
        clamp_probability(self.state.mean.unwrap_or(PRIOR), PRIOR)
    }

    fn summary(&self, _verbose: bool) -> String {
        match self.state.mean {
            Some(mean) => format!("{}: mean {mean:.4} over {} observations", self.kind(), self.state.count),
            None => format!("{}: untrained, {} observations", self.kind(), self.state.count),
        }
    }

    fn save(&self, path: &Path) -> TemporalResult<()> {
        storage::write_record(path, &self.state)
    }

    fn load(&mut self, path: &Path) -> TemporalResult<()> {
        self.state = storage::read_record(path)?;
        Ok(())
    }

    fn export_to_array(&self, buffer: &mut [f64]) -> TemporalResult<usize> {
        interchange::export_record(self.kind(), &self.state, buffer)
    }

    fn import_from_array(&mut self, buffer: &[f64]) -> TemporalResult<()> {
        self.state = interchange::import_record(self.kind(), buffer)?;
        Ok(())
    }
}

// ---- Histogram ----

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct Bin {
    sum: f64,
    count: usize,
}

impl Bin {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct HistogramState {
    bins: Vec<Bin>,
    total: Bin,
    levels: Option<Vec<f64>>,
}

/// Periodic histogram strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramModel {
    config: TemporalConfig,
    state: HistogramState,
}

impl HistogramModel {
    pub fn new(config: TemporalConfig) -> Self {
        let state = HistogramState {
            bins: vec![Bin::default(); config.element_budget],
            total: Bin::default(),
            levels: None,
        };
        Self { config, state }
    }

    /// Bin of `timestamp` after folding on `max_period`.
    pub fn bin_index(&self, timestamp: i64) -> usize {
        let period = i64::from(self.config.max_period);
        let phase = timestamp.rem_euclid(period) as u128;
        (phase * self.config.element_budget as u128 / period as u128) as usize
    }

    fn accept(&mut self, state: HistogramState) -> TemporalResult<()> {
        let levels_ok = state.levels.as_ref().map_or(true, |l| l.len() == state.bins.len());
        if state.bins.len() != self.config.element_budget || !levels_ok {
            return Err(TemporalError::InconsistentState {
                reason: format!(
                    "histogram record has {} bins, model is configured for {}",
                    state.bins.len(),
                    self.config.element_budget
                ),
            });
        }
        self.state = state;
        Ok(())
    }
}

impl TemporalModel for HistogramModel {
    fn kind(&self) -> TemporalKind {
        TemporalKind::Histogram
    }

    fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn is_trained(&self) -> bool {
        self.state.levels.is_some()
    }

    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()> {
        check_capacity(self.state.total.count, &self.config)?;
        let index = self.bin_index(timestamp);
        let bin = &mut self.state.bins[index];
        bin.sum += state;
        bin.count += 1;
        self.state.total.sum += state;
        self.state.total.count += 1;
        Ok(())
    }

    fn update(&mut self, _order: usize) -> TemporalResult<()> {
        let fallback = self.state.total.mean().unwrap_or(PRIOR);
        self.state.levels =
            Some(self.state.bins.iter().map(|bin| bin.mean().unwrap_or(fallback)).collect());
        Ok(())
    }

    fn estimate(&self, timestamp: i64) -> f64 {
        let level = self
            .state
            .levels
            .as_ref()
            .and_then(|levels| levels.get(self.bin_index(timestamp)).copied())
            .unwrap_or(PRIOR);
        clamp_probability(level, PRIOR)
    }

    fn summary(&self, verbose: bool) -> String {
        let mut out = format!(
            "{}: {} bins over {} s, {} observations, {}",
            self.kind(),
            self.state.bins.len(),
            self.config.max_period,
            self.state.total.count,
            if self.is_trained() { "trained" } else { "untrained" }
        );
        if let (true, Some(levels)) = (verbose, &self.state.levels) {
            out.push_str(&format!("\n  levels: {levels:.3?}"));
        }
        out
    }

    fn save(&self, path: &Path) -> TemporalResult<()> {
        storage::write_record(path, &self.state)
    }

    fn load(&mut self, path: &Path) -> TemporalResult<()> {
        let state = storage::read_record(path)?;
        self.accept(state)
    }

    fn export_to_array(&self, buffer: &mut [f64]) -> TemporalResult<usize> {
        interchange::export_record(self.kind(), &self.state, buffer)
    }

    fn import_from_array(&mut self, buffer: &[f64]) -> TemporalResult<()> {
        let state = interchange::import_record(self.kind(), buffer)?;
        self.accept(state)
    }
}
