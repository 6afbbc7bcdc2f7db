//! FreMEn strategy: the signal mean plus its strongest periodic components.
//!
//! Observations are accumulated into a [`FrequencyDetector`] as they arrive,
//! so `add` is O(#candidates) and no samples are stored. `update(order)`
//! keeps the `order` strongest components, and
//! `estimate(t) = mean + Σₖ 2·Aₖ·cos(2πt/Pₖ − φₖ)`, clamped to `[0, 1]`.
use crate::spectral::{FrequencyDetector, SpectralComponent};
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Retained {
    mean: f64,
    components: Vec<SpectralComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FremenState {
    detector: FrequencyDetector,
    retained: Option<Retained>,
}

/// Frequency Map Enhancement model.
#[derive(Debug, Clone, PartialEq)]
pub struct FremenModel {
    config: TemporalConfig,
    state: FremenState,
}

impl FremenModel {
    pub fn new(config: TemporalConfig) -> Self {
        let detector = FrequencyDetector::new(config.max_period, config.element_budget);
        Self { config, state: FremenState { detector, retained: None } }
    }

    /// Components kept by the last update, strongest first.
    pub fn components(&self) -> &[SpectralComponent] {
        self.state.retained.as_ref().map_or(&[], |r| r.components.as_slice())
    }

    fn accept(&mut self, state: FremenState) -> TemporalResult<()> {
        if state.detector.periods() != self.state.detector.periods() {
            return Err(TemporalError::InconsistentState {
                reason: "stored candidate periods differ from the configured ones".into(),
            });
        }
        self.state = state;
        Ok(())
    }
}

impl TemporalModel for FremenModel {
    fn kind(&self) -> TemporalKind {
        TemporalKind::FreMEn
    }

    fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn is_trained(&self) -> bool {
        self.state.retained.is_some()
    }

    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()> {
        let stored = self.state.detector.len();
        if stored >= self.config.sample_capacity {
            return Err(TemporalError::CapacityExceeded {
                needed: stored + 1,
                capacity: self.config.sample_capacity,
            });
        }
        self.state.detector.add(timestamp, state);
        Ok(())
    }

    fn update(&mut self, order: usize) -> TemporalResult<()> {
        if self.state.detector.is_empty() {
            self.state.retained = None;
            return Ok(());
        }
        let components = self.state.detector.strongest(order);
        tracing::debug!(
            order,
            periods = ?components.iter().map(|c| c.period).collect::<Vec<_>>(),
            "FreMEn components retained"
        );
        self.state.retained = Some(Retained { mean: self.state.detector.mean(), components });
        Ok(())
    }

    fn estimate(&self, timestamp: i64) -> f64 {
        match &self.state.retained {
            Some(retained) => {
                let value = retained.mean
                    + retained.components.iter().map(|c| c.evaluate(timestamp)).sum::<f64>();
                clamp_probability(value, retained.mean)
            }
            None => 0.5,
        }
    }

    fn summary(&self, verbose: bool) -> String {
        let mut out = format!(
            "{}: {} observations, {} components",
            self.kind(),
            self.state.detector.len(),
            self.components().len()
        );
        if verbose {
            for c in self.components() {
                out.push_str(&format!(
                    "\n  period {} amplitude {:.4} phase {:.4}",
                    c.period, c.amplitude, c.phase
                ));
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::config::{DAY, WEEK};
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    #[test]
    // Purpose
    // -------
    // A daily sinusoid sampled hourly for a week is reconstructed by one
    // component.
    //
    // Given
    // -----
    // - s(t) = 0.5 + 0.4·cos(2πt/86400), t hourly over 7 days.
    //
    // Expect
    // ------
    // - update(1) keeps the 86400 s component; estimates match s(t).
    fn daily_signal_is_reconstructed() {
        // Arrange
        let signal = |t: i64| 0.5 + 0.4 * (TAU * t as f64 / f64::from(DAY)).cos();
        let mut model = FremenModel::new(TemporalConfig::new(WEEK, 10, 1).unwrap());
        for h in 0..168 {
            model.add(h * 3_600, signal(h * 3_600)).unwrap();
        }

        // Act
        model.update(1).unwrap();

        // Assert
        assert_eq!(model.components()[0].period, DAY);
        for t in [0, 5_000, 30_000, 1_000_000] {
            assert_relative_eq!(model.predict(t), signal(t), epsilon = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // Untrained models predict the prior; export/import is a fixed point.
    fn prior_and_interchange() {
        let mut model = FremenModel::new(TemporalConfig::default());
        assert_eq!(model.predict(1), 0.5);
        model.update(2).unwrap();
        assert!(!model.is_trained());

        for h in 0..48 {
            model.add(h * 3_600, if h % 24 < 12 { 1.0 } else { 0.0 }).unwrap();
        }
        model.update(2).unwrap();
        let mut buffer = vec![0.0; 65_536];
        let len = model.export_to_array(&mut buffer).unwrap();
        let mut copy = FremenModel::new(TemporalConfig::default());
        copy.import_from_array(&buffer[..len]).unwrap();
        for t in (0..20).map(|k| k * 10_007) {
            assert_eq!(copy.predict(t), model.predict(t));
            assert!((0.0..=1.0).contains(&model.predict(t)));
        }
    }
}
