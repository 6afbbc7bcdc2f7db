//! Von Mises strategy: class mixtures over fixed daily and weekly harmonics.
//!
//! Features are `[cos d, sin d, cos w, sin w, x]` where `d`, `w` are the
//! daily and weekly phase angles and `x` is `1` for positive, `0` for
//! negative observations. Each class gets a diagonal-covariance mixture,
//! trained only when the class has more than [`MIN_CLASS_SAMPLES`]
//! observations. With both mixtures fitted,
//! `p = eᵃ / (eᵃ + eᵇ)`; otherwise `0.5`.
use crate::mixture::{CovarianceKind, GaussianMixture, MixtureOptions};
use crate::spectral::detector::angle;
use crate::temporal::{
    config::{TemporalConfig, DAY, WEEK},
    errors::{TemporalError, TemporalResult},
    interchange,
    kind::TemporalKind,
    model::{clamp_probability, TemporalModel},
    samples::{Observation, SampleBuffer},
    storage,
};
use ndarray::{array, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A class mixture is fitted only above this many observations.
pub const MIN_CLASS_SAMPLES: usize = 5;

const CLASS_COLUMN: usize = 4;

fn features(timestamp: i64, class: f64) -> Array1<f64> {
    let (sin_d, cos_d) = angle(timestamp, DAY).sin_cos();
    let (sin_w, cos_w) = angle(timestamp, WEEK).sin_cos();
    array![cos_d, sin_d, cos_w, sin_w, class]
}

fn class_matrix<'a>(samples: impl Iterator<Item = &'a Observation>, class: f64) -> Array2<f64> {
    let rows: Vec<Array1<f64>> = samples.map(|s| features(s.timestamp, class)).collect();
    let mut matrix = Array2::<f64>::zeros((rows.len(), 5));
    for (mut target, row) in matrix.outer_iter_mut().zip(rows.iter()) {
        target.assign(row);
    }
    matrix
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MisesState {
    samples: SampleBuffer,
    order: usize,
    positive: Option<GaussianMixture>,
    negative: Option<GaussianMixture>,
}

/// Fixed two-frequency mixture model.
#[derive(Debug, Clone, PartialEq)]
pub struct MisesModel {
    config: TemporalConfig,
    options: MixtureOptions,
    state: MisesState,
}

impl MisesModel {
    pub fn new(config: TemporalConfig) -> Self {
        let state = MisesState {
            samples: SampleBuffer::new(config.sample_capacity),
            order: 0,
            positive: None,
            negative: None,
        };
        Self { config, options: MixtureOptions::with_covariance(CovarianceKind::Diagonal), state }
    }

    fn fit_class(&self, positive: bool, order: usize) -> TemporalResult<Option<GaussianMixture>> {
        let samples = self.state.samples.iter().filter(|s| s.is_positive() == positive);
        let data = class_matrix(samples, if positive { 1.0 } else { 0.0 });
        if data.nrows() <= MIN_CLASS_SAMPLES {
            return Ok(None);
        }
        let mut mixture = GaussianMixture::new(order, self.options)?;
        mixture.fit(data.view())?;
        Ok(Some(mixture))
    }

    fn accept(&mut self, state: MisesState) -> TemporalResult<()> {
        for mixture in [&state.positive, &state.negative].into_iter().flatten() {
            if mixture.dimension().is_some_and(|d| d != 5) || mixture.order() != state.order {
                return Err(TemporalError::InconsistentState {
                    reason: "von Mises mixture does not match its five-column feature space".into(),
                });
            }
        }
        self.state = state;
        Ok(())
    }
}

impl TemporalModel for MisesModel {
    fn kind(&self) -> TemporalKind {
        TemporalKind::VonMises
    }

    fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn is_trained(&self) -> bool {
        self.state.positive.is_some() && self.state.negative.is_some()
    }

    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()> {
        self.state.samples.push(Observation::new(timestamp, state))
    }

    /// Refit both classes; classes with too few samples are left unfitted.
    fn update(&mut self, order: usize) -> TemporalResult<()> {
        if order == 0 {
            return Err(TemporalError::InvalidOrder { order });
        }
        let positive = self.fit_class(true, order)?;
        let negative = self.fit_class(false, order)?;
        if positive.is_none() || negative.is_none() {
            let (p, n) = self.state.samples.class_counts();
            tracing::debug!(positives = p, negatives = n, "von Mises class left unfitted");
        }
        self.state.order = order;
        self.state.positive = positive;
        self.state.negative = negative;
        Ok(())
    }

    fn estimate(&self, timestamp: i64) -> f64 {
        let (Some(positive), Some(negative)) = (&self.state.positive, &self.state.negative) else {
            return 0.5;
        };
        let mut x = features(timestamp, 1.0);
        let a = positive.score(x.view());
        x[CLASS_COLUMN] = 0.0;
        let b = negative.score(x.view());
        match (a, b) {
            (Ok(a), Ok(b)) => clamp_probability(1.0 / (1.0 + (b - a).exp()), 0.5),
            _ => 0.5,
        }
    }

    fn summary(&self, _verbose: bool) -> String {
        let (p, n) = self.state.samples.class_counts();
        format!(
            "{}: order {}, {p} positives, {n} negatives, {}",
            self.kind(),
            self.state.order,
            if self.is_trained() { "trained" } else { "untrained" }
        )
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
