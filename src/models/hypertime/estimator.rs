//! models::hypertime::estimator — periodicity-augmented mixture estimator.
//!
//! Purpose
//! -------
//! Predict the probability of a binary state at any timestamp by modelling
//! each class with a Gaussian mixture over a feature space that grows one
//! harmonic pair at a time. The periods are chosen greedily from the
//! spectrum of the current model's residuals.
//!
//! Key behaviors
//! -------------
//! - `train(order)` runs the expansion loop:
//!   1. fit both class mixtures on `[state, cos/sin per active period]`,
//!   2. feed the residuals `estimate(tᵢ) − stateᵢ` to a fresh
//!      [`FrequencyDetector`],
//!   3. recalibrate `correction *= positives / Σ estimate(tᵢ)`,
//!   4. record the RMS error of the round,
//!   5. reject the round and restore the previous checkpoint if the RMS grew,
//!      otherwise checkpoint it,
//!   6. stop at the dimension budget or append the strongest unused period.
//! - `estimate(t)` scores one feature vector under the positive mixture with
//!   the state column at `1`, flips it to `0`, scores it under the negative
//!   mixture and combines
//!   `p = c · P·eᵃ / (P·eᵃ + N·eᵇ)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `positives + negatives == samples.len()` after every `train` call,
//!   successful or not.
//! - `active_periods` never holds duplicates; the time dimension is always
//!   `2 · active_periods.len()` and matches the mixtures' dimension.
//! - A failed first round (too few samples, EM failure) leaves the previous
//!   trained state untouched.
//! - Checkpoints are in-memory copies; the filesystem is never used for
//!   control flow.
//!
//! Conventions
//! -----------
//! - The mixture combination is evaluated as `1 / (1 + (N/P)·e^{b−a})`,
//!   which equals the formula above whenever its denominator is positive and
//!   does not underflow when both likelihoods are tiny.
//! - Public estimates are clamped to `[0, 1]`; calibration and residuals use
//!   the raw, unclamped value.
use crate::mixture::GaussianMixture;
use crate::models::hypertime::{
    features::{self, ClassSamples, STATE_COLUMN},
    options::HypertimeOptions,
    report::{review_round, RoundVerdict, StopReason, UpdateReport},
};
use crate::spectral::FrequencyDetector;
use crate::temporal::{
    config::TemporalConfig,
    errors::{TemporalError, TemporalResult},
    kind::TemporalKind,
    model::{clamp_probability, TemporalModel},
    samples::{Observation, SampleBuffer},
};
use statrs::statistics::Statistics;
use std::fmt::Write as _;
use std::path::Path;

/// Trained state restored on rollback.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Checkpoint {
    pub(crate) order: usize,
    pub(crate) periods: Vec<u32>,
    pub(crate) positive: Option<GaussianMixture>,
    pub(crate) negative: Option<GaussianMixture>,
    pub(crate) correction: f64,
}

/// Hypertime temporal model.
#[derive(Debug, Clone)]
pub struct HypertimeEstimator {
    pub(crate) config: TemporalConfig,
    pub(crate) options: HypertimeOptions,
    pub(crate) samples: SampleBuffer,
    pub(crate) positives: usize,
    pub(crate) negatives: usize,
    /// Mixture order; `0` until the first `train`, import or load.
    pub(crate) order: usize,
    pub(crate) periods: Vec<u32>,
    pub(crate) positive: Option<GaussianMixture>,
    pub(crate) negative: Option<GaussianMixture>,
    pub(crate) correction: f64,
    pub(crate) error_history: Vec<f64>,
    pub(crate) last_report: Option<UpdateReport>,
}

impl HypertimeEstimator {
    pub fn new(config: TemporalConfig) -> Self {
        Self::with_options(config, HypertimeOptions::default())
    }

    pub fn with_options(config: TemporalConfig, options: HypertimeOptions) -> Self {
        Self {
            config,
            options,
            samples: SampleBuffer::new(config.sample_capacity),
            positives: 0,
            negatives: 0,
            order: 0,
            periods: Vec::new(),
            positive: None,
            negative: None,
            correction: 1.0,
            error_history: Vec::new(),
            last_report: None,
        }
    }

    pub fn options(&self) -> &HypertimeOptions {
        &self.options
    }

    pub fn samples(&self) -> &[Observation] {
        self.samples.as_slice()
    }

    /// `(positives, negatives)` as of the last `train`, load or import.
    pub fn class_counts(&self) -> (usize, usize) {
        (self.positives, self.negatives)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn active_periods(&self) -> &[u32] {
        &self.periods
    }

    pub fn time_dimension(&self) -> usize {
        2 * self.periods.len()
    }

    pub fn correction(&self) -> f64 {
        self.correction
    }

    /// RMS errors of the rounds evaluated by the last `train`.
    pub fn error_history(&self) -> &[f64] {
        &self.error_history
    }

    pub fn last_report(&self) -> Option<&UpdateReport> {
        self.last_report.as_ref()
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            order: self.order,
            periods: self.periods.clone(),
            positive: self.positive.clone(),
            negative: self.negative.clone(),
            correction: self.correction,
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.order = checkpoint.order;
        self.periods = checkpoint.periods;
        self.positive = checkpoint.positive;
        self.negative = checkpoint.negative;
        self.correction = checkpoint.correction;
    }

    /// Fallback estimate: empirical positive rate, `0.5` without samples.
    fn prior(&self) -> f64 {
        let total = self.positives + self.negatives;
        if total == 0 { 0.5 } else { self.positives as f64 / total as f64 }
    }

    fn mixtures_fitted(&self) -> bool {
        self.positive.as_ref().is_some_and(GaussianMixture::is_fitted)
            && self.negative.as_ref().is_some_and(GaussianMixture::is_fitted)
    }

    /// Unclamped estimate used for calibration and residuals.
    pub(crate) fn raw_estimate(&self, timestamp: i64) -> f64 {
        if let (Some(positive), Some(negative)) = (&self.positive, &self.negative) {
            if positive.is_fitted() && negative.is_fitted() && self.positives > 0 {
                let mut x = features::feature_vector(timestamp, 1.0, &self.periods);
                let a = positive.score(x.view());
                x[STATE_COLUMN] = 0.0;
                let b = negative.score(x.view());
                if let (Ok(a), Ok(b)) = (a, b) {
                    let odds = self.negatives as f64 / self.positives as f64 * (b - a).exp();
                    let p = self.correction / (1.0 + odds);
                    if p.is_finite() {
                        return p;
                    }
                }
            }
        }
        self.prior()
    }

    fn fit_round(&mut self, pos: &ClassSamples, neg: &ClassSamples) -> TemporalResult<()> {
        let (Some(positive), Some(negative)) = (self.positive.as_mut(), self.negative.as_mut())
        else {
            return Err(TemporalError::InconsistentState {
                reason: "class mixtures missing before fit".into(),
            });
        };
        let pos_summary = positive.fit(pos.matrix(&self.periods).view())?;
        let neg_summary = negative.fit(neg.matrix(&self.periods).view())?;
        tracing::debug!(
            order = self.order,
            time_dimension = 2 * self.periods.len(),
            positives = pos.len(),
            negatives = neg.len(),
            pos_iterations = pos_summary.iterations,
            neg_iterations = neg_summary.iterations,
            "class mixtures fitted"
        );
        Ok(())
    }

    /// Run the expansion loop with `order` components per class.
    ///
    /// # Errors
    /// - [`TemporalError::InvalidOrder`] for `order == 0`.
    /// - [`TemporalError::InsufficientSamples`] if either class has
    ///   `≤ order` samples. Class counts are updated; everything else keeps
    ///   its previous value, so an untrained array export carries the last
    ///   successful order rather than the rejected one.
    /// - [`TemporalError::Mixture`] if EM fails in the first round; the
    ///   previous trained state is restored.
    pub fn train(&mut self, order: usize) -> TemporalResult<UpdateReport> {
        if order == 0 {
            return Err(TemporalError::InvalidOrder { order });
        }
        let (pos, neg) = features::partition(self.samples.as_slice());
        self.positives = pos.len();
        self.negatives = neg.len();
        if self.positives <= order || self.negatives <= order {
            tracing::warn!(
                order,
                positives = self.positives,
                negatives = self.negatives,
                "not enough samples per class; keeping previous model"
            );
            return Err(TemporalError::InsufficientSamples {
                positives: self.positives,
                negatives: self.negatives,
                order,
            });
        }

        let previous = self.checkpoint();
        if order != self.order || self.positive.is_none() || self.negative.is_none() {
            self.positive = Some(GaussianMixture::new(order, self.options.mixture)?);
            self.negative = Some(GaussianMixture::new(order, self.options.mixture)?);
            self.order = order;
        }
        self.periods.clear();

        let mut history: Vec<f64> = Vec::new();
        let mut accepted: Option<Checkpoint> = None;
        let stop = loop {
            if let Err(err) = self.fit_round(&pos, &neg) {
                match accepted.take() {
                    None => {
                        self.restore(previous);
                        return Err(err);
                    }
                    Some(checkpoint) => {
                        tracing::warn!(error = %err, "mixture fit failed; restoring previous round");
                        self.restore(checkpoint);
                        break StopReason::FitFailed;
                    }
                }
            }

            let mut detector =
                FrequencyDetector::new(self.config.max_period, self.config.element_budget);
            for s in self.samples.iter() {
                detector.add(s.timestamp, self.raw_estimate(s.timestamp) - s.state);
            }

            let integral: f64 = self.samples.iter().map(|s| self.raw_estimate(s.timestamp)).sum();
            let calibrated = self.correction * self.positives as f64 / integral;
            if integral > 0.0 && calibrated.is_finite() && calibrated > 0.0 {
                self.correction = calibrated;
            }

            let rms = self
                .samples
                .iter()
                .map(|s| self.raw_estimate(s.timestamp) - s.state)
                .collect::<Vec<f64>>()
                .quadratic_mean();

            let candidate = detector
                .ranked()
                .into_iter()
                .map(|component| component.period)
                .find(|period| !self.periods.contains(period));
            tracing::debug!(
                round = history.len(),
                time_dimension = self.time_dimension(),
                rms,
                correction = self.correction,
                candidate = ?candidate,
                "expansion round evaluated"
            );

            if review_round(&history, rms) == RoundVerdict::Reject {
                tracing::warn!(
                    previous = history.last().copied().unwrap_or(f64::NAN),
                    current = rms,
                    "error increased; dropping the last period"
                );
                history.push(rms);
                if let Some(checkpoint) = accepted.take() {
                    self.restore(checkpoint);
                }
                break StopReason::ErrorRegression;
            }
            history.push(rms);
            accepted = Some(self.checkpoint());

            if self.time_dimension() >= self.options.max_time_dimension {
                break StopReason::DimensionBudget;
            }
            match candidate {
                Some(period) => self.periods.push(period),
                None => break StopReason::CandidatesExhausted,
            }
        };

        let report = UpdateReport {
            order,
            rounds: history.len(),
            error_history: history.clone(),
            active_periods: self.periods.clone(),
            stop,
        };
        tracing::info!(
            order,
            rounds = report.rounds,
            periods = ?report.active_periods,
            stop = %stop,
            "hypertime update finished"
        );
        self.error_history = history;
        self.last_report = Some(report.clone());
        Ok(report)
    }
}

impl TemporalModel for HypertimeEstimator {
    fn kind(&self) -> TemporalKind {
        TemporalKind::HyperTime
    }

    fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn is_trained(&self) -> bool {
        self.mixtures_fitted()
    }

    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()> {
        self.samples.push(Observation::new(timestamp, state))
    }

    fn update(&mut self, order: usize) -> TemporalResult<()> {
        self.train(order).map(|_| ())
    }

    fn estimate(&self, timestamp: i64) -> f64 {
        clamp_probability(self.raw_estimate(timestamp), self.prior())
    }

    fn summary(&self, verbose: bool) -> String {
        let mut out = format!(
            "{}: order {}, time dimension {}, periods {:?}, {} positives, {} negatives, \
             correction {:.4}, {}",
            self.kind(),
            self.order,
            self.time_dimension(),
            self.periods,
            self.positives,
            self.negatives,
            self.correction,
            if self.is_trained() { "trained" } else { "untrained" }
        );
        if verbose {
            if let Some(report) = &self.last_report {
                let _ = write!(out, "\n  stop: {}, rms by round: {:?}", report.stop, report.error_history);
            }
            for (label, mixture) in [("positive", &self.positive), ("negative", &self.negative)] {
                if let Some(means) = mixture.as_ref().and_then(GaussianMixture::means) {
                    let _ = write!(out, "\n  {label} means:\n{means}");
                }
            }
        }
        out
    }

    fn save(&self, path: &Path) -> TemporalResult<()> {
        self.save_records(path)
    }

    fn load(&mut self, path: &Path) -> TemporalResult<()> {
        self.load_records(path)
    }

    fn export_to_array(&self, buffer: &mut [f64]) -> TemporalResult<usize> {
        self.export_state(buffer)
    }

    fn import_from_array(&mut self, buffer: &[f64]) -> TemporalResult<()> {
        self.import_state(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Coverage
    // -------------------------------------------------------------------------
    // - Untrained fallbacks (0.5 with no samples, empirical ratio otherwise).
    // - Order validation and insufficient-sample aborts that keep the prior
    //   trained state.
    // - Expansion on a clean daily pattern: periods, bounds, calibration.
    // - Invariants (counts, dimension, uniqueness) on noisy data, including
    //   the rollback length relation whenever a regression stop occurs.
    // -------------------------------------------------------------------------

    const DAY: i64 = 86_400;

    fn daily(n_days: i64) -> HypertimeEstimator {
        let mut model = HypertimeEstimator::new(TemporalConfig::default());
        for d in 0..n_days {
            model.add(d * DAY, 1.0).unwrap();
            model.add(d * DAY + DAY / 2, 0.0).unwrap();
        }
        model
    }

    /// Deterministic pseudo-random states in `{0, 1}` with a daily bias.
    fn noisy(n: usize, seed: u64) -> HypertimeEstimator {
        let mut model = HypertimeEstimator::new(TemporalConfig::default());
        let mut state = seed;
        for i in 0..n {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let u = (state >> 11) as f64 / (1u64 << 53) as f64;
            let t = i as i64 * 3_607;
            let hour = (t % DAY) / 3_600;
            let p = if (8..18).contains(&hour) { 0.8 } else { 0.2 };
            model.add(t, if u < p { 1.0 } else { 0.0 }).unwrap();
        }
        model
    }

    #[test]
    // Purpose
    // -------
    // An empty model predicts exactly 0.5 everywhere and is not trained.
    fn empty_model_predicts_one_half() {
        let model = HypertimeEstimator::new(TemporalConfig::default());
        for t in [-1_000_000, 0, 43_200, 1_700_000_000] {
            assert_eq!(model.predict(t), 0.5);
        }
        assert!(!model.is_trained());
        assert_eq!(model.time_dimension(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Too few samples per class abort the update and leave the model
    // untrained with updated counts.
    //
    // Given
    // -----
    // - 3 positives, 3 negatives; order 5.
    //
    // Expect
    // ------
    // - InsufficientSamples; untrained; predict = 3/6 = 0.5.
    fn insufficient_samples_abort_update() {
        // Arrange
        let mut model = daily(3);

        // Act
        let result = model.update(5);

        // Assert
        assert_eq!(
            result,
            Err(TemporalError::InsufficientSamples { positives: 3, negatives: 3, order: 5 })
        );
        assert!(!model.is_trained());
        assert_eq!(model.class_counts(), (3, 3));
        assert_eq!(model.predict(12_345), 0.5);
        assert_eq!(model.update(0), Err(TemporalError::InvalidOrder { order: 0 }));

        // The untrained export keeps the last successful order (none yet).
        let mut buffer = [0.0; 16];
        let used = model.export_to_array(&mut buffer).unwrap();
        assert_eq!(&buffer[..used], &[4.0, 1.0, 1.0, 3.0, 3.0, 3.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // Untrained models with unbalanced classes fall back to the empirical
    // positive rate.
    fn untrained_prior_is_empirical_ratio() {
        let mut model = HypertimeEstimator::new(TemporalConfig::default());
        for t in 0..3 {
            model.add(t, 1.0).unwrap();
        }
        model.add(10, 0.0).unwrap();
        assert!(model.update(1).is_err());
        assert_relative_eq!(model.predict(0), 0.75, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A clean day/night pattern is picked up on the first expansion and
    // predictions separate the two phases.
    //
    // Given
    // -----
    // - 30 days; state 1 at midnight, 0 at noon; order 1.
    //
    // Expect
    // ------
    // - 86400 is the first active period; midnight → ≈1, noon → ≈0;
    //   dimension invariant holds; the loop ended on a documented reason.
    fn daily_pattern_is_learned() {
        // Arrange
        let mut model = daily(30);

        // Act
        let report = model.train(1).expect("update should succeed");

        // Assert
        assert!(model.is_trained());
        assert_eq!(model.active_periods().first(), Some(&86_400));
        assert_eq!(model.time_dimension(), 2 * model.active_periods().len());
        assert_eq!(report.active_periods, model.active_periods());
        assert_relative_eq!(model.predict(100 * DAY), 1.0, epsilon = 1e-6);
        assert_relative_eq!(model.predict(100 * DAY + DAY / 2), 0.0, epsilon = 1e-6);
        assert_eq!(model.error_history(), report.error_history.as_slice());
        assert_relative_eq!(report.error_history[0], 0.5, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Invariants hold on noisy data for several seeds and orders.
    //
    // Expect
    // ------
    // - counts sum to the number of samples; no duplicate periods; dimension
    //   ≤ budget; predictions in [0, 1]; after a regression stop the history
    //   is exactly two entries longer than the period list.
    fn invariants_hold_on_noisy_data() {
        for seed in [1, 7, 42] {
            for order in [1, 2] {
                // Arrange
                let mut model = noisy(240, seed);

                // Act
                let report = model.train(order).expect("update should succeed");

                // Assert
                let (p, n) = model.class_counts();
                assert_eq!(p + n, model.samples().len());
                let mut sorted = model.active_periods().to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                assert_eq!(sorted.len(), model.active_periods().len());
                assert!(model.time_dimension() <= model.options().max_time_dimension);
                for t in (0..200).map(|k| k * 4_999) {
                    let y = model.predict(t);
                    assert!((0.0..=1.0).contains(&y), "predict({t}) = {y}");
                }
                match report.stop {
                    StopReason::ErrorRegression => {
                        assert_eq!(model.active_periods().len() + 2, report.error_history.len());
                    }
                    _ => assert_eq!(model.active_periods().len() + 1, report.error_history.len()),
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A failed update with a larger order keeps the earlier trained state.
    fn failed_update_keeps_previous_training() {
        // Arrange
        let mut model = daily(20);
        model.train(1).unwrap();
        let periods = model.active_periods().to_vec();
        let before = model.predict(5 * DAY);

        // Act
        let result = model.update(50);

        // Assert
        assert!(matches!(result, Err(TemporalError::InsufficientSamples { order: 50, .. })));
        assert!(model.is_trained());
        assert_eq!(model.order(), 1);
        assert_eq!(model.active_periods(), periods.as_slice());
        assert_eq!(model.predict(5 * DAY), before);
    }

    #[test]
    fn add_respects_sample_capacity() {
        let config = TemporalConfig::default().with_sample_capacity(2).unwrap();
        let mut model = HypertimeEstimator::new(config);
        model.add(0, 1.0).unwrap();
        model.add(1, 0.0).unwrap();
        assert_eq!(
            model.add(2, 1.0),
            Err(TemporalError::CapacityExceeded { needed: 3, capacity: 2 })
        );
    }

    #[test]
    fn summary_mentions_state() {
        let mut model = daily(10);
        assert!(model.summary(false).contains("untrained"));
        model.train(1).unwrap();
        let text = model.summary(true);
        assert!(text.contains("HyT-EM"));
        assert!(text.contains("positive means"));
        assert!(text.contains("stop:"));
    }
}
