//! spectral::detector — incremental residual spectrum over candidate periods.
//!
//! Purpose
//! -------
//! Rank a fixed grid of candidate periods by how much of a signal's variance
//! they explain. The hypertime loop feeds the per-sample residuals of the
//! current model and takes the strongest unused period as its next harmonic
//! feature; the FreMEn strategy keeps the strongest components directly.
//!
//! Key behaviors
//! -------------
//! - Candidate periods are `max_period / i` for `i = 1..=elements` (integer
//!   division), with zeros and duplicates dropped, longest first.
//! - [`FrequencyDetector::add`] is O(#candidates): it accumulates
//!   `Σ v·cos ωt`, `Σ v·sin ωt`, `Σ cos ωt`, `Σ sin ωt` per candidate plus
//!   `Σ v` and the sample count.
//! - [`FrequencyDetector::ranked`] removes the mean from the accumulated sums
//!   and returns every candidate ordered by amplitude (strongest first).
//!
//! Invariants & assumptions
//! ------------------------
//! - Phase angles are computed from `t mod period` so large epoch
//!   timestamps keep full precision.
//! - Amplitudes are compared after rounding to 1e-9, and equal amplitudes
//!   keep candidate order, so ties resolve toward the longer period and the
//!   ranking is deterministic across platforms.
//!
//! Conventions
//! -----------
//! - For a component `{period P, amplitude A, phase φ}` the reconstruction
//!   is `2·A·cos(2πt/P − φ)` around the signal mean.
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::f64::consts::TAU;

/// Resolution used when comparing amplitudes.
const AMPLITUDE_RESOLUTION: f64 = 1e-9;

/// One ranked spectral component of the de-meaned signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralComponent {
    pub period: u32,
    /// `|G|` of the normalized Fourier coefficient.
    pub amplitude: f64,
    /// `arg G` in radians.
    pub phase: f64,
}

impl SpectralComponent {
    /// Contribution of this component at timestamp `t`.
    pub fn evaluate(&self, t: i64) -> f64 {
        2.0 * self.amplitude * (angle(t, self.period) - self.phase).cos()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Accumulator {
    period: u32,
    value_cos: f64,
    value_sin: f64,
    cos: f64,
    sin: f64,
}

/// Incremental spectrum of a `(timestamp, value)` signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDetector {
    bins: Vec<Accumulator>,
    value_sum: f64,
    count: usize,
}

impl FrequencyDetector {
    /// Build the candidate grid `max_period / i`, `i = 1..=elements`.
    pub fn new(max_period: u32, elements: usize) -> Self {
        let mut periods: Vec<u32> = (1..=elements)
            .map_while(|i| u32::try_from(i).ok())
            .map(|i| max_period / i)
            .filter(|&p| p > 0)
            .collect();
        periods.dedup();
        let bins = periods
            .into_iter()
            .map(|period| Accumulator { period, value_cos: 0.0, value_sin: 0.0, cos: 0.0, sin: 0.0 })
            .collect();
        Self { bins, value_sum: 0.0, count: 0 }
    }

    /// Candidate periods, longest first.
    pub fn periods(&self) -> Vec<u32> {
        self.bins.iter().map(|b| b.period).collect()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of all values added so far (`0.0` when empty).
    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.value_sum / self.count as f64 }
    }

    pub fn add(&mut self, t: i64, value: f64) {
        for bin in &mut self.bins {
            let (sin, cos) = angle(t, bin.period).sin_cos();
            bin.value_cos += value * cos;
            bin.value_sin += value * sin;
            bin.cos += cos;
            bin.sin += sin;
        }
        self.value_sum += value;
        self.count += 1;
    }

    /// All candidates ordered by amplitude, strongest first.
    ///
    /// An empty detector ranks every candidate at amplitude zero.
    pub fn ranked(&self) -> Vec<SpectralComponent> {
        let n = self.count.max(1) as f64;
        let mean = self.mean();
        let mut components: Vec<SpectralComponent> = self
            .bins
            .iter()
            .map(|bin| {
                let re = (bin.value_cos - mean * bin.cos) / n;
                let im = (bin.value_sin - mean * bin.sin) / n;
                SpectralComponent { period: bin.period, amplitude: re.hypot(im), phase: im.atan2(re) }
            })
            .collect();
        components.sort_by_key(|c| Reverse((c.amplitude / AMPLITUDE_RESOLUTION).round() as i64));
        components
    }

    /// The `k` strongest components.
    pub fn strongest(&self, k: usize) -> Vec<SpectralComponent> {
        let mut ranked = self.ranked();
        ranked.truncate(k);
        ranked
    }
}

/// `2π (t mod P) / P`.
pub(crate) fn angle(t: i64, period: u32) -> f64 {
    let p = i64::from(period.max(1));
    TAU * t.rem_euclid(p) as f64 / p as f64
}
