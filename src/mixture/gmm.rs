//! mixture::gmm — Gaussian mixture density estimator fitted by EM.
//!
//! Purpose
//! -------
//! Provide the class-conditional density estimator used by the temporal
//! models: fit a finite mixture of multivariate Gaussians to a feature
//! matrix and score the log-likelihood of single feature vectors.
//!
//! Key behaviors
//! -------------
//! - Seed component means deterministically (farthest-point traversal from
//!   the first row) and refine them with a few Lloyd iterations, so repeated
//!   fits on identical data produce identical models.
//! - Run EM with full or diagonal covariance, adding `reg_covar` to every
//!   covariance diagonal after each M-step.
//! - Cache a Cholesky factor and log-determinant per component; scoring is a
//!   triangular solve plus a log-sum-exp over components.
//! - Serialize through a plain record (weights, means, covariances) and
//!   rebuild the factors on deserialization.
//!
//! Invariants & assumptions
//! ------------------------
//! - A fitted mixture has exactly `order` components, all sharing the same
//!   dimension `d`; weights are strictly positive and sum to one.
//! - Every stored covariance is symmetric positive definite (the ridge keeps
//!   constant columns from collapsing the factorization).
//! - A failed `fit` leaves the previous fitted state untouched.
//!
//! Conventions
//! -----------
//! - Training matrices are `n × d` with rows = observations.
//! - Log-likelihoods are natural-log densities, not normalized per row.
//! - The ndarray → nalgebra bridge copies `d × d` covariances into
//!   `DMatrix` only for factorization.
//!
//! Downstream usage
//! ----------------
//! - `models::hypertime` fits one full-covariance mixture per class on the
//!   harmonic feature space.
//! - `models::mises` fits diagonal-covariance mixtures on fixed daily and
//!   weekly harmonics.
//!
//! Testing notes
//! -------------
//! - Unit tests cover recovery of well-separated clusters, scoring near vs
//!   far from the data, validation errors, constant columns, diagonal
//!   covariance, and bit-exact serde round-trips.
use crate::mixture::{
    errors::{MixtureError, MixtureResult},
    options::{CovarianceKind, MixtureOptions},
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// `ln(2π)`.
const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Lloyd refinement passes applied to the seeded means.
const LLOYD_ITERS: usize = 10;

/// Keeps empty components from producing zero weights.
const WEIGHT_FLOOR: f64 = 10.0 * f64::EPSILON;

/// Diagnostics of a single EM run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    /// EM iterations performed.
    pub iterations: usize,
    /// `true` if the tolerance was met before `max_iter`.
    pub converged: bool,
    /// Mean per-row log-likelihood at the last E-step.
    pub mean_log_likelihood: f64,
}

/// Cholesky factor of one component covariance.
#[derive(Debug, Clone, PartialEq)]
struct Factor {
    lower: DMatrix<f64>,
    ln_det: f64,
}

impl Factor {
    fn new(cov: &Array2<f64>, component: usize) -> MixtureResult<Self> {
        let d = cov.nrows();
        let matrix = DMatrix::from_fn(d, d, |i, j| cov[[i, j]]);
        let chol = matrix.cholesky().ok_or(MixtureError::SingularCovariance { component })?;
        let lower = chol.l();
        let ln_det = 2.0 * lower.diagonal().iter().map(|v| v.ln()).sum::<f64>();
        if !ln_det.is_finite() {
            return Err(MixtureError::SingularCovariance { component });
        }
        Ok(Self { lower, ln_det })
    }

    fn ln_density(&self, x: ArrayView1<f64>, mean: ArrayView1<f64>) -> f64 {
        let d = x.len();
        let diff = DVector::from_iterator(d, x.iter().zip(mean.iter()).map(|(a, b)| a - b));
        match self.lower.solve_lower_triangular(&diff) {
            Some(z) => -0.5 * (d as f64 * LN_2PI + self.ln_det + z.norm_squared()),
            None => f64::NEG_INFINITY,
        }
    }
}

/// Fitted component parameters plus their cached factors.
#[derive(Debug, Clone, PartialEq)]
struct Components {
    weights: Array1<f64>,
    means: Array2<f64>,
    covariances: Vec<Array2<f64>>,
    factors: Vec<Factor>,
}

impl Components {
    fn from_parts(
        weights: Array1<f64>, means: Array2<f64>, covariances: Vec<Array2<f64>>,
    ) -> MixtureResult<Self> {
        let factors = covariances
            .iter()
            .enumerate()
            .map(|(j, cov)| Factor::new(cov, j))
            .collect::<MixtureResult<Vec<_>>>()?;
        Ok(Self { weights, means, covariances, factors })
    }

    fn dim(&self) -> usize {
        self.means.ncols()
    }

    /// `ln wⱼ + ln N(x; μⱼ, Σⱼ)` for every component.
    fn component_log_probs(&self, x: ArrayView1<f64>, out: &mut [f64]) {
        for (j, slot) in out.iter_mut().enumerate() {
            *slot = self.weights[j].ln() + self.factors[j].ln_density(x, self.means.row(j));
        }
    }
}

/// Finite mixture of multivariate Gaussians.
///
/// Constructed unfitted with a fixed `order` (number of components) and
/// [`MixtureOptions`]; [`fit`](Self::fit) trains it on an `n × d` matrix and
/// [`score`](Self::score) returns `ln p(x)` for a single `d`-vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MixtureRecord", into = "MixtureRecord")]
pub struct GaussianMixture {
    order: usize,
    options: MixtureOptions,
    components: Option<Components>,
}

impl GaussianMixture {
    /// Create an unfitted mixture with `order` components.
    ///
    /// # Errors
    /// - [`MixtureError::InvalidOrder`] if `order == 0`.
    pub fn new(order: usize, options: MixtureOptions) -> MixtureResult<Self> {
        if order == 0 {
            return Err(MixtureError::InvalidOrder { order });
        }
        Ok(Self { order, options, components: None })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn options(&self) -> &MixtureOptions {
        &self.options
    }

    pub fn is_fitted(&self) -> bool {
        self.components.is_some()
    }

    /// Feature dimension of the fitted mixture, `None` before fitting.
    pub fn dimension(&self) -> Option<usize> {
        self.components.as_ref().map(Components::dim)
    }

    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.components.as_ref().map(|c| &c.weights)
    }

    /// Component means as a `order × d` matrix.
    pub fn means(&self) -> Option<&Array2<f64>> {
        self.components.as_ref().map(|c| &c.means)
    }

    pub fn covariances(&self) -> Option<&[Array2<f64>]> {
        self.components.as_ref().map(|c| c.covariances.as_slice())
    }

    /// Fit the mixture to `data` (`n × d`) by EM.
    ///
    /// ## Steps
    /// 1. Validate shape (`d > 0`, `n ≥ order`) and finiteness.
    /// 2. Seed means by farthest-point traversal and refine with Lloyd passes.
    /// 3. Turn the hard assignment into initial responsibilities and
    ///    alternate M/E steps until the mean log-likelihood settles or
    ///    `max_iter` is reached.
    ///
    /// ## Errors
    /// - Validation errors from step 1.
    /// - [`MixtureError::SingularCovariance`] if a component cannot be
    ///   factorized despite the ridge.
    ///
    /// On error the previously fitted components (if any) are kept.
    pub fn fit(&mut self, data: ArrayView2<f64>) -> MixtureResult<FitSummary> {
        validate_training(data, self.order)?;
        let (n, k) = (data.nrows(), self.order);

        let mut means = seed_means(data, k);
        let labels = lloyd(data, &mut means);
        let mut resp = Array2::<f64>::zeros((n, k));
        for (i, &label) in labels.iter().enumerate() {
            resp[[i, label]] = 1.0;
        }

        let mut summary =
            FitSummary { iterations: 0, converged: false, mean_log_likelihood: f64::NEG_INFINITY };
        let mut previous = f64::NEG_INFINITY;
        let mut components = m_step(data, &resp, &self.options)?;
        for iteration in 1..=self.options.max_iter {
            let mean_ll = e_step(data, &components, &mut resp);
            summary.iterations = iteration;
            summary.mean_log_likelihood = mean_ll;
            if (mean_ll - previous).abs() <= self.options.tol * mean_ll.abs().max(1.0) {
                summary.converged = true;
                break;
            }
            previous = mean_ll;
            components = m_step(data, &resp, &self.options)?;
        }
        if !summary.converged {
            tracing::debug!(
                order = k,
                iterations = summary.iterations,
                "EM stopped at the iteration cap before converging"
            );
        }
        self.components = Some(components);
        Ok(summary)
    }

    /// Log-likelihood `ln p(x)` of one feature vector.
    ///
    /// # Errors
    /// - [`MixtureError::NotFitted`] before a successful fit.
    /// - [`MixtureError::DimensionMismatch`] if `x.len()` differs from the
    ///   fitted dimension.
    pub fn score(&self, x: ArrayView1<f64>) -> MixtureResult<f64> {
        let components = self.components.as_ref().ok_or(MixtureError::NotFitted)?;
        if x.len() != components.dim() {
            return Err(MixtureError::DimensionMismatch {
                expected: components.dim(),
                actual: x.len(),
            });
        }
        let mut log_probs = vec![0.0; self.order];
        components.component_log_probs(x, &mut log_probs);
        Ok(log_sum_exp(&log_probs))
    }
}

/// Numerically stable `ln Σ exp(vᵢ)`; `-∞` for empty or all-`-∞` input.
pub(crate) fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn validate_training(data: ArrayView2<f64>, order: usize) -> MixtureResult<()> {
    let (rows, cols) = data.dim();
    if cols == 0 {
        return Err(MixtureError::EmptyFeatureSpace);
    }
    if rows < order || rows == 0 {
        return Err(MixtureError::TooFewRows { rows, order });
    }
    if let Some(((row, col), &value)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(MixtureError::NonFiniteData { row, col, value });
    }
    Ok(())
}

fn sq_dist(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest_center(row: ArrayView1<f64>, means: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, center) in means.outer_iter().enumerate() {
        let dist = sq_dist(row, center);
        if dist < best_dist {
            best = c;
            best_dist = dist;
        }
    }
    best
}

/// Farthest-point seeding starting from the first row.
fn seed_means(data: ArrayView2<f64>, k: usize) -> Array2<f64> {
    let mut means = Array2::<f64>::zeros((k, data.ncols()));
    means.row_mut(0).assign(&data.row(0));
    let mut nearest: Vec<f64> = data.outer_iter().map(|row| sq_dist(row, data.row(0))).collect();
    for c in 1..k {
        let mut pick = 0;
        let mut pick_dist = f64::NEG_INFINITY;
        for (i, &dist) in nearest.iter().enumerate() {
            if dist > pick_dist {
                pick = i;
                pick_dist = dist;
            }
        }
        means.row_mut(c).assign(&data.row(pick));
        for (i, row) in data.outer_iter().enumerate() {
            nearest[i] = nearest[i].min(sq_dist(row, data.row(pick)));
        }
    }
    means
}

/// Lloyd passes; empty clusters keep their previous center.
fn lloyd(data: ArrayView2<f64>, means: &mut Array2<f64>) -> Vec<usize> {
    let k = means.nrows();
    let mut labels = vec![0usize; data.nrows()];
    for pass in 0..LLOYD_ITERS {
        let mut changed = pass == 0;
        for (i, row) in data.outer_iter().enumerate() {
            let label = nearest_center(row, means);
            if label != labels[i] {
                labels[i] = label;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        let mut sums = Array2::<f64>::zeros(means.raw_dim());
        let mut counts = vec![0usize; k];
        for (i, row) in data.outer_iter().enumerate() {
            let mut target = sums.row_mut(labels[i]);
            target += &row;
            counts[labels[i]] += 1;
        }
        for (c, &count) in counts.iter().enumerate() {
            if count > 0 {
                let centroid = &sums.row(c) / count as f64;
                means.row_mut(c).assign(&centroid);
            }
        }
    }
    labels
}

fn m_step(
    data: ArrayView2<f64>, resp: &Array2<f64>, options: &MixtureOptions,
) -> MixtureResult<Components> {
    let nk = resp.sum_axis(Axis(0)).mapv(|v| v + WEIGHT_FLOOR);
    let mut weights = nk.clone();
    weights /= nk.sum();

    let mut means = resp.t().dot(&data);
    for (mut row, &count) in means.outer_iter_mut().zip(nk.iter()) {
        row /= count;
    }

    let mut covariances = Vec::with_capacity(nk.len());
    for (j, mean) in means.outer_iter().enumerate() {
        let diff = &data - &mean;
        let weighted = &diff * &resp.column(j).insert_axis(Axis(1));
        let raw = weighted.t().dot(&diff) / nk[j];
        let mut cov = match options.covariance {
            CovarianceKind::Full => (&raw + &raw.t()) * 0.5,
            CovarianceKind::Diagonal => Array2::from_diag(&raw.diag()),
        };
        cov.diag_mut().mapv_inplace(|v| v + options.reg_covar);
        covariances.push(cov);
    }
    Components::from_parts(weights, means, covariances)
}

/// Fills `resp` and returns the mean per-row log-likelihood.
fn e_step(data: ArrayView2<f64>, components: &Components, resp: &mut Array2<f64>) -> f64 {
    let k = components.weights.len();
    let mut log_probs = vec![0.0; k];
    let mut total = 0.0;
    let mut counted = 0usize;
    for (i, row) in data.outer_iter().enumerate() {
        components.component_log_probs(row, &mut log_probs);
        let lse = log_sum_exp(&log_probs);
        let mut resp_row = resp.row_mut(i);
        if lse.is_finite() {
            for (r, &lp) in resp_row.iter_mut().zip(log_probs.iter()) {
                *r = (lp - lse).exp();
            }
            total += lse;
            counted += 1;
        } else {
            resp_row.fill(1.0 / k as f64);
        }
    }
    if counted == 0 { f64::NEG_INFINITY } else { total / counted as f64 }
}

// ---- Persisted record -----------------------------------------------------

#[derive(Serialize, Deserialize)]
struct MixtureRecord {
    order: usize,
    options: MixtureOptions,
    components: Option<ComponentsRecord>,
}

#[derive(Serialize, Deserialize)]
struct ComponentsRecord {
    weights: Array1<f64>,
    means: Array2<f64>,
    covariances: Vec<Array2<f64>>,
}

impl From<GaussianMixture> for MixtureRecord {
    fn from(mixture: GaussianMixture) -> Self {
        MixtureRecord {
            order: mixture.order,
            options: mixture.options,
            components: mixture.components.map(|c| ComponentsRecord {
                weights: c.weights,
                means: c.means,
                covariances: c.covariances,
            }),
        }
    }
}

impl TryFrom<MixtureRecord> for GaussianMixture {
    type Error = MixtureError;

    fn try_from(record: MixtureRecord) -> MixtureResult<Self> {
        let mut mixture = GaussianMixture::new(record.order, record.options)?;
        let Some(parts) = record.components else {
            return Ok(mixture);
        };
        let k = record.order;
        let d = parts.means.ncols();
        if parts.weights.len() != k || parts.means.nrows() != k || parts.covariances.len() != k {
            return Err(MixtureError::InconsistentRecord {
                reason: format!(
                    "expected {k} components, found {} weights, {} means, {} covariances",
                    parts.weights.len(),
                    parts.means.nrows(),
                    parts.covariances.len()
                ),
            });
        }
        if d == 0 {
            return Err(MixtureError::InconsistentRecord { reason: "zero dimension".into() });
        }
        if let Some(j) = parts.covariances.iter().position(|c| c.dim() != (d, d)) {
            return Err(MixtureError::InconsistentRecord {
                reason: format!("covariance {j} is not {d}x{d}"),
            });
        }
        if parts.weights.iter().any(|w| !w.is_finite() || *w <= 0.0)
            || parts.means.iter().any(|v| !v.is_finite())
        {
            return Err(MixtureError::InconsistentRecord {
                reason: "non-finite or non-positive parameters".into(),
            });
        }
        mixture.components =
            Some(Components::from_parts(parts.weights, parts.means, parts.covariances)?);
        Ok(mixture)
    }
}
