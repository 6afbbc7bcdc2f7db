//! Hypertime feature space.
//!
//! A feature vector is the observed state followed by one `(cos, sin)` pair
//! per active period:
//!
//! ```text
//! [state, cos(2πt/P₀), sin(2πt/P₀), cos(2πt/P₁), sin(2πt/P₁), …]
//! ```
//!
//! Column 0 is the state column: the observed value during training, `1`
//! when querying the positive mixture and `0` when querying the negative one.
use crate::spectral::detector::angle;
use crate::temporal::samples::Observation;
use ndarray::{Array1, Array2};

pub const STATE_COLUMN: usize = 0;

/// Feature dimension for `period_count` active periods.
pub fn dimension(period_count: usize) -> usize {
    1 + 2 * period_count
}

/// Feature vector of a single timestamp.
pub fn feature_vector(timestamp: i64, state: f64, periods: &[u32]) -> Array1<f64> {
    let mut x = Array1::<f64>::zeros(dimension(periods.len()));
    x[STATE_COLUMN] = state;
    for (k, &period) in periods.iter().enumerate() {
        let (sin, cos) = angle(timestamp, period).sin_cos();
        x[1 + 2 * k] = cos;
        x[2 + 2 * k] = sin;
    }
    x
}

/// Observations of one class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassSamples {
    timestamps: Vec<i64>,
    states: Vec<f64>,
}

impl ClassSamples {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn push(&mut self, observation: &Observation) {
        self.timestamps.push(observation.timestamp);
        self.states.push(observation.state);
    }

    /// `n × (1 + 2·#periods)` training matrix.
    pub fn matrix(&self, periods: &[u32]) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.len(), dimension(periods.len())));
        for (mut row, (&t, &state)) in
            matrix.outer_iter_mut().zip(self.timestamps.iter().zip(self.states.iter()))
        {
            row.assign(&feature_vector(t, state, periods));
        }
        matrix
    }
}

/// Split observations into `(positives, negatives)`.
pub fn partition(samples: &[Observation]) -> (ClassSamples, ClassSamples) {
    let mut positives = ClassSamples::default();
    let mut negatives = ClassSamples::default();
    for observation in samples {
        if observation.is_positive() {
            positives.push(observation);
        } else {
            negatives.push(observation);
        }
    }
    (positives, negatives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Check column layout: state first, then cos/sin per period in order.
    fn feature_vector_layout() {
        // Quarter day into a daily period, 1/8 of the way into a two-day one.
        let x = feature_vector(21_600, 0.7, &[86_400, 172_800]);
        assert_eq!(x.len(), 5);
        assert_eq!(x[STATE_COLUMN], 0.7);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[3], std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(x[4], std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Partition follows the 0.5 threshold and matrices keep arrival order.
    fn partition_and_matrix() {
        let samples = vec![
            Observation::new(0, 1.0),
            Observation::new(43_200, 0.0),
            Observation::new(86_400, 1.0),
        ];
        let (pos, neg) = partition(&samples);
        assert_eq!((pos.len(), neg.len()), (2, 1));

        let m = pos.matrix(&[86_400]);
        assert_eq!(m.dim(), (2, 3));
        assert_eq!(m.column(0).to_vec(), vec![1.0, 1.0]);
        assert_relative_eq!(m[[1, 1]], 1.0, epsilon = 1e-12);
        assert_eq!(neg.matrix(&[]).dim(), (1, 1));
    }
}
