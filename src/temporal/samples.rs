//! Observation storage.
//!
//! [`SampleBuffer`] is an append-only, arrival-ordered list of
//! [`Observation`]s with a hard capacity. A full buffer refuses new
//! observations with [`TemporalError::CapacityExceeded`] instead of dropping
//! them.
use crate::temporal::errors::{TemporalError, TemporalResult};
use serde::{Deserialize, Serialize};

/// States above this threshold count as positive.
pub const POSITIVE_THRESHOLD: f64 = 0.5;

/// One `(timestamp, state)` observation; `state` is nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: i64,
    pub state: f64,
}

impl Observation {
    /// `state` is expected in `[0, 1]`; range checks happen where
    /// observations enter from outside (see [`crate::io::parse_training`]).
    pub fn new(timestamp: i64, state: f64) -> Self {
        Self { timestamp, state }
    }

    pub fn is_positive(&self) -> bool {
        self.state > POSITIVE_THRESHOLD
    }
}

/// Capacity-bounded observation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBuffer {
    samples: Vec<Observation>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { samples: Vec::new(), capacity }
    }

    /// Append an observation.
    ///
    /// # Errors
    /// - [`TemporalError::CapacityExceeded`] if the buffer is full; the buffer
    ///   is left unchanged.
    pub fn push(&mut self, observation: Observation) -> TemporalResult<()> {
        if self.samples.len() >= self.capacity {
            return Err(TemporalError::CapacityExceeded {
                needed: self.samples.len() + 1,
                capacity: self.capacity,
            });
        }
        self.samples.push(observation);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.samples.iter()
    }

    /// `(positives, negatives)` under [`Observation::is_positive`].
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.samples.iter().filter(|s| s.is_positive()).count();
        (positives, self.samples.len() - positives)
    }
}

impl<'a> IntoIterator for &'a SampleBuffer {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
