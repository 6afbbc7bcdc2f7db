//! Temporal model configuration.
//!
//! A [`TemporalConfig`] is fixed when a model is created and never changes
//! afterwards. It replaces the separate `init` call of the classic temporal
//! model interface: construction takes an already validated configuration.
use crate::temporal::errors::{TemporalError, TemporalResult};
use serde::{Deserialize, Serialize};

/// One day in seconds.
pub const DAY: u32 = 86_400;

/// One week in seconds; the default longest period considered.
pub const WEEK: u32 = 7 * DAY;

/// Default number of periodic elements (spectral candidates, histogram bins).
pub const DEFAULT_ELEMENT_BUDGET: usize = 10;

/// Default sample capacity per model.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 1_000_000;

/// Model configuration.
///
/// Fields:
/// - `max_period` — longest period in seconds (`> 0`).
/// - `element_budget` — number of periodic elements a strategy may use:
///   spectral candidates for FreMEn / hypertime residual search, bins for the
///   histogram (`> 0`).
/// - `class_count` — number of state classes (`≥ 1`); binary models use 1.
/// - `sample_capacity` — maximum number of stored observations (`> 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalConfig {
    pub max_period: u32,
    pub element_budget: usize,
    pub class_count: usize,
    pub sample_capacity: usize,
}

impl TemporalConfig {
    /// Validated configuration with the default sample capacity.
    ///
    /// # Errors
    /// - [`TemporalError::InvalidConfig`] when any field is zero.
    pub fn new(
        max_period: u32, element_budget: usize, class_count: usize,
    ) -> TemporalResult<Self> {
        if max_period == 0 {
            return Err(TemporalError::InvalidConfig {
                name: "max_period",
                value: 0.0,
                reason: "Longest period must be at least one second.",
            });
        }
        if element_budget == 0 {
            return Err(TemporalError::InvalidConfig {
                name: "element_budget",
                value: 0.0,
                reason: "At least one periodic element is required.",
            });
        }
        if class_count == 0 {
            return Err(TemporalError::InvalidConfig {
                name: "class_count",
                value: 0.0,
                reason: "At least one state class is required.",
            });
        }
        Ok(Self { max_period, element_budget, class_count, sample_capacity: DEFAULT_SAMPLE_CAPACITY })
    }

    /// Same configuration with a different sample capacity.
    pub fn with_sample_capacity(self, sample_capacity: usize) -> TemporalResult<Self> {
        if sample_capacity == 0 {
            return Err(TemporalError::InvalidConfig {
                name: "sample_capacity",
                value: 0.0,
                reason: "Sample capacity must be positive.",
            });
        }
        Ok(Self { sample_capacity, ..self })
    }
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            max_period: WEEK,
            element_budget: DEFAULT_ELEMENT_BUDGET,
            class_count: 1,
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
        }
    }
}
