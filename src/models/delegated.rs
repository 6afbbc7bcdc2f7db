//! Delegated strategy: every operation is forwarded to an external backend.
//!
//! The backend is an opaque [`ExternalModel`] supplied by the caller, for
//! example a model served by another runtime. This crate adds only the
//! contract plumbing: configuration, kind tagging and `[0, 1]` clamping of
//! whatever the backend returns.
use crate::temporal::{
    config::TemporalConfig,
    errors::{TemporalError, TemporalResult},
    kind::TemporalKind,
    model::{clamp_probability, TemporalModel},
};
use std::path::Path;

/// Operations an external backend must provide.
///
/// Array interchange and diagnostics are optional; the defaults report
/// [`TemporalError::Unsupported`] and a generic summary.
pub trait ExternalModel {
    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()>;

    fn update(&mut self, order: usize) -> TemporalResult<()>;

    fn estimate(&self, timestamp: i64) -> f64;

    fn save(&self, path: &Path) -> TemporalResult<()>;

    fn load(&mut self, path: &Path) -> TemporalResult<()>;

    fn is_trained(&self) -> bool {
        true
    }

    fn summary(&self, _verbose: bool) -> String {
        "external backend".to_string()
    }

    fn export_to_array(&self, _buffer: &mut [f64]) -> TemporalResult<usize> {
        Err(TemporalError::Unsupported { kind: "external", operation: "array export" })
    }

    fn import_from_array(&mut self, _buffer: &[f64]) -> TemporalResult<()> {
        Err(TemporalError::Unsupported { kind: "external", operation: "array import" })
    }
}

/// Pass-through temporal model.
pub struct DelegatedModel {
    config: TemporalConfig,
    backend: Box<dyn ExternalModel>,
}

impl std::fmt::Debug for DelegatedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatedModel").field("config", &self.config).finish_non_exhaustive()
    }
}

impl DelegatedModel {
    pub fn new(config: TemporalConfig, backend: Box<dyn ExternalModel>) -> Self {
        Self { config, backend }
    }
}

impl TemporalModel for DelegatedModel {
    fn kind(&self) -> TemporalKind {
        TemporalKind::HyperTimeExternal
    }

    fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn is_trained(&self) -> bool {
        self.backend.is_trained()
    }

    fn add(&mut self, timestamp: i64, state: f64) -> TemporalResult<()> {
        self.backend.add(timestamp, state)
    }

    fn update(&mut self, order: usize) -> TemporalResult<()> {
        self.backend.update(order)
    }

    fn estimate(&self, timestamp: i64) -> f64 {
        clamp_probability(self.backend.estimate(timestamp), 0.5)
    }

    fn summary(&self, verbose: bool) -> String {
        format!("{}: {}", self.kind(), self.backend.summary(verbose))
    }

    fn save(&self, path: &Path) -> TemporalResult<()> {
        self.backend.save(path)
    }

    fn load(&mut self, path: &Path) -> TemporalResult<()> {
        self.backend.load(path)
    }

    fn export_to_array(&self, buffer: &mut [f64]) -> TemporalResult<usize> {
        self.backend.export_to_array(buffer)
    }

    fn import_from_array(&mut self, buffer: &[f64]) -> TemporalResult<()> {
        self.backend.import_from_array(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Backend that records how many observations it saw and answers an
    /// out-of-range constant.
    struct Recording {
        seen: Rc<Cell<usize>>,
    }

    impl ExternalModel for Recording {
        fn add(&mut self, _timestamp: i64, _state: f64) -> TemporalResult<()> {
            self.seen.set(self.seen.get() + 1);
            Ok(())
        }
        fn update(&mut self, _order: usize) -> TemporalResult<()> {
            Ok(())
        }
        fn estimate(&self, _timestamp: i64) -> f64 {
            1.7
        }
        fn save(&self, _path: &Path) -> TemporalResult<()> {
            Ok(())
        }
        fn load(&mut self, _path: &Path) -> TemporalResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Calls reach the backend, estimates are clamped, and unsupported
    // interchange is reported.
    fn forwards_and_clamps() {
        let seen = Rc::new(Cell::new(0));
        let mut model = DelegatedModel::new(
            TemporalConfig::default(),
            Box::new(Recording { seen: Rc::clone(&seen) }),
        );
        model.add(0, 1.0).unwrap();
        model.add(1, 0.0).unwrap();
        assert_eq!(seen.get(), 2);
        assert_eq!(model.predict(5), 1.0);
        assert!(matches!(
            model.export_to_array(&mut [0.0; 8]),
            Err(TemporalError::Unsupported { .. })
        ));
    }
}
