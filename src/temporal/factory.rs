//! Model factory: kind, name or id → configured [`Temporal`] strategy.
//!
//! Lookup never fails. Names and ids outside the table, and kinds without an
//! in-crate implementation, resolve to the no-op [`NoneModel`] strategy and
//! log a warning. The externally served hypertime kind resolves to a
//! [`DelegatedModel`] only when a backend constructor has been registered.
use crate::models::{
    baseline::{HistogramModel, MeanModel, NoneModel},
    delegated::{DelegatedModel, ExternalModel},
    fremen::FremenModel,
    hypertime::HypertimeEstimator,
    mises::MisesModel,
};
use crate::temporal::{config::TemporalConfig, kind::TemporalKind, model::Temporal};

/// Builds the backend of a delegated model.
pub type BackendConstructor = Box<dyn Fn(&TemporalConfig) -> Box<dyn ExternalModel>>;

/// Strategy factory with an optional external backend.
#[derive(Default)]
pub struct ModelFactory {
    backend: Option<BackendConstructor>,
}

impl std::fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFactory").field("backend", &self.backend.is_some()).finish()
    }
}

impl ModelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor used for [`TemporalKind::HyperTimeExternal`].
    pub fn with_backend<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&TemporalConfig) -> Box<dyn ExternalModel> + 'static,
    {
        self.backend = Some(Box::new(constructor));
        self
    }

    pub fn create(&self, kind: TemporalKind, config: TemporalConfig) -> Temporal {
        match kind {
            TemporalKind::None => Temporal::None(NoneModel::new(config)),
            TemporalKind::Mean => Temporal::Mean(MeanModel::new(config)),
            TemporalKind::Histogram => Temporal::Histogram(HistogramModel::new(config)),
            TemporalKind::FreMEn => Temporal::FreMEn(FremenModel::new(config)),
            TemporalKind::HyperTime => Temporal::HyperTime(HypertimeEstimator::new(config)),
            TemporalKind::VonMises => Temporal::VonMises(MisesModel::new(config)),
            TemporalKind::HyperTimeExternal => match &self.backend {
                Some(constructor) => {
                    Temporal::Delegated(DelegatedModel::new(config, constructor(&config)))
                }
                None => fallback(kind.name(), config),
            },
            TemporalKind::Gaussian | TemporalKind::Adaptive => fallback(kind.name(), config),
        }
    }

    /// Exact-name lookup in the kind table; unknown names give `None`.
    pub fn create_by_name(&self, name: &str, config: TemporalConfig) -> Temporal {
        match TemporalKind::from_name(name) {
            Some(kind) => self.create(kind, config),
            None => fallback(name, config),
        }
    }

    /// Id lookup in the kind table; unknown ids give `None`.
    pub fn create_by_id(&self, id: i64, config: TemporalConfig) -> Temporal {
        match TemporalKind::from_id(id) {
            Some(kind) => self.create(kind, config),
            None => fallback(&id.to_string(), config),
        }
    }
}

fn fallback(requested: &str, config: TemporalConfig) -> Temporal {
    tracing::warn!(requested, "no implementation for temporal model kind; using None");
    Temporal::None(NoneModel::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{errors::TemporalResult, model::TemporalModel};
    use std::path::Path;

    /// Backend that answers a constant and counts nothing.
    struct ConstantBackend(f64);

    impl ExternalModel for ConstantBackend {
        fn add(&mut self, _timestamp: i64, _state: f64) -> TemporalResult<()> {
            Ok(())
        }
        fn update(&mut self, _order: usize) -> TemporalResult<()> {
            Ok(())
        }
        fn estimate(&self, _timestamp: i64) -> f64 {
            self.0
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
    // Every implemented kind produces a model reporting that kind.
    fn create_returns_requested_kind() {
        let factory = ModelFactory::new();
        for kind in [
            TemporalKind::None,
            TemporalKind::Mean,
            TemporalKind::Histogram,
            TemporalKind::FreMEn,
            TemporalKind::HyperTime,
            TemporalKind::VonMises,
        ] {
            let model = factory.create(kind, TemporalConfig::default());
            assert_eq!(model.kind(), kind);
            assert_eq!(model.config(), &TemporalConfig::default());
        }
    }

    #[test]
    // Purpose
    // -------
    // Unknown names and ids, and kinds without an implementation, fall back
    // to the None strategy instead of failing.
    fn unknown_and_unimplemented_kinds_fall_back_to_none() {
        let factory = ModelFactory::new();
        let config = TemporalConfig::default();
        for model in [
            factory.create_by_name("NoSuchModel", config),
            factory.create_by_name("hyt-em", config),
            factory.create_by_id(42, config),
            factory.create(TemporalKind::Gaussian, config),
            factory.create(TemporalKind::Adaptive, config),
            factory.create(TemporalKind::HyperTimeExternal, config),
        ] {
            assert_eq!(model.kind(), TemporalKind::None);
            assert_eq!(model.predict(12_345), 0.5);
        }
        assert_eq!(factory.create_by_name("HyT-EM", config).kind(), TemporalKind::HyperTime);
        assert_eq!(factory.create_by_id(3, config).kind(), TemporalKind::FreMEn);
    }

    #[test]
    // Purpose
    // -------
    // With a registered backend the external kind is served by it.
    fn registered_backend_serves_external_kind() {
        let factory = ModelFactory::new().with_backend(|_| Box::new(ConstantBackend(0.75)));
        let model = factory.create_by_name("HyT-KM", TemporalConfig::default());
        assert_eq!(model.kind(), TemporalKind::HyperTimeExternal);
        assert_eq!(model.predict(0), 0.75);
    }
}
