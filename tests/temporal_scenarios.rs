//! Integration tests for the temporal models through the public API.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path callers use: factory construction,
//!   observation intake, training, querying, and persistence.
//! - Exercise the hypertime estimator on realistic periodic patterns rather
//!   than toy edge cases only.
//!
//! Coverage
//! --------
//! - `temporal::ModelFactory`:
//!   - Name and id lookup, including the no-op fallback.
//! - `models::hypertime::HypertimeEstimator` (via `Temporal`):
//!   - Daily period discovery, too-few-samples rejection, untrained
//!     persistence, trained file and array round-trips.
//! - `io`:
//!   - Training/query parsing feeding a model and prediction output.
//!
//! Exclusions
//! ----------
//! - Low-level mixture and detector behavior; covered by unit tests.
//! - Python bindings; exercised from the Python package.
use approx::assert_abs_diff_eq;
use hypertime::{
    io::{parse_queries, parse_training, write_predictions},
    temporal::{
        ModelFactory, Temporal, TemporalConfig, TemporalError, TemporalKind, TemporalModel,
    },
};

const DAY: i64 = 86_400;

/// Purpose
/// -------
/// Build a hypertime model through the factory with default configuration.
fn hypertime() -> Temporal {
    ModelFactory::new().create_by_name("HyT-EM", TemporalConfig::default())
}

/// Purpose
/// -------
/// Feed `n` alternating observations: positive at midnight, negative at noon.
fn feed_day_night(model: &mut Temporal, n: i64) {
    for i in 0..n {
        let day = i / 2;
        if i % 2 == 0 {
            model.add(day * DAY, 1.0).unwrap();
        } else {
            model.add(day * DAY + DAY / 2, 0.0).unwrap();
        }
    }
}

#[test]
// Purpose
// -------
// A clean day/night pattern leads the expansion loop to the daily period.
//
// Given
// -----
// - 200 observations: label 1 at multiples of 86400, label 0 half a day later.
// - update(2).
//
// Expect
// ------
// - The model is trained and 86400 is among the active periods.
// - Midnight predictions exceed noon predictions; all lie in [0, 1].
fn daily_period_is_discovered() {
    // Arrange
    let mut model = hypertime();
    feed_day_night(&mut model, 200);

    // Act
    model.update(2).unwrap();

    // Assert
    assert!(model.is_trained());
    let estimator = model.as_hypertime().unwrap();
    assert!(estimator.active_periods().contains(&86_400));
    assert!(!estimator.error_history().is_empty());
    let later = 150 * DAY;
    let (midnight, noon) = (model.predict(later), model.predict(later + DAY / 2));
    assert!(midnight > noon);
    for p in [midnight, noon] {
        assert!((0.0..=1.0).contains(&p));
    }
}

#[test]
// Purpose
// -------
// Training with too few samples per class fails and leaves the model
// untrained, answering the empirical positive ratio.
//
// Given
// -----
// - 3 positive and 3 negative observations; update(5).
//
// Expect
// ------
// - InsufficientSamples { positives: 3, negatives: 3, order: 5 }.
// - predict returns 3/6 = 0.5.
fn too_few_samples_are_rejected() {
    // Arrange
    let mut model = hypertime();
    for k in 0..3 {
        model.add(k * 1_000, 1.0).unwrap();
        model.add(k * 1_000 + 500, 0.0).unwrap();
    }

    // Act
    let result = model.update(5);

    // Assert
    assert_eq!(
        result,
        Err(TemporalError::InsufficientSamples { positives: 3, negatives: 3, order: 5 })
    );
    assert!(!model.is_trained());
    assert_abs_diff_eq!(model.predict(12_345), 0.5);
}

#[test]
// Purpose
// -------
// An untrained model survives a save/load round-trip into a fresh instance.
//
// Expect
// ------
// - Both instances return the same untrained fallback.
fn untrained_model_round_trips_through_files() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m");
    let model = hypertime();

    // Act
    model.save(&path).unwrap();
    let mut restored = hypertime();
    restored.load(&path).unwrap();

    // Assert
    assert!(!restored.is_trained());
    for t in [0, 43_200, 1_000_000] {
        assert_eq!(restored.predict(t), model.predict(t));
    }
}

#[test]
// Purpose
// -------
// Trained state moves between instances through files and flat arrays
// without changing any prediction.
fn trained_model_round_trips() {
    // Arrange
    let mut model = hypertime();
    feed_day_night(&mut model, 120);
    model.update(2).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trained");

    // Act
    model.save(&path).unwrap();
    let mut from_file = hypertime();
    from_file.load(&path).unwrap();

    let mut buffer = vec![0.0; 200_000];
    let used = model.export_to_array(&mut buffer).unwrap();
    let mut from_array = hypertime();
    from_array.import_from_array(&buffer[..used]).unwrap();

    // Assert
    assert!(from_file.is_trained() && from_array.is_trained());
    for t in (0..48).map(|h| 70 * DAY + h * 1_800) {
        assert_eq!(from_file.predict(t), model.predict(t));
        assert_eq!(from_array.predict(t), model.predict(t));
    }
}

#[test]
// Purpose
// -------
// A state buffer written by one kind is refused by another.
fn foreign_array_is_rejected() {
    let mut mean = ModelFactory::new().create(TemporalKind::Mean, TemporalConfig::default());
    mean.add(0, 1.0).unwrap();
    mean.update(1).unwrap();
    let mut buffer = vec![0.0; 10_000];
    let used = mean.export_to_array(&mut buffer).unwrap();

    let mut model = hypertime();
    assert!(matches!(
        model.import_from_array(&buffer[..used]),
        Err(TemporalError::FormatMismatch { field: "kind", .. })
    ));
}

#[test]
// Purpose
// -------
// Factory lookups resolve names and ids, and unknown requests yield the
// no-op strategy answering 0.5.
fn factory_lookup_and_fallback() {
    let factory = ModelFactory::new();
    let config = TemporalConfig::default();
    assert_eq!(factory.create_by_id(4, config).kind(), TemporalKind::HyperTime);
    assert_eq!(factory.create_by_name("FreMEn", config).kind(), TemporalKind::FreMEn);

    let mut unknown = factory.create_by_name("does-not-exist", config);
    assert_eq!(unknown.kind(), TemporalKind::None);
    unknown.add(0, 1.0).unwrap();
    unknown.update(3).unwrap();
    assert_eq!(unknown.predict(0), 0.5);
    assert_eq!(factory.create_by_id(99, config).kind(), TemporalKind::None);
}

#[test]
// Purpose
// -------
// Text files drive the same flow the command-line tool runs.
//
// Given
// -----
// - A training body with 30 days of midnight positives and noon negatives.
// - Two query timestamps.
//
// Expect
// ------
// - Two prediction lines with three decimals, midnight above noon.
fn text_files_drive_training_and_prediction() {
    // Arrange
    let mut training = String::new();
    for d in 0..30 {
        training.push_str(&format!("{} 1\n{} 0\n", d * DAY, d * DAY + DAY / 2));
    }
    let queries = format!("{}\n{}\n", 40 * DAY, 40 * DAY + DAY / 2);
    let mut model = hypertime();

    // Act
    for o in parse_training(&training).unwrap() {
        model.add(o.timestamp, o.state).unwrap();
    }
    model.update(1).unwrap();
    let predictions: Vec<f64> =
        parse_queries(&queries).unwrap().iter().map(|&t| model.predict(t)).collect();
    let mut out = Vec::new();
    write_predictions(&mut out, &predictions).unwrap();

    // Assert
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.len() == 5 && l.as_bytes()[1] == b'.'));
    assert!(predictions[0] > predictions[1]);
}
