//! hypertime — periodicity-augmented Gaussian mixture estimator.
//!
//! The estimator lives in [`estimator`]; the feature space, options, update
//! report and persistence formats are split into their own modules.
pub mod estimator;
pub mod features;
pub mod options;
pub mod persist;
pub mod report;

pub use self::estimator::HypertimeEstimator;
pub use self::options::HypertimeOptions;
pub use self::report::{StopReason, UpdateReport};
