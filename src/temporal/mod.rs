//! temporal — the temporal state model contract and its plumbing.
//!
//! Purpose
//! -------
//! Collect everything a strategy needs to sit behind the common contract:
//! configuration, the kind table, observation storage, the
//! [`TemporalModel`] trait and the [`Temporal`] union, persistence helpers,
//! array interchange, the factory, and the shared error type.
//!
//! Key behaviors
//! -------------
//! - [`ModelFactory`] maps a [`TemporalKind`], name or id to a configured
//!   [`Temporal`], falling back to the no-op strategy for unknown requests.
//! - [`SampleBuffer`] stores observations up to a fixed capacity.
//! - [`storage`] and [`interchange`] give every strategy the same JSON record
//!   and flat-array encodings.
//!
//! Downstream usage
//! ----------------
//! - `models::*` implement [`TemporalModel`].
//! - The CLI and the Python bindings go through [`ModelFactory`].
pub mod config;
pub mod errors;
pub mod factory;
pub mod interchange;
pub mod kind;
pub mod model;
pub mod samples;
pub mod storage;

pub use self::config::TemporalConfig;
pub use self::errors::{TemporalError, TemporalResult};
pub use self::factory::ModelFactory;
pub use self::kind::TemporalKind;
pub use self::model::{Temporal, TemporalModel};
pub use self::samples::{Observation, SampleBuffer};

pub mod prelude {
    pub use super::config::TemporalConfig;
    pub use super::errors::{TemporalError, TemporalResult};
    pub use super::factory::ModelFactory;
    pub use super::kind::TemporalKind;
    pub use super::model::{Temporal, TemporalModel};
    pub use super::samples::Observation;
}
