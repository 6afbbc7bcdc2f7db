//! Model kind table: numeric discriminants and exact-match names.
use crate::temporal::errors::{TemporalError, TemporalResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Every strategy the factory can be asked for.
///
/// The discriminant doubles as the leading element of exported arrays, so the
/// numbering is part of the interchange format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalKind {
    None = 0,
    Mean = 1,
    Histogram = 2,
    FreMEn = 3,
    HyperTime = 4,
    /// Hypertime served by an external backend.
    HyperTimeExternal = 5,
    /// Periodic Gaussian mixture. No in-crate implementation.
    Gaussian = 6,
    /// Adaptive histogram. No in-crate implementation.
    Adaptive = 7,
    VonMises = 8,
}

impl TemporalKind {
    pub const ALL: [TemporalKind; 9] = [
        TemporalKind::None,
        TemporalKind::Mean,
        TemporalKind::Histogram,
        TemporalKind::FreMEn,
        TemporalKind::HyperTime,
        TemporalKind::HyperTimeExternal,
        TemporalKind::Gaussian,
        TemporalKind::Adaptive,
        TemporalKind::VonMises,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    /// Name used by the factory and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            TemporalKind::None => "None",
            TemporalKind::Mean => "Mean",
            TemporalKind::Histogram => "Hist",
            TemporalKind::FreMEn => "FreMEn",
            TemporalKind::HyperTime => "HyT-EM",
            TemporalKind::HyperTimeExternal => "HyT-KM",
            TemporalKind::Gaussian => "Gaussian",
            TemporalKind::Adaptive => "Adaptive",
            TemporalKind::VonMises => "VonMises",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| i64::from(kind.id()) == id)
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemporalKind {
    type Err = TemporalError;

    fn from_str(s: &str) -> TemporalResult<Self> {
        Self::from_name(s).ok_or_else(|| TemporalError::UnknownKind { name: s.to_string() })
    }
}
