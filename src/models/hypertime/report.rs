//! Outcome of one hypertime `update`.
use serde::{Deserialize, Serialize};

/// Why the expansion loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The last round raised the RMS error; the previous round was restored.
    ErrorRegression,
    /// The harmonic feature budget was reached.
    DimensionBudget,
    /// Every candidate period is already active.
    CandidatesExhausted,
    /// EM failed after the first round; the previous round was restored.
    FitFailed,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::ErrorRegression => "error regression",
            StopReason::DimensionBudget => "dimension budget reached",
            StopReason::CandidatesExhausted => "candidate periods exhausted",
            StopReason::FitFailed => "mixture fit failed",
        };
        f.write_str(text)
    }
}

/// Summary of a successful `update`.
///
/// `error_history` holds one RMS value per evaluated round, including a
/// rejected final round. After an [`StopReason::ErrorRegression`] stop the
/// history is therefore two entries longer than `active_periods`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub order: usize,
    pub rounds: usize,
    pub error_history: Vec<f64>,
    pub active_periods: Vec<u32>,
    pub stop: StopReason,
}

/// Verdict on a freshly evaluated round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoundVerdict {
    Accept,
    Reject,
}

/// Reject a round whose RMS exceeds the previous round's; the first round is
/// always accepted.
pub(crate) fn review_round(history: &[f64], rms: f64) -> RoundVerdict {
    match history.last() {
        Some(&previous) if rms > previous => RoundVerdict::Reject,
        _ => RoundVerdict::Accept,
    }
}
