//! Plain-text training, query, and prediction files.
//!
//! - Training: one `timestamp state` pair per line, whitespace separated.
//!   Timestamps are integer seconds; states are numbers in `[0, 1]`
//!   (usually `0`/`1`).
//! - Queries: one integer timestamp per line.
//! - Predictions: one probability per line with three decimals, in query
//!   order.
//!
//! Blank lines are skipped. Anything else that does not parse is reported
//! with its 1-based line number.
use crate::temporal::{
    errors::{TemporalError, TemporalResult},
    samples::Observation,
};
use std::io::Write;

fn malformed(index: usize, line: &str) -> TemporalError {
    TemporalError::MalformedInput { line: index + 1, content: line.to_string() }
}

/// Parse a training file body.
pub fn parse_training(text: &str) -> TemporalResult<Vec<Observation>> {
    let mut observations = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(first) = fields.next() else {
            continue;
        };
        let (Some(second), None) = (fields.next(), fields.next()) else {
            return Err(malformed(index, line));
        };
        let timestamp: i64 = first.parse().map_err(|_| malformed(index, line))?;
        let state: f64 = second.parse().map_err(|_| malformed(index, line))?;
        if !(0.0..=1.0).contains(&state) {
            return Err(malformed(index, line));
        }
        observations.push(Observation::new(timestamp, state));
    }
    Ok(observations)
}

/// Parse a query file body.
pub fn parse_queries(text: &str) -> TemporalResult<Vec<i64>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| line.trim().parse::<i64>().map_err(|_| malformed(index, line)))
        .collect()
}

/// Write predictions, one `%.3f` value per line.
pub fn write_predictions<W: Write>(writer: &mut W, predictions: &[f64]) -> std::io::Result<()> {
    for p in predictions {
        writeln!(writer, "{p:.3}")?;
    }
    writer.flush()
}
