//! temporal::interchange — versioned flat-array encoding of model state.
//!
//! Purpose
//! -------
//! Let one model's trained state travel inside a plain `f64` buffer so that a
//! composite model can consume it as a feature source.
//!
//! Layout
//! ------
//! ```text
//! [kind_id, format_version, field_count, len₀, payload₀…, len₁, payload₁…, …]
//! ```
//! - `kind_id` is [`TemporalKind::id`]; a reader built for another kind
//!   rejects the buffer with [`TemporalError::FormatMismatch`].
//! - Fields are length-prefixed. Byte fields store one byte per element
//!   (`0.0..=255.0`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Writers never write past the end of the caller's buffer: a payload that
//!   does not fit yields [`TemporalError::CapacityExceeded`] with the total
//!   length that would have been needed.
//! - Readers validate every length against the buffer before slicing.
use crate::temporal::{
    errors::{TemporalError, TemporalResult},
    kind::TemporalKind,
    storage,
};
use serde::{de::DeserializeOwned, Serialize};

/// Current array format version.
pub const FORMAT_VERSION: u32 = 1;

/// Number of header elements before the first field.
pub const HEADER_LEN: usize = 3;

/// Sequential writer over a caller-provided buffer.
#[derive(Debug)]
pub struct ArrayWriter<'a> {
    buffer: &'a mut [f64],
    len: usize,
}

impl<'a> ArrayWriter<'a> {
    /// Write the header for `field_count` fields of `kind`.
    pub fn new(
        buffer: &'a mut [f64], kind: TemporalKind, field_count: usize,
    ) -> TemporalResult<Self> {
        let mut writer = Self { buffer, len: 0 };
        writer.put(&[f64::from(kind.id()), f64::from(FORMAT_VERSION), field_count as f64])?;
        Ok(writer)
    }

    fn put(&mut self, values: &[f64]) -> TemporalResult<()> {
        let end = self.len + values.len();
        if end > self.buffer.len() {
            return Err(TemporalError::CapacityExceeded { needed: end, capacity: self.buffer.len() });
        }
        self.buffer[self.len..end].copy_from_slice(values);
        self.len = end;
        Ok(())
    }

    /// Append a numeric field.
    pub fn field(&mut self, payload: &[f64]) -> TemporalResult<()> {
        let needed = self.len + 1 + payload.len();
        if needed > self.buffer.len() {
            return Err(TemporalError::CapacityExceeded { needed, capacity: self.buffer.len() });
        }
        self.put(&[payload.len() as f64])?;
        self.put(payload)
    }

    /// Append a byte field, one element per byte.
    pub fn bytes_field(&mut self, bytes: &[u8]) -> TemporalResult<()> {
        let payload: Vec<f64> = bytes.iter().map(|&b| f64::from(b)).collect();
        self.field(&payload)
    }

    /// Number of elements written.
    pub fn finish(self) -> usize {
        self.len
    }
}

/// Sequential reader that validates the header on construction.
#[derive(Debug)]
pub struct ArrayReader<'a> {
    buffer: &'a [f64],
    pos: usize,
    field_count: usize,
}

impl<'a> ArrayReader<'a> {
    /// Validate the header against `kind` and [`FORMAT_VERSION`].
    pub fn new(buffer: &'a [f64], kind: TemporalKind) -> TemporalResult<Self> {
        if buffer.len() < HEADER_LEN {
            return Err(TemporalError::TruncatedArray { needed: HEADER_LEN, len: buffer.len() });
        }
        let expect = |field: &'static str, expected: f64, found: f64| {
            if found == expected {
                Ok(())
            } else {
                Err(TemporalError::FormatMismatch { field, expected, found })
            }
        };
        expect("kind", f64::from(kind.id()), buffer[0])?;
        expect("version", f64::from(FORMAT_VERSION), buffer[1])?;
        let field_count = as_count(buffer[2])?;
        // Every field occupies at least its length prefix.
        if field_count > buffer.len() - HEADER_LEN {
            return Err(TemporalError::TruncatedArray {
                needed: HEADER_LEN.saturating_add(field_count),
                len: buffer.len(),
            });
        }
        Ok(Self { buffer, pos: HEADER_LEN, field_count })
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Next numeric field.
    pub fn next_field(&mut self) -> TemporalResult<&'a [f64]> {
        let buffer: &'a [f64] = self.buffer;
        if self.pos >= buffer.len() {
            return Err(TemporalError::TruncatedArray { needed: self.pos + 1, len: buffer.len() });
        }
        let len = as_count(buffer[self.pos])?;
        let start = self.pos + 1;
        if len > buffer.len() - start {
            return Err(TemporalError::TruncatedArray {
                needed: start.saturating_add(len),
                len: buffer.len(),
            });
        }
        let end = start + len;
        self.pos = end;
        Ok(&buffer[start..end])
    }

    /// Next byte field.
    pub fn next_bytes(&mut self) -> TemporalResult<Vec<u8>> {
        self.next_field()?
            .iter()
            .map(|&v| {
                if v.fract() == 0.0 && (0.0..=255.0).contains(&v) {
                    Ok(v as u8)
                } else {
                    Err(TemporalError::InconsistentState {
                        reason: format!("byte field holds non-byte value {v}"),
                    })
                }
            })
            .collect()
    }
}

fn as_count(value: f64) -> TemporalResult<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(TemporalError::InconsistentState {
            reason: format!("length or count is not a non-negative integer: {value}"),
        })
    }
}

/// Export a single serde record as the one byte field of `kind`.
pub fn export_record<T: Serialize>(
    kind: TemporalKind, record: &T, buffer: &mut [f64],
) -> TemporalResult<usize> {
    let bytes = storage::to_bytes(record)?;
    let mut writer = ArrayWriter::new(buffer, kind, 1)?;
    writer.bytes_field(&bytes)?;
    Ok(writer.finish())
}

/// Inverse of [`export_record`].
pub fn import_record<T: DeserializeOwned>(kind: TemporalKind, buffer: &[f64]) -> TemporalResult<T> {
    let mut reader = ArrayReader::new(buffer, kind)?;
    if reader.field_count() != 1 {
        return Err(TemporalError::InconsistentState {
            reason: format!("expected 1 field, header declares {}", reader.field_count()),
        });
    }
    storage::from_bytes(&reader.next_bytes()?)
}
