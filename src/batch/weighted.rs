//! Weighted re-sampling of compressed batch groups.
//!
//! Each [`WeightedGroup`] is a list of batches plus a target record count. The
//! batches are decoded and concatenated, then cut or cycled to exactly `target`
//! records:
//!
//! - `n == target`: unchanged
//! - `n > target`: the first `target` records
//! - `n < target`: `records[i % n]` for `i in 0..target`
//!
//! Groups are written in input order into one JSON array. A target of zero skips
//! the group, and so does a group that decodes to no records.

use crate::batch::codec::{CompressedBatch, decode_values};
use crate::error::{Error, Result};
use crate::io::json_array::{WriterOptions, create_array_file};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

const ENTRY_SHAPE: &str = "expected [multipleCompressedJsonLines, weight]";

/// Batches to combine and the number of records they must yield.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedGroup {
    pub batches: Vec<CompressedBatch>,
    pub target: usize,
}

impl WeightedGroup {
    #[must_use]
    pub fn new(batches: Vec<CompressedBatch>, target: usize) -> Self {
        Self { batches, target }
    }
}

/// Truncate or cyclically repeat `records` to exactly `target` items.
///
/// An empty input yields an empty output whatever the target.
///
/// # Example
/// ```
/// use datastrand::batch::weighted::resample;
///
/// assert_eq!(resample(&["a", "b"], 5), vec!["a", "b", "a", "b", "a"]);
/// assert_eq!(resample(&["a", "b", "c"], 2), vec!["a", "b"]);
/// ```
#[must_use]
pub fn resample<T: Clone>(records: &[T], target: usize) -> Vec<T> {
    records.iter().cycle().take(target).cloned().collect()
}

/// Decode every group, resample it to its target, and write all groups as one
/// JSON array file.
///
/// # Returns
/// The number of records written: the sum of the targets of all non-skipped groups.
///
/// # Errors
/// Returns [`Error::Decode`] naming the group and batch (`group g batch b`, 1-based)
/// whose decoding failed, or [`Error::Io`].
pub fn write_weighted_batches_to_array_file(
    groups: &[WeightedGroup],
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<usize> {
    let path = path.as_ref();
    let mut w = create_array_file(path, options)?;
    for (g, group) in groups.iter().enumerate() {
        if group.target == 0 {
            tracing::debug!(group = g + 1, "skipping group with zero target");
            continue;
        }
        let mut records = Vec::new();
        for (b, batch) in group.batches.iter().enumerate() {
            if batch.is_empty() {
                continue;
            }
            records.extend(decode_values(batch, &format!("group {} batch {}", g + 1, b + 1))?);
        }
        if records.is_empty() {
            tracing::warn!(group = g + 1, target = group.target, "weighted group has no records");
            continue;
        }
        tracing::debug!(
            group = g + 1,
            records = records.len(),
            target = group.target,
            "resampling weighted group"
        );
        for v in resample(&records, group.target) {
            w.push_value(&v)?;
        }
    }
    let n = w.finish()?;
    tracing::debug!(path = %path.display(), groups = groups.len(), elements = n, "wrote weighted batches");
    Ok(n)
}

/// Read loosely shaped `[[batch, ...], weight]` entries into groups.
///
/// Weights may be integers or floats (truncated toward zero); a weight of zero or
/// less becomes a zero target.
///
/// # Errors
/// Returns [`Error::Config`] if an entry is not a two-element array, its first
/// element is not an array of strings, or its weight is not a number.
pub fn parse_weighted_groups(value: &Value) -> Result<Vec<WeightedGroup>> {
    let entries = value
        .as_array()
        .ok_or_else(|| Error::Config(format!("weighted batches: {ENTRY_SHAPE} entries")))?;
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i + 1, entry))
        .collect()
}

fn parse_entry(index: usize, entry: &Value) -> Result<WeightedGroup> {
    let [batches, weight] = entry.as_array().map(Vec::as_slice).unwrap_or_default() else {
        return Err(Error::Config(format!("entry #{index}: {ENTRY_SHAPE}")));
    };
    let batches = batches
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|b| b.as_str().map(CompressedBatch::from_envelope))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| {
            Error::Config(format!("entry #{index}: batches must be an array of strings"))
        })?;
    let weight = weight
        .as_f64()
        .ok_or_else(|| Error::Config(format!("entry #{index}: invalid weight {weight}: expected number")))?;
    let target = if weight >= 1.0 { weight.trunc() as usize } else { 0 };
    Ok(WeightedGroup { batches, target })
}
