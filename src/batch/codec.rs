//! Compressed NDJSON batches.
//!
//! A [`CompressedBatch`] is NDJSON text (one compact JSON value per line, no
//! trailing newline), gzip-compressed and wrapped in standard base64. The string
//! is opaque; only this module produces or opens one.
//!
//! Decoding fails in one of three [`DecodeStage`]s: base64 envelope,
//! decompression, or line parsing. Errors name the batch and the stage.

use crate::error::{DecodeStage, Error, IoContext, Result};
use crate::io::json_array::{JsonArrayWriter, WriterOptions, create_array_file, non_blank_lines};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;
use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Highest accepted compression level; `0` stores without compressing.
pub const MAX_COMPRESSION_LEVEL: i64 = 9;

/// Opaque text envelope around a compressed NDJSON payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressedBatch(String);

impl CompressedBatch {
    /// Wrap envelope text received from elsewhere. Nothing is checked until decoding.
    #[must_use]
    pub fn from_envelope(text: impl Into<String>) -> Self {
        CompressedBatch(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// An empty envelope stands for "no batch" and is skipped by multi-batch readers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CompressedBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CompressedBatch {
    fn from(s: String) -> Self {
        CompressedBatch(s)
    }
}

impl AsRef<str> for CompressedBatch {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render values as NDJSON: one compact value per line, no trailing newline.
///
/// # Errors
/// Returns [`Error::Parse`] if a value cannot be represented as JSON (e.g. a map
/// with non-string keys).
pub fn to_json_lines<T: Serialize>(values: &[T]) -> Result<String> {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line = serde_json::to_string(v)
            .map_err(|e| Error::parse(format!("value #{}", i + 1), None, e))?;
        out.push_str(&line);
    }
    Ok(out)
}

/// Parse NDJSON text; blank lines are skipped.
///
/// # Errors
/// Returns [`Error::Parse`] with the 1-based number of the first invalid line.
pub fn json_lines_to_values(text: &str) -> Result<Vec<Value>> {
    non_blank_lines(text)
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                Error::parse("<json lines>", Some(n), format!("invalid JSON on line {n}: {e}"))
            })
        })
        .collect()
}

/// Map a requested level onto gzip's range; anything outside `0..=9` is the default.
#[must_use]
pub fn resolve_level(level: Option<i64>) -> Compression {
    match level {
        Some(l @ 0..=MAX_COMPRESSION_LEVEL) => Compression::new(l as u32),
        None | Some(-1) => Compression::default(),
        Some(l) => {
            tracing::warn!(level = l, "compression level out of range, using default");
            Compression::default()
        }
    }
}

/// Compress NDJSON text into a batch envelope.
///
/// # Errors
/// Returns [`Error::Io`] if the encoder fails.
pub fn compress_json_lines(text: &str, level: Option<i64>) -> Result<CompressedBatch> {
    let mut enc = GzEncoder::new(Vec::new(), resolve_level(level));
    enc.write_all(text.as_bytes())
        .io_context(|| "compress JSON lines".to_string())?;
    let bytes = enc
        .finish()
        .io_context(|| "finish gzip stream".to_string())?;
    Ok(CompressedBatch(STANDARD.encode(bytes)))
}

/// Serialize `values` as NDJSON and compress them into a batch envelope.
///
/// An empty slice yields a valid envelope that decodes to no values.
///
/// # Errors
/// See [`to_json_lines`] and [`compress_json_lines`].
pub fn compress_values<T: Serialize>(values: &[T], level: Option<i64>) -> Result<CompressedBatch> {
    compress_json_lines(&to_json_lines(values)?, level)
}

/// Open the envelope and return a reader over the decompressed NDJSON.
fn open_batch(batch: &CompressedBatch, location: &str) -> Result<impl BufRead> {
    let bytes = STANDARD
        .decode(batch.as_str())
        .map_err(|e| Error::decode(location, DecodeStage::Envelope, e))?;
    Ok(BufReader::new(GzDecoder::new(std::io::Cursor::new(bytes))))
}

/// Decompressed NDJSON text of one batch.
///
/// # Errors
/// Returns [`Error::Decode`] at the [`DecodeStage::Envelope`] or
/// [`DecodeStage::Decompression`] stage.
pub fn decompress_to_json_lines(batch: &CompressedBatch) -> Result<String> {
    decompress_text(batch, "batch")
}

fn decompress_text(batch: &CompressedBatch, location: &str) -> Result<String> {
    let mut bytes = Vec::new();
    open_batch(batch, location)?
        .read_to_end(&mut bytes)
        .map_err(|e| Error::decode(location, DecodeStage::Decompression, e))?;
    String::from_utf8(bytes).map_err(|e| {
        let bad = e.utf8_error();
        let line = 1 + e.as_bytes()[..bad.valid_up_to()]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        Error::decode(location, DecodeStage::Line, format!("line {line}: {bad}"))
    })
}

/// Decode one batch back into its values, in order. An empty envelope decodes to
/// no values.
///
/// # Errors
/// Returns [`Error::Decode`] naming the failing [`DecodeStage`].
pub fn decompress_batch(batch: &CompressedBatch) -> Result<Vec<Value>> {
    decode_values(batch, "batch")
}

pub(crate) fn decode_values(batch: &CompressedBatch, location: &str) -> Result<Vec<Value>> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }
    let text = decompress_text(batch, location)?;
    non_blank_lines(&text)
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                Error::decode(location, DecodeStage::Line, format!("line {n}: {e}"))
            })
        })
        .collect()
}

/// Decode several batches and concatenate their values. Empty envelopes are skipped.
///
/// # Errors
/// Returns [`Error::Decode`] naming the batch (`batch #i`, 1-based) and stage.
pub fn decompress_batches(batches: &[CompressedBatch]) -> Result<Vec<Value>> {
    let mut out = Vec::new();
    for (i, batch) in batches.iter().enumerate() {
        if batch.is_empty() {
            continue;
        }
        out.extend(decode_values(batch, &format!("batch #{}", i + 1))?);
    }
    Ok(out)
}

/// Stream one batch's lines into `w` without collecting them.
fn copy_batch_lines<W: Write>(
    batch: &CompressedBatch,
    location: &str,
    w: &mut JsonArrayWriter<W>,
) -> Result<()> {
    let mut reader = open_batch(batch, location)?;
    let mut raw = Vec::new();
    let mut line_no = 0usize;
    loop {
        raw.clear();
        let n = reader
            .read_until(b'\n', &mut raw)
            .map_err(|e| Error::decode(location, DecodeStage::Decompression, e))?;
        if n == 0 {
            return Ok(());
        }
        line_no += 1;
        let text = std::str::from_utf8(&raw)
            .map_err(|e| Error::decode(location, DecodeStage::Line, format!("line {line_no}: {e}")))?
            .trim();
        if text.is_empty() {
            continue;
        }
        let raw = serde_json::from_str::<&RawValue>(text).map_err(|e| {
            Error::decode(location, DecodeStage::Line, format!("line {line_no}: {e}"))
        })?;
        w.push_raw(raw)?;
    }
}

/// Decode one batch and write its values as a JSON array file.
///
/// # Errors
/// Returns [`Error::Decode`] for a bad batch and [`Error::Io`] for write failures.
pub fn write_compressed_batch_to_array_file(
    batch: &CompressedBatch,
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<usize> {
    write_multiple_compressed_batches_to_array_file(std::slice::from_ref(batch), path, options)
}

/// Compress `values`, then write them as a JSON array file through the batch path.
///
/// # Errors
/// See [`compress_values`] and [`write_compressed_batch_to_array_file`].
pub fn write_compressed_values_to_array_file<T: Serialize>(
    values: &[T],
    path: impl AsRef<Path>,
    level: Option<i64>,
    options: &WriterOptions,
) -> Result<usize> {
    let batch = compress_values(values, level)?;
    write_compressed_batch_to_array_file(&batch, path, options)
}

/// Decode several batches, in order, into one JSON array file.
///
/// Lines are validated and copied one at a time. Empty envelopes are skipped.
///
/// # Errors
/// Returns [`Error::Decode`] naming the batch (`batch #i`, 1-based) and stage, or
/// [`Error::Io`].
pub fn write_multiple_compressed_batches_to_array_file(
    batches: &[CompressedBatch],
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<usize> {
    let path = path.as_ref();
    let mut w = create_array_file(path, options)?;
    for (i, batch) in batches.iter().enumerate() {
        if batch.is_empty() {
            continue;
        }
        copy_batch_lines(batch, &format!("batch #{}", i + 1), &mut w)?;
    }
    let n = w.finish()?;
    tracing::debug!(path = %path.display(), batches = batches.len(), elements = n, "wrote compressed batches");
    Ok(n)
}
