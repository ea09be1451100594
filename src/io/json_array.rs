//! Incremental JSON array writer and the batch merger built on it.
//!
//! This module provides:
//! - **Streaming writer**: [`JsonArrayWriter`] emits `[`, comma-separated elements
//!   and `]` to any `Write` sink, flushing every `flush_interval` elements
//! - **File writers**: [`write_values_to_array_file`], [`write_json_lines_to_array_file`],
//!   [`write_multiple_json_lines_to_array_file`]
//! - **Merger**: [`combine_json_array_files`] concatenates the elements of several
//!   JSON array files into one array without materializing any of them
//!
//! # Notes
//! - Output is compact: no whitespace between brackets, commas and elements.
//! - Pre-encoded fragments (NDJSON lines, raw array elements) are validated but copied
//!   byte for byte, never re-encoded.
//! - A failed call may leave a partial file behind; its content is undefined.

use crate::error::{Error, IoContext, Result};
use crate::io::compression::open_source;
use crate::io::json::for_each_array_element;
use crate::io::{DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_INTERVAL};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Buffering knobs shared by every array writer. Zero means "use the default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriterOptions {
    /// Capacity of the output buffer in bytes.
    pub buffer_size: usize,
    /// Elements written between explicit flushes.
    pub flush_interval: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl WriterOptions {
    #[must_use]
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, elements: usize) -> Self {
        self.flush_interval = elements;
        self
    }

    #[must_use]
    pub fn effective_buffer_size(&self) -> usize {
        if self.buffer_size == 0 { DEFAULT_BUFFER_SIZE } else { self.buffer_size }
    }

    #[must_use]
    pub fn effective_flush_interval(&self) -> usize {
        if self.flush_interval == 0 { DEFAULT_FLUSH_INTERVAL } else { self.flush_interval }
    }
}

/// Writes one JSON array to `W`, element by element.
///
/// The opening bracket is written by [`JsonArrayWriter::new`]; the array is only
/// complete after [`JsonArrayWriter::finish`].
///
/// # Example
/// ```
/// use datastrand::io::json_array::{JsonArrayWriter, WriterOptions};
/// use serde_json::json;
///
/// let mut out = Vec::new();
/// let mut w = JsonArrayWriter::new(&mut out, &WriterOptions::default())?;
/// w.push_value(&json!({"id": 1}))?;
/// w.push_json_text(r#"{"id":2}"#)?;
/// assert_eq!(w.finish()?, 2);
/// assert_eq!(out, br#"[{"id":1},{"id":2}]"#);
/// # Ok::<(), datastrand::Error>(())
/// ```
pub struct JsonArrayWriter<W: Write> {
    inner: W,
    count: usize,
    flush_interval: usize,
    since_flush: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Start an array on `inner`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the opening bracket cannot be written.
    pub fn new(mut inner: W, options: &WriterOptions) -> Result<Self> {
        inner
            .write_all(b"[")
            .io_context(|| "write array start".to_string())?;
        Ok(Self {
            inner,
            count: 0,
            flush_interval: options.effective_flush_interval(),
            since_flush: 0,
        })
    }

    /// Elements written so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    fn begin_element(&mut self) -> Result<()> {
        if self.count > 0 {
            self.inner
                .write_all(b",")
                .io_context(|| format!("write separator before element #{}", self.count + 1))?;
        }
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        self.count += 1;
        self.since_flush += 1;
        if self.since_flush >= self.flush_interval {
            self.inner
                .flush()
                .io_context(|| format!("flush after element #{}", self.count))?;
            self.since_flush = 0;
        }
        Ok(())
    }

    /// Serialize `value` as the next element.
    ///
    /// The value is encoded before anything is written, so a value with no JSON form
    /// leaves the array untouched.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if `value` cannot be represented as JSON (e.g. a map
    /// with non-string keys), or [`Error::Io`] if the write fails.
    pub fn push_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let location = format!("element #{}", self.count + 1);
        let text = serde_json::to_string(value).map_err(|e| Error::parse(&location, None, e))?;
        self.begin_element()?;
        self.inner
            .write_all(text.as_bytes())
            .io_context(|| format!("write {location}"))?;
        self.end_element()
    }

    /// Copy an already-encoded element verbatim.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the write fails.
    pub fn push_raw(&mut self, raw: &RawValue) -> Result<()> {
        self.begin_element()?;
        self.inner
            .write_all(raw.get().as_bytes())
            .io_context(|| format!("write element #{}", self.count + 1))?;
        self.end_element()
    }

    /// Validate `text` as exactly one JSON value and append it.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if `text` is not a single JSON value, or
    /// [`Error::Io`] if the write fails.
    pub fn push_json_text(&mut self, text: &str) -> Result<()> {
        let location = format!("element #{}", self.count + 1);
        let raw = parse_raw(text, &location, None)?;
        self.push_raw(raw)
    }

    /// Close the array and flush the sink.
    ///
    /// # Returns
    /// The number of elements written.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the closing bracket or the final flush fails.
    pub fn finish(mut self) -> Result<usize> {
        self.inner
            .write_all(b"]")
            .io_context(|| "write array end".to_string())?;
        self.inner
            .flush()
            .io_context(|| "flush array".to_string())?;
        Ok(self.count)
    }
}

/// Check that `text` is one JSON value, borrowing it as a raw fragment.
pub(crate) fn parse_raw<'a>(
    text: &'a str,
    location: &str,
    line: Option<usize>,
) -> Result<&'a RawValue> {
    serde_json::from_str::<&RawValue>(text).map_err(|e| match line {
        Some(n) => Error::parse(location, Some(n), format!("invalid JSON on line {n}: {e}")),
        None => Error::parse(location, None, format!("invalid JSON: {e}")),
    })
}

/// Non-blank lines of an NDJSON text with their 1-based line numbers.
pub(crate) fn non_blank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

/// Create `path` (and its parent directories) and start an array writer on it.
pub(crate) fn create_array_file(
    path: &Path,
    options: &WriterOptions,
) -> Result<JsonArrayWriter<BufWriter<File>>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).io_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).io_context(|| format!("create {}", path.display()))?;
    JsonArrayWriter::new(BufWriter::with_capacity(options.effective_buffer_size(), f), options)
}

/// Write every item of `values` as one JSON array file.
///
/// * Creates parent directories if they don't exist.
/// * Items are serialized one at a time; the input iterator is never collected.
///
/// # Returns
/// The number of elements written.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be created or written.
pub fn write_values_to_array_file<I>(
    values: I,
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<usize>
where
    I: IntoIterator,
    I::Item: Serialize,
{
    let path = path.as_ref();
    let mut w = create_array_file(path, options)?;
    for v in values {
        w.push_value(&v)?;
    }
    let n = w.finish()?;
    tracing::debug!(path = %path.display(), elements = n, "wrote JSON array");
    Ok(n)
}

/// Write an NDJSON text as one JSON array file.
///
/// Blank lines are skipped; every other line must be one JSON value and is copied
/// verbatim.
///
/// # Errors
/// Returns [`Error::Parse`] naming the first invalid line, or [`Error::Io`].
pub fn write_json_lines_to_array_file(
    json_lines: &str,
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<usize> {
    write_multiple_json_lines_to_array_file(&[json_lines], path, options)
}

/// Write several NDJSON texts, in order, as one JSON array file.
///
/// Empty batches contribute nothing. Errors name the batch (`batch #i`, 1-based) and
/// the line within it.
///
/// # Errors
/// Returns [`Error::Parse`] for an invalid line, or [`Error::Io`].
pub fn write_multiple_json_lines_to_array_file<S: AsRef<str>>(
    batches: &[S],
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<usize> {
    let path = path.as_ref();
    let mut w = create_array_file(path, options)?;
    for (i, batch) in batches.iter().enumerate() {
        let location = format!("batch #{}", i + 1);
        for (line_no, line) in non_blank_lines(batch.as_ref()) {
            w.push_raw(parse_raw(line, &location, Some(line_no))?)?;
        }
    }
    let n = w.finish()?;
    tracing::debug!(path = %path.display(), batches = batches.len(), elements = n, "wrote JSON lines as array");
    Ok(n)
}

/// Merge JSON array files, in input order, into one array at `output`.
///
/// Each input is streamed element by element (gzip inputs are decoded transparently)
/// and its elements are copied without re-encoding.
///
/// # Returns
/// The total number of elements written.
///
/// # Errors
/// Returns [`Error::Io`] if an input cannot be opened or the output cannot be
/// written, and [`Error::Parse`] naming the input that is not one complete
/// top-level array.
pub fn combine_json_array_files<P: AsRef<Path>>(
    inputs: &[P],
    output: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<usize> {
    let output = output.as_ref();
    let mut w = create_array_file(output, options)?;
    for input in inputs {
        let input = input.as_ref();
        let location = input.display().to_string();
        let reader = open_source(input, options.effective_buffer_size())?;
        let n = for_each_array_element(reader, &location, |raw: Box<RawValue>| w.push_raw(&raw))?;
        tracing::debug!(input = %location, elements = n, "merged JSON array");
    }
    let total = w.finish()?;
    tracing::debug!(output = %output.display(), inputs = inputs.len(), elements = total, "combined JSON arrays");
    Ok(total)
}
