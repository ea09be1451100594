//! JSON source reader with format auto-detection.
//!
//! A source is one of:
//! 1. a top-level array `[{...}, {...}]`, decoded one element at a time
//! 2. a top-level object `{"k": {...}}`, parsed as one unit into a map
//! 3. newline-delimited JSON (NDJSON), one object per non-blank line
//!
//! The first non-whitespace byte decides between them (`[`, `{`, anything else).
//! A file name ending in `.ndjson` or `.jsonl` (optionally followed by `.gz`) forces
//! NDJSON regardless of content, which matters for NDJSON files whose lines start
//! with `{`.
//!
//! # Notes
//! - Array elements are handed to a callback as they are decoded, so the array itself
//!   is never buffered. Only [`read_json`]/[`load_json`] collect the values.
//! - Anything but whitespace after a top-level array or object is a parse error.
//! - An empty source is an empty NDJSON stream.

use crate::error::{Error, IoContext, Result};
use crate::io::DEFAULT_BUFFER_SIZE;
use crate::io::compression::{inner_file_name, open_source};
use serde::de::{self, DeserializeOwned, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

const NDJSON_SUFFIXES: [&str; 2] = [".ndjson", ".jsonl"];

/// Detected layout of a JSON source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    Array,
    Object,
    Lines,
}

/// Everything read from a JSON source.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonDocument {
    /// Elements of a top-level array, or the objects of an NDJSON stream.
    Values(Vec<Value>),
    /// A top-level object. Keys come back in sorted order.
    Object(Map<String, Value>),
}

impl JsonDocument {
    #[must_use]
    pub fn as_values(&self) -> Option<&[Value]> {
        match self {
            JsonDocument::Values(v) => Some(v),
            JsonDocument::Object(_) => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            JsonDocument::Object(m) => Some(m),
            JsonDocument::Values(_) => None,
        }
    }

    /// Number of values, or number of keys for an object document.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            JsonDocument::Values(v) => v.len(),
            JsonDocument::Object(m) => m.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a file name forces line-delimited parsing.
#[must_use]
pub fn is_json_lines_path(path: impl AsRef<Path>) -> bool {
    let name = inner_file_name(path.as_ref());
    NDJSON_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Detect the layout of the source behind `reader`.
///
/// Leading whitespace is consumed; the first significant byte is left unread.
///
/// # Errors
/// Returns [`Error::Io`] if the source cannot be read.
pub fn detect_json_format<R: BufRead>(
    reader: &mut R,
    path_hint: Option<&Path>,
) -> Result<JsonFormat> {
    if path_hint.is_some_and(is_json_lines_path) {
        return Ok(JsonFormat::Lines);
    }
    loop {
        let buf = reader.fill_buf().io_context(|| "read JSON source".to_string())?;
        if buf.is_empty() {
            return Ok(JsonFormat::Lines);
        }
        let skip = buf
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\n' | b'\r' | b'\t'))
            .count();
        if skip < buf.len() {
            let first = buf[skip];
            reader.consume(skip);
            return Ok(match first {
                b'[' => JsonFormat::Array,
                b'{' => JsonFormat::Object,
                _ => JsonFormat::Lines,
            });
        }
        reader.consume(skip);
    }
}

/// Decode a top-level JSON array from `reader`, calling `f` for every element in order.
///
/// Elements are deserialized as `T`; use `Box<serde_json::value::RawValue>` to
/// re-emit them untouched. Returns the number of elements seen.
///
/// # Errors
/// Returns [`Error::Parse`] naming `location` if the source is not one complete
/// array, [`Error::Io`] on read failures, or the first error returned by `f`.
pub fn for_each_array_element<R, T, F>(reader: R, location: &str, mut f: F) -> Result<usize>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let mut de = serde_json::Deserializer::from_reader(reader);
    let mut handler_error = None;
    let visitor = ElementVisitor {
        f: &mut f,
        handler_error: &mut handler_error,
        _t: PhantomData,
    };
    let count = match de.deserialize_seq(visitor) {
        Ok(count) => count,
        Err(e) => return Err(handler_error.unwrap_or_else(|| json_error(location, e))),
    };
    de.end().map_err(|e| json_error(location, e))?;
    Ok(count)
}

struct ElementVisitor<'a, T, F> {
    f: &'a mut F,
    handler_error: &'a mut Option<Error>,
    _t: PhantomData<fn() -> T>,
}

impl<'de, T, F> Visitor<'de> for ElementVisitor<'_, T, F>
where
    T: Deserialize<'de>,
    F: FnMut(T) -> Result<()>,
{
    type Value = usize;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<usize, A::Error> {
        let mut count = 0usize;
        while let Some(item) = seq.next_element::<T>()? {
            if let Err(e) = (self.f)(item) {
                *self.handler_error = Some(e);
                return Err(de::Error::custom("element handler failed"));
            }
            count += 1;
        }
        Ok(count)
    }
}

/// Map a serde_json error onto the crate taxonomy.
pub(crate) fn json_error(location: &str, e: serde_json::Error) -> Error {
    if e.is_io() {
        Error::io(format!("read {location}"), e.into())
    } else {
        let line = e.line();
        Error::parse(location, (line > 0).then_some(line), e)
    }
}

/// Decode NDJSON objects from `reader`, calling `f` for each one in order.
///
/// Blank lines are skipped; every other line must be a single JSON object.
///
/// # Errors
/// Returns [`Error::Parse`] with the 1-based line number of the first bad line.
pub fn for_each_json_line<R, F>(mut reader: R, location: &str, mut f: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(Map<String, Value>) -> Result<()>,
{
    let mut raw = Vec::new();
    let mut line_no = 0usize;
    let mut count = 0usize;
    loop {
        raw.clear();
        let n = reader
            .read_until(b'\n', &mut raw)
            .io_context(|| format!("read {location} line {}", line_no + 1))?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let text = std::str::from_utf8(&raw)
            .map_err(|e| {
                Error::parse(location, Some(line_no), format!("invalid UTF-8 on line {line_no}: {e}"))
            })?
            .trim();
        if text.is_empty() {
            continue;
        }
        let object: Map<String, Value> = serde_json::from_str(text).map_err(|e| {
            Error::parse(location, Some(line_no), format!("invalid JSON object on line {line_no}: {e}"))
        })?;
        f(object)?;
        count += 1;
    }
    Ok(count)
}

/// Visit every value of a source in the given (already detected) format.
///
/// For [`JsonFormat::Object`] the single top-level object is the only value.
///
/// # Errors
/// See [`for_each_array_element`] and [`for_each_json_line`].
pub fn for_each_json_value<R, F>(
    reader: R,
    format: JsonFormat,
    location: &str,
    mut f: F,
) -> Result<usize>
where
    R: BufRead,
    F: FnMut(Value) -> Result<()>,
{
    match format {
        JsonFormat::Array => for_each_array_element(reader, location, f),
        JsonFormat::Object => {
            let object = read_object(reader, location)?;
            f(Value::Object(object))?;
            Ok(1)
        }
        JsonFormat::Lines => for_each_json_line(reader, location, |m| f(Value::Object(m))),
    }
}

fn read_object<R: Read>(reader: R, location: &str) -> Result<Map<String, Value>> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let object = Map::<String, Value>::deserialize(&mut de).map_err(|e| json_error(location, e))?;
    de.end().map_err(|e| json_error(location, e))?;
    Ok(object)
}

/// Read a JSON source of any supported layout.
///
/// `path_hint` is only used for the NDJSON file-name check.
///
/// # Errors
/// Returns [`Error::Parse`] on malformed input and [`Error::Io`] on read failures.
pub fn read_json<R: Read>(reader: R, path_hint: Option<&Path>) -> Result<JsonDocument> {
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, reader);
    let location = path_hint.map_or_else(|| "<input>".to_string(), |p| p.display().to_string());
    read_detected(&mut reader, path_hint, &location)
}

/// Open and read a JSON file of any supported layout.
///
/// Gzip-compressed files are decoded transparently.
///
/// # Errors
/// Returns [`Error::Io`] if the file is missing or unreadable and [`Error::Parse`]
/// for malformed content.
pub fn load_json(path: impl AsRef<Path>) -> Result<JsonDocument> {
    let path = path.as_ref();
    let mut reader = open_source(path, DEFAULT_BUFFER_SIZE)?;
    let doc = read_detected(&mut reader, Some(path), &path.display().to_string())?;
    tracing::debug!(path = %path.display(), values = doc.len(), "loaded JSON source");
    Ok(doc)
}

fn read_detected<R: BufRead>(
    reader: &mut R,
    path_hint: Option<&Path>,
    location: &str,
) -> Result<JsonDocument> {
    match detect_json_format(reader, path_hint)? {
        JsonFormat::Object => Ok(JsonDocument::Object(read_object(reader, location)?)),
        format => {
            let mut values = Vec::new();
            for_each_json_value(reader, format, location, |v| {
                values.push(v);
                Ok(())
            })?;
            Ok(JsonDocument::Values(values))
        }
    }
}
