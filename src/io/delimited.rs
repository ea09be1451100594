//! Delimited-record (CSV-like) streaming reader and writer.
//!
//! This module provides:
//! - **Streaming reader**: [`DelimitedReader`] turns any `BufRead` into a lazy
//!   sequence of [`Row`]s, one physical record at a time
//! - **Whole-file helper**: [`read_delimited_file`]
//! - **Writer**: [`write_delimited_file`], backed by the `csv` crate
//!
//! # Dialect
//! - Fields enclosed in `"` may contain the delimiter and line breaks; `""` inside a
//!   quoted field is one literal quote.
//! - With `lazy_quotes` off, a quote inside an unquoted field, or a quote in a quoted
//!   field that is neither doubled nor followed by a delimiter/line end, is a
//!   [`Error::Parse`] naming the line. With it on, such quotes are kept literally.
//! - `trim_leading_space` drops whitespace after each delimiter, *before* quote
//!   detection, so `a, "b,c"` reads as two fields.
//! - `trim_space` trims both ends of every field after extraction.
//! - Rows are never padded or truncated: each row has as many fields as its line.
//! - Blank lines are skipped and `\r\n` is read as `\n`, also inside quoted fields.

use crate::error::{Error, IoContext, Result};
use crate::io::DEFAULT_BUFFER_SIZE;
use crate::io::compression::open_source;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufWriter};
use std::path::Path;

/// One record: ordered text fields, arity free to vary from row to row.
pub type Row = Vec<String>;

const BARE_QUOTE: &str = "bare quote in non-quoted field";
const STRAY_QUOTE: &str = "extraneous or missing quote in quoted field";

/// Dialect options for [`DelimitedReader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderOptions {
    /// Accept stray quotes literally instead of failing.
    pub lazy_quotes: bool,
    /// Skip whitespace immediately following a delimiter (and at line start).
    pub trim_leading_space: bool,
    /// Trim leading and trailing whitespace from every extracted field.
    pub trim_space: bool,
    /// Performance hint only; reading behavior is identical either way.
    pub reuse_record: bool,
    /// Field separator. Must be ASCII and not a quote or line break.
    pub delimiter: char,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            lazy_quotes: true,
            trim_leading_space: true,
            trim_space: false,
            reuse_record: true,
            delimiter: ',',
        }
    }
}

impl ReaderOptions {
    #[must_use]
    pub fn with_lazy_quotes(mut self, on: bool) -> Self {
        self.lazy_quotes = on;
        self
    }

    #[must_use]
    pub fn with_trim_leading_space(mut self, on: bool) -> Self {
        self.trim_leading_space = on;
        self
    }

    #[must_use]
    pub fn with_trim_space(mut self, on: bool) -> Self {
        self.trim_space = on;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Reject delimiters the tokenizer cannot honor.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for a non-ASCII delimiter, `"`, `\r` or `\n`.
    pub fn validate(&self) -> Result<()> {
        let d = self.delimiter;
        if !d.is_ascii() || matches!(d, '"' | '\r' | '\n') {
            return Err(Error::Config(format!("invalid field delimiter {d:?}")));
        }
        Ok(())
    }
}

/// Streaming tokenizer over a buffered byte source.
///
/// Iterating yields `Result<Row>`; the first error ends the sequence.
pub struct DelimitedReader<R> {
    reader: R,
    options: ReaderOptions,
    source: String,
    raw: Vec<u8>,
    line_number: usize,
    line_terminated: bool,
    records_read: usize,
    finished: bool,
}

impl<R: BufRead> DelimitedReader<R> {
    /// Create a reader. Errors in the input are reported against `<input>`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the options fail [`ReaderOptions::validate`].
    pub fn new(reader: R, options: ReaderOptions) -> Result<Self> {
        Self::with_source_name(reader, options, "<input>")
    }

    /// Create a reader whose errors name `source` (usually the file path).
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the options fail [`ReaderOptions::validate`].
    pub fn with_source_name(
        reader: R,
        options: ReaderOptions,
        source: impl Into<String>,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            reader,
            options,
            source: source.into(),
            raw: Vec::with_capacity(256),
            line_number: 0,
            line_terminated: false,
            records_read: 0,
            finished: false,
        })
    }

    /// Number of physical lines consumed so far.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Number of records produced so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Read the next physical line without its terminator.
    fn next_line(&mut self) -> Result<Option<String>> {
        if !self.options.reuse_record {
            self.raw = Vec::with_capacity(256);
        }
        self.raw.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.raw)
            .io_context(|| format!("read {} line {}", self.source, self.line_number + 1))?;
        if n == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        self.line_terminated = self.raw.last() == Some(&b'\n');
        if self.line_terminated {
            self.raw.pop();
        }
        if self.raw.last() == Some(&b'\r') {
            self.raw.pop();
        }
        match std::str::from_utf8(&self.raw) {
            Ok(s) => Ok(Some(s.to_string())),
            Err(e) => Err(Error::parse(
                self.source.clone(),
                Some(self.line_number),
                format!("invalid UTF-8 on line {}: {e}", self.line_number),
            )),
        }
    }

    fn quote_error(&self, line: &str, byte_pos: usize, what: &str, start_line: usize) -> Error {
        let column = line[..byte_pos.min(line.len())].chars().count() + 1;
        let mut message = format!(
            "parse error on line {}, column {column}: {what}",
            self.line_number
        );
        if start_line != self.line_number {
            message.push_str(&format!(" (record starts on line {start_line})"));
        }
        Error::parse(self.source.clone(), Some(self.line_number), message)
    }

    /// Read one record, or `None` at end of input.
    fn read_record(&mut self) -> Result<Option<Row>> {
        let mut line = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(l) if l.is_empty() => continue,
                Some(l) => break l,
            }
        };
        let start_line = self.line_number;
        let delim = self.options.delimiter;
        let lazy = self.options.lazy_quotes;
        let mut fields = Row::new();
        let mut pos = 0usize;

        'fields: loop {
            if self.options.trim_leading_space {
                let rest = &line[pos..];
                pos += rest.len() - rest.trim_start().len();
            }

            let rest = &line[pos..];
            if !rest.starts_with('"') {
                let end = rest.find(delim).unwrap_or(rest.len());
                let text = &rest[..end];
                if !lazy && let Some(q) = text.find('"') {
                    return Err(self.quote_error(&line, pos + q, BARE_QUOTE, start_line));
                }
                fields.push(text.to_string());
                if end < rest.len() {
                    pos += end + delim.len_utf8();
                    continue 'fields;
                }
                break 'fields;
            }

            // Quoted field, possibly spanning several physical lines.
            let mut field = String::new();
            pos += 1;
            loop {
                let rest = &line[pos..];
                if let Some(q) = rest.find('"') {
                    field.push_str(&rest[..q]);
                    pos += q + 1;
                    match line[pos..].chars().next() {
                        Some('"') => {
                            field.push('"');
                            pos += 1;
                        }
                        Some(c) if c == delim => {
                            pos += c.len_utf8();
                            fields.push(field);
                            continue 'fields;
                        }
                        None => {
                            fields.push(field);
                            break 'fields;
                        }
                        Some(_) if lazy => field.push('"'),
                        Some(_) => {
                            return Err(self.quote_error(&line, pos - 1, STRAY_QUOTE, start_line));
                        }
                    }
                } else if self.line_terminated {
                    field.push_str(rest);
                    field.push('\n');
                    match self.next_line()? {
                        Some(next) => {
                            line = next;
                            pos = 0;
                        }
                        None if lazy => {
                            fields.push(field);
                            break 'fields;
                        }
                        None => {
                            return Err(self.quote_error("", 0, STRAY_QUOTE, start_line));
                        }
                    }
                } else {
                    if !lazy {
                        return Err(self.quote_error(&line, line.len(), STRAY_QUOTE, start_line));
                    }
                    field.push_str(rest);
                    fields.push(field);
                    break 'fields;
                }
            }
        }

        if self.options.trim_space {
            for f in &mut fields {
                let trimmed = f.trim();
                if trimmed.len() != f.len() {
                    *f = trimmed.to_string();
                }
            }
        }
        self.records_read += 1;
        Ok(Some(fields))
    }
}

impl<R: BufRead> Iterator for DelimitedReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Read a whole delimited file into memory.
///
/// Gzip-compressed inputs are decoded transparently (see [`crate::io::compression`]).
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be opened or read, [`Error::Parse`] on a
/// dialect violation and [`Error::Config`] for invalid options.
pub fn read_delimited_file(path: impl AsRef<Path>, options: &ReaderOptions) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let source = open_source(path, DEFAULT_BUFFER_SIZE)?;
    let reader = DelimitedReader::with_source_name(source, options.clone(), path.display().to_string())?;
    let rows = reader.collect::<Result<Vec<Row>>>()?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "read delimited file");
    Ok(rows)
}

/// Write rows to a delimited file with standard quoting.
///
/// * Creates parent directories if they don't exist.
/// * Rows may have different lengths.
///
/// # Returns
/// The number of rows written (i.e., `rows.len()`).
///
/// # Errors
/// Returns [`Error::Io`] if the file/dirs cannot be created or any row fails to write.
pub fn write_delimited_file(path: impl AsRef<Path>, rows: &[Row]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).io_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).io_context(|| format!("create {}", path.display()))?;
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(BufWriter::new(f));
    for (i, row) in rows.iter().enumerate() {
        wtr.write_record(row)
            .map_err(std::io::Error::from)
            .io_context(|| format!("write row #{} to {}", i + 1, path.display()))?;
    }
    wtr.flush()
        .io_context(|| format!("flush {}", path.display()))?;
    Ok(rows.len())
}
