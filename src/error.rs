//! Error taxonomy shared by every reader, writer and codec in the crate.
//!
//! Four kinds of failure are fatal to a call:
//! - [`Error::Io`] - open/read/write failures, including missing files
//! - [`Error::Parse`] - malformed delimited text, malformed JSON, wrong top-level shape
//! - [`Error::Config`] - invalid options (bad regex, unknown rule type, bad delimiter)
//! - [`Error::Decode`] - a compressed batch failed at one of its [`DecodeStage`]s
//!
//! Everything else (missing columns, non-numeric range values, out-of-range
//! compression levels) is absorbed by the documented policy of the operation
//! and never surfaces here.

use std::fmt;
use std::io;
use thiserror::Error;

/// Convenience result type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by all fallible operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying I/O failure. `context` names the verb and the target, e.g. `open data.csv`.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Input text could not be parsed.
    ///
    /// `location` identifies the input (file, batch, line); `line` is the 1-based
    /// line number when one is known.
    #[error("{location}: {message}")]
    Parse {
        location: String,
        line: Option<usize>,
        message: String,
    },

    /// Options were rejected before any data was processed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A compressed batch could not be decoded.
    #[error("{location}: {stage} failed: {message}")]
    Decode {
        location: String,
        stage: DecodeStage,
        message: String,
    },
}

/// The stage of batch decoding that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// The text-safe (base64) envelope was invalid.
    Envelope,
    /// The compressed payload was corrupt or truncated.
    Decompression,
    /// A decompressed line was not valid JSON.
    Line,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStage::Envelope => f.write_str("envelope decoding"),
            DecodeStage::Decompression => f.write_str("decompression"),
            DecodeStage::Line => f.write_str("line parsing"),
        }
    }
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn parse(
        location: impl Into<String>,
        line: Option<usize>,
        message: impl fmt::Display,
    ) -> Self {
        Error::Parse {
            location: location.into(),
            line,
            message: message.to_string(),
        }
    }

    pub(crate) fn decode(
        location: impl Into<String>,
        stage: DecodeStage,
        message: impl fmt::Display,
    ) -> Self {
        Error::Decode {
            location: location.into(),
            stage,
            message: message.to_string(),
        }
    }

    /// The 1-based line number carried by a parse error, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Parse { line, .. } => *line,
            _ => None,
        }
    }

    /// The failing stage of a decode error, if this is one.
    #[must_use]
    pub fn decode_stage(&self) -> Option<DecodeStage> {
        match self {
            Error::Decode { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Attach an I/O context string to `std::io::Result`, mirroring `anyhow::Context`.
pub(crate) trait IoContext<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::io(f(), e))
    }
}
