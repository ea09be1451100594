//! # Datastrand
//!
//! **Constant-memory streaming** of large tabular and JSON datasets. Datastrand reads
//! CSV-like files one record at a time, runs them through a small single-pass query
//! pipeline, and writes, merges, compresses and re-samples batches of JSON records
//! without ever holding a whole dataset in memory.
//!
//! ## Key Features
//!
//! - **Delimited reader** - strict or lenient quoting, whitespace trimming, multi-line fields
//! - **Row pipeline** - header skip, filters, transforms, projection and grouping in one pass
//! - **JSON reader** - top-level arrays, top-level objects and NDJSON, auto-detected
//! - **Incremental JSON array writer** - valid output at every flush boundary
//! - **Merger** - concatenate JSON array files element by element
//! - **Compressed batches** - NDJSON, gzip and base64 in one opaque string
//! - **Weighted combiner** - truncate or cycle batch groups to exact record counts
//! - **Transparent gzip inputs** - `.gz` files (or gzip magic bytes) are decoded on the fly
//!
//! ## Quick Start
//!
//! ```
//! use datastrand::pipeline::{FilterRule, ProcessingOptions, ProjectionField, process_delimited};
//! use datastrand::Scalar;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let csv = "id,name,value\n1,alpha,100\n2,,200\n3,charlie,300\n";
//!
//! let options = ProcessingOptions::default()
//!     .with_filter(FilterRule::EmptyString { column: 1 })
//!     .with_field(ProjectionField::Column { column: 1 })
//!     .with_field(ProjectionField::Fixed { value: Scalar::from(true) });
//!
//! let rows = process_delimited(csv.as_bytes(), &options)?;
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1], vec![Scalar::from("charlie"), Scalar::from(true)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rows
//!
//! A [`Row`] is an ordered list of text fields. Rows are never padded or truncated:
//! every rule that names a column past the end of a row has a fixed policy instead
//! of an error (filters drop the row, transforms skip, projection emits `""`).
//!
//! ### Processing options
//!
//! [`ProcessingOptions`] is plain serde data, so it can come straight from JSON:
//!
//! ```
//! use datastrand::ProcessingOptions;
//!
//! let options = ProcessingOptions::from_json(r#"{
//!     "skipHeader": true,
//!     "filters": [{"type": "valueRange", "column": 2, "min": 200}],
//!     "groupBy": {"column": 3}
//! }"#)?;
//! assert_eq!(options.filters.len(), 1);
//! # Ok::<(), datastrand::Error>(())
//! ```
//!
//! ### JSON arrays on disk
//!
//! Writers in [`io::json_array`] emit compact arrays (`[a,b,c]`) and return the
//! number of elements written. [`combine_json_array_files`] streams several arrays
//! into one.
//!
//! ### Compressed batches
//!
//! A [`CompressedBatch`] is an opaque string. Produce one with [`compress_values`],
//! open it with [`decompress_batch`], or write many straight to an array file with
//! [`write_multiple_compressed_batches_to_array_file`].
//!
//! ```
//! use datastrand::{compress_values, decompress_batch};
//! use serde_json::json;
//!
//! let values = vec![json!({"name": "Alice"}), json!({"name": "Bob"})];
//! let batch = compress_values(&values, Some(9))?;
//! assert_eq!(decompress_batch(&batch)?, values);
//! # Ok::<(), datastrand::Error>(())
//! ```
//!
//! ## Errors and Logging
//!
//! Every fallible call returns [`Result`] with an [`Error`] that is one of `Io`,
//! `Parse`, `Config` or `Decode`. The crate reports progress through `tracing`
//! events (`debug` for counts, `warn` for absorbed anomalies) and never installs a
//! subscriber itself.
//!
//! ## Feature Flags
//!
//! - `gzip-sources` (default) - detect and decode gzip-compressed input files
//!
//! ## Module Overview
//!
//! - [`io`] - delimited reader/writer, JSON reader, JSON array writer and merger
//! - [`pipeline`] - processing options, rule policies and the row engine
//! - [`batch`] - compressed batch codec and weighted combiner
//! - [`testing`] - fixtures, scratch files and assertions for tests

pub mod batch;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod testing;
pub mod value;

// General re-exports
pub use error::{DecodeStage, Error, Result};
pub use value::Scalar;

pub use io::delimited::{
    DelimitedReader, ReaderOptions, Row, read_delimited_file, write_delimited_file,
};
pub use io::json::{JsonDocument, JsonFormat, detect_json_format, load_json, read_json};
pub use io::json_array::{
    JsonArrayWriter, WriterOptions, combine_json_array_files,
    write_json_lines_to_array_file, write_multiple_json_lines_to_array_file,
    write_values_to_array_file,
};

pub use pipeline::{
    FilterRule, ProcessingOptions, ProjectedRow, ProjectionField, RowGroup, RowProcessor,
    TransformRule, process_delimited_file,
};

pub use batch::{
    CompressedBatch, WeightedGroup, compress_values, decompress_batch, decompress_batches,
    write_multiple_compressed_batches_to_array_file, write_weighted_batches_to_array_file,
};
