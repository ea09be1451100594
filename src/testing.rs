//! Testing utilities for datastrand users.
//!
//! This module bundles what the crate's own integration tests use, so callers can
//! write the same kind of tests for their data:
//!
//! - **Fixtures**: the category CSV sample, sample people records, numbered records
//! - **Mock I/O**: temporary files/directories, gzip inputs, JSON array readback
//! - **Assertions**: ordered and unordered collection comparison, projected-row checks
//!
//! # Quick Start
//!
//! ```
//! use datastrand::pipeline::{ProcessingOptions, process_delimited};
//! use datastrand::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rows = process_delimited(SAMPLE_CSV.as_bytes(), &ProcessingOptions::default())?;
//! assert_projected_rows(&rows, &[
//!     &["1", "alpha", "100", "A"],
//!     &["2", "bravo", "", "B"],
//!     &["3", "charlie", "300", "A"],
//!     &["4", "delta", "400", "C"],
//!     &["5", "", "500", "B"],
//! ]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
