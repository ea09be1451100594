//! Filter / transform / group / project over delimited rows.
//!
//! Build a [`ProcessingOptions`] (or parse one from JSON), then either feed rows
//! to a [`RowProcessor`] or let [`process_delimited_file`] do the reading.

pub mod engine;
pub mod options;
pub mod rules;

pub use engine::{
    PipelineStats, RowGroup, RowProcessor, process_delimited, process_delimited_file,
    process_rows,
};
pub use options::{FilterRule, GroupBy, ProcessingOptions, ProjectionField, TransformRule};
pub use rules::ProjectedRow;
