//! Single-pass row engine: header skip, filter, transform, project, group.
//!
//! [`RowProcessor`] holds the compiled options and is fed one [`Row`] at a time.
//! Without grouping each accepted row comes straight back from
//! [`RowProcessor::push`]. With grouping rows are bucketed by the transformed
//! value of the group column and released by [`RowProcessor::finish`], one
//! flattened row per bucket (all member fields end to end), or by
//! [`RowProcessor::finish_groups`] with row boundaries intact.
//!
//! Buckets are released in the order their keys were first seen; callers must not
//! rely on any particular order.

use crate::error::Result;
use crate::io::DEFAULT_BUFFER_SIZE;
use crate::io::compression::open_source;
use crate::io::delimited::{DelimitedReader, Row};
use crate::pipeline::options::{ProcessingOptions, ProjectionField, TransformRule};
use crate::pipeline::rules::{
    CompiledFilter, ProjectedRow, apply_transforms, compile_filters, passes_all, project,
};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Projected rows sharing one group key.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    pub key: String,
    pub rows: Vec<ProjectedRow>,
}

impl RowGroup {
    /// Concatenate every member row into one sequence.
    #[must_use]
    pub fn flatten(self) -> ProjectedRow {
        self.rows.into_iter().flatten().collect()
    }
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub rows_read: usize,
    pub header_skipped: bool,
    pub rows_filtered: usize,
    /// Rows dropped because the group column was out of range.
    pub rows_ungrouped: usize,
    pub rows_emitted: usize,
}

/// Incremental pipeline over pushed rows.
#[derive(Debug)]
pub struct RowProcessor {
    skip_header: bool,
    filters: Vec<CompiledFilter>,
    transforms: Vec<TransformRule>,
    fields: Vec<ProjectionField>,
    group_by: Option<usize>,
    groups: Vec<RowGroup>,
    group_index: HashMap<String, usize>,
    stats: PipelineStats,
}

impl RowProcessor {
    /// Compile `options` into a processor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Config`] if any filter pattern fails to compile; no row
    /// has been looked at yet.
    pub fn new(options: &ProcessingOptions) -> Result<Self> {
        Ok(Self {
            skip_header: options.skip_header,
            filters: compile_filters(&options.filters)?,
            transforms: options.transforms.clone(),
            fields: options.fields.clone(),
            group_by: options.group_by.map(|g| g.column),
            groups: Vec::new(),
            group_index: HashMap::new(),
            stats: PipelineStats::default(),
        })
    }

    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Process one row.
    ///
    /// Returns the projected row when it should be emitted now; `None` when it was
    /// skipped, filtered out or buffered into a group.
    pub fn push(&mut self, mut row: Row) -> Option<ProjectedRow> {
        self.stats.rows_read += 1;
        if self.skip_header && self.stats.rows_read == 1 {
            self.stats.header_skipped = true;
            return None;
        }
        if !passes_all(&self.filters, &row) {
            self.stats.rows_filtered += 1;
            return None;
        }
        apply_transforms(&self.transforms, &mut row);
        let projected = project(&self.fields, &row);

        let Some(column) = self.group_by else {
            self.stats.rows_emitted += 1;
            return Some(projected);
        };
        let Some(key) = row.get(column) else {
            self.stats.rows_ungrouped += 1;
            return None;
        };
        match self.group_index.get(key) {
            Some(&i) => self.groups[i].rows.push(projected),
            None => {
                self.group_index.insert(key.clone(), self.groups.len());
                self.groups.push(RowGroup {
                    key: key.clone(),
                    rows: vec![projected],
                });
            }
        }
        None
    }

    /// Release grouped output as one flattened row per group.
    ///
    /// Empty when grouping is off, since every row was already returned by `push`.
    #[must_use]
    pub fn finish(self) -> Vec<ProjectedRow> {
        self.finish_groups()
            .into_iter()
            .map(RowGroup::flatten)
            .collect()
    }

    /// Release grouped output keeping each group's rows apart.
    #[must_use]
    pub fn finish_groups(mut self) -> Vec<RowGroup> {
        self.stats.rows_emitted += self.groups.len();
        tracing::debug!(
            rows_read = self.stats.rows_read,
            rows_filtered = self.stats.rows_filtered,
            rows_ungrouped = self.stats.rows_ungrouped,
            rows_emitted = self.stats.rows_emitted,
            groups = self.groups.len(),
            "pipeline finished"
        );
        self.groups
    }
}

/// Run the pipeline over in-memory rows.
///
/// # Errors
/// Returns [`crate::Error::Config`] for an invalid filter pattern.
pub fn process_rows<I>(rows: I, options: &ProcessingOptions) -> Result<Vec<ProjectedRow>>
where
    I: IntoIterator<Item = Row>,
{
    let mut processor = RowProcessor::new(options)?;
    let mut out: Vec<ProjectedRow> = rows.into_iter().filter_map(|r| processor.push(r)).collect();
    out.extend(processor.finish());
    Ok(out)
}

/// Read delimited records from `reader` and run the pipeline over them.
///
/// # Errors
/// Returns [`crate::Error::Config`] before reading anything if the options are
/// invalid, then the first [`crate::Error::Parse`] or [`crate::Error::Io`] raised by
/// the reader.
pub fn process_delimited<R: BufRead>(
    reader: R,
    options: &ProcessingOptions,
) -> Result<Vec<ProjectedRow>> {
    let processor = RowProcessor::new(options)?;
    drain(DelimitedReader::new(reader, options.reader.clone())?, processor)
}

/// Open a delimited file (gzip allowed) and run the pipeline over it.
///
/// # Errors
/// As [`process_delimited`], plus [`crate::Error::Io`] if the file cannot be opened.
pub fn process_delimited_file(
    path: impl AsRef<Path>,
    options: &ProcessingOptions,
) -> Result<Vec<ProjectedRow>> {
    let path = path.as_ref();
    let processor = RowProcessor::new(options)?;
    let source = open_source(path, DEFAULT_BUFFER_SIZE)?;
    let reader =
        DelimitedReader::with_source_name(source, options.reader.clone(), path.display().to_string())?;
    let out = drain(reader, processor)?;
    tracing::debug!(path = %path.display(), output_rows = out.len(), "processed delimited file");
    Ok(out)
}

fn drain<R: BufRead>(reader: DelimitedReader<R>, mut processor: RowProcessor) -> Result<Vec<ProjectedRow>> {
    let mut out = Vec::new();
    for row in reader {
        if let Some(p) = processor.push(row?) {
            out.push(p);
        }
    }
    out.extend(processor.finish());
    Ok(out)
}
