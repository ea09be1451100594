//! Option aggregate for a pipeline run.
//!
//! Options are plain serde data. The JSON shape uses camelCase keys and a `type`
//! discriminator on every rule:
//!
//! ```json
//! {
//!   "skipHeader": true,
//!   "lazyQuotes": false,
//!   "filters":    [{"type": "regexMatch", "column": 3, "pattern": "^[A-C]$"}],
//!   "transforms": [{"type": "substring", "column": 3, "start": 0, "length": 1}],
//!   "groupBy":    {"column": 3},
//!   "fields":     [{"type": "column", "column": 0}, {"type": "fixed", "value": 1}]
//! }
//! ```
//!
//! Every key is optional. Unknown rule types, missing rule attributes and negative
//! column indices are rejected by [`ProcessingOptions::from_json`] as
//! [`Error::Config`].

use crate::error::{Error, Result};
use crate::io::delimited::ReaderOptions;
use crate::value::Scalar;
use serde::{Deserialize, Serialize};

/// Row filter, evaluated against the row before any transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterRule {
    /// Keep rows whose column is present and non-empty.
    EmptyString { column: usize },
    /// Keep rows whose column is present and matches `pattern` (unanchored).
    RegexMatch { column: usize, pattern: String },
    /// Keep rows whose column parses as a number within the given inclusive bounds.
    ValueRange {
        column: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
}

/// In-place rewrite of one column, applied in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransformRule {
    /// Canonicalize an integer field (`"007"` becomes `"7"`); other text is left alone.
    ParseInt { column: usize },
    /// Replace the field with the text rendering of `value`.
    FixedValue { column: usize, value: Scalar },
    /// Keep `length` characters starting at character `start`.
    Substring {
        column: usize,
        #[serde(default)]
        start: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<i64>,
    },
}

/// One output field of a projected row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProjectionField {
    Column { column: usize },
    Fixed { value: Scalar },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBy {
    pub column: usize,
}

/// Everything a pipeline run needs besides its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingOptions {
    /// Drop the first record.
    pub skip_header: bool,
    /// Dialect of the delimited input; its keys sit at the top level of the JSON form.
    #[serde(flatten)]
    pub reader: ReaderOptions,
    pub filters: Vec<FilterRule>,
    pub transforms: Vec<TransformRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
    /// Output fields. Empty means every column, as text.
    pub fields: Vec<ProjectionField>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            skip_header: true,
            reader: ReaderOptions::default(),
            filters: Vec::new(),
            transforms: Vec::new(),
            group_by: None,
            fields: Vec::new(),
        }
    }
}

impl ProcessingOptions {
    /// Parse options from their JSON text form.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the text is not valid options JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(format!("processing options: {e}")))
    }

    /// Convert an already-decoded JSON value into options.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the value does not describe valid options.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::Config(format!("processing options: {e}")))
    }

    #[must_use]
    pub fn with_skip_header(mut self, on: bool) -> Self {
        self.skip_header = on;
        self
    }

    #[must_use]
    pub fn with_reader(mut self, reader: ReaderOptions) -> Self {
        self.reader = reader;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, rule: FilterRule) -> Self {
        self.filters.push(rule);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, rule: TransformRule) -> Self {
        self.transforms.push(rule);
        self
    }

    #[must_use]
    pub fn with_group_by(mut self, column: usize) -> Self {
        self.group_by = Some(GroupBy { column });
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: ProjectionField) -> Self {
        self.fields.push(field);
        self
    }
}
