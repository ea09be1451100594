//! Per-rule policies of the pipeline, each usable on its own.
//!
//! | Rule | Column out of range | Other anomaly |
//! |---|---|---|
//! | filter (any) | row dropped | - |
//! | `emptyString` | row dropped | - |
//! | `regexMatch` | row dropped | bad pattern: [`Error::Config`] at compile time |
//! | `valueRange` | row dropped | non-numeric text: row dropped |
//! | transform (any) | rule skipped for the row | - |
//! | `parseInt` | skipped | non-integer text: left untouched |
//! | `substring` | skipped | `start` negative or past the end: field emptied |
//! | projection `column` | emits `""` | - |

use crate::error::{Error, Result};
use crate::io::delimited::Row;
use crate::pipeline::options::{FilterRule, ProjectionField, TransformRule};
use crate::value::Scalar;
use regex::Regex;

/// Output row: text columns and typed fixed values.
pub type ProjectedRow = Vec<Scalar>;

/// A filter with its pattern (if any) compiled.
#[derive(Debug, Clone)]
pub enum CompiledFilter {
    EmptyString { column: usize },
    RegexMatch { column: usize, regex: Regex },
    ValueRange { column: usize, min: Option<f64>, max: Option<f64> },
}

impl CompiledFilter {
    /// Compile one rule.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a `regexMatch` pattern does not compile.
    pub fn compile(rule: &FilterRule) -> Result<Self> {
        Ok(match rule {
            FilterRule::EmptyString { column } => CompiledFilter::EmptyString { column: *column },
            FilterRule::RegexMatch { column, pattern } => {
                let regex = Regex::new(pattern).map_err(|e| {
                    Error::Config(format!(
                        "invalid pattern {pattern:?} in regexMatch filter on column {column}: {e}"
                    ))
                })?;
                CompiledFilter::RegexMatch {
                    column: *column,
                    regex,
                }
            }
            FilterRule::ValueRange { column, min, max } => CompiledFilter::ValueRange {
                column: *column,
                min: *min,
                max: *max,
            },
        })
    }

    fn column(&self) -> usize {
        match self {
            CompiledFilter::EmptyString { column }
            | CompiledFilter::RegexMatch { column, .. }
            | CompiledFilter::ValueRange { column, .. } => *column,
        }
    }

    /// Whether `row` survives this filter.
    #[must_use]
    pub fn accepts(&self, row: &[String]) -> bool {
        let Some(cell) = row.get(self.column()) else {
            return false;
        };
        match self {
            CompiledFilter::EmptyString { .. } => !cell.is_empty(),
            CompiledFilter::RegexMatch { regex, .. } => regex.is_match(cell),
            CompiledFilter::ValueRange { min, max, .. } => match cell.parse::<f64>() {
                Ok(v) => !(min.is_some_and(|m| v < m) || max.is_some_and(|m| v > m)),
                Err(_) => false,
            },
        }
    }
}

/// Compile a filter list, failing on the first bad pattern.
///
/// # Errors
/// Returns [`Error::Config`] for an invalid `regexMatch` pattern.
pub fn compile_filters(rules: &[FilterRule]) -> Result<Vec<CompiledFilter>> {
    rules.iter().map(CompiledFilter::compile).collect()
}

/// Whether `row` passes every filter; stops at the first rejection.
#[must_use]
pub fn passes_all(filters: &[CompiledFilter], row: &[String]) -> bool {
    filters.iter().all(|f| f.accepts(row))
}

/// Apply one transform to `row` in place.
pub fn apply_transform(rule: &TransformRule, row: &mut [String]) {
    match rule {
        TransformRule::ParseInt { column } => {
            if let Some(cell) = row.get_mut(*column)
                && let Some(canonical) = canonical_int(cell)
            {
                *cell = canonical;
            }
        }
        TransformRule::FixedValue { column, value } => {
            if let Some(cell) = row.get_mut(*column) {
                *cell = value.render_text();
            }
        }
        TransformRule::Substring {
            column,
            start,
            length,
        } => {
            if let Some(cell) = row.get_mut(*column) {
                *cell = substring(cell, *start, *length);
            }
        }
    }
}

/// Apply transforms in list order; later rules see earlier results.
pub fn apply_transforms(rules: &[TransformRule], row: &mut [String]) {
    for rule in rules {
        apply_transform(rule, row);
    }
}

/// Base-10 re-rendering of an integer field, or `None` if it is not one.
fn canonical_int(text: &str) -> Option<String> {
    text.parse::<i64>().ok().map(|n| n.to_string())
}

/// Character-based substring.
///
/// A negative or past-the-end `start` gives `""`. A missing or non-positive
/// `length`, or one that would overrun, runs to the end of the text.
#[must_use]
pub fn substring(text: &str, start: i64, length: Option<i64>) -> String {
    let Ok(start) = usize::try_from(start) else {
        return String::new();
    };
    let mut chars = text.chars().skip(start).peekable();
    if chars.peek().is_none() {
        return String::new();
    }
    match length.and_then(|l| usize::try_from(l).ok()).filter(|l| *l > 0) {
        Some(len) => chars.take(len).collect(),
        None => chars.collect(),
    }
}

/// Build the output row. With no fields configured every column is emitted as text.
#[must_use]
pub fn project(fields: &[ProjectionField], row: &Row) -> ProjectedRow {
    if fields.is_empty() {
        return row.iter().cloned().map(Scalar::String).collect();
    }
    fields
        .iter()
        .map(|field| match field {
            ProjectionField::Column { column } => {
                Scalar::String(row.get(*column).cloned().unwrap_or_default())
            }
            ProjectionField::Fixed { value } => value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn substring_policy() {
        assert_eq!(substring("charlie", 0, Some(1)), "c");
        assert_eq!(substring("charlie", 2, None), "arlie");
        assert_eq!(substring("charlie", 2, Some(100)), "arlie");
        assert_eq!(substring("charlie", 2, Some(0)), "arlie");
        assert_eq!(substring("charlie", 2, Some(-3)), "arlie");
        assert_eq!(substring("charlie", 7, Some(1)), "");
        assert_eq!(substring("charlie", -1, Some(1)), "");
        assert_eq!(substring("", 0, None), "");
        assert_eq!(substring("héllo", 1, Some(2)), "él");
    }

    #[test]
    fn parse_int_canonicalizes_or_leaves_alone() {
        let mut r = row(&["007", "+5", "1.5", "abc"]);
        for c in 0..4 {
            apply_transform(&TransformRule::ParseInt { column: c }, &mut r);
        }
        assert_eq!(r, row(&["7", "5", "1.5", "abc"]));
    }

    #[test]
    fn fixed_value_renders_scalars_as_text() {
        let mut r = row(&["a", "b", "c", "d"]);
        let values = [
            Scalar::from("x"),
            Scalar::from(42_i64),
            Scalar::from(true),
            Scalar::Null,
        ];
        for (c, value) in values.into_iter().enumerate() {
            apply_transform(&TransformRule::FixedValue { column: c, value }, &mut r);
        }
        assert_eq!(r, row(&["x", "42", "true", ""]));
    }

    #[test]
    fn out_of_range_column_drops_for_filters_and_skips_for_transforms() {
        let r = row(&["1", "alpha"]);
        let f = CompiledFilter::compile(&FilterRule::ValueRange {
            column: 5,
            min: None,
            max: None,
        })
        .unwrap();
        assert!(!f.accepts(&r));

        let mut r2 = r.clone();
        apply_transform(
            &TransformRule::FixedValue {
                column: 5,
                value: Scalar::from("x"),
            },
            &mut r2,
        );
        assert_eq!(r2, r);
    }

    #[test]
    fn value_range_bounds_are_inclusive_and_optional() {
        let within = |text: &str, min, max| {
            CompiledFilter::compile(&FilterRule::ValueRange { column: 0, min, max })
                .unwrap()
                .accepts(&row(&[text]))
        };
        assert!(within("200", Some(200.0), Some(350.0)));
        assert!(within("350", Some(200.0), Some(350.0)));
        assert!(!within("351", Some(200.0), Some(350.0)));
        assert!(within("-1e9", None, Some(0.0)));
        assert!(!within("n/a", None, None));
        assert!(!within("", None, None));
    }

    #[test]
    fn regex_is_unanchored_and_bad_patterns_are_config_errors() {
        let f = CompiledFilter::compile(&FilterRule::RegexMatch {
            column: 0,
            pattern: "lph".into(),
        })
        .unwrap();
        assert!(f.accepts(&row(&["alpha"])));

        let err = CompiledFilter::compile(&FilterRule::RegexMatch {
            column: 0,
            pattern: "(".into(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn projection_pads_missing_columns_and_keeps_fixed_types() {
        let r = row(&["1", "alpha", "100", "A"]);
        let out = project(
            &[
                ProjectionField::Column { column: 999 },
                ProjectionField::Fixed {
                    value: Scalar::from(1_i64),
                },
                ProjectionField::Column { column: 3 },
            ],
            &r,
        );
        assert_eq!(
            out,
            vec![Scalar::from(""), Scalar::from(1_i64), Scalar::from("A")]
        );
        assert_eq!(project(&[], &r).len(), 4);
    }
}
