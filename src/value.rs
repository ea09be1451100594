//! The scalar value type used in projected output rows.
//!
//! Rows travel through the pipeline as text. Only the projection stage produces
//! typed values: column fields become [`Scalar::String`] and `fixed` fields keep
//! whatever scalar the options carried.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

/// A JSON-compatible scalar: string, number, boolean or null.
///
/// Arrays and objects are rejected on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Text rendering used when a scalar is written into a text field.
    ///
    /// Strings are verbatim, numbers use JSON notation, booleans are `true`/`false`
    /// and null renders as the empty string.
    #[must_use]
    pub fn render_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }

    /// Borrow the text of a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<f64> for Scalar {
    /// Non-finite floats have no JSON form and become [`Scalar::Null`].
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Scalar::Null, Scalar::Number)
    }
}
