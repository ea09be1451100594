//! Pre-built datasets for common test scenarios.

use crate::io::delimited::Row;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Five records under an `id,name,value,category` header.
///
/// Row 2 has an empty `value`, row 5 an empty `name`; categories are `A`, `B`, `C`.
pub const SAMPLE_CSV: &str = "\
id,name,value,category
1,alpha,100,A
2,bravo,,B
3,charlie,300,A
4,delta,400,C
5,,500,B
";

/// [`SAMPLE_CSV`] as rows, header included.
///
/// # Example
///
/// ```
/// use datastrand::testing::sample_rows;
///
/// let rows = sample_rows();
/// assert_eq!(rows.len(), 6);
/// assert_eq!(rows[0], vec!["id", "name", "value", "category"]);
/// ```
#[must_use]
pub fn sample_rows() -> Vec<Row> {
    SAMPLE_CSV
        .lines()
        .map(|l| l.split(',').map(str::to_string).collect())
        .collect()
}

/// A small person record for serialization tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplePerson {
    pub name: String,
    pub age: u32,
    pub city: String,
}

#[must_use]
pub fn sample_people() -> Vec<SamplePerson> {
    [
        ("Alice", 30, "New York"),
        ("Bob", 25, "Boston"),
        ("Charlie", 35, "Chicago"),
        ("Diana", 28, "Denver"),
        ("Eve", 41, "Seattle"),
    ]
    .into_iter()
    .map(|(name, age, city)| SamplePerson {
        name: name.to_string(),
        age,
        city: city.to_string(),
    })
    .collect()
}

/// [`sample_people`] as JSON objects.
///
/// # Example
///
/// ```
/// use datastrand::testing::sample_people_values;
///
/// let people = sample_people_values();
/// assert_eq!(people[0]["name"], "Alice");
/// ```
#[must_use]
pub fn sample_people_values() -> Vec<Value> {
    sample_people()
        .into_iter()
        .map(|p| json!({"name": p.name, "age": p.age, "city": p.city}))
        .collect()
}

/// `n` objects `{"id": i}` for `i` in `0..n`, handy for flush-boundary tests.
#[must_use]
pub fn numbered_records(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({ "id": i })).collect()
}
