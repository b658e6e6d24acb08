//! Ordered result rows returned by the database collaborator.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// One result row: an ordered mapping from column name to value.
///
/// Column order is the order the collaborator returned; name lookup is linear,
/// which is fine at the column counts a single table carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from ordered (column, value) pairs.
    pub fn from_pairs<I, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Append a column.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Value of a column by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Value of a column by name, erroring when absent.
    pub fn try_get(&self, name: &str) -> OrmResult<&Value> {
        self.get(name)
            .ok_or_else(|| OrmError::decode(name, "column missing from row"))
    }

    /// Text of a column, erroring when absent or not textual.
    pub fn try_get_text(&self, name: &str) -> OrmResult<&str> {
        self.try_get(name)?
            .as_str()
            .ok_or_else(|| OrmError::decode(name, "expected a text value"))
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Ordered (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Keep the first `count` rows of a result set.
///
/// A negative `count` is a programming error and fails immediately with
/// [`OrmError::NegativeCount`]; a `count` beyond the result length keeps
/// everything.
pub fn take_rows(mut rows: Vec<Row>, count: i64) -> OrmResult<Vec<Row>> {
    if count < 0 {
        return Err(OrmError::NegativeCount(count));
    }
    rows.truncate(count.min(rows.len() as i64) as usize);
    Ok(rows)
}
