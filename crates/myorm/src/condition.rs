//! Comparison operators and join kinds for building WHERE and JOIN clauses.

use std::fmt;

/// Comparison operator for WHERE conditions.
///
/// # Example
/// ```ignore
/// use myorm::Op;
///
/// let q = myorm::select_from("Users", &["name"]).condition(Op::Gte, "age", 18);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    /// column = value
    #[default]
    Eq,
    /// column != value
    Ne,
    /// column > value
    Gt,
    /// column < value
    Lt,
    /// column >= value
    Gte,
    /// column <= value
    Lte,
    /// column IS NOT value
    IsNot,
}

impl Op {
    /// SQL text for this operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::IsNot => "IS NOT",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Join kind for secondary tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// INNER JOIN
    #[default]
    Inner,
    /// LEFT JOIN
    Left,
    /// RIGHT JOIN
    Right,
    /// FULL JOIN
    Full,
}

impl JoinKind {
    /// SQL keyword for this join kind.
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
