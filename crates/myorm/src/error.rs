//! Error types for myorm

use thiserror::Error;

/// Result type alias for myorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement construction and record mapping
#[derive(Debug, Error)]
pub enum OrmError {
    /// Malformed statement: misuse of the query builder (primary clause unset or
    /// set twice, LIMIT set twice, INSERT combined with WHERE/JOIN/LIMIT, or a
    /// referenced secondary table that was never joined).
    #[error("Malformed statement: {0}")]
    Syntax(String),

    /// Engine rejection or connectivity failure; carries the offending statement
    /// text for diagnosis.
    #[error("Database error while executing `{statement}`: {message}")]
    Database { statement: String, message: String },

    /// No reachable database collaborator
    #[error("Connection error: {0}")]
    Connection(String),

    /// Keyed lookup matched no row
    #[error("Not found: {0}")]
    NotFound(String),

    /// A negative number of results was requested
    #[error("Requested a negative number of results: {0}")]
    NegativeCount(i64),

    /// Enumeration construction violated the zero-valued sentinel rule
    #[error("Enum invariant violation: {0}")]
    EnumInvariant(String),

    /// Attempted mutation of a key or auto-generated field
    #[error("Field '{0}' is read-only")]
    ReadOnlyField(String),

    /// Field name not present in the table's layout
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    /// A keyed operation needs a key column the table does not have
    #[error("Table '{0}' has no key column usable for a keyed WHERE clause")]
    MissingGuardColumn(String),

    /// Row value could not be mapped to the resolved field type
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl OrmError {
    /// Create a malformed-statement error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    /// Create a database error carrying the offending statement text
    pub fn database(statement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a malformed-statement error
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }

    /// Check if this is a database error
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
