//! Query error types.

use thiserror::Error;

/// Error returned when a query or aggregate cannot be evaluated.
///
/// Both variants are programming or configuration errors. They are never
/// raised for data problems such as a record missing an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query specification names an unknown field or dimension, or
    /// carries a malformed token.
    #[error("invalid query spec: {field}: {reason}")]
    InvalidQuerySpec {
        /// The offending field, e.g. `sortKey` or `filters.supplier`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A comparison or aggregate referenced a field missing from the schema.
    #[error("unsupported field type: {0} is not declared in the schema")]
    UnsupportedFieldType(String),
}

impl QueryError {
    /// Create an [`QueryError::InvalidQuerySpec`].
    pub fn invalid_spec(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuerySpec {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
