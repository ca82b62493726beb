//! Error types for schema compilation and validation.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A defect in a field definition map.
///
/// These are programmer errors: they surface when a definition is built or
/// compiled and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An entity-specific field reuses a base field name.
    #[error("field `{0}` is reserved for engine-managed base fields")]
    ReservedField(String),

    /// A field name appears twice in one definition.
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),

    /// More than one field is marked auto-increment + primary key.
    #[error("only one auto-increment primary key is allowed, found {0:?}")]
    MultiplePrimaryKeys(Vec<String>),

    /// A field was referenced for validation but carries no rule.
    #[error("field `{0}` is referenced for validation but has no rule attached")]
    MissingRule(String),

    /// A field was referenced that the definition does not declare.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// An entity or field name is not a plain identifier.
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
}

/// Aggregated field-level violations for one candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label} validation failed: {}", violations.join(", "))]
pub struct ValidationError {
    /// Display name of what was being validated, e.g. `"Guitar update"`.
    pub label: String,
    /// Every violation, in schema order.
    pub violations: Vec<String>,
}
