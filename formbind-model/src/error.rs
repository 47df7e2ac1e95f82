//! Error types for schema construction and schema misuse.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised for bad schema authoring.
///
/// These are programmer errors, not user-input errors. Missing input data is
/// never reported through this type.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A declaration used a type name outside the recognized kinds.
    #[error("field '{field}' declares unknown type '{type_name}'")]
    UnknownType { field: String, type_name: String },

    /// An array declaration without an `items` shape.
    #[error("array field '{0}' has no items definition")]
    MissingItems(String),

    /// A custom declaration without a `ref`.
    #[error("custom field '{0}' does not reference a type")]
    MissingReference(String),

    /// A custom declaration referencing an undeclared type.
    #[error("field '{field}' references undeclared type '{reference}'")]
    UnknownReference { field: String, reference: String },

    /// Type declarations that reference each other in a loop.
    #[error("cyclic type reference: {0}")]
    CyclicReference(String),

    /// A non-primitive kind reached the primitive coercer.
    #[error("field '{field}' is not a primitive type or is an array ({kind})")]
    NotPrimitive { field: String, kind: &'static str },

    /// An array of arrays declared with the comma-delimited encoding.
    #[error("cannot map array of arrays for comma-delimited field '{0}'")]
    CsvNestedArray(String),

    /// Malformed schema document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
