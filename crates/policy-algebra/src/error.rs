//! Error types for the policy algebra.

use thiserror::Error;

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur while building or normalizing policies.
///
/// Empty and unsatisfiable operators are values, not errors. Asking a leaf
/// for its children is a broken tree invariant and panics instead.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy reference has no entry in the registry chain.
    #[error("Unresolved policy reference: {0}")]
    UnresolvedReference(String),

    /// A policy reference chain points back at itself.
    #[error("Circular policy reference: {0}")]
    CircularReference(String),

    /// Policy document could not be parsed.
    #[error("Failed to parse policy document: {0}")]
    ParseError(String),

    /// Policy document is well-formed but not a valid component tree.
    #[error("Invalid policy document: {0}")]
    InvalidDocument(String),

    /// A requirement builder rejected its element.
    #[error("Requirement builder for '{name}' failed: {message}")]
    BuilderError { name: String, message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for PolicyError {
    fn from(err: serde_yaml::Error) -> Self {
        PolicyError::ParseError(err.to_string())
    }
}
