//! Error types for datastore implementations

use thiserror::Error;

/// Errors surfaced by datastore implementations
#[derive(Error, Debug)]
pub enum DatastoreError {
    /// A declared unique constraint rejected the write
    #[error("Unique constraint violated on {table} ({fields})")]
    Conflict { table: String, fields: String },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for datastore operations
pub type Result<T> = std::result::Result<T, DatastoreError>;
