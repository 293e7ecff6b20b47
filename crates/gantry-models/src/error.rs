//! Error types for the gantry model layer

use thiserror::Error;

use crate::version::VersionError;

/// Model layer errors
///
/// Persistence failures propagate unmodified from the datastore; nothing is
/// retried or swallowed here.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A factory was constructed without a usable datastore
    #[error("{0}")]
    Configuration(String),

    /// The store rejected a duplicate `(name, version)` write
    #[error("Template {name} already exists at version {version}")]
    DuplicateVersion { name: String, version: String },

    #[error("Invalid version: {0}")]
    Version(#[from] VersionError),

    #[error("Datastore error: {0}")]
    Datastore(#[from] gantry_datastore::DatastoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
