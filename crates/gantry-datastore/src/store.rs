//! Storage abstraction for gantry records

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Generic shape of a persisted record or an equality filter
pub type Document = serde_json::Map<String, Value>;

/// Window over a scan result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    pub page: usize,

    /// Number of records per page
    pub count: usize,
}

impl Pagination {
    pub fn new(page: usize, count: usize) -> Self {
        Pagination { page, count }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { page: 1, count: 50 }
    }
}

/// Key-value style datastore consumed by the model layer
///
/// Implementations assign an `id` on `save` when the entity carries none and
/// return the full stored record. A write that violates a declared unique
/// constraint fails with [`DatastoreError::Conflict`](crate::DatastoreError::Conflict).
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Persist an entity, assigning an `id` if absent
    async fn save(&self, table: &str, entity: Document) -> Result<Document>;

    /// Fetch a single record matching every filter field
    async fn get(&self, table: &str, filter: &Document) -> Result<Option<Document>>;

    /// Fetch all records matching the filter, optionally windowed
    ///
    /// Order is unspecified; callers sort when order matters.
    async fn scan(
        &self,
        table: &str,
        filter: Option<&Document>,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Document>>;
}
