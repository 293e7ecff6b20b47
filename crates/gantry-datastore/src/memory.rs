//! In-memory datastore implementation for testing and development

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{DatastoreError, Result};
use crate::store::{Datastore, Document, Pagination};

/// Unique constraint declared on a table
#[derive(Debug, Clone)]
struct UniqueConstraint {
    table: String,
    fields: Vec<String>,
}

/// In-memory datastore backed by one record list per table
///
/// Records are kept in insertion order, so scans are stable per call.
/// Declared unique constraints reject colliding writes the way a backing
/// store with a uniqueness index would.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    tables: Mutex<HashMap<String, Vec<Document>>>,
    constraints: Vec<UniqueConstraint>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique constraint over the given fields of a table
    pub fn with_unique_constraint(mut self, table: impl Into<String>, fields: &[&str]) -> Self {
        self.constraints.push(UniqueConstraint {
            table: table.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    /// Number of records in a table (useful for testing)
    pub fn len(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, |records| records.len())
    }

    /// Check if a table holds no records
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.tables.lock().unwrap().clear();
    }

    fn matches(record: &Document, filter: &Document) -> bool {
        filter
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }

    /// Check declared constraints against every record other than `entity` itself
    fn check_constraints(&self, table: &str, records: &[Document], entity: &Document) -> Result<()> {
        for constraint in self.constraints.iter().filter(|c| c.table == table) {
            // A record missing a constrained field cannot collide
            if !constraint.fields.iter().all(|f| entity.contains_key(f)) {
                continue;
            }

            let collision = records.iter().any(|record| {
                record.get("id") != entity.get("id")
                    && constraint
                        .fields
                        .iter()
                        .all(|f| record.get(f) == entity.get(f))
            });

            if collision {
                return Err(DatastoreError::Conflict {
                    table: table.to_string(),
                    fields: constraint.fields.join(", "),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn save(&self, table: &str, mut entity: Document) -> Result<Document> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| DatastoreError::Backend("Lock poisoned".into()))?;

        entity
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

        let records = tables.entry(table.to_string()).or_default();
        self.check_constraints(table, records, &entity)?;

        let id = entity.get("id").cloned();
        match records
            .iter_mut()
            .find(|record| record.get("id") == id.as_ref())
        {
            Some(existing) => *existing = entity.clone(),
            None => records.push(entity.clone()),
        }

        Ok(entity)
    }

    async fn get(&self, table: &str, filter: &Document) -> Result<Option<Document>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| DatastoreError::Backend("Lock poisoned".into()))?;

        Ok(tables.get(table).and_then(|records| {
            records
                .iter()
                .find(|record| Self::matches(record, filter))
                .cloned()
        }))
    }

    async fn scan(
        &self,
        table: &str,
        filter: Option<&Document>,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Document>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| DatastoreError::Backend("Lock poisoned".into()))?;

        let mut results: Vec<Document> = tables
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.map_or(true, |f| Self::matches(record, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(page) = pagination {
            let start = page.page.saturating_sub(1) * page.count;
            results = results.into_iter().skip(start).take(page.count).collect();
        }

        Ok(results)
    }
}
