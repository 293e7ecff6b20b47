//! Generic persistence core shared by the entity factories

use std::marker::PhantomData;
use std::sync::Arc;

use gantry_datastore::{Datastore, Document, Pagination};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Capability set a persisted entity exposes to the generic factory
pub trait Entity: Sized + Send {
    /// Datastore table the entity lives in
    const TABLE: &'static str;

    /// Construct the typed model from a persisted record
    fn from_record(record: Document) -> Result<Self>;
}

/// Generic construction and persistence delegation for one entity type
///
/// Entity-specific factories compose this core and supply their own
/// resolution or issuance logic on top of it.
pub struct ModelFactory<E: Entity> {
    store: Arc<dyn Datastore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for ModelFactory<E> {
    fn clone(&self) -> Self {
        ModelFactory {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> std::fmt::Debug for ModelFactory<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFactory").field("table", &E::TABLE).finish()
    }
}

impl<E: Entity> ModelFactory<E> {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        ModelFactory {
            store,
            _entity: PhantomData,
        }
    }

    /// Persist the given attributes and wrap the stored record
    ///
    /// Fields generated by the store, such as `id`, are reflected back on
    /// the returned model.
    pub async fn create(&self, attributes: Document) -> Result<E> {
        let record = self.store.save(E::TABLE, attributes).await?;
        E::from_record(record)
    }

    /// Fetch a single entity matching every filter field
    ///
    /// Absence is signalled by `Ok(None)`, not an error.
    pub async fn get(&self, filter: &Document) -> Result<Option<E>> {
        match self.store.get(E::TABLE, filter).await? {
            Some(record) => Ok(Some(E::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Fetch all entities matching the filter
    ///
    /// The store guarantees no ordering; callers sort when order matters.
    pub async fn scan(
        &self,
        filter: Option<&Document>,
        pagination: Option<Pagination>,
    ) -> Result<Vec<E>> {
        let records = self.store.scan(E::TABLE, filter, pagination).await?;
        records.into_iter().map(E::from_record).collect()
    }
}

/// Serialize a value into the datastore's document shape
pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(crate::error::ModelError::Serialization(
            serde::ser::Error::custom("entity must serialize to an object"),
        )),
    }
}

/// Build an equality filter over a single field
pub(crate) fn field_filter(field: &str, value: impl Into<String>) -> Document {
    let mut filter = Document::new();
    filter.insert(field.to_string(), Value::String(value.into()));
    filter
}
