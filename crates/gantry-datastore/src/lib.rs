//! # Gantry Datastore
//!
//! The key-value style persistence contract consumed by the gantry model
//! layer:
//! - [`Datastore`]: the collaborator trait (`save`/`get`/`scan`)
//! - [`Document`]: the generic record and filter shape
//! - [`MemoryDatastore`]: in-memory implementation for testing and
//!   development
//!
//! `scan` returns records in an unspecified but stable order per call;
//! consumers re-sort when semantics require it.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{DatastoreError, Result};
pub use memory::MemoryDatastore;
pub use store::{Datastore, Document, Pagination};
