//! # Gantry Models
//!
//! Typed model and factory layer over the gantry datastore, providing:
//! - Template versioning with system-assigned, monotonically increasing
//!   patch numbers (auto-bump on `major.minor` collision)
//! - Label-aware lookup resolving to the highest matching version
//! - Single-issue access tokens whose cleartext is returned exactly once
//!   and persisted only as a digest
//! - An explicit, caller-owned [`ModelContext`] holding one factory per
//!   entity type
//!
//! ## Core Concepts
//!
//! - **Templates** are immutable once persisted; for a name, each
//!   `(major, minor, patch)` triple exists at most once
//! - **Versions** are strict numeric triples; requested versions are
//!   normalized at the boundary and malformed input is rejected early
//! - **Tokens** round-trip only their digest; lookup by cleartext re-hashes
//!   before querying
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gantry_datastore::MemoryDatastore;
//! use gantry_models::{ContextConfig, ModelContext, TemplateSpec, TokenSpec};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryDatastore::new());
//! let context = ModelContext::new(ContextConfig::new(store))?;
//!
//! // Publish a template; the patch component is assigned automatically
//! let template = context
//!     .templates()
//!     .create(TemplateSpec {
//!         name: "nodejs-build".to_string(),
//!         version: "1.3".parse()?,
//!         maintainer: "dev@example.com".to_string(),
//!         description: None,
//!         labels: ["stable".to_string()].into(),
//!         config: serde_json::json!({ "image": "node:20" }),
//!         pipeline_id: "42".to_string(),
//!     })
//!     .await?;
//! assert_eq!(template.version.to_string(), "1.3.0");
//!
//! // Issue a token; the cleartext secret is observable exactly once
//! let token = context
//!     .tokens()
//!     .create(TokenSpec {
//!         user_id: "alice".to_string(),
//!         name: "ci".to_string(),
//!         description: None,
//!     })
//!     .await?;
//! println!("token secret (shown once): {}", token.value.unwrap());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod entities;
pub mod error;
pub mod factory;
pub mod secret;
pub mod template_factory;
pub mod token_factory;
pub mod version;

pub use context::{ContextConfig, ModelContext};
pub use entities::{Template, TemplateId, Token, TokenId};
pub use error::{ModelError, Result};
pub use factory::{Entity, ModelFactory};
pub use template_factory::{TemplateFactory, TemplateQuery, TemplateSpec};
pub use token_factory::{TokenFactory, TokenQuery, TokenSpec};
pub use version::{Version, VersionError, VersionSpec};
