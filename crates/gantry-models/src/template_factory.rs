//! Template construction and version resolution

use std::collections::BTreeSet;
use std::sync::Arc;

use gantry_datastore::{Datastore, DatastoreError, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::context::ContextConfig;
use crate::entities::{Template, TemplateId};
use crate::error::{ModelError, Result};
use crate::factory::{ModelFactory, field_filter, to_document};
use crate::version::{Version, VersionSpec};

/// Metadata for creating a new template version
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSpec {
    pub name: String,

    /// Requested version line; the patch component is assigned, never taken
    /// from here
    pub version: VersionSpec,

    pub maintainer: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub labels: BTreeSet<String>,

    /// Opaque configuration payload
    #[serde(default)]
    pub config: Value,

    pub pipeline_id: String,
}

/// Lookup parameters for [`TemplateFactory::get_template`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateQuery {
    pub name: String,

    /// Optional version prefix restricting the candidate set
    #[serde(default)]
    pub version: Option<VersionSpec>,

    /// Only consider versions carrying this label
    #[serde(default)]
    pub label: Option<String>,
}

impl TemplateQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        TemplateQuery {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_version(mut self, version: VersionSpec) -> Self {
        self.version = Some(version);
        self
    }
}

#[derive(Serialize)]
struct NewTemplate {
    name: String,
    version: Version,
    maintainer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    labels: BTreeSet<String>,
    config: Value,
    pipeline_id: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

/// Factory owning template version resolution and label-aware lookup
#[derive(Debug, Clone)]
pub struct TemplateFactory {
    inner: ModelFactory<Template>,
}

impl TemplateFactory {
    /// Create a factory backed by the given datastore
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        TemplateFactory {
            inner: ModelFactory::new(store),
        }
    }

    /// Build from a context config, failing fast when no datastore is present
    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        let store = config.datastore.clone().ok_or_else(|| {
            ModelError::Configuration("No datastore provided to TemplateFactory".to_string())
        })?;
        Ok(TemplateFactory::new(store))
    }

    /// Create a new template version
    ///
    /// The requested version is normalized to its `major.minor` line and the
    /// patch is assigned from the highest existing patch on that line, or 0
    /// when the line is empty. The bump is purely a function of the
    /// `(name, major, minor)` collision, never of content equality.
    ///
    /// This is a read-then-write sequence without a transactional guarantee;
    /// two concurrent creates on one line can observe the same maximum. A
    /// store-level uniqueness rejection surfaces as
    /// [`ModelError::DuplicateVersion`].
    pub async fn create(&self, spec: TemplateSpec) -> Result<Template> {
        let (major, minor) = spec.version.line();
        let existing = self.scan_by_name(&spec.name).await?;

        let next_patch = existing
            .iter()
            .filter(|t| t.version.is_on_line(major, minor))
            .map(|t| t.version.patch)
            .max()
            .map_or(0, |p| p + 1);
        let version = Version::new(major, minor, next_patch);
        debug!(name = %spec.name, %version, "resolved template version");

        let attributes = to_document(&NewTemplate {
            name: spec.name.clone(),
            version,
            maintainer: spec.maintainer,
            description: spec.description,
            labels: spec.labels,
            config: spec.config,
            pipeline_id: spec.pipeline_id,
            created_at: OffsetDateTime::now_utc(),
        })?;

        match self.inner.create(attributes).await {
            Err(ModelError::Datastore(DatastoreError::Conflict { .. })) => {
                Err(ModelError::DuplicateVersion {
                    name: spec.name,
                    version: version.to_string(),
                })
            }
            other => other,
        }
    }

    /// Resolve a query to the highest matching template version
    ///
    /// Candidates are all versions of the name, narrowed by label and by
    /// version prefix when given; the winner is the numeric component-wise
    /// maximum `(major, minor, patch)`. `Ok(None)` when nothing matches.
    pub async fn get_template(&self, query: TemplateQuery) -> Result<Option<Template>> {
        let candidates = self.scan_by_name(&query.name).await?;

        Ok(candidates
            .into_iter()
            .filter(|t| query.label.as_deref().map_or(true, |l| t.has_label(l)))
            .filter(|t| {
                query
                    .version
                    .as_ref()
                    .map_or(true, |v| v.matches(&t.version))
            })
            .max_by_key(|t| t.version))
    }

    /// Fetch a single template matching a raw document filter
    pub async fn get(&self, filter: &Document) -> Result<Option<Template>> {
        self.inner.get(filter).await
    }

    /// Fetch a template by its record id
    pub async fn get_by_id(&self, id: &TemplateId) -> Result<Option<Template>> {
        self.inner.get(&field_filter("id", id.as_ref())).await
    }

    /// All versions published under a name, newest first
    pub async fn list_versions(&self, name: &str) -> Result<Vec<Template>> {
        let mut templates = self.scan_by_name(name).await?;
        templates.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(templates)
    }

    async fn scan_by_name(&self, name: &str) -> Result<Vec<Template>> {
        self.inner
            .scan(Some(&field_filter("name", name)), None)
            .await
    }
}
