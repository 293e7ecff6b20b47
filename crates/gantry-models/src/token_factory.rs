//! Token issuance and digest-based lookup

use std::sync::Arc;

use gantry_datastore::{Datastore, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::context::ContextConfig;
use crate::entities::{Token, TokenId};
use crate::error::{ModelError, Result};
use crate::factory::{ModelFactory, field_filter, to_document};
use crate::secret;

/// Metadata for issuing a new token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSpec {
    pub user_id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Lookup parameters for tokens
///
/// When `value` is set, the lookup runs against its digest; the cleartext
/// itself never reaches the datastore.
#[derive(Debug, Clone, Default)]
pub struct TokenQuery {
    pub id: Option<TokenId>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub value: Option<String>,
}

impl TokenQuery {
    pub fn by_id(id: impl Into<TokenId>) -> Self {
        TokenQuery {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_value(value: impl Into<String>) -> Self {
        TokenQuery {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn by_user_and_name(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        TokenQuery {
            user_id: Some(user_id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Build the datastore filter, replacing any cleartext with its digest
    fn into_filter(self) -> Document {
        let mut filter = Document::new();
        if let Some(id) = self.id {
            filter.insert("id".to_string(), Value::String(id.0));
        }
        if let Some(user_id) = self.user_id {
            filter.insert("user_id".to_string(), Value::String(user_id));
        }
        if let Some(name) = self.name {
            filter.insert("name".to_string(), Value::String(name));
        }
        if let Some(value) = self.value {
            filter.insert("hash".to_string(), Value::String(secret::digest(&value)));
        }
        filter
    }
}

#[derive(Serialize)]
struct NewToken {
    user_id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    hash: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

/// Factory owning token issuance and digest-based lookup
#[derive(Debug, Clone)]
pub struct TokenFactory {
    inner: ModelFactory<Token>,
}

impl TokenFactory {
    /// Create a factory backed by the given datastore
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        TokenFactory {
            inner: ModelFactory::new(store),
        }
    }

    /// Build from a context config, failing fast when no datastore is present
    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        let store = config.datastore.clone().ok_or_else(|| {
            ModelError::Configuration("No datastore provided to TokenFactory".to_string())
        })?;
        Ok(TokenFactory::new(store))
    }

    /// Issue a new token
    ///
    /// A fresh secret is generated and attached to the returned model as
    /// `value`; only its digest is persisted. This is the single moment the
    /// cleartext is observable; no later operation can recover it.
    pub async fn create(&self, spec: TokenSpec) -> Result<Token> {
        let value = secret::generate();
        let hash = secret::digest(&value);

        let attributes = to_document(&NewToken {
            user_id: spec.user_id,
            name: spec.name,
            description: spec.description,
            hash,
            created_at: OffsetDateTime::now_utc(),
        })?;

        let mut token = self.inner.create(attributes).await?;
        debug!(user_id = %token.user_id, name = %token.name, "issued token");

        token.value = Some(value);
        Ok(token)
    }

    /// Fetch a single token matching the query
    ///
    /// A supplied cleartext is digested before querying.
    pub async fn get(&self, query: TokenQuery) -> Result<Option<Token>> {
        self.inner.get(&query.into_filter()).await
    }

    /// All tokens issued to a user
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Token>> {
        self.inner
            .scan(Some(&field_filter("user_id", user_id)), None)
            .await
    }
}
