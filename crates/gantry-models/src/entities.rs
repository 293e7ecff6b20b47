//! Core entities of the gantry model layer

use std::collections::BTreeSet;

use gantry_datastore::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::Result;
use crate::factory::Entity;
use crate::version::Version;

/// Unique identifier for a template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl From<String> for TemplateId {
    fn from(s: String) -> Self {
        TemplateId(s)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        TemplateId(s.to_string())
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        TokenId(s)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        TokenId(s.to_string())
    }
}

impl AsRef<str> for TokenId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A named, versioned configuration bundle
///
/// Versions group under `name`; at most one persisted record holds a given
/// `(major, minor, patch)` triple for a name. Templates are immutable once
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Record identifier assigned by the datastore
    pub id: TemplateId,

    /// Template name; versions group under it
    pub name: String,

    /// Fully qualified version, assigned at creation
    pub version: Version,

    /// Contact for the template
    pub maintainer: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Labels attached to this version
    #[serde(default)]
    pub labels: BTreeSet<String>,

    /// Opaque configuration payload
    #[serde(default)]
    pub config: Value,

    /// Pipeline that published this version
    pub pipeline_id: String,

    /// When this version was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Template {
    /// Check if this version carries the given label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

impl Entity for Template {
    const TABLE: &'static str = "templates";

    fn from_record(record: Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }
}

/// A bearer secret bound to a user, stored only as a digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Record identifier assigned by the datastore
    pub id: TokenId,

    /// Owner of the token
    pub user_id: String,

    /// Human-readable token name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// SHA-256 hex digest of the secret
    pub hash: String,

    /// Last time the token authenticated a request
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_used: Option<OffsetDateTime>,

    /// When the token was issued
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Cleartext secret, present only on the model returned by issuance.
    /// Never serialized; there is no way to recover it from a stored record.
    #[serde(skip)]
    pub value: Option<String>,
}

impl Entity for Token {
    const TABLE: &'static str = "tokens";

    fn from_record(record: Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }
}
