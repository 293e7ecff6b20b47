//! Integration tests for gantry-models

use std::sync::Arc;

use async_trait::async_trait;
use gantry_datastore::{Datastore, Document, MemoryDatastore, Pagination};
use gantry_models::{
    ContextConfig, ModelContext, ModelError, TemplateQuery, TemplateSpec, TokenFactory,
    TokenQuery, TokenSpec, secret,
};
use serde_json::{Value, json};

fn context() -> (Arc<MemoryDatastore>, ModelContext) {
    let store = Arc::new(MemoryDatastore::new());
    let context = ModelContext::new(ContextConfig::new(store.clone())).unwrap();
    (store, context)
}

fn template_spec(name: &str, version: &str) -> TemplateSpec {
    TemplateSpec {
        name: name.to_string(),
        version: version.parse().unwrap(),
        maintainer: "dev@example.com".to_string(),
        description: None,
        labels: Default::default(),
        config: json!({ "image": "node:20" }),
        pipeline_id: "42".to_string(),
    }
}

fn filter(field: &str, value: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(field.to_string(), Value::String(value.to_string()));
    filter
}

#[tokio::test]
async fn test_first_version_on_line_gets_patch_zero() {
    let (_, context) = context();

    let template = context
        .templates()
        .create(template_spec("build", "1.3"))
        .await
        .unwrap();

    assert_eq!(template.version.to_string(), "1.3.0");
    assert!(!template.id.as_ref().is_empty());
}

#[tokio::test]
async fn test_bare_major_version_defaults_minor_to_zero() {
    let (_, context) = context();

    let mut spec = template_spec("build", "1");
    spec.version = 1.into();
    let template = context.templates().create(spec).await.unwrap();

    assert_eq!(template.version.to_string(), "1.0.0");
}

#[tokio::test]
async fn test_existing_version_auto_bumps_patch() {
    let (_, context) = context();
    let templates = context.templates();

    let first = templates.create(template_spec("build", "1.3")).await.unwrap();
    assert_eq!(first.version.to_string(), "1.3.0");

    // A different pipeline and config still bump; the collision is purely
    // on (name, major, minor)
    let mut spec = template_spec("build", "1.3");
    spec.pipeline_id = "999".to_string();
    spec.config = json!({ "image": "node:22" });
    let second = templates.create(spec).await.unwrap();

    assert_eq!(second.version.to_string(), "1.3.1");
}

#[tokio::test]
async fn test_successive_patches_strictly_increase_from_zero() {
    let (_, context) = context();
    let templates = context.templates();

    for expected in 0..4 {
        let template = templates.create(template_spec("build", "2.1")).await.unwrap();
        assert_eq!(template.version.patch, expected);
        assert_eq!(template.version.to_string(), format!("2.1.{expected}"));
    }
}

#[tokio::test]
async fn test_supplied_patch_is_ignored() {
    let (_, context) = context();
    let templates = context.templates();

    templates.create(template_spec("build", "1.3")).await.unwrap();
    let bumped = templates.create(template_spec("build", "1.3.9")).await.unwrap();

    assert_eq!(bumped.version.to_string(), "1.3.1");
}

#[tokio::test]
async fn test_version_lines_bump_independently() {
    let (_, context) = context();
    let templates = context.templates();

    assert_eq!(
        templates
            .create(template_spec("build", "1.3"))
            .await
            .unwrap()
            .version
            .to_string(),
        "1.3.0"
    );
    assert_eq!(
        templates
            .create(template_spec("build", "1.4"))
            .await
            .unwrap()
            .version
            .to_string(),
        "1.4.0"
    );
    assert_eq!(
        templates
            .create(template_spec("build", "1.3"))
            .await
            .unwrap()
            .version
            .to_string(),
        "1.3.1"
    );

    // Other template names are unaffected
    assert_eq!(
        templates
            .create(template_spec("deploy", "1.3"))
            .await
            .unwrap()
            .version
            .to_string(),
        "1.3.0"
    );
}

#[tokio::test]
async fn test_get_template_returns_numeric_max_version() {
    let (_, context) = context();
    let templates = context.templates();

    templates.create(template_spec("build", "1.9")).await.unwrap();
    templates.create(template_spec("build", "1.10")).await.unwrap();
    templates.create(template_spec("build", "1.2")).await.unwrap();

    // Lexicographic comparison would pick 1.9; numeric picks 1.10
    let winner = templates
        .get_template(TemplateQuery::by_name("build"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(winner.version.to_string(), "1.10.0");
}

#[tokio::test]
async fn test_get_template_filters_by_label() {
    let (_, context) = context();
    let templates = context.templates();

    let mut stable = template_spec("build", "1.0");
    stable.labels = ["stable".to_string()].into();
    templates.create(stable).await.unwrap();

    let mut beta = template_spec("build", "2.0");
    beta.labels = ["beta".to_string()].into();
    templates.create(beta).await.unwrap();

    let stable_winner = templates
        .get_template(TemplateQuery::by_name("build").with_label("stable"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stable_winner.version.to_string(), "1.0.0");

    // Without a label the max across all labels wins
    let global_winner = templates
        .get_template(TemplateQuery::by_name("build"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(global_winner.version.to_string(), "2.0.0");

    // Unmatched label or name resolves to nothing
    assert!(
        templates
            .get_template(TemplateQuery::by_name("build").with_label("lts"))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        templates
            .get_template(TemplateQuery::by_name("missing"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_get_template_with_version_prefix() {
    let (_, context) = context();
    let templates = context.templates();

    templates.create(template_spec("build", "1.3")).await.unwrap();
    templates.create(template_spec("build", "1.3")).await.unwrap();
    templates.create(template_spec("build", "2.0")).await.unwrap();

    let on_line = templates
        .get_template(TemplateQuery::by_name("build").with_version("1.3".parse().unwrap()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(on_line.version.to_string(), "1.3.1");

    let on_major = templates
        .get_template(TemplateQuery::by_name("build").with_version(1.into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(on_major.version.to_string(), "1.3.1");

    let exact = templates
        .get_template(TemplateQuery::by_name("build").with_version("1.3.0".parse().unwrap()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exact.version.to_string(), "1.3.0");

    assert!(
        templates
            .get_template(TemplateQuery::by_name("build").with_version(3.into()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_list_versions_newest_first() {
    let (_, context) = context();
    let templates = context.templates();

    templates.create(template_spec("build", "1.0")).await.unwrap();
    templates.create(template_spec("build", "1.2")).await.unwrap();
    templates.create(template_spec("build", "1.1")).await.unwrap();

    let versions: Vec<String> = templates
        .list_versions("build")
        .await
        .unwrap()
        .iter()
        .map(|t| t.version.to_string())
        .collect();

    assert_eq!(versions, vec!["1.2.0", "1.1.0", "1.0.0"]);
}

#[tokio::test]
async fn test_get_by_id_reflects_generated_id() {
    let (_, context) = context();
    let templates = context.templates();

    let created = templates.create(template_spec("build", "1.0")).await.unwrap();
    let fetched = templates.get_by_id(&created.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.version, created.version);
}

#[test]
fn test_context_accessors_return_the_same_instances() {
    let store = Arc::new(MemoryDatastore::new());
    let context = ModelContext::new(ContextConfig::new(store)).unwrap();

    assert!(std::ptr::eq(context.templates(), context.templates()));
    assert!(std::ptr::eq(context.tokens(), context.tokens()));
}

#[test]
fn test_context_without_datastore_fails_fast() {
    let err = ModelContext::new(ContextConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "No datastore provided to TemplateFactory");

    let err = TokenFactory::from_config(&ContextConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "No datastore provided to TokenFactory");
}

#[tokio::test]
async fn test_token_cleartext_is_returned_once_and_never_persisted() {
    let (store, context) = context();

    let token = context
        .tokens()
        .create(TokenSpec {
            user_id: "alice".to_string(),
            name: "ci".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let value = token.value.as_deref().unwrap();
    assert_eq!(token.hash, secret::digest(value));
    assert_ne!(token.hash, value);
    assert!(token.last_used.is_none());

    // The stored record carries the digest only
    let record = store
        .get("tokens", &filter("id", token.id.as_ref()))
        .await
        .unwrap()
        .unwrap();
    assert!(record.get("value").is_none());
    assert_eq!(
        record.get("hash").and_then(Value::as_str),
        Some(token.hash.as_str())
    );
    assert!(!serde_json::to_string(&record).unwrap().contains(value));
}

#[tokio::test]
async fn test_token_lookup_by_cleartext_queries_by_digest() {
    let (_, context) = context();
    let tokens = context.tokens();

    let issued = tokens
        .create(TokenSpec {
            user_id: "alice".to_string(),
            name: "ci".to_string(),
            description: Some("deploy key".to_string()),
        })
        .await
        .unwrap();
    let value = issued.value.clone().unwrap();

    let found = tokens.get(TokenQuery::by_value(value)).await.unwrap().unwrap();
    assert_eq!(found.id, issued.id);
    // Lookup never resurrects the cleartext
    assert!(found.value.is_none());

    let missing = tokens
        .get(TokenQuery::by_value("not-the-secret"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_token_list_for_user() {
    let (_, context) = context();
    let tokens = context.tokens();

    for name in ["ci", "deploy"] {
        tokens
            .create(TokenSpec {
                user_id: "alice".to_string(),
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap();
    }
    tokens
        .create(TokenSpec {
            user_id: "bob".to_string(),
            name: "ci".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let alices = tokens.list_for_user("alice").await.unwrap();
    assert_eq!(alices.len(), 2);
    assert!(alices.iter().all(|t| t.user_id == "alice"));
}

/// Store that lands a rival write between the factory's scan and its save,
/// reproducing the concurrent-create race on a constrained backing store.
struct RacingStore {
    inner: MemoryDatastore,
}

#[async_trait]
impl Datastore for RacingStore {
    async fn save(&self, table: &str, entity: Document) -> gantry_datastore::Result<Document> {
        let mut rival = entity.clone();
        rival.remove("id");
        self.inner.save(table, rival).await?;
        self.inner.save(table, entity).await
    }

    async fn get(&self, table: &str, filter: &Document) -> gantry_datastore::Result<Option<Document>> {
        self.inner.get(table, filter).await
    }

    async fn scan(
        &self,
        table: &str,
        filter: Option<&Document>,
        pagination: Option<Pagination>,
    ) -> gantry_datastore::Result<Vec<Document>> {
        self.inner.scan(table, filter, pagination).await
    }
}

#[tokio::test]
async fn test_duplicate_version_surfaces_distinctly() {
    let store = Arc::new(RacingStore {
        inner: MemoryDatastore::new().with_unique_constraint("templates", &["name", "version"]),
    });
    let context = ModelContext::new(ContextConfig::new(store)).unwrap();

    let err = context
        .templates()
        .create(template_spec("build", "1.0"))
        .await
        .unwrap_err();

    match err {
        ModelError::DuplicateVersion { name, version } => {
            assert_eq!(name, "build");
            assert_eq!(version, "1.0.0");
        }
        other => panic!("Expected DuplicateVersion, got {other:?}"),
    }
}

#[test]
fn test_malformed_versions_are_rejected_at_the_boundary() {
    // A malformed version never parses, so no datastore call can happen
    for input in ["", "1.x", "1.2.3.4", "-1", "1..2"] {
        assert!(
            input.parse::<gantry_models::VersionSpec>().is_err(),
            "expected {input:?} to be rejected"
        );
    }

    let spec = json!({
        "name": "build",
        "version": "1.x",
        "maintainer": "dev@example.com",
        "pipeline_id": "42"
    });
    assert!(serde_json::from_value::<TemplateSpec>(spec).is_err());

    let spec = json!({
        "name": "build",
        "version": -1,
        "maintainer": "dev@example.com",
        "pipeline_id": "42"
    });
    assert!(serde_json::from_value::<TemplateSpec>(spec).is_err());
}
