//! Caller-owned factory registry
//!
//! One [`ModelContext`] is constructed at process start and passed explicitly
//! to consumers. It holds exactly one factory per entity type for its
//! lifetime, keeping initialization order and test isolation in the caller's
//! hands instead of behind global mutable state.

use std::sync::Arc;

use gantry_datastore::Datastore;

use crate::error::Result;
use crate::template_factory::TemplateFactory;
use crate::token_factory::TokenFactory;

/// Configuration for building a [`ModelContext`]
#[derive(Clone, Default)]
pub struct ContextConfig {
    /// Datastore shared by all factories
    pub datastore: Option<Arc<dyn Datastore>>,
}

impl ContextConfig {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        ContextConfig {
            datastore: Some(datastore),
        }
    }
}

/// Explicit registry of factory instances
///
/// Factories are constructed once, synchronously, when the context is built;
/// the accessors hand out the same instances for the lifetime of the context.
#[derive(Debug)]
pub struct ModelContext {
    templates: TemplateFactory,
    tokens: TokenFactory,
}

impl ModelContext {
    /// Build the context, constructing one factory per entity type
    ///
    /// Fails with a configuration error, before any asynchronous operation,
    /// when the config carries no datastore.
    pub fn new(config: ContextConfig) -> Result<Self> {
        let templates = TemplateFactory::from_config(&config)?;
        let tokens = TokenFactory::from_config(&config)?;

        Ok(ModelContext { templates, tokens })
    }

    /// The template factory for this context
    pub fn templates(&self) -> &TemplateFactory {
        &self.templates
    }

    /// The token factory for this context
    pub fn tokens(&self) -> &TokenFactory {
        &self.tokens
    }
}
