//! Repository factory configuration.

use crate::template::TemplateSettings;
use quarry_core::QueryLookupKey;

/// Settings applied by [`RepositoryFactory`](crate::factory::RepositoryFactory).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryFactoryConfig {
    lookup_key: QueryLookupKey,
    templates: TemplateSettings,
}

impl RepositoryFactoryConfig {
    /// Default configuration: `CreateIfNotFound` with default template settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how unmarked methods are resolved.
    pub fn with_lookup_key(mut self, key: QueryLookupKey) -> Self {
        self.lookup_key = key;
        self
    }

    /// Set where marker templates are looked up.
    pub fn with_templates(mut self, templates: TemplateSettings) -> Self {
        self.templates = templates;
        self
    }

    /// The lookup key.
    pub fn lookup_key(&self) -> QueryLookupKey {
        self.lookup_key
    }

    /// The template settings.
    pub fn templates(&self) -> &TemplateSettings {
        &self.templates
    }
}
