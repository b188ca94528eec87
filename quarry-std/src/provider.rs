//! Persistence provider detection.

use quarry_core::{PersistenceSession, QueryExtractor, SessionCapabilities};
use std::sync::Arc;

/// The provider behind a session, acting as its [`QueryExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceProvider {
    name: String,
    extracts_query_strings: bool,
}

impl PersistenceProvider {
    /// Detect the provider of `session`. Called once per session.
    pub fn from_session(session: &dyn PersistenceSession) -> Self {
        Self::from_capabilities(session.capabilities())
    }

    /// Build the provider from reported capabilities.
    pub fn from_capabilities(capabilities: SessionCapabilities) -> Self {
        Self {
            name: capabilities.provider,
            extracts_query_strings: capabilities.extracts_query_strings,
        }
    }

    /// Type-erase into the shared extractor handle.
    pub fn into_extractor(self) -> Arc<dyn QueryExtractor> {
        Arc::new(self)
    }
}

impl QueryExtractor for PersistenceProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn can_extract_query(&self) -> bool {
        self.extracts_query_strings
    }
}
