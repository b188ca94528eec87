//! Projection detection.

use quarry_core::ProjectionFactory;
use std::collections::HashSet;

/// A projection factory that knows its projection types by name.
///
/// A result type counts as a projection when it differs from the domain
/// type and has been registered.
#[derive(Debug, Clone, Default)]
pub struct DefaultProjectionFactory {
    projections: HashSet<String>,
}

impl DefaultProjectionFactory {
    /// A factory with no registered projections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a projection type.
    pub fn with_projection(mut self, name: impl Into<String>) -> Self {
        self.projections.insert(name.into());
        self
    }
}

impl ProjectionFactory for DefaultProjectionFactory {
    fn is_projection(&self, result_type: &str, domain_type: &str) -> bool {
        result_type != domain_type && self.projections.contains(result_type)
    }
}
