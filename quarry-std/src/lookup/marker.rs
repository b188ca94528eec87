//! # Marker Dispatcher
//!
//! [`MarkerQueryLookupStrategy`] routes each repository method to one of two
//! resolvers:
//!
//! - methods carrying a [`QueryMarker`] become a [`DeferredDynamicQuery`];
//! - everything else goes to the fallback resolver, and its answer (query
//!   or error) is returned untouched.
//!
//! The dispatcher keeps no state between calls. Resolving the same method
//! twice yields two distinct but equal queries.
//!
//! [`QueryMarker`]: quarry_core::QueryMarker

use super::DefaultQueryLookupStrategy;
use crate::{deferred::DeferredDynamicQuery, template::TemplateSettings};
use quarry_core::{
    HasQueryMarker, NamedQueries, PersistenceSession, ProjectionFactory, QueryLookupStrategy,
    QueryMethodFactory, RepositoryMetadata, RepositoryMethod, RepositoryQuery, ResolveError,
};
use std::sync::Arc;

/// Lookup strategy that understands query markers.
///
/// `D` is the resolver used for unmarked methods.
pub struct MarkerQueryLookupStrategy<D = DefaultQueryLookupStrategy> {
    session: Arc<dyn PersistenceSession>,
    method_factory: Arc<dyn QueryMethodFactory>,
    templates: TemplateSettings,
    fallback: D,
}

impl<D: QueryLookupStrategy> MarkerQueryLookupStrategy<D> {
    /// Create a dispatcher delegating unmarked methods to `fallback`.
    ///
    /// `method_factory` builds the descriptors of marked methods and carries
    /// the session's query extractor into them.
    pub fn new(
        session: Arc<dyn PersistenceSession>,
        method_factory: Arc<dyn QueryMethodFactory>,
        fallback: D,
    ) -> Self {
        Self {
            session,
            method_factory,
            templates: TemplateSettings::default(),
            fallback,
        }
    }

    /// Use `templates` to locate marker templates.
    pub fn with_templates(mut self, templates: TemplateSettings) -> Self {
        self.templates = templates;
        self
    }

    /// The resolver used for unmarked methods.
    pub fn fallback(&self) -> &D {
        &self.fallback
    }
}

impl<D: QueryLookupStrategy> QueryLookupStrategy for MarkerQueryLookupStrategy<D> {
    fn resolve_query(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
        named_queries: &dyn NamedQueries,
    ) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
        let Some(marker) = method.query_marker() else {
            #[cfg(feature = "tracing")]
            {
                tracing::debug!(method = %method.signature(), "No query marker, delegating");
            }
            return self
                .fallback
                .resolve_query(method, metadata, projection, named_queries);
        };

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                method = %method.signature(),
                declaring_type = %method.declaring_type().qualified_name(),
                ?marker,
                "Resolving marked method as deferred dynamic query"
            );
        }

        let descriptor = self.method_factory.build(method, metadata, projection)?;
        let query = DeferredDynamicQuery::builder()
            .descriptor(descriptor)
            .session(self.session.clone())
            .marker(marker.clone())
            .declaring_type(method.declaring_type())
            .templates(self.templates.clone())
            .build()?;
        Ok(Arc::new(query))
    }
}
