//! # Query Lookup Strategy
//!
//! The pluggable extension point of repository construction: for each
//! abstract method, the repository factory asks a [`QueryLookupStrategy`] for
//! the executable query that will serve it.
//!
//! Strategies are selected by injection. A strategy that wants to reuse the
//! default behavior wraps a default strategy and delegates to it; there is no
//! base type to extend.

use crate::{
    error::ResolveError, metadata::RepositoryMetadata, method::RepositoryMethod,
    query::RepositoryQuery,
};
use std::sync::Arc;

/// How the default strategy finds the query of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryLookupKey {
    /// Always derive the query from the method name.
    Create,
    /// Only use declared (named) queries; fail when none exists.
    UseDeclaredQuery,
    /// Use a declared query when one exists, otherwise derive.
    #[default]
    CreateIfNotFound,
}

/// Decides whether a result type is a projection of the domain type.
pub trait ProjectionFactory: Send + Sync {
    /// Whether `result_type` is a projection of `domain_type`.
    fn is_projection(&self, result_type: &str, domain_type: &str) -> bool;
}

/// Queries declared by name, outside the repository interface.
pub trait NamedQueries: Send + Sync {
    /// Whether a query named `name` is declared.
    fn has_query(&self, name: &str) -> bool {
        self.get_query(name).is_some()
    }

    /// The text of the query named `name`.
    fn get_query(&self, name: &str) -> Option<&str>;
}

/// Resolves repository methods into executable queries.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a query lookup strategy",
    label = "missing `QueryLookupStrategy` implementation",
    note = "Implement `resolve_query` to turn repository methods into queries."
)]
pub trait QueryLookupStrategy: Send + Sync {
    /// Resolve the query for `method`, declared on the repository described by `metadata`.
    ///
    /// Called once per method while the repository is built.
    fn resolve_query(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
        named_queries: &dyn NamedQueries,
    ) -> Result<Arc<dyn RepositoryQuery>, ResolveError>;
}

impl<T: QueryLookupStrategy + ?Sized> QueryLookupStrategy for Arc<T> {
    fn resolve_query(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
        named_queries: &dyn NamedQueries,
    ) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
        (**self).resolve_query(method, metadata, projection, named_queries)
    }
}

impl<T: QueryLookupStrategy + ?Sized> QueryLookupStrategy for Box<T> {
    fn resolve_query(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
        named_queries: &dyn NamedQueries,
    ) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
        (**self).resolve_query(method, metadata, projection, named_queries)
    }
}
