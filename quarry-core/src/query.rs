//! # Executable Query Contract
//!
//! Every lookup strategy hands back an `Arc<dyn RepositoryQuery>`. Whatever
//! branch produced it (a derived query, a declared query or a deferred
//! dynamic query), callers invoke it the same way.

use crate::{
    descriptor::QueryMethod,
    error::InvocationError,
    value::{Arguments, QueryOutput},
};
use async_trait::async_trait;
use std::any::Any;

/// An executable repository query.
///
/// Queries are immutable once resolved and are shared across concurrent
/// invocations of the repository.
#[async_trait]
pub trait RepositoryQuery: Send + Sync + std::fmt::Debug + 'static {
    /// The descriptor of the method this query serves.
    fn query_method(&self) -> &QueryMethod;

    /// Run the query with the given call arguments.
    async fn execute(&self, args: Arguments) -> Result<QueryOutput, InvocationError>;

    /// Access to the concrete type, for inspection.
    fn as_any(&self) -> &dyn Any;
}
