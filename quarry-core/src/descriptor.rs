//! # Query Descriptor
//!
//! A [`QueryMethod`] is the resolved metadata of a repository method: how its
//! parameters bind and what shape its result takes, independent of where the
//! query text comes from.
//!
//! Both resolution branches build descriptors through the same
//! [`QueryMethodFactory`], so a method binds its parameters identically
//! whether or not it carries a query marker.

use crate::{
    error::ResolveError,
    metadata::RepositoryMetadata,
    method::{RepositoryMethod, TypeRef},
    session::QueryExtractor,
    strategy::ProjectionFactory,
};
use std::sync::Arc;

/// How a parameter takes part in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Bound by name into the query.
    Bindable,
    /// Carries the page window.
    Pageable,
}

/// A parameter as seen by the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    /// Position in the method signature.
    pub index: usize,
    /// Parameter name, used as the binding name.
    pub name: String,
    /// Declared type.
    pub ty: String,
    /// Binding role.
    pub kind: ParameterKind,
}

/// The shape of a method's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// `()`.
    Unit,
    /// Exactly one entity or projection.
    Single,
    /// `Option<T>`.
    Optional,
    /// `Vec<T>` and other collections.
    Collection,
    /// A lazily consumed stream.
    Stream,
    /// `Page<T>`: rows plus a total.
    Page,
    /// `Slice<T>`: rows without a total.
    Slice,
    /// A count.
    Count,
    /// An existence check.
    Exists,
}

impl ReturnShape {
    /// Whether the shape consumes a page window.
    pub fn is_paging(self) -> bool {
        matches!(self, ReturnShape::Page | ReturnShape::Slice)
    }

    /// Whether the shape yields many rows.
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            ReturnShape::Collection | ReturnShape::Stream | ReturnShape::Page | ReturnShape::Slice
        )
    }
}

/// Resolved metadata of a repository method.
#[derive(Debug, Clone)]
pub struct QueryMethod {
    method: RepositoryMethod,
    metadata: RepositoryMetadata,
    parameters: Vec<QueryParameter>,
    return_shape: ReturnShape,
    result_type: String,
    projection: Option<String>,
    extractor: Arc<dyn QueryExtractor>,
}

impl QueryMethod {
    /// Start a descriptor for `method` with no parameters and a single result.
    pub fn new(
        method: RepositoryMethod,
        metadata: RepositoryMetadata,
        extractor: Arc<dyn QueryExtractor>,
    ) -> Self {
        let result_type = method.return_type().to_string();
        Self {
            method,
            metadata,
            parameters: Vec::new(),
            return_shape: ReturnShape::Single,
            result_type,
            projection: None,
            extractor,
        }
    }

    /// Set the resolved parameters.
    pub fn with_parameters(mut self, parameters: Vec<QueryParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the result shape and the element type it carries.
    pub fn with_return_shape(mut self, shape: ReturnShape, result_type: impl Into<String>) -> Self {
        self.return_shape = shape;
        self.result_type = result_type.into();
        self
    }

    /// Mark the result type as a projection of the domain type.
    pub fn with_projection(mut self, projection: Option<String>) -> Self {
        self.projection = projection;
        self
    }

    /// The underlying method.
    pub fn method(&self) -> &RepositoryMethod {
        &self.method
    }

    /// The owning repository's metadata.
    pub fn metadata(&self) -> &RepositoryMetadata {
        &self.metadata
    }

    /// The method name.
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// The interface declaring the method.
    pub fn declaring_type(&self) -> TypeRef {
        self.method.declaring_type()
    }

    /// The method signature, for diagnostics.
    pub fn signature(&self) -> String {
        self.method.signature()
    }

    /// All parameters.
    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }

    /// Parameters bound by name, in order.
    pub fn bindable_parameters(&self) -> impl Iterator<Item = &QueryParameter> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Bindable)
    }

    /// Position of the pageable parameter, if declared.
    pub fn pageable_index(&self) -> Option<usize> {
        self.parameters
            .iter()
            .find(|p| p.kind == ParameterKind::Pageable)
            .map(|p| p.index)
    }

    /// The result shape.
    pub fn return_shape(&self) -> ReturnShape {
        self.return_shape
    }

    /// The element type of the result (`User` for `Vec<User>`).
    pub fn result_type(&self) -> &str {
        &self.result_type
    }

    /// The projection type, when the result is not the domain type.
    pub fn projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    /// Whether the method returns a page or slice.
    pub fn is_page_query(&self) -> bool {
        self.return_shape.is_paging()
    }

    /// Whether the method returns many rows.
    pub fn is_collection_query(&self) -> bool {
        self.return_shape.is_collection()
    }

    /// The name under which a declared query for this method is registered.
    pub fn named_query_name(&self) -> String {
        format!("{}.{}", self.metadata.domain_type(), self.method.name())
    }

    /// The extractor handle the descriptor was built with.
    pub fn extractor(&self) -> &Arc<dyn QueryExtractor> {
        &self.extractor
    }
}

impl PartialEq for QueryMethod {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.metadata == other.metadata
            && self.parameters == other.parameters
            && self.return_shape == other.return_shape
            && self.result_type == other.result_type
            && self.projection == other.projection
            && std::ptr::addr_eq(Arc::as_ptr(&self.extractor), Arc::as_ptr(&other.extractor))
    }
}

/// Builds query descriptors.
///
/// One factory instance is shared by the default resolver and the marker
/// dispatcher.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot build query methods",
    label = "missing `QueryMethodFactory` implementation",
    note = "Implement `build` to turn repository methods into `QueryMethod`s."
)]
pub trait QueryMethodFactory: Send + Sync {
    /// Build the descriptor for `method`.
    fn build(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
    ) -> Result<QueryMethod, ResolveError>;
}

impl<T: QueryMethodFactory + ?Sized> QueryMethodFactory for Arc<T> {
    fn build(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
    ) -> Result<QueryMethod, ResolveError> {
        (**self).build(method, metadata, projection)
    }
}
