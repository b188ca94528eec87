//! Error types for Quarry.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`QuarryError`] - Top-level error type for all Quarry operations
//! - [`ResolveError`] - Construction errors raised while a repository is built
//! - [`DescriptorError`] - Why a query descriptor could not be built
//! - [`InvocationError`] - Errors raised when a resolved query is invoked
//!
//! Resolution errors are fatal: they surface while the repository is being
//! constructed. Problems with the *content* of a query marker (blank ids,
//! incompatible return types) are never resolution errors; they surface as
//! [`InvocationError`]s on the first call of the affected method.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// A repository method could not be resolved.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// A resolved query failed when invoked.
    #[error("invocation error: {0}")]
    Invocation(#[from] InvocationError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while resolving repository methods into queries.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The query descriptor for a method could not be built.
    #[error("cannot build query method for `{method}`: {source}")]
    Descriptor {
        /// Signature of the offending method.
        method: String,
        /// The underlying descriptor problem.
        #[source]
        source: DescriptorError,
    },

    /// A deferred query was built without one of its mandatory parts.
    #[error("deferred query for `{method}` is missing its {part}")]
    Incomplete {
        /// Signature of the offending method, or `<unknown>` without descriptor.
        method: String,
        /// The missing part.
        part: &'static str,
    },

    /// The lookup key demands a declared query but none is registered.
    #[error("no declared query `{name}` found for `{method}`")]
    NoDeclaredQuery {
        /// Signature of the offending method.
        method: String,
        /// Name of the named query that was looked up.
        name: String,
    },

    /// The method name cannot be turned into a derived query.
    #[error("cannot derive a query from `{method}`: {reason}")]
    InvalidDerivedQuery {
        /// Signature of the offending method.
        method: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// A custom error raised by a third-party lookup strategy.
    #[error(transparent)]
    Custom(BoxError),
}

/// Reasons a query descriptor cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Two parameters share the same name.
    #[error("duplicate parameter name `{0}`")]
    DuplicateParameter(String),

    /// More than one pageable parameter was declared.
    #[error("at most one pageable parameter is allowed")]
    MultiplePageable,

    /// A page or slice return type without a pageable parameter.
    #[error("paging return type `{0}` requires a `PageRequest` parameter")]
    PageWithoutPageable(String),

    /// The declared return type cannot be mapped to a result shape.
    #[error("unsupported return type `{0}`")]
    UnsupportedReturnType(String),
}

/// Errors raised when a resolved query is invoked.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The repository has no query for the requested method.
    #[error("no query resolved for method `{0}`")]
    UnknownMethod(String),

    /// The marker names neither a template id nor inline query text.
    #[error("query marker on `{method}` has a blank template id and no inline query")]
    BlankQuery {
        /// Signature of the offending method.
        method: String,
    },

    /// The template id cannot be split into a namespace and an id.
    #[error("query marker on `{method}` names an invalid template id `{id}`")]
    InvalidTemplateId {
        /// Signature of the offending method.
        method: String,
        /// The template id as written.
        id: String,
    },

    /// The marker requests counting on a method that does not return a page.
    #[error("`{method}` returns `{return_type}`, which cannot carry a count query")]
    IncompatibleReturnType {
        /// Signature of the offending method.
        method: String,
        /// The declared return type.
        return_type: String,
    },

    /// The number of arguments does not match the bindable parameters.
    #[error("`{method}` expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// Signature of the offending method.
        method: String,
        /// Number of bindable parameters.
        expected: usize,
        /// Number of supplied values.
        actual: usize,
    },

    /// A paging method was invoked without a page request.
    #[error("`{method}` is a paging query and requires a page request")]
    MissingPage {
        /// Signature of the offending method.
        method: String,
    },

    /// The session returned an output the query cannot interpret.
    #[error("unexpected output for `{method}`: {detail}")]
    UnexpectedOutput {
        /// Signature of the offending method.
        method: String,
        /// What was received.
        detail: String,
    },

    /// The persistence session failed to execute the statement.
    #[error("session error")]
    Session(#[source] BoxError),
}

// Convenience conversions
impl From<BoxError> for QuarryError {
    fn from(err: BoxError) -> Self {
        QuarryError::Custom(err)
    }
}

impl From<BoxError> for ResolveError {
    fn from(err: BoxError) -> Self {
        ResolveError::Custom(err)
    }
}

impl From<BoxError> for InvocationError {
    fn from(err: BoxError) -> Self {
        InvocationError::Session(err)
    }
}
