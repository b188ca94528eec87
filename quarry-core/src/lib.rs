//! # quarry-core
//!
//! Core traits for the Quarry repository query lookup framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! persistence integrations and custom strategies that don't need the full
//! `quarry-std` implementation.
//!
//! # Resolution Model
//!
//! A repository is described by a [`RepositoryDefinition`]: its
//! [`RepositoryMetadata`] plus every abstract [`RepositoryMethod`] it exposes.
//! While the repository is built, each method is handed to a
//! [`QueryLookupStrategy`], which returns the [`RepositoryQuery`] that will
//! serve the method for the lifetime of the repository.
//!
//! ## Method Identity ([`RepositoryMethod`])
//!
//! Name, declaring interface, parameters and return type. A method may carry
//! a [`QueryMarker`], reported through [`HasQueryMarker`].
//!
//! ## Query Descriptor ([`QueryMethod`])
//!
//! Parameter binding and result shape, built by a [`QueryMethodFactory`]
//! shared by every strategy so that binding never depends on the branch.
//!
//! ## Executable Query ([`RepositoryQuery`])
//!
//! Immutable, shareable, invoked with [`Arguments`] and answering a
//! [`QueryOutput`].
//!
//! # Error Types
//!
//! - [`QuarryError`] - Top-level error type
//! - [`ResolveError`] - Construction errors, fatal at startup
//! - [`InvocationError`] - Errors of a single query call

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod descriptor;
mod error;
mod marker;
mod metadata;
mod method;
mod query;
mod session;
mod strategy;
mod value;

// Re-exports
pub use descriptor::{ParameterKind, QueryMethod, QueryMethodFactory, QueryParameter, ReturnShape};
pub use error::{BoxError, DescriptorError, InvocationError, QuarryError, ResolveError};
pub use marker::{HasQueryMarker, QueryFlags, QueryMarker, QuerySource};
pub use metadata::{RepositoryDefinition, RepositoryInterface, RepositoryMetadata};
pub use method::{MethodParameter, RepositoryMethod, TypeRef};
pub use query::RepositoryQuery;
pub use session::{
    PersistenceSession, QueryExtractor, SessionCapabilities, Statement, StatementKind,
    StatementSource, TemplateLocation,
};
pub use strategy::{NamedQueries, ProjectionFactory, QueryLookupKey, QueryLookupStrategy};
pub use value::{Arguments, Bindings, PageRequest, QueryOutput, Row, Value};
