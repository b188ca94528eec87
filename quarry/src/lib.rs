//! # quarry - Marker-Driven Query Lookup
//!
//! `quarry` builds repositories from trait definitions. Each repository
//! method gets its query once, while the repository is constructed:
//!
//! - methods carrying a query marker become deferred dynamic queries,
//!   assembled from a template or inline text when they are called;
//! - every other method is resolved by the default strategy, from a
//!   declared query or from the method name.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quarry::prelude::*;
//!
//! #[quarry::repository(entity = User, id = i64)]
//! pub trait UserRepository {
//!     fn find_by_name(&self, name: String) -> Vec<User>;
//!
//!     #[query("activeUsers")]
//!     fn find_active_users(&self) -> Vec<User>;
//! }
//!
//! let factory = RepositoryFactory::new(session);
//! let users = factory.resolve_interface::<UserRepositoryDefinition>()?;
//! let active = users.invoke("find_active_users", Arguments::none()).await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use quarry_core::{
    // Values
    Arguments,
    Bindings,
    // Error types
    BoxError,
    DescriptorError,
    // Repository model
    HasQueryMarker,
    InvocationError,
    MethodParameter,
    // Lookup
    NamedQueries,
    PageRequest,
    ParameterKind,
    // Session
    PersistenceSession,
    ProjectionFactory,
    QuarryError,
    QueryExtractor,
    QueryFlags,
    QueryLookupKey,
    QueryLookupStrategy,
    QueryMarker,
    // Descriptor
    QueryMethod,
    QueryMethodFactory,
    QueryOutput,
    QueryParameter,
    QuerySource,
    RepositoryDefinition,
    RepositoryInterface,
    RepositoryMetadata,
    RepositoryMethod,
    RepositoryQuery,
    ResolveError,
    ReturnShape,
    Row,
    SessionCapabilities,
    Statement,
    StatementKind,
    StatementSource,
    TemplateLocation,
    TypeRef,
    Value,
};

pub use quarry_std::{
    DeclaredQuery, DefaultProjectionFactory, DefaultQueryLookupStrategy, DefaultQueryMethodFactory,
    DeferredDynamicQuery, DeferredQueryBuilder, DerivedQuery, MarkerQueryLookupStrategy,
    MarkerTable, NoNamedQueries, PersistenceProvider, PropertiesNamedQueries, RepositoryFactory,
    RepositoryFactoryConfig, ResolvedRepository, TemplateSettings,
};

#[cfg(feature = "inventory")]
pub use quarry_std::{RepositoryRegistration, find_registered, registered_repositories};

pub use async_trait::async_trait;

/// Method-name query derivation.
pub mod part_tree {
    pub use quarry_std::lookup::part_tree::{Direction, Operator, Part, PartTree, Subject};
}

/// Testing utilities.
pub mod testing {
    pub use quarry_std::testing::{RecordingSession, StubLookupStrategy, StubQuery};
}

/// Prelude module - common imports for Quarry.
///
/// # Usage
///
/// ```rust,ignore
/// use quarry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Arguments, InvocationError, PageRequest, PersistenceSession, QueryLookupKey, QueryMarker,
        QueryOutput, RepositoryFactory, RepositoryFactoryConfig, RepositoryInterface,
        RepositoryQuery, ResolveError, Statement, TemplateSettings, Value, async_trait,
    };
}

#[cfg(feature = "macros")]
pub use quarry_macros::repository;

#[cfg(feature = "inventory")]
pub use inventory;
