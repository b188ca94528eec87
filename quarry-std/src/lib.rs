//! # quarry-std
//!
//! Standard implementations for the Quarry repository query framework.
//!
//! This crate provides:
//! - **Marker dispatch**: [`MarkerQueryLookupStrategy`] and the
//!   [`DeferredDynamicQuery`] it produces for marked methods
//! - **Default resolution**: [`DefaultQueryLookupStrategy`], deriving queries
//!   from method names or using declared queries
//! - **Descriptors**: [`DefaultQueryMethodFactory`], [`PersistenceProvider`]
//! - **Construction**: [`RepositoryFactory`], [`RepositoryFactoryConfig`]
//! - **Marker binding**: [`MarkerTable`] and, with the `inventory` feature,
//!   link-time repository registration
//! - **Testing**: recording sessions and stub strategies in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use quarry_core;

mod binding;

// Modules
pub mod config;
pub mod deferred;
pub mod factory;
pub mod lookup;
pub mod method_factory;
pub mod named;
pub mod projection;
pub mod provider;
pub mod registry;
pub mod template;
pub mod testing;

pub use config::RepositoryFactoryConfig;
pub use deferred::{DeferredDynamicQuery, DeferredQueryBuilder};
pub use factory::{RepositoryFactory, ResolvedRepository};
pub use lookup::{
    DeclaredQuery, DefaultQueryLookupStrategy, DerivedQuery, MarkerQueryLookupStrategy,
};
pub use method_factory::DefaultQueryMethodFactory;
pub use named::{NoNamedQueries, PropertiesNamedQueries};
pub use projection::DefaultProjectionFactory;
pub use provider::PersistenceProvider;
pub use registry::MarkerTable;
#[cfg(feature = "inventory")]
pub use registry::{RepositoryRegistration, find_registered, registered_repositories};
pub use template::TemplateSettings;

#[cfg(feature = "inventory")]
pub use inventory;
