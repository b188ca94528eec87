//! # Marker Binding
//!
//! Two ways of getting markers onto repository methods besides writing
//! them by hand:
//!
//! - the `#[repository]` macro, whose definitions are also collected here
//!   through `inventory` (feature `inventory`);
//! - a [`MarkerTable`], filled at runtime and applied to a definition.

use quarry_core::{HasQueryMarker, QueryMarker, RepositoryDefinition, RepositoryMethod, TypeRef};
use std::collections::HashMap;

/// A repository definition submitted at link time.
#[cfg(feature = "inventory")]
pub struct RepositoryRegistration {
    name: &'static str,
    definition: fn() -> RepositoryDefinition,
}

#[cfg(feature = "inventory")]
impl RepositoryRegistration {
    /// Create a registration entry. Usable in `inventory::submit!`.
    pub const fn new(name: &'static str, definition: fn() -> RepositoryDefinition) -> Self {
        Self { name, definition }
    }

    /// The qualified name of the repository interface.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build the definition.
    pub fn definition(&self) -> RepositoryDefinition {
        (self.definition)()
    }
}

#[cfg(feature = "inventory")]
inventory::collect!(RepositoryRegistration);

/// Every registered repository, sorted by name.
#[cfg(feature = "inventory")]
pub fn registered_repositories() -> Vec<&'static RepositoryRegistration> {
    let mut entries: Vec<_> = inventory::iter::<RepositoryRegistration>
        .into_iter()
        .collect();
    entries.sort_by_key(|entry| entry.name);
    entries
}

/// Find a registered repository by qualified name.
#[cfg(feature = "inventory")]
pub fn find_registered(name: &str) -> Option<&'static RepositoryRegistration> {
    inventory::iter::<RepositoryRegistration>
        .into_iter()
        .find(|entry| entry.name == name)
}

/// Markers keyed by declaring type and method name.
///
/// Keys use the type that *declares* the method, so a marker registered
/// for a parent interface applies to the inherited method but not to a
/// child's redeclaration of it.
#[derive(Debug, Clone, Default)]
pub struct MarkerTable {
    markers: HashMap<(TypeRef, String), QueryMarker>,
}

impl MarkerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `marker` for `method` declared on `declaring_type`.
    /// A later registration for the same key wins.
    pub fn with_marker(
        mut self,
        declaring_type: TypeRef,
        method: impl Into<String>,
        marker: QueryMarker,
    ) -> Self {
        self.markers.insert((declaring_type, method.into()), marker);
        self
    }

    /// The marker registered for `method` on `declaring_type`.
    pub fn get(&self, declaring_type: TypeRef, method: &str) -> Option<&QueryMarker> {
        self.markers.get(&(declaring_type, method.to_string()))
    }

    /// Number of registered markers.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Attach registered markers to the methods of `definition`.
    ///
    /// A method that already carries a marker keeps it.
    pub fn apply(&self, definition: RepositoryDefinition) -> RepositoryDefinition {
        let mut applied = RepositoryDefinition::new(definition.metadata().clone());
        for method in definition.methods() {
            applied = applied.method(self.attach(method));
        }
        applied
    }

    fn attach(&self, method: &RepositoryMethod) -> RepositoryMethod {
        match (
            method.query_marker(),
            self.get(method.declaring_type(), method.name()),
        ) {
            (None, Some(marker)) => method.clone().with_marker(marker.clone()),
            _ => method.clone(),
        }
    }
}
