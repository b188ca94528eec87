//! Repository metadata and definitions.

use crate::method::{RepositoryMethod, TypeRef};

/// Describes the repository that owns a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryMetadata {
    repository_interface: TypeRef,
    domain_type: String,
    id_type: String,
}

impl RepositoryMetadata {
    /// Create metadata for `repository_interface` managing `domain_type` keyed by `id_type`.
    pub fn new(
        repository_interface: TypeRef,
        domain_type: impl Into<String>,
        id_type: impl Into<String>,
    ) -> Self {
        Self {
            repository_interface,
            domain_type: domain_type.into(),
            id_type: id_type.into(),
        }
    }

    /// The repository interface being built.
    pub fn repository_interface(&self) -> TypeRef {
        self.repository_interface
    }

    /// The entity type the repository manages.
    pub fn domain_type(&self) -> &str {
        &self.domain_type
    }

    /// The entity's id type.
    pub fn id_type(&self) -> &str {
        &self.id_type
    }
}

/// A repository interface together with every method it exposes,
/// including the ones inherited from parent interfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryDefinition {
    metadata: RepositoryMetadata,
    methods: Vec<RepositoryMethod>,
}

impl RepositoryDefinition {
    /// Create an empty definition.
    pub fn new(metadata: RepositoryMetadata) -> Self {
        Self {
            metadata,
            methods: Vec::new(),
        }
    }

    /// Add a method. A method with the same name replaces the earlier one,
    /// which is how a child interface overrides an inherited declaration.
    pub fn method(mut self, method: RepositoryMethod) -> Self {
        self.methods.retain(|m| m.name() != method.name());
        self.methods.push(method);
        self
    }

    /// Add every method of `parent`, keeping their declaring type.
    pub fn inherit(mut self, parent: RepositoryDefinition) -> Self {
        for method in parent.methods {
            self = self.method(method);
        }
        self
    }

    /// The repository metadata.
    pub fn metadata(&self) -> &RepositoryMetadata {
        &self.metadata
    }

    /// The methods, in declaration order.
    pub fn methods(&self) -> &[RepositoryMethod] {
        &self.methods
    }
}

/// A type that can describe a repository interface.
///
/// Implemented by the companion types the `#[repository]` macro generates.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not describe a repository interface",
    label = "missing `RepositoryInterface` implementation",
    note = "Annotate the trait with `#[quarry::repository]` or implement `definition` by hand."
)]
pub trait RepositoryInterface {
    /// The full definition, inherited methods included.
    fn definition() -> RepositoryDefinition;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{HasQueryMarker, QueryMarker};

    const BASE: TypeRef = TypeRef::new("app", "BaseRepository");
    const USERS: TypeRef = TypeRef::new("app", "UserRepository");

    #[test]
    fn test_inherit_keeps_declaring_type() {
        let base = RepositoryDefinition::new(RepositoryMetadata::new(BASE, "User", "i64"))
            .method(RepositoryMethod::new(BASE, "find_all_active"));
        let users = RepositoryDefinition::new(RepositoryMetadata::new(USERS, "User", "i64"))
            .inherit(base)
            .method(RepositoryMethod::new(USERS, "find_by_name").param("name", "String"));

        assert_eq!(users.methods().len(), 2);
        assert_eq!(users.methods()[0].declaring_type(), BASE);
        assert_eq!(users.methods()[1].declaring_type(), USERS);
    }

    #[test]
    fn test_redeclared_method_replaces_parent() {
        let base = RepositoryDefinition::new(RepositoryMetadata::new(BASE, "User", "i64")).method(
            RepositoryMethod::new(BASE, "find_recent").with_marker(QueryMarker::template("recent")),
        );
        let users = RepositoryDefinition::new(RepositoryMetadata::new(USERS, "User", "i64"))
            .inherit(base)
            .method(RepositoryMethod::new(USERS, "find_recent"));

        assert_eq!(users.methods().len(), 1);
        assert_eq!(users.methods()[0].declaring_type(), USERS);
        assert!(users.methods()[0].query_marker().is_none());
    }
}
