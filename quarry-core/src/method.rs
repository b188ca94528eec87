//! # Repository Method Identity
//!
//! A [`RepositoryMethod`] identifies one abstract method of a repository
//! interface: its name, the interface that declares it, its parameters and
//! its return type. It optionally carries a [`QueryMarker`], the method-level
//! tag that routes the method to the dynamic-query engine.
//!
//! Methods are built once, when a repository definition is assembled, and
//! are immutable afterwards.

use crate::marker::{HasQueryMarker, QueryMarker};
use std::fmt;

/// Static identity of a repository interface.
///
/// The macro layer builds these with `module_path!()` and the trait name,
/// so two `TypeRef`s are equal exactly when they name the same interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    module_path: &'static str,
    name: &'static str,
}

impl TypeRef {
    /// Create a type reference from a module path and a type name.
    pub const fn new(module_path: &'static str, name: &'static str) -> Self {
        Self { module_path, name }
    }

    /// The bare type name, e.g. `UserRepository`.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The module path the type lives in, e.g. `app::repo`.
    pub const fn module_path(&self) -> &'static str {
        self.module_path
    }

    /// `module::path::Name`, or just `Name` for an empty module path.
    pub fn qualified_name(&self) -> String {
        if self.module_path.is_empty() {
            self.name.to_string()
        } else {
            format!("{}::{}", self.module_path, self.name)
        }
    }

    /// The module path as a relative directory (`app/repo`).
    pub fn template_dir(&self) -> String {
        self.module_path.replace("::", "/")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One declared parameter of a repository method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    name: String,
    ty: String,
}

impl MethodParameter {
    /// Create a parameter from its name and its type as written.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter type as written in the interface.
    pub fn ty(&self) -> &str {
        &self.ty
    }
}

/// An abstract method declared on a repository interface.
///
/// # Example
///
/// ```rust,ignore
/// const USERS: TypeRef = TypeRef::new("app::repo", "UserRepository");
///
/// let method = RepositoryMethod::new(USERS, "find_active_users")
///     .returns("Vec<User>")
///     .with_marker(QueryMarker::template("activeUsers"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryMethod {
    name: String,
    declaring_type: TypeRef,
    parameters: Vec<MethodParameter>,
    return_type: String,
    marker: Option<QueryMarker>,
}

impl RepositoryMethod {
    /// Start a method declared on `declaring_type`. The return type defaults to `()`.
    pub fn new(declaring_type: TypeRef, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            parameters: Vec::new(),
            return_type: "()".to_string(),
            marker: None,
        }
    }

    /// Append a parameter.
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.parameters.push(MethodParameter::new(name, ty));
        self
    }

    /// Set the declared return type.
    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Attach the query marker to this method.
    pub fn with_marker(mut self, marker: QueryMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interface that declares the method.
    ///
    /// For a method inherited from a parent interface this is the parent.
    pub fn declaring_type(&self) -> TypeRef {
        self.declaring_type
    }

    /// The declared parameters, in order.
    pub fn parameters(&self) -> &[MethodParameter] {
        &self.parameters
    }

    /// The declared return type.
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// `Type::method(a: A) -> R`, used to identify the method in errors and logs.
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}::{}({}) -> {}",
            self.declaring_type.name, self.name, params, self.return_type
        )
    }
}

impl HasQueryMarker for RepositoryMethod {
    fn query_marker(&self) -> Option<&QueryMarker> {
        self.marker.as_ref()
    }
}
