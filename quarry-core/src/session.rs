//! # Persistence Session Handles
//!
//! The session and the query extractor are external collaborators. They are
//! obtained once when the repository factory is created and threaded through
//! unchanged; Quarry stores and forwards them, it never looks inside.
//!
//! Statements handed to a session are descriptions, not SQL: a template
//! reference or a piece of query text plus its bindings. Assembling the final
//! text from a template is the session's (or its engine's) business.

use crate::{
    error::BoxError,
    value::{Bindings, PageRequest, QueryOutput},
};
use async_trait::async_trait;

/// What a session reports about the persistence provider behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCapabilities {
    /// Provider name, e.g. `postgres`.
    pub provider: String,
    /// Whether the provider can hand back the text of a prepared query.
    pub extracts_query_strings: bool,
}

impl Default for SessionCapabilities {
    fn default() -> Self {
        Self {
            provider: "generic".to_string(),
            extracts_query_strings: false,
        }
    }
}

/// Resolved location of a query template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateLocation {
    /// Template namespace: an explicit one or the declaring type's qualified name.
    pub namespace: String,
    /// Template id within the namespace.
    pub id: String,
    /// Relative path of the file expected to hold the namespace.
    pub path: String,
}

/// Where the text of a statement comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementSource {
    /// Ready query text (derived, declared or inline).
    Text(String),
    /// A template the session's engine must assemble.
    Template(TemplateLocation),
}

/// The operation a statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Fetch rows.
    Select,
    /// Count matching rows.
    Count,
    /// Check whether any row matches.
    Exists,
    /// Delete matching rows.
    Delete,
}

/// A statement ready to be handed to a [`PersistenceSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Source of the statement text.
    pub source: StatementSource,
    /// The operation.
    pub kind: StatementKind,
    /// Named parameter bindings.
    pub bindings: Bindings,
    /// Page window, for paging queries.
    pub page: Option<PageRequest>,
    /// Whether the text is native SQL.
    pub native: bool,
}

impl Statement {
    /// A select statement over `source` with no bindings.
    pub fn select(source: StatementSource) -> Self {
        Self {
            source,
            kind: StatementKind::Select,
            bindings: Bindings::new(),
            page: None,
            native: false,
        }
    }

    /// Change the operation.
    pub fn with_kind(mut self, kind: StatementKind) -> Self {
        self.kind = kind;
        self
    }

    /// Replace the bindings.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Restrict to a page window.
    pub fn with_page(mut self, page: Option<PageRequest>) -> Self {
        self.page = page;
        self
    }

    /// Flag the text as native SQL.
    pub fn with_native(mut self, native: bool) -> Self {
        self.native = native;
        self
    }
}

/// The persistence session used to execute statements.
///
/// Implementations must be safe to share across concurrent invocations.
#[async_trait]
pub trait PersistenceSession: Send + Sync + 'static {
    /// Provider capabilities, read once by the repository factory.
    fn capabilities(&self) -> SessionCapabilities {
        SessionCapabilities::default()
    }

    /// Execute a statement.
    async fn execute(&self, statement: Statement) -> Result<QueryOutput, BoxError>;
}

/// Opaque capability handle derived from a session's provider.
///
/// Obtained once per session and forwarded into every query descriptor.
pub trait QueryExtractor: Send + Sync + std::fmt::Debug + 'static {
    /// The provider this extractor belongs to.
    fn provider_name(&self) -> &str;

    /// Whether prepared query text can be extracted.
    fn can_extract_query(&self) -> bool;
}
