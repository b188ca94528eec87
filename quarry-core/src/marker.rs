//! # Query Marker
//!
//! The marker is the method-level tag saying "this query is assembled by the
//! dynamic-query engine, not derived by the default rules". Its payload names
//! where the query text comes from and carries the counting and native flags.
//!
//! The marker is read-only. Resolution only checks whether it is present;
//! its *content* is validated when the resolved query is first invoked.

use bitflags::bitflags;

bitflags! {
    /// Flags carried by a [`QueryMarker`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct QueryFlags: u8 {
        /// The assembled text is native SQL rather than the portable dialect.
        const NATIVE = 1;
        /// A page query also runs a count statement to fill the total.
        const COUNTABLE = 1 << 1;
    }
}

/// Where the text of a marked query comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuerySource {
    /// An external template, named `id` or `namespace.id`.
    Template(String),
    /// Query text written inline on the method.
    Inline(String),
}

/// Payload of the query marker.
///
/// # Example
///
/// ```rust,ignore
/// let marker = QueryMarker::template("users.active")
///     .countable()
///     .native();
/// assert!(marker.is_native());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryMarker {
    source: QuerySource,
    count_query: Option<String>,
    flags: QueryFlags,
}

impl QueryMarker {
    /// A marker whose query lives in an external template.
    pub fn template(id: impl Into<String>) -> Self {
        Self::from_source(QuerySource::Template(id.into()))
    }

    /// A marker whose query text is written inline.
    pub fn inline(text: impl Into<String>) -> Self {
        Self::from_source(QuerySource::Inline(text.into()))
    }

    /// A marker built from an explicit source.
    pub fn from_source(source: QuerySource) -> Self {
        Self {
            source,
            count_query: None,
            flags: QueryFlags::empty(),
        }
    }

    /// Mark the assembled query as native SQL.
    pub fn native(mut self) -> Self {
        self.flags |= QueryFlags::NATIVE;
        self
    }

    /// Request a count statement alongside page queries.
    pub fn countable(mut self) -> Self {
        self.flags |= QueryFlags::COUNTABLE;
        self
    }

    /// Use a dedicated template for the count statement.
    pub fn with_count_query(mut self, id: impl Into<String>) -> Self {
        self.count_query = Some(id.into());
        self
    }

    /// Replace all flags.
    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The query source.
    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    /// The template id, when the query lives in a template.
    pub fn template_id(&self) -> Option<&str> {
        match &self.source {
            QuerySource::Template(id) => Some(id),
            QuerySource::Inline(_) => None,
        }
    }

    /// The inline text, when the query is written inline.
    pub fn inline_text(&self) -> Option<&str> {
        match &self.source {
            QuerySource::Inline(text) => Some(text),
            QuerySource::Template(_) => None,
        }
    }

    /// The dedicated count template id, if any.
    pub fn count_query(&self) -> Option<&str> {
        self.count_query.as_deref()
    }

    /// All flags.
    pub fn flags(&self) -> QueryFlags {
        self.flags
    }

    /// Whether the query is native SQL.
    pub fn is_native(&self) -> bool {
        self.flags.contains(QueryFlags::NATIVE)
    }

    /// Whether the marker asks for a count statement.
    pub fn is_countable(&self) -> bool {
        self.flags.contains(QueryFlags::COUNTABLE) || self.count_query.is_some()
    }

    /// Whether the marker names neither a template nor any inline text.
    pub fn is_blank(&self) -> bool {
        match &self.source {
            QuerySource::Template(id) => id.trim().is_empty(),
            QuerySource::Inline(text) => text.trim().is_empty(),
        }
    }
}

/// Capability to report the query marker attached to a method.
///
/// Any binding layer can satisfy this: the `#[repository]` macro, an
/// explicit registration table or hand-built method values.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot report a query marker",
    label = "missing `HasQueryMarker` implementation",
    note = "Implement `query_marker` to expose the method-level marker payload."
)]
pub trait HasQueryMarker {
    /// The marker payload, or `None` when the method is not marked.
    fn query_marker(&self) -> Option<&QueryMarker>;
}

impl<T: HasQueryMarker + ?Sized> HasQueryMarker for &T {
    fn query_marker(&self) -> Option<&QueryMarker> {
        (**self).query_marker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_accumulate() {
        let marker = QueryMarker::template("users.active").native().countable();
        assert!(marker.is_native());
        assert!(marker.is_countable());
        assert_eq!(marker.flags(), QueryFlags::NATIVE | QueryFlags::COUNTABLE);
    }

    #[test]
    fn test_count_query_implies_countable() {
        let marker = QueryMarker::template("activeUsers").with_count_query("countActiveUsers");
        assert!(marker.is_countable());
        assert_eq!(marker.count_query(), Some("countActiveUsers"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(QueryMarker::template("  ").is_blank());
        assert!(QueryMarker::inline("").is_blank());
        assert!(!QueryMarker::inline("select u from User u").is_blank());
        assert_eq!(QueryMarker::inline("x").template_id(), None);
    }
}
