//! Named query sources.

use quarry_core::NamedQueries;
use std::collections::HashMap;

/// Named queries held in a map, keyed `Domain.method`.
#[derive(Debug, Clone, Default)]
pub struct PropertiesNamedQueries {
    queries: HashMap<String, String>,
}

impl PropertiesNamedQueries {
    /// An empty set of named queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a query.
    pub fn with_query(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.queries.insert(name.into(), text.into());
        self
    }
}

impl NamedQueries for PropertiesNamedQueries {
    fn get_query(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }
}

/// No named queries at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNamedQueries;

impl NamedQueries for NoNamedQueries {
    fn has_query(&self, _name: &str) -> bool {
        false
    }

    fn get_query(&self, _name: &str) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let queries =
            PropertiesNamedQueries::new().with_query("User.find_admins", "select u from User u");
        assert!(queries.has_query("User.find_admins"));
        assert_eq!(queries.get_query("User.find_admins"), Some("select u from User u"));
        assert!(!queries.has_query("User.find_guests"));
        assert!(!NoNamedQueries.has_query("User.find_admins"));
    }
}
