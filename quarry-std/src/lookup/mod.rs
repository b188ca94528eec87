//! Query lookup strategies.

mod derived;
mod marker;
pub mod part_tree;

pub use derived::{DeclaredQuery, DefaultQueryLookupStrategy, DerivedQuery};
pub use marker::MarkerQueryLookupStrategy;
