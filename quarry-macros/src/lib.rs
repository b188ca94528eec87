//! Procedural macros for Quarry.
//!
//! - `#[repository]` - Describes a repository trait and binds its `#[query]` markers

use proc_macro::TokenStream;
use syn::{ItemTrait, parse_macro_input};

mod query;
mod repository;

/// Turn a trait into a repository interface.
///
/// ```rust,ignore
/// #[quarry::repository(entity = User, id = i64, extends = [BaseRepository])]
/// pub trait UserRepository {
///     fn find_by_name(&self, name: String) -> Vec<User>;
///
///     #[query("activeUsers")]
///     fn find_active_users(&self) -> Vec<User>;
///
///     #[query(inline = "select u from User u where u.age > :age", native)]
///     fn find_older_than(&self, age: u32) -> Vec<User>;
/// }
/// ```
///
/// The trait is emitted unchanged apart from the `#[query]` attributes. A
/// companion `UserRepositoryDefinition` implements `RepositoryInterface` and
/// is registered with the inventory registry.
#[proc_macro_attribute]
pub fn repository(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as repository::RepositoryArgs);
    let input = parse_macro_input!(item as ItemTrait);

    repository::expand(args, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
