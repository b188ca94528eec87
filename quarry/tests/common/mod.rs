#![allow(dead_code)]

use quarry::{
    DefaultProjectionFactory, DefaultQueryLookupStrategy, DefaultQueryMethodFactory,
    MarkerQueryLookupStrategy, NamedQueries, PersistenceProvider, PersistenceSession,
    PropertiesNamedQueries, QueryLookupKey, QueryLookupStrategy, QueryMarker, RepositoryMetadata,
    RepositoryMethod, RepositoryQuery, ResolveError, TypeRef, testing::RecordingSession,
};
use std::sync::Arc;

// ============================================================================
// Repository Model
// ============================================================================

pub const BASE_REPOSITORY: TypeRef = TypeRef::new("app::repo", "BaseRepository");
pub const USER_REPOSITORY: TypeRef = TypeRef::new("app::repo", "UserRepository");

pub fn user_metadata() -> RepositoryMetadata {
    RepositoryMetadata::new(USER_REPOSITORY, "User", "i64")
}

pub fn find_by_name() -> RepositoryMethod {
    RepositoryMethod::new(USER_REPOSITORY, "find_by_name")
        .param("name", "String")
        .returns("Vec<User>")
}

pub fn find_active_users() -> RepositoryMethod {
    RepositoryMethod::new(USER_REPOSITORY, "find_active_users")
        .returns("Vec<User>")
        .with_marker(QueryMarker::template("activeUsers"))
}

// ============================================================================
// Strategies
// ============================================================================

/// The default resolver and the dispatcher in front of it, sharing one
/// session and one method factory.
pub struct Fixture {
    pub session: Arc<RecordingSession>,
    pub default: Arc<DefaultQueryLookupStrategy>,
    pub dispatcher: MarkerQueryLookupStrategy<Arc<DefaultQueryLookupStrategy>>,
}

impl Fixture {
    pub fn new(key: QueryLookupKey) -> Self {
        let session = Arc::new(RecordingSession::new());
        let shared: Arc<dyn PersistenceSession> = session.clone();
        let extractor = PersistenceProvider::from_session(shared.as_ref()).into_extractor();
        let method_factory = Arc::new(DefaultQueryMethodFactory::new(extractor));
        let default = Arc::new(DefaultQueryLookupStrategy::new(
            shared.clone(),
            method_factory.clone(),
            key,
        ));
        let dispatcher = MarkerQueryLookupStrategy::new(shared, method_factory, default.clone());
        Self {
            session,
            default,
            dispatcher,
        }
    }
}

pub fn resolve(
    strategy: &dyn QueryLookupStrategy,
    method: &RepositoryMethod,
    named: &dyn NamedQueries,
) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
    strategy.resolve_query(
        method,
        &user_metadata(),
        &DefaultProjectionFactory::new(),
        named,
    )
}

pub fn no_named_queries() -> PropertiesNamedQueries {
    PropertiesNamedQueries::new()
}
