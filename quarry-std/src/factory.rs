//! # Repository Factory
//!
//! Builds repositories from their definitions. Every method is resolved
//! exactly once, through the marker dispatcher, while the repository is
//! constructed; the first failure aborts construction.
//!
//! ```rust,ignore
//! let factory = RepositoryFactory::new(session)
//!     .with_config(RepositoryFactoryConfig::new().with_lookup_key(QueryLookupKey::Create));
//! let users = factory.resolve_interface::<UserRepositoryDefinition>()?;
//! let rows = users.invoke("find_by_name", Arguments::new(vec!["ada".into()])).await?;
//! ```

use crate::{
    config::RepositoryFactoryConfig,
    lookup::{DefaultQueryLookupStrategy, MarkerQueryLookupStrategy},
    method_factory::DefaultQueryMethodFactory,
    named::NoNamedQueries,
    projection::DefaultProjectionFactory,
    provider::PersistenceProvider,
};
use quarry_core::{
    Arguments, InvocationError, NamedQueries, PersistenceSession, ProjectionFactory,
    QueryExtractor, QueryLookupStrategy, QueryMethodFactory, QueryOutput, RepositoryDefinition,
    RepositoryInterface, RepositoryMetadata, RepositoryQuery, ResolveError,
};
use std::{collections::HashMap, fmt, sync::Arc};

/// Creates repositories bound to one persistence session.
pub struct RepositoryFactory {
    session: Arc<dyn PersistenceSession>,
    extractor: Arc<dyn QueryExtractor>,
    config: RepositoryFactoryConfig,
    named_queries: Arc<dyn NamedQueries>,
    projections: Arc<dyn ProjectionFactory>,
}

impl RepositoryFactory {
    /// Create a factory for `session`.
    ///
    /// The session's query extractor is detected here, once.
    pub fn new(session: Arc<dyn PersistenceSession>) -> Self {
        let extractor = PersistenceProvider::from_session(session.as_ref()).into_extractor();
        Self {
            session,
            extractor,
            config: RepositoryFactoryConfig::default(),
            named_queries: Arc::new(NoNamedQueries),
            projections: Arc::new(DefaultProjectionFactory::new()),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: RepositoryFactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `named_queries` for declared-query lookup.
    pub fn with_named_queries(mut self, named_queries: impl NamedQueries + 'static) -> Self {
        self.named_queries = Arc::new(named_queries);
        self
    }

    /// Use `projections` for projection detection.
    pub fn with_projection_factory(
        mut self,
        projections: impl ProjectionFactory + 'static,
    ) -> Self {
        self.projections = Arc::new(projections);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &RepositoryFactoryConfig {
        &self.config
    }

    /// The extractor detected for the session.
    pub fn extractor(&self) -> &Arc<dyn QueryExtractor> {
        &self.extractor
    }

    /// The lookup strategy for the configured key: the marker dispatcher in
    /// front of the default resolver, both sharing one method factory.
    pub fn query_lookup_strategy(&self) -> MarkerQueryLookupStrategy {
        let method_factory: Arc<dyn QueryMethodFactory> =
            Arc::new(DefaultQueryMethodFactory::new(self.extractor.clone()));
        let fallback = DefaultQueryLookupStrategy::new(
            self.session.clone(),
            method_factory.clone(),
            self.config.lookup_key(),
        );
        MarkerQueryLookupStrategy::new(
            self.session.clone(),
            method_factory,
            fallback,
        )
        .with_templates(self.config.templates().clone())
    }

    /// Resolve every method of `definition`.
    pub fn resolve(
        &self,
        definition: &RepositoryDefinition,
    ) -> Result<ResolvedRepository, ResolveError> {
        self.resolve_with(&self.query_lookup_strategy(), definition)
    }

    /// Resolve every method of `definition` with a custom `strategy`.
    pub fn resolve_with(
        &self,
        strategy: &dyn QueryLookupStrategy,
        definition: &RepositoryDefinition,
    ) -> Result<ResolvedRepository, ResolveError> {
        let metadata = definition.metadata();
        let mut queries = HashMap::with_capacity(definition.methods().len());
        for method in definition.methods() {
            let query = strategy.resolve_query(
                method,
                metadata,
                self.projections.as_ref(),
                self.named_queries.as_ref(),
            )?;
            queries.insert(method.name().to_string(), query);
        }

        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                repository = %metadata.repository_interface().qualified_name(),
                methods = queries.len(),
                "Repository resolved"
            );
        }

        Ok(ResolvedRepository {
            metadata: metadata.clone(),
            queries,
        })
    }

    /// Resolve the repository described by `R`.
    pub fn resolve_interface<R: RepositoryInterface>(
        &self,
    ) -> Result<ResolvedRepository, ResolveError> {
        self.resolve(&R::definition())
    }
}

impl fmt::Debug for RepositoryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryFactory")
            .field("extractor", &self.extractor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A repository whose methods all have a query.
pub struct ResolvedRepository {
    metadata: RepositoryMetadata,
    queries: HashMap<String, Arc<dyn RepositoryQuery>>,
}

impl ResolvedRepository {
    /// The repository metadata.
    pub fn metadata(&self) -> &RepositoryMetadata {
        &self.metadata
    }

    /// The query resolved for `method`.
    pub fn query(&self, method: &str) -> Option<&Arc<dyn RepositoryQuery>> {
        self.queries.get(method)
    }

    /// Number of resolved methods.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the repository has no methods.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Invoke `method` with `args`.
    pub async fn invoke(
        &self,
        method: &str,
        args: Arguments,
    ) -> Result<QueryOutput, InvocationError> {
        let query = self
            .queries
            .get(method)
            .ok_or_else(|| InvocationError::UnknownMethod(method.to_string()))?;
        query.execute(args).await
    }
}

impl fmt::Debug for ResolvedRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("ResolvedRepository")
            .field("metadata", &self.metadata)
            .field("methods", &methods)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deferred::DeferredDynamicQuery, lookup::DerivedQuery, testing::RecordingSession};
    use quarry_core::{QueryMarker, RepositoryMethod, SessionCapabilities, TypeRef, Value};

    const USERS: TypeRef = TypeRef::new("app::repo", "UserRepository");

    fn definition() -> RepositoryDefinition {
        RepositoryDefinition::new(RepositoryMetadata::new(USERS, "User", "i64"))
            .method(
                RepositoryMethod::new(USERS, "find_by_name")
                    .param("name", "String")
                    .returns("Vec<User>"),
            )
            .method(
                RepositoryMethod::new(USERS, "find_active_users")
                    .returns("Vec<User>")
                    .with_marker(QueryMarker::template("activeUsers")),
            )
            .method(
                RepositoryMethod::new(USERS, "find_unfinished")
                    .returns("Vec<User>")
                    .with_marker(QueryMarker::template("")),
            )
    }

    #[test]
    fn test_extractor_detected_once() {
        let session = Arc::new(RecordingSession::new().with_capabilities(SessionCapabilities {
            provider: "hibernate".into(),
            extracts_query_strings: true,
        }));
        let factory = RepositoryFactory::new(session);
        assert_eq!(factory.extractor().provider_name(), "hibernate");

        let repo = factory.resolve(&definition()).unwrap();
        for name in ["find_by_name", "find_active_users"] {
            let query = repo.query(name).unwrap();
            assert!(Arc::ptr_eq(
                query.query_method().extractor(),
                factory.extractor()
            ));
        }
    }

    #[test]
    fn test_branches() {
        let factory = RepositoryFactory::new(Arc::new(RecordingSession::new()));
        let repo = factory.resolve(&definition()).unwrap();
        assert_eq!(repo.len(), 3);
        assert!(
            repo.query("find_by_name")
                .unwrap()
                .as_any()
                .is::<DerivedQuery>()
        );
        assert!(
            repo.query("find_active_users")
                .unwrap()
                .as_any()
                .is::<DeferredDynamicQuery>()
        );
    }

    #[tokio::test]
    async fn test_deferred_failure_is_per_call() {
        let session = Arc::new(RecordingSession::new());
        let repo = RepositoryFactory::new(session.clone())
            .resolve(&definition())
            .unwrap();

        let err = repo
            .invoke("find_unfinished", Arguments::none())
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::BlankQuery { .. }));

        repo.invoke("find_by_name", Arguments::new(vec![Value::from("ada")]))
            .await
            .unwrap();
        assert_eq!(session.statements().len(), 1);

        let err = repo
            .invoke("delete_everything", Arguments::none())
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::UnknownMethod(ref name) if name == "delete_everything"));
    }

    #[test]
    fn test_fail_fast_names_method() {
        let factory = RepositoryFactory::new(Arc::new(RecordingSession::new()));
        let broken = definition().method(
            RepositoryMethod::new(USERS, "fetch_everything").returns("Vec<User>"),
        );
        let err = factory.resolve(&broken).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDerivedQuery { .. }));
        assert!(err.to_string().contains("fetch_everything"));
    }
}
