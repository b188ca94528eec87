//! # Default Query Lookup
//!
//! The built-in strategy: queries come either from declared (named) queries
//! or from the method name itself. Which source is used depends on the
//! [`QueryLookupKey`]:
//!
//! | key | declared query present | declared query absent |
//! |-----|------------------------|-----------------------|
//! | `Create` | derived | derived |
//! | `UseDeclaredQuery` | declared | `NoDeclaredQuery` error |
//! | `CreateIfNotFound` | declared | derived |

use super::part_tree::{PartTree, Subject};
use crate::binding::{bind_arguments, page_rows};
use async_trait::async_trait;
use quarry_core::{
    Arguments, InvocationError, NamedQueries, PageRequest, PersistenceSession, ProjectionFactory,
    QueryLookupKey, QueryLookupStrategy, QueryMethod, QueryMethodFactory, QueryOutput,
    RepositoryMetadata, RepositoryMethod, RepositoryQuery, ResolveError, ReturnShape, Statement,
    StatementKind, StatementSource,
};
use std::{any::Any, fmt, sync::Arc};

/// The default query lookup strategy.
pub struct DefaultQueryLookupStrategy {
    session: Arc<dyn PersistenceSession>,
    method_factory: Arc<dyn QueryMethodFactory>,
    key: QueryLookupKey,
}

impl DefaultQueryLookupStrategy {
    /// Create the strategy for `key`, building descriptors with `method_factory`.
    pub fn new(
        session: Arc<dyn PersistenceSession>,
        method_factory: Arc<dyn QueryMethodFactory>,
        key: QueryLookupKey,
    ) -> Self {
        Self {
            session,
            method_factory,
            key,
        }
    }

    /// The lookup key.
    pub fn key(&self) -> QueryLookupKey {
        self.key
    }

    fn declared(&self, query_method: QueryMethod, text: &str) -> Arc<dyn RepositoryQuery> {
        Arc::new(DeclaredQuery {
            query_method,
            session: self.session.clone(),
            text: text.to_string(),
        })
    }

    fn derived(&self, query_method: QueryMethod) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
        let invalid = |reason: String| ResolveError::InvalidDerivedQuery {
            method: query_method.signature(),
            reason,
        };
        let tree = PartTree::parse(query_method.name()).map_err(invalid)?;

        let parameters: Vec<&str> = query_method
            .bindable_parameters()
            .map(|p| p.name.as_str())
            .collect();
        if tree.arity() != parameters.len() {
            return Err(invalid(format!(
                "criteria consume {} argument(s) but the method declares {}",
                tree.arity(),
                parameters.len()
            )));
        }

        let domain = query_method.metadata().domain_type();
        let text = tree.render(domain, &parameters);
        let count_text = (query_method.return_shape() == ReturnShape::Page).then(|| {
            PartTree {
                subject: Subject::Count,
                order: Vec::new(),
                ..tree.clone()
            }
            .render(domain, &parameters)
        });

        Ok(Arc::new(DerivedQuery {
            session: self.session.clone(),
            text,
            count_text,
            subject: tree.subject,
            limit: tree.limit,
            query_method,
        }))
    }
}

impl QueryLookupStrategy for DefaultQueryLookupStrategy {
    fn resolve_query(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
        named_queries: &dyn NamedQueries,
    ) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
        let query_method = self.method_factory.build(method, metadata, projection)?;
        let name = query_method.named_query_name();

        match (self.key, named_queries.get_query(&name)) {
            (QueryLookupKey::Create, _) => self.derived(query_method),
            (_, Some(text)) => Ok(self.declared(query_method, text)),
            (QueryLookupKey::UseDeclaredQuery, None) => Err(ResolveError::NoDeclaredQuery {
                method: method.signature(),
                name,
            }),
            (QueryLookupKey::CreateIfNotFound, None) => self.derived(query_method),
        }
    }
}

fn kind_for(shape: ReturnShape) -> StatementKind {
    match shape {
        ReturnShape::Count => StatementKind::Count,
        ReturnShape::Exists => StatementKind::Exists,
        _ => StatementKind::Select,
    }
}

async fn run_text(
    query_method: &QueryMethod,
    session: &dyn PersistenceSession,
    statement: Statement,
    count_text: Option<&str>,
) -> Result<QueryOutput, InvocationError> {
    if !query_method.is_page_query() {
        return session
            .execute(statement)
            .await
            .map_err(InvocationError::Session);
    }

    let rows = page_rows(
        query_method,
        session
            .execute(statement.clone())
            .await
            .map_err(InvocationError::Session)?,
    )?;
    let total = match count_text {
        Some(text) => {
            let count = Statement::select(StatementSource::Text(text.to_string()))
                .with_kind(StatementKind::Count)
                .with_bindings(statement.bindings);
            match session
                .execute(count)
                .await
                .map_err(InvocationError::Session)?
            {
                QueryOutput::Count(total) => Some(total),
                other => {
                    return Err(InvocationError::UnexpectedOutput {
                        method: query_method.signature(),
                        detail: format!("expected a count, got {:?}", other),
                    });
                }
            }
        }
        None => None,
    };
    Ok(QueryOutput::Page { rows, total })
}

/// A query derived from the method name.
pub struct DerivedQuery {
    query_method: QueryMethod,
    session: Arc<dyn PersistenceSession>,
    text: String,
    count_text: Option<String>,
    subject: Subject,
    limit: Option<u32>,
}

impl DerivedQuery {
    /// The rendered query text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The rendered count text, for page queries.
    pub fn count_text(&self) -> Option<&str> {
        self.count_text.as_deref()
    }
}

#[async_trait]
impl RepositoryQuery for DerivedQuery {
    fn query_method(&self) -> &QueryMethod {
        &self.query_method
    }

    async fn execute(&self, args: Arguments) -> Result<QueryOutput, InvocationError> {
        let bindings = bind_arguments(&self.query_method, &args)?;
        let kind = match self.subject {
            Subject::Select => kind_for(self.query_method.return_shape()),
            Subject::Count => StatementKind::Count,
            Subject::Exists => StatementKind::Exists,
            Subject::Delete => StatementKind::Delete,
        };
        let page = args
            .page()
            .or_else(|| self.limit.map(|limit| PageRequest::of(0, limit)));
        let statement = Statement::select(StatementSource::Text(self.text.clone()))
            .with_kind(kind)
            .with_bindings(bindings)
            .with_page(page);

        run_text(
            &self.query_method,
            self.session.as_ref(),
            statement,
            self.count_text.as_deref(),
        )
        .await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for DerivedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedQuery")
            .field("method", &self.query_method.signature())
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

/// A query declared by name outside the interface.
pub struct DeclaredQuery {
    query_method: QueryMethod,
    session: Arc<dyn PersistenceSession>,
    text: String,
}

impl DeclaredQuery {
    /// The declared query text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[async_trait]
impl RepositoryQuery for DeclaredQuery {
    fn query_method(&self) -> &QueryMethod {
        &self.query_method
    }

    async fn execute(&self, args: Arguments) -> Result<QueryOutput, InvocationError> {
        let bindings = bind_arguments(&self.query_method, &args)?;
        let statement = Statement::select(StatementSource::Text(self.text.clone()))
            .with_kind(kind_for(self.query_method.return_shape()))
            .with_bindings(bindings)
            .with_page(args.page());
        run_text(&self.query_method, self.session.as_ref(), statement, None).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for DeclaredQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredQuery")
            .field("method", &self.query_method.signature())
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        method_factory::DefaultQueryMethodFactory, named::PropertiesNamedQueries,
        projection::DefaultProjectionFactory, provider::PersistenceProvider,
        testing::RecordingSession,
    };
    use quarry_core::{TypeRef, Value};

    const USERS: TypeRef = TypeRef::new("app::repo", "UserRepository");

    fn strategy(session: Arc<RecordingSession>, key: QueryLookupKey) -> DefaultQueryLookupStrategy {
        let extractor = PersistenceProvider::from_session(session.as_ref()).into_extractor();
        DefaultQueryLookupStrategy::new(
            session,
            Arc::new(DefaultQueryMethodFactory::new(extractor)),
            key,
        )
    }

    fn resolve(
        strategy: &DefaultQueryLookupStrategy,
        method: RepositoryMethod,
        named: &PropertiesNamedQueries,
    ) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
        strategy.resolve_query(
            &method,
            &RepositoryMetadata::new(USERS, "User", "i64"),
            &DefaultProjectionFactory::new(),
            named,
        )
    }

    fn find_by_name() -> RepositoryMethod {
        RepositoryMethod::new(USERS, "find_by_name")
            .param("name", "String")
            .returns("Vec<User>")
    }

    #[tokio::test]
    async fn test_derives_and_executes() {
        let session = Arc::new(RecordingSession::new());
        let strategy = strategy(session.clone(), QueryLookupKey::CreateIfNotFound);
        let query = resolve(&strategy, find_by_name(), &PropertiesNamedQueries::new()).unwrap();

        let derived = query.as_any().downcast_ref::<DerivedQuery>().unwrap();
        assert_eq!(derived.text(), "select e from User e where e.name = :name");

        query
            .execute(Arguments::new(vec![Value::from("ada")]))
            .await
            .unwrap();
        let statements = session.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].bindings.get("name"), Some(&Value::from("ada")));
    }

    #[test]
    fn test_declared_query_wins_when_present() {
        let named = PropertiesNamedQueries::new()
            .with_query("User.find_by_name", "select u from User u where u.name = :name");
        let strategy = strategy(
            Arc::new(RecordingSession::new()),
            QueryLookupKey::CreateIfNotFound,
        );
        let query = resolve(&strategy, find_by_name(), &named).unwrap();
        let declared = query.as_any().downcast_ref::<DeclaredQuery>().unwrap();
        assert_eq!(declared.text(), "select u from User u where u.name = :name");
    }

    #[test]
    fn test_create_ignores_declared_queries() {
        let named = PropertiesNamedQueries::new().with_query("User.find_by_name", "declared");
        let strategy = strategy(Arc::new(RecordingSession::new()), QueryLookupKey::Create);
        let query = resolve(&strategy, find_by_name(), &named).unwrap();
        assert!(query.as_any().is::<DerivedQuery>());
    }

    #[test]
    fn test_use_declared_query_requires_one() {
        let strategy = strategy(
            Arc::new(RecordingSession::new()),
            QueryLookupKey::UseDeclaredQuery,
        );
        let err = resolve(&strategy, find_by_name(), &PropertiesNamedQueries::new()).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NoDeclaredQuery { ref name, .. } if name == "User.find_by_name"
        ));
    }

    #[test]
    fn test_arity_mismatch_fails_at_resolution() {
        let strategy = strategy(Arc::new(RecordingSession::new()), QueryLookupKey::Create);
        let err = resolve(
            &strategy,
            RepositoryMethod::new(USERS, "find_by_name_and_age")
                .param("name", "String")
                .returns("Vec<User>"),
            &PropertiesNamedQueries::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDerivedQuery { .. }));
    }

    #[tokio::test]
    async fn test_page_query_counts() {
        let session = Arc::new(
            RecordingSession::new()
                .respond_with(QueryOutput::Rows(Vec::new()))
                .respond_with(QueryOutput::Count(12)),
        );
        let strategy = strategy(session.clone(), QueryLookupKey::Create);
        let query = resolve(
            &strategy,
            RepositoryMethod::new(USERS, "find_by_status_order_by_name")
                .param("status", "String")
                .param("page", "PageRequest")
                .returns("Page<User>"),
            &PropertiesNamedQueries::new(),
        )
        .unwrap();

        let output = query
            .execute(Arguments::new(vec![Value::from("active")]).with_page(PageRequest::of(0, 5)))
            .await
            .unwrap();
        assert_eq!(
            output,
            QueryOutput::Page {
                rows: Vec::new(),
                total: Some(12),
            }
        );
        let statements = session.statements();
        assert_eq!(
            statements[1].source,
            StatementSource::Text(
                "select count(e) from User e where e.status = :status".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_subject_decides_statement_kind() {
        let session = Arc::new(RecordingSession::new());
        let strategy = strategy(session.clone(), QueryLookupKey::Create);
        let named = PropertiesNamedQueries::new();

        let delete = resolve(
            &strategy,
            RepositoryMethod::new(USERS, "delete_by_name")
                .param("name", "String")
                .returns("u64"),
            &named,
        )
        .unwrap();
        let output = delete
            .execute(Arguments::new(vec![Value::from("ada")]))
            .await
            .unwrap();
        assert_eq!(output, QueryOutput::Affected(0));

        let exists = resolve(
            &strategy,
            RepositoryMethod::new(USERS, "exists_by_name")
                .param("name", "String")
                .returns("bool"),
            &named,
        )
        .unwrap();
        let output = exists
            .execute(Arguments::new(vec![Value::from("ada")]))
            .await
            .unwrap();
        assert_eq!(output, QueryOutput::Exists(false));

        let kinds: Vec<StatementKind> = session.statements().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StatementKind::Delete, StatementKind::Exists]);
    }

    #[tokio::test]
    async fn test_page_count_must_return_count() {
        let session = Arc::new(
            RecordingSession::new()
                .respond_with(QueryOutput::Rows(Vec::new()))
                .respond_with(QueryOutput::Rows(Vec::new())),
        );
        let strategy = strategy(session.clone(), QueryLookupKey::Create);
        let query = resolve(
            &strategy,
            RepositoryMethod::new(USERS, "find_by_status")
                .param("status", "String")
                .param("page", "PageRequest")
                .returns("Page<User>"),
            &PropertiesNamedQueries::new(),
        )
        .unwrap();

        let err = query
            .execute(Arguments::new(vec![Value::from("active")]).with_page(PageRequest::of(0, 5)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InvocationError::UnexpectedOutput { ref method, .. } if method.contains("find_by_status")
        ));
        assert_eq!(session.statements().len(), 2);
    }
}
