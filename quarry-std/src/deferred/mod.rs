//! # Deferred Dynamic Query
//!
//! The query the marker dispatcher hands back for marked methods. It holds
//! everything the dynamic-query engine needs later (descriptor, session,
//! marker payload and declaring type) without assembling any query text.
//!
//! # Deferred Validation
//!
//! Building a deferred query never inspects the marker's content. A blank
//! template id, an unresolvable template id or a count request on a method
//! that doesn't return a page are reported when the query is first
//! invoked, and only for that call. A method that is never called never
//! fails.

mod builder;

pub use builder::DeferredQueryBuilder;

use crate::{
    binding::{bind_arguments, page_rows},
    template::TemplateSettings,
};
use async_trait::async_trait;
use quarry_core::{
    Arguments, InvocationError, PersistenceSession, QueryMarker, QueryMethod, QueryOutput,
    QuerySource, RepositoryQuery, ReturnShape, Statement, StatementKind, StatementSource, TypeRef,
};
use std::{any::Any, fmt, sync::Arc};

/// A resolved, not yet assembled, dynamic query.
///
/// Immutable once built and safe to share across concurrent invocations.
pub struct DeferredDynamicQuery {
    query_method: QueryMethod,
    session: Arc<dyn PersistenceSession>,
    marker: QueryMarker,
    declaring_type: TypeRef,
    templates: TemplateSettings,
}

impl DeferredDynamicQuery {
    /// Start building a deferred query.
    pub fn builder() -> DeferredQueryBuilder {
        DeferredQueryBuilder::new()
    }

    /// The query descriptor.
    pub fn query_method(&self) -> &QueryMethod {
        &self.query_method
    }

    /// The session the query executes on.
    pub fn session(&self) -> &Arc<dyn PersistenceSession> {
        &self.session
    }

    /// The marker payload.
    pub fn marker(&self) -> &QueryMarker {
        &self.marker
    }

    /// The interface that declares the method; templates resolve relative to it.
    pub fn declaring_type(&self) -> TypeRef {
        self.declaring_type
    }

    /// The template lookup settings.
    pub fn templates(&self) -> &TemplateSettings {
        &self.templates
    }

    fn source_of(&self, id: &str) -> Result<StatementSource, InvocationError> {
        if id.trim().is_empty() {
            return Err(InvocationError::BlankQuery {
                method: self.query_method.signature(),
            });
        }
        self.templates
            .resolve(id, self.declaring_type)
            .map(StatementSource::Template)
            .ok_or_else(|| InvocationError::InvalidTemplateId {
                method: self.query_method.signature(),
                id: id.to_string(),
            })
    }

    fn statement_source(&self) -> Result<StatementSource, InvocationError> {
        match self.marker.source() {
            QuerySource::Template(id) => self.source_of(id),
            QuerySource::Inline(text) if text.trim().is_empty() => {
                Err(InvocationError::BlankQuery {
                    method: self.query_method.signature(),
                })
            }
            QuerySource::Inline(text) => Ok(StatementSource::Text(text.clone())),
        }
    }

    fn check_return_type(&self) -> Result<(), InvocationError> {
        if self.marker.is_countable() && self.query_method.return_shape() != ReturnShape::Page {
            return Err(InvocationError::IncompatibleReturnType {
                method: self.query_method.signature(),
                return_type: self.query_method.method().return_type().to_string(),
            });
        }
        Ok(())
    }

    async fn count(
        &self,
        main: &Statement,
        source: Option<StatementSource>,
    ) -> Result<u64, InvocationError> {
        let source = source.unwrap_or_else(|| main.source.clone());
        let statement = Statement::select(source)
            .with_kind(StatementKind::Count)
            .with_bindings(main.bindings.clone())
            .with_native(main.native);

        match self
            .session
            .execute(statement)
            .await
            .map_err(InvocationError::Session)?
        {
            QueryOutput::Count(total) => Ok(total),
            other => Err(InvocationError::UnexpectedOutput {
                method: self.query_method.signature(),
                detail: format!("expected a count, got {:?}", other),
            }),
        }
    }

    async fn run(&self, args: Arguments) -> Result<QueryOutput, InvocationError> {
        let source = self.statement_source()?;
        self.check_return_type()?;
        let count_source = self
            .marker
            .count_query()
            .map(|id| self.source_of(id))
            .transpose()?;
        let bindings = bind_arguments(&self.query_method, &args)?;

        let kind = match self.query_method.return_shape() {
            ReturnShape::Count => StatementKind::Count,
            ReturnShape::Exists => StatementKind::Exists,
            _ => StatementKind::Select,
        };
        let statement = Statement::select(source)
            .with_kind(kind)
            .with_bindings(bindings)
            .with_page(args.page())
            .with_native(self.marker.is_native());

        if !self.query_method.is_page_query() {
            return self
                .session
                .execute(statement)
                .await
                .map_err(InvocationError::Session);
        }

        let output = self
            .session
            .execute(statement.clone())
            .await
            .map_err(InvocationError::Session)?;
        let rows = page_rows(&self.query_method, output)?;
        let total = if self.query_method.return_shape() == ReturnShape::Page
            && self.marker.is_countable()
        {
            Some(self.count(&statement, count_source).await?)
        } else {
            None
        };
        Ok(QueryOutput::Page { rows, total })
    }
}

#[async_trait]
impl RepositoryQuery for DeferredDynamicQuery {
    fn query_method(&self) -> &QueryMethod {
        &self.query_method
    }

    async fn execute(&self, args: Arguments) -> Result<QueryOutput, InvocationError> {
        let result = self.run(args).await;
        #[cfg(feature = "tracing")]
        {
            if let Err(err) = &result {
                tracing::warn!(
                    method = %self.query_method.signature(),
                    error = %err,
                    "Deferred dynamic query failed"
                );
            }
        }
        result
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for DeferredDynamicQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredDynamicQuery")
            .field("method", &self.query_method.signature())
            .field("marker", &self.marker)
            .field("declaring_type", &self.declaring_type)
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DeferredDynamicQuery {
    fn eq(&self, other: &Self) -> bool {
        self.query_method == other.query_method
            && self.marker == other.marker
            && self.declaring_type == other.declaring_type
            && self.templates == other.templates
            && std::ptr::addr_eq(Arc::as_ptr(&self.session), Arc::as_ptr(&other.session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        method_factory::DefaultQueryMethodFactory, projection::DefaultProjectionFactory,
        provider::PersistenceProvider, testing::RecordingSession,
    };
    use quarry_core::{
        PageRequest, QueryMethodFactory, RepositoryMetadata, RepositoryMethod,
        SessionCapabilities, TemplateLocation, Value,
    };

    const USERS: TypeRef = TypeRef::new("app::repo", "UserRepository");

    fn deferred(
        method: RepositoryMethod,
        marker: QueryMarker,
        session: Arc<RecordingSession>,
    ) -> DeferredDynamicQuery {
        let factory = DefaultQueryMethodFactory::new(
            PersistenceProvider::from_capabilities(SessionCapabilities::default()).into_extractor(),
        );
        let query_method = factory
            .build(
                &method,
                &RepositoryMetadata::new(USERS, "User", "i64"),
                &DefaultProjectionFactory::new(),
            )
            .unwrap();
        DeferredDynamicQuery::builder()
            .descriptor(query_method)
            .session(session)
            .marker(marker)
            .declaring_type(method.declaring_type())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_template_statement_is_bound() {
        let session = Arc::new(RecordingSession::new());
        let query = deferred(
            RepositoryMethod::new(USERS, "find_by_status")
                .param("status", "String")
                .returns("Vec<User>"),
            QueryMarker::template("byStatus").native(),
            session.clone(),
        );

        query
            .execute(Arguments::new(vec![Value::from("active")]))
            .await
            .unwrap();

        let statements = session.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].source,
            StatementSource::Template(TemplateLocation {
                namespace: "app::repo::UserRepository".into(),
                id: "byStatus".into(),
                path: "templates/app/repo/UserRepository.xml".into(),
            })
        );
        assert_eq!(
            statements[0].bindings.get("status"),
            Some(&Value::Text("active".into()))
        );
        assert!(statements[0].native);
    }

    #[tokio::test]
    async fn test_blank_marker_fails_only_on_invocation() {
        let session = Arc::new(RecordingSession::new());
        let query = deferred(
            RepositoryMethod::new(USERS, "find_nothing").returns("Vec<User>"),
            QueryMarker::template(""),
            session.clone(),
        );

        let err = query.execute(Arguments::none()).await.unwrap_err();
        assert!(matches!(err, InvocationError::BlankQuery { .. }));
        assert!(session.statements().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_template_id() {
        for id in ["users.", "users..active"] {
            let session = Arc::new(RecordingSession::new());
            let query = deferred(
                RepositoryMethod::new(USERS, "find_odd").returns("Vec<User>"),
                QueryMarker::template(id),
                session.clone(),
            );
            let err = query.execute(Arguments::none()).await.unwrap_err();
            assert!(matches!(err, InvocationError::InvalidTemplateId { .. }), "{id}");
            assert!(session.statements().is_empty());
        }
    }

    #[tokio::test]
    async fn test_countable_requires_page() {
        let query = deferred(
            RepositoryMethod::new(USERS, "find_all").returns("Vec<User>"),
            QueryMarker::template("all").countable(),
            Arc::new(RecordingSession::new()),
        );
        let err = query.execute(Arguments::none()).await.unwrap_err();
        assert!(matches!(err, InvocationError::IncompatibleReturnType { .. }));
    }

    #[tokio::test]
    async fn test_count_query_on_slice_is_rejected() {
        let session = Arc::new(RecordingSession::new());
        let query = deferred(
            RepositoryMethod::new(USERS, "find_active")
                .param("page", "PageRequest")
                .returns("Slice<User>"),
            QueryMarker::template("active").with_count_query(""),
            session.clone(),
        );

        let err = query
            .execute(Arguments::none().with_page(PageRequest::of(0, 5)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InvocationError::IncompatibleReturnType { ref return_type, .. } if return_type == "Slice<User>"
        ));
        assert!(session.statements().is_empty());
    }

    #[tokio::test]
    async fn test_blank_count_query_fails_before_execution() {
        let session = Arc::new(RecordingSession::new());
        let query = deferred(
            RepositoryMethod::new(USERS, "find_active")
                .param("page", "PageRequest")
                .returns("Page<User>"),
            QueryMarker::template("active").with_count_query("  "),
            session.clone(),
        );

        let err = query
            .execute(Arguments::none().with_page(PageRequest::of(0, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::BlankQuery { .. }));
        assert!(session.statements().is_empty());
    }

    #[tokio::test]
    async fn test_page_with_count_query() {
        let session = Arc::new(
            RecordingSession::new()
                .respond_with(QueryOutput::Rows(vec![vec![Value::Int(1)]]))
                .respond_with(QueryOutput::Count(41)),
        );
        let query = deferred(
            RepositoryMethod::new(USERS, "find_active")
                .param("page", "PageRequest")
                .returns("Page<User>"),
            QueryMarker::inline("select u from User u where u.active = true")
                .with_count_query("users.countActive"),
            session.clone(),
        );

        let output = query
            .execute(Arguments::none().with_page(PageRequest::of(2, 10)))
            .await
            .unwrap();
        assert_eq!(
            output,
            QueryOutput::Page {
                rows: vec![vec![Value::Int(1)]],
                total: Some(41),
            }
        );

        let statements = session.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].page, Some(PageRequest::of(2, 10)));
        assert_eq!(statements[1].kind, StatementKind::Count);
        assert!(matches!(
            &statements[1].source,
            StatementSource::Template(location) if location.namespace == "users"
        ));
    }

    #[tokio::test]
    async fn test_missing_page_and_argument_count() {
        let paged = deferred(
            RepositoryMethod::new(USERS, "find_active")
                .param("page", "PageRequest")
                .returns("Slice<User>"),
            QueryMarker::template("active"),
            Arc::new(RecordingSession::new()),
        );
        assert!(matches!(
            paged.execute(Arguments::none()).await.unwrap_err(),
            InvocationError::MissingPage { .. }
        ));

        let by_name = deferred(
            RepositoryMethod::new(USERS, "find_by_name")
                .param("name", "String")
                .returns("Vec<User>"),
            QueryMarker::template("byName"),
            Arc::new(RecordingSession::new()),
        );
        assert!(matches!(
            by_name.execute(Arguments::none()).await.unwrap_err(),
            InvocationError::ArgumentCount {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_session_failure_is_wrapped() {
        let session = Arc::new(RecordingSession::new().fail_with("connection reset"));
        let query = deferred(
            RepositoryMethod::new(USERS, "find_all").returns("Vec<User>"),
            QueryMarker::template("all"),
            session,
        );
        let err = query.execute(Arguments::none()).await.unwrap_err();
        assert!(matches!(err, InvocationError::Session(_)));
    }
}
