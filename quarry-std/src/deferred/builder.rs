//! Builder for [`DeferredDynamicQuery`].

use super::DeferredDynamicQuery;
use crate::template::TemplateSettings;
use quarry_core::{PersistenceSession, QueryMarker, QueryMethod, ResolveError, TypeRef};
use std::sync::Arc;

/// Assembles a [`DeferredDynamicQuery`] from its parts.
///
/// `build` refuses to yield a query until the descriptor, the session, the
/// marker and the declaring type are all present. The yielded query has no
/// setters.
///
/// # Example
///
/// ```rust,ignore
/// let query = DeferredDynamicQuery::builder()
///     .descriptor(query_method)
///     .session(session.clone())
///     .marker(marker.clone())
///     .declaring_type(method.declaring_type())
///     .build()?;
/// ```
#[derive(Default)]
pub struct DeferredQueryBuilder {
    descriptor: Option<QueryMethod>,
    session: Option<Arc<dyn PersistenceSession>>,
    marker: Option<QueryMarker>,
    declaring_type: Option<TypeRef>,
    templates: TemplateSettings,
}

impl DeferredQueryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query descriptor.
    pub fn descriptor(mut self, descriptor: QueryMethod) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Set the session the query will execute on.
    pub fn session(mut self, session: Arc<dyn PersistenceSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the marker payload.
    pub fn marker(mut self, marker: QueryMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Set the interface that declares the method.
    pub fn declaring_type(mut self, declaring_type: TypeRef) -> Self {
        self.declaring_type = Some(declaring_type);
        self
    }

    /// Set the template lookup settings. Defaults apply otherwise.
    pub fn templates(mut self, templates: TemplateSettings) -> Self {
        self.templates = templates;
        self
    }

    /// Build the query.
    pub fn build(self) -> Result<DeferredDynamicQuery, ResolveError> {
        let query_method = self.descriptor.ok_or_else(|| ResolveError::Incomplete {
            method: "<unknown>".to_string(),
            part: "query method",
        })?;
        let incomplete = |part| ResolveError::Incomplete {
            method: query_method.signature(),
            part,
        };

        let session = self.session.ok_or_else(|| incomplete("persistence session"))?;
        let marker = self.marker.ok_or_else(|| incomplete("query marker"))?;
        let declaring_type = self
            .declaring_type
            .ok_or_else(|| incomplete("declaring type"))?;

        Ok(DeferredDynamicQuery {
            query_method,
            session,
            marker,
            declaring_type,
            templates: self.templates,
        })
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
        QueryMethodFactory, RepositoryMetadata, RepositoryMethod, SessionCapabilities,
    };

    const USERS: TypeRef = TypeRef::new("app::repo", "UserRepository");

    fn descriptor() -> QueryMethod {
        let factory = DefaultQueryMethodFactory::new(
            PersistenceProvider::from_capabilities(SessionCapabilities::default()).into_extractor(),
        );
        factory
            .build(
                &RepositoryMethod::new(USERS, "find_active_users").returns("Vec<User>"),
                &RepositoryMetadata::new(USERS, "User", "i64"),
                &DefaultProjectionFactory::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_build_requires_every_part() {
        let session: Arc<dyn PersistenceSession> = Arc::new(RecordingSession::new());

        let missing_session = DeferredQueryBuilder::new()
            .descriptor(descriptor())
            .marker(QueryMarker::template("activeUsers"))
            .declaring_type(USERS)
            .build()
            .unwrap_err();
        assert!(matches!(
            missing_session,
            ResolveError::Incomplete {
                part: "persistence session",
                ..
            }
        ));

        let missing_marker = DeferredQueryBuilder::new()
            .descriptor(descriptor())
            .session(session.clone())
            .declaring_type(USERS)
            .build()
            .unwrap_err();
        assert!(missing_marker.to_string().contains("query marker"));

        let missing_descriptor = DeferredQueryBuilder::new()
            .session(session)
            .marker(QueryMarker::template("activeUsers"))
            .declaring_type(USERS)
            .build()
            .unwrap_err();
        assert!(missing_descriptor.to_string().contains("<unknown>"));
    }

    #[test]
    fn test_build_complete() {
        let session: Arc<dyn PersistenceSession> = Arc::new(RecordingSession::new());
        let query = DeferredQueryBuilder::new()
            .descriptor(descriptor())
            .session(session)
            .marker(QueryMarker::template("activeUsers"))
            .declaring_type(USERS)
            .build()
            .unwrap();
        assert_eq!(query.marker().template_id(), Some("activeUsers"));
        assert_eq!(query.declaring_type(), USERS);
        assert_eq!(query.query_method().name(), "find_active_users");
    }
}
