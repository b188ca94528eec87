//! Testing utilities for Quarry.
//!
//! This module provides stand-ins for the external collaborators so that
//! strategies and repositories can be exercised without a database.
//!
//! # Features
//!
//! - [`RecordingSession`]: A session that records statements and replays scripted outputs
//! - [`StubLookupStrategy`]: A lookup strategy with a fixed answer
//! - [`StubQuery`]: A query that always returns the same output

use async_trait::async_trait;
use quarry_core::{
    Arguments, BoxError, InvocationError, NamedQueries, PersistenceSession, ProjectionFactory,
    QueryLookupStrategy, QueryMethod, QueryOutput, RepositoryMetadata, RepositoryMethod,
    RepositoryQuery, ResolveError, SessionCapabilities, Statement, StatementKind,
};
use std::{
    any::Any,
    collections::VecDeque,
    sync::{Arc, Mutex},
};

// ============================================================================
// Recording Session
// ============================================================================

/// A session that records every statement it executes.
///
/// Scripted outputs are replayed in order; once they run out, each statement
/// gets an empty answer of its kind.
///
/// # Example
///
/// ```rust,ignore
/// let session = Arc::new(RecordingSession::new().respond_with(QueryOutput::Count(3)));
/// // resolve and invoke queries against `session`...
/// assert_eq!(session.statements().len(), 1);
/// ```
#[derive(Default)]
pub struct RecordingSession {
    statements: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<QueryOutput>>,
    failure: Option<String>,
    capabilities: SessionCapabilities,
}

impl RecordingSession {
    /// Create a session with no scripted outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an output for the next unanswered statement.
    pub fn respond_with(self, output: QueryOutput) -> Self {
        self.responses.lock().unwrap().push_back(output);
        self
    }

    /// Make every execution fail with `message`.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Report the given capabilities.
    pub fn with_capabilities(mut self, capabilities: SessionCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// A clone of the recorded statements.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    /// Forget the recorded statements.
    pub fn clear(&self) {
        self.statements.lock().unwrap().clear();
    }
}

#[async_trait]
impl PersistenceSession for RecordingSession {
    fn capabilities(&self) -> SessionCapabilities {
        self.capabilities.clone()
    }

    async fn execute(&self, statement: Statement) -> Result<QueryOutput, BoxError> {
        let kind = statement.kind;
        self.statements.lock().unwrap().push(statement);
        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        let scripted = self.responses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or(match kind {
            StatementKind::Select => QueryOutput::Rows(Vec::new()),
            StatementKind::Count => QueryOutput::Count(0),
            StatementKind::Exists => QueryOutput::Exists(false),
            StatementKind::Delete => QueryOutput::Affected(0),
        }))
    }
}

// ============================================================================
// Stub Query
// ============================================================================

/// A query that answers every call with the same output.
#[derive(Debug)]
pub struct StubQuery {
    query_method: QueryMethod,
    output: QueryOutput,
}

impl StubQuery {
    /// Create a stub for `query_method` answering `output`.
    pub fn new(query_method: QueryMethod, output: QueryOutput) -> Self {
        Self {
            query_method,
            output,
        }
    }
}

#[async_trait]
impl RepositoryQuery for StubQuery {
    fn query_method(&self) -> &QueryMethod {
        &self.query_method
    }

    async fn execute(&self, _args: Arguments) -> Result<QueryOutput, InvocationError> {
        Ok(self.output.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Stub Lookup Strategy
// ============================================================================

/// A lookup strategy that always gives the same answer and records each call.
///
/// # Example
///
/// ```rust,ignore
/// let stub = StubLookupStrategy::returning(query.clone());
/// let resolved = stub.resolve_query(&method, &metadata, &projections, &named)?;
/// assert!(Arc::ptr_eq(&resolved, &query));
/// assert_eq!(stub.calls(), vec![method.signature()]);
/// ```
pub struct StubLookupStrategy {
    answer: Option<Arc<dyn RepositoryQuery>>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubLookupStrategy {
    /// A stub that resolves every method to `query`.
    pub fn returning(query: Arc<dyn RepositoryQuery>) -> Self {
        Self {
            answer: Some(query),
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A stub that fails every resolution with `ResolveError::Custom(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: None,
            failure: Some(message.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Signatures of the methods resolved so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of resolutions so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Clone for StubLookupStrategy {
    fn clone(&self) -> Self {
        Self {
            answer: self.answer.clone(),
            failure: self.failure.clone(),
            calls: self.calls.clone(),
        }
    }
}

impl QueryLookupStrategy for StubLookupStrategy {
    fn resolve_query(
        &self,
        method: &RepositoryMethod,
        _metadata: &RepositoryMetadata,
        _projection: &dyn ProjectionFactory,
        _named_queries: &dyn NamedQueries,
    ) -> Result<Arc<dyn RepositoryQuery>, ResolveError> {
        self.calls.lock().unwrap().push(method.signature());
        match (&self.answer, &self.failure) {
            (Some(query), _) => Ok(query.clone()),
            (None, Some(message)) => Err(ResolveError::Custom(message.clone().into())),
            (None, None) => Err(ResolveError::Custom("stub has no answer".into())),
        }
    }
}
