//! Argument binding shared by every query implementation.

use quarry_core::{Arguments, Bindings, InvocationError, QueryMethod, QueryOutput, Row};

/// Bind call arguments to the bindable parameters of `query_method`.
///
/// Values bind by parameter name, in declaration order. Paging methods must
/// receive a page request.
pub(crate) fn bind_arguments(
    query_method: &QueryMethod,
    args: &Arguments,
) -> Result<Bindings, InvocationError> {
    let expected = query_method.bindable_parameters().count();
    if args.values().len() != expected {
        return Err(InvocationError::ArgumentCount {
            method: query_method.signature(),
            expected,
            actual: args.values().len(),
        });
    }
    if query_method.is_page_query() && args.page().is_none() {
        return Err(InvocationError::MissingPage {
            method: query_method.signature(),
        });
    }

    let mut bindings = Bindings::new();
    for (param, value) in query_method.bindable_parameters().zip(args.values()) {
        bindings.bind(param.name.clone(), value.clone());
    }
    Ok(bindings)
}

/// Rows of a paging query's select statement.
pub(crate) fn page_rows(
    query_method: &QueryMethod,
    output: QueryOutput,
) -> Result<Vec<Row>, InvocationError> {
    match output {
        QueryOutput::Rows(rows) | QueryOutput::Page { rows, .. } => Ok(rows),
        other => Err(InvocationError::UnexpectedOutput {
            method: query_method.signature(),
            detail: format!("expected rows, got {:?}", other),
        }),
    }
}
