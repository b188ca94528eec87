//! # Default Query Method Factory
//!
//! Turns a [`RepositoryMethod`] into a [`QueryMethod`] by reading its
//! signature: which parameters bind by name, which one carries the page
//! window, and what shape the result takes.
//!
//! Return types are read as written. `Result<T, E>` is looked through, so
//! `Result<Vec<User>, Error>` classifies like `Vec<User>`:
//!
//! | return type | shape |
//! |-------------|-------|
//! | `()` | `Unit` |
//! | `Option<T>` | `Optional` |
//! | `Vec<T>`, `VecDeque<T>`, `HashSet<T>`, `BTreeSet<T>` | `Collection` |
//! | `Page<T>` / `Slice<T>` | `Page` / `Slice` |
//! | `Stream<T>`, `BoxStream<T>`, `impl Stream<Item = T>` | `Stream` |
//! | integer on a `count*` method | `Count` |
//! | `bool` on an `exists*` method | `Exists` |
//! | anything else | `Single` |

use quarry_core::{
    DescriptorError, ParameterKind, ProjectionFactory, QueryExtractor, QueryMethod,
    QueryMethodFactory, QueryParameter, RepositoryMetadata, RepositoryMethod, ResolveError,
    ReturnShape,
};
use std::collections::HashSet;
use std::sync::Arc;

const PAGEABLE_TYPE: &str = "PageRequest";
const COLLECTION_TYPES: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet"];
const STREAM_TYPES: &[&str] = &["Stream", "BoxStream"];
const COUNT_TYPES: &[&str] = &["u64", "usize", "i64", "u32", "i32"];

/// The query method factory used by both resolution branches.
#[derive(Debug, Clone)]
pub struct DefaultQueryMethodFactory {
    extractor: Arc<dyn QueryExtractor>,
}

impl DefaultQueryMethodFactory {
    /// Create a factory that stamps `extractor` into every descriptor.
    pub fn new(extractor: Arc<dyn QueryExtractor>) -> Self {
        Self { extractor }
    }
}

impl QueryMethodFactory for DefaultQueryMethodFactory {
    fn build(
        &self,
        method: &RepositoryMethod,
        metadata: &RepositoryMetadata,
        projection: &dyn ProjectionFactory,
    ) -> Result<QueryMethod, ResolveError> {
        let fail = |source| ResolveError::Descriptor {
            method: method.signature(),
            source,
        };

        let parameters = resolve_parameters(method).map_err(fail)?;
        let (shape, result_type) =
            classify_return(method.name(), method.return_type()).map_err(fail)?;

        if shape.is_paging() && !parameters.iter().any(|p| p.kind == ParameterKind::Pageable) {
            return Err(fail(DescriptorError::PageWithoutPageable(
                method.return_type().to_string(),
            )));
        }

        let projection = projection
            .is_projection(&result_type, metadata.domain_type())
            .then(|| result_type.clone());

        Ok(
            QueryMethod::new(method.clone(), metadata.clone(), self.extractor.clone())
                .with_parameters(parameters)
                .with_return_shape(shape, result_type)
                .with_projection(projection),
        )
    }
}

fn resolve_parameters(method: &RepositoryMethod) -> Result<Vec<QueryParameter>, DescriptorError> {
    let mut seen = HashSet::new();
    let mut pageable = 0usize;
    let mut parameters = Vec::with_capacity(method.parameters().len());

    for (index, param) in method.parameters().iter().enumerate() {
        if !seen.insert(param.name()) {
            return Err(DescriptorError::DuplicateParameter(param.name().to_string()));
        }
        let ty = normalize(param.ty());
        let kind = if base_name(ty.trim_start_matches('&')) == PAGEABLE_TYPE {
            pageable += 1;
            ParameterKind::Pageable
        } else {
            ParameterKind::Bindable
        };
        parameters.push(QueryParameter {
            index,
            name: param.name().to_string(),
            ty,
            kind,
        });
    }

    if pageable > 1 {
        return Err(DescriptorError::MultiplePageable);
    }
    Ok(parameters)
}

fn classify_return(
    method_name: &str,
    return_type: &str,
) -> Result<(ReturnShape, String), DescriptorError> {
    let unsupported = || DescriptorError::UnsupportedReturnType(return_type.to_string());
    let mut ty = normalize(return_type);

    // Fallible signatures classify by their success type.
    if base_name(&ty) == "Result" {
        ty = generic_args(&ty)
            .and_then(|args| args.into_iter().next())
            .ok_or_else(unsupported)?;
    }

    if ty.is_empty() || ty == "()" {
        return Ok((ReturnShape::Unit, "()".to_string()));
    }
    if ty.starts_with('(') {
        return Err(unsupported());
    }
    if let Some(item) = ty.strip_prefix("implStream<Item=") {
        let item = item.strip_suffix('>').ok_or_else(unsupported)?;
        return Ok((ReturnShape::Stream, item.to_string()));
    }

    let base = base_name(&ty);
    let element = || {
        generic_args(&ty)
            .and_then(|args| args.into_iter().next())
            .filter(|arg| !arg.is_empty())
            .ok_or_else(unsupported)
    };

    let classified = match base {
        "Option" => (ReturnShape::Optional, element()?),
        "Page" => (ReturnShape::Page, element()?),
        "Slice" => (ReturnShape::Slice, element()?),
        b if COLLECTION_TYPES.contains(&b) => (ReturnShape::Collection, element()?),
        b if STREAM_TYPES.contains(&b) => (ReturnShape::Stream, element()?),
        b if COUNT_TYPES.contains(&b) && method_name.starts_with("count") => {
            (ReturnShape::Count, ty.clone())
        }
        "bool" if method_name.starts_with("exists") => (ReturnShape::Exists, ty.clone()),
        _ => (ReturnShape::Single, ty.clone()),
    };
    Ok(classified)
}

/// Drop whitespace that doesn't separate two words (`Vec < User >` → `Vec<User>`).
fn normalize(ty: &str) -> String {
    let chars: Vec<char> = ty.trim().chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '\'';
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            let prev = out.chars().last();
            let next = chars[i + 1..].iter().copied().find(|c| !c.is_whitespace());
            match (prev, next) {
                (Some(p), Some(n)) if is_word(p) && is_word(n) && p != '\'' => {
                    if !out.ends_with(' ') {
                        out.push(' ');
                    }
                }
                _ => {}
            }
        } else {
            out.push(c);
        }
    }
    out.replace("impl Stream", "implStream")
}

/// Last path segment before any generic arguments (`std::vec::Vec<T>` → `Vec`).
fn base_name(ty: &str) -> &str {
    let head = ty.split('<').next().unwrap_or(ty);
    head.rsplit("::").next().unwrap_or(head)
}

/// Top-level generic arguments of `ty`, if it has any.
fn generic_args(ty: &str) -> Option<Vec<String>> {
    let open = ty.find('<')?;
    let inner = ty[open + 1..].strip_suffix('>')?;
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                args.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    args.push(current);
    Some(args)
}
