//! Argument values, page requests and query outputs.

/// A value bound to a query parameter or returned in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// A list, bound to `in` predicates.
    List(Vec<Value>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    /// Page size.
    pub size: u32,
}

impl PageRequest {
    /// Request page `page` of `size` items.
    pub const fn of(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Number of rows skipped before this page.
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

/// The arguments of one repository method call.
///
/// `values` hold the bindable parameters in declaration order; a pageable
/// parameter is passed separately through `page`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
    page: Option<PageRequest>,
}

impl Arguments {
    /// Arguments from bindable values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, page: None }
    }

    /// No arguments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Attach the page request.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// The bindable values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The page request, if any.
    pub fn page(&self) -> Option<PageRequest> {
        self.page
    }
}

/// Named parameter bindings, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(Vec<(String, Value)>);

impl Bindings {
    /// Empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `name`.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.0.push((name.into(), value));
    }

    /// The value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// One result row.
pub type Row = Vec<Value>;

/// What a query invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Result rows.
    Rows(Vec<Row>),
    /// One page of rows plus the total number of matching rows.
    Page {
        /// The rows of the requested page.
        rows: Vec<Row>,
        /// Total number of matching rows, when counted.
        total: Option<u64>,
    },
    /// A count.
    Count(u64),
    /// An existence check.
    Exists(bool),
    /// Number of rows affected by a modifying statement.
    Affected(u64),
}
