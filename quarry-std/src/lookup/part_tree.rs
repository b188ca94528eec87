//! # Method-Name Derivation
//!
//! Parses snake_case repository method names into a [`PartTree`]:
//!
//! ```text
//! find_distinct_top3_by_last_name_and_age_greater_than_order_by_age_desc
//! ^^^^ ^^^^^^^^ ^^^^ ^^ ^^^^^^^^^ ^^^ ^^^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^^
//! subject  |    limit |  criterion  |    criterion      ordering
//!       distinct     by            and
//! ```

use std::fmt::Write as _;

/// What a derived query does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// `find`, `read`, `get`, `query`, `search`, `stream`.
    Select,
    /// `count`.
    Count,
    /// `exists`.
    Exists,
    /// `delete`, `remove`.
    Delete,
}

/// Comparison applied to one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`.
    Equals,
    /// `<>`.
    Not,
    /// `like`.
    Like,
    /// `like %x%`.
    Containing,
    /// `like x%`.
    StartingWith,
    /// `like %x`.
    EndingWith,
    /// `>`.
    GreaterThan,
    /// `<`.
    LessThan,
    /// `between a and b`.
    Between,
    /// `in (...)`.
    In,
    /// `is null`.
    IsNull,
    /// `is not null`.
    IsNotNull,
    /// `= true`.
    True,
    /// `= false`.
    False,
}

// Suffixes are tried in order.
const OPERATORS: &[(&str, Operator)] = &[
    ("_is_not_null", Operator::IsNotNull),
    ("_is_null", Operator::IsNull),
    ("_starting_with", Operator::StartingWith),
    ("_ending_with", Operator::EndingWith),
    ("_greater_than", Operator::GreaterThan),
    ("_containing", Operator::Containing),
    ("_less_than", Operator::LessThan),
    ("_between", Operator::Between),
    ("_false", Operator::False),
    ("_like", Operator::Like),
    ("_true", Operator::True),
    ("_not", Operator::Not),
    ("_in", Operator::In),
];

impl Operator {
    /// Number of arguments the operator consumes.
    pub fn arity(self) -> usize {
        match self {
            Operator::Between => 2,
            Operator::IsNull | Operator::IsNotNull | Operator::True | Operator::False => 0,
            _ => 1,
        }
    }
}

/// One `property operator` criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// The property name.
    pub property: String,
    /// The comparison.
    pub operator: Operator,
}

/// Sort direction of an `order_by` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// A parsed method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTree {
    /// What the query does.
    pub subject: Subject,
    /// `distinct` was requested.
    pub distinct: bool,
    /// `first` / `top<N>` limit.
    pub limit: Option<u32>,
    /// Criteria as OR-ed groups of AND-ed parts.
    pub predicate: Vec<Vec<Part>>,
    /// Ordering clauses.
    pub order: Vec<(String, Direction)>,
}

impl PartTree {
    /// Parse `method_name`. The error explains which part is not understood.
    pub fn parse(method_name: &str) -> Result<Self, String> {
        let (subject, rest) = parse_subject(method_name)?;

        let (main, order) = if let Some(order) = rest.strip_prefix("order_by_") {
            ("", Some(order))
        } else if let Some((main, order)) = rest.split_once("_order_by_") {
            (main, Some(order))
        } else {
            (rest, None)
        };

        let (head, criteria) = if let Some(criteria) = main.strip_prefix("by_") {
            ("", Some(criteria))
        } else if let Some((head, criteria)) = main.split_once("_by_") {
            (head, Some(criteria))
        } else if main == "by" || main.ends_with("_by") {
            return Err("missing criteria after `by`".to_string());
        } else {
            (main, None)
        };
        let (distinct, limit) = parse_head(head)?;

        let predicate = match criteria {
            Some(c) if !c.is_empty() => parse_predicate(c)?,
            Some(_) => return Err("empty criteria".to_string()),
            None => Vec::new(),
        };
        let order = match order {
            Some(o) => parse_order(o)?,
            None => Vec::new(),
        };

        Ok(Self {
            subject,
            distinct,
            limit,
            predicate,
            order,
        })
    }

    /// Number of call arguments the criteria consume.
    pub fn arity(&self) -> usize {
        self.predicate
            .iter()
            .flatten()
            .map(|part| part.operator.arity())
            .sum()
    }

    /// Render the query text over `domain_type`, binding the given parameter names in order.
    pub fn render(&self, domain_type: &str, parameters: &[&str]) -> String {
        let mut query = String::new();
        let projection = match self.subject {
            Subject::Select if self.distinct => "select distinct e",
            Subject::Select => "select e",
            Subject::Count if self.distinct => "select count(distinct e)",
            Subject::Count => "select count(e)",
            Subject::Exists => "select e",
            Subject::Delete => "delete",
        };
        let _ = write!(query, "{} from {} e", projection, domain_type);

        if !self.predicate.is_empty() {
            let mut params = parameters.iter();
            let mut next = || format!(":{}", params.next().copied().unwrap_or("?"));
            let groups: Vec<String> = self
                .predicate
                .iter()
                .map(|group| {
                    group
                        .iter()
                        .map(|part| render_part(part, &mut next))
                        .collect::<Vec<_>>()
                        .join(" and ")
                })
                .collect();
            let _ = write!(query, " where {}", groups.join(" or "));
        }

        if !self.order.is_empty() {
            let clauses: Vec<String> = self
                .order
                .iter()
                .map(|(property, direction)| {
                    let dir = match direction {
                        Direction::Asc => "asc",
                        Direction::Desc => "desc",
                    };
                    format!("e.{} {}", property, dir)
                })
                .collect();
            let _ = write!(query, " order by {}", clauses.join(", "));
        }
        query
    }
}

fn render_part(part: &Part, next: &mut impl FnMut() -> String) -> String {
    let p = &part.property;
    match part.operator {
        Operator::Equals => format!("e.{} = {}", p, next()),
        Operator::Not => format!("e.{} <> {}", p, next()),
        Operator::Like => format!("e.{} like {}", p, next()),
        Operator::Containing => format!("e.{} like concat('%', {}, '%')", p, next()),
        Operator::StartingWith => format!("e.{} like concat({}, '%')", p, next()),
        Operator::EndingWith => format!("e.{} like concat('%', {})", p, next()),
        Operator::GreaterThan => format!("e.{} > {}", p, next()),
        Operator::LessThan => format!("e.{} < {}", p, next()),
        Operator::Between => {
            let low = next();
            format!("e.{} between {} and {}", p, low, next())
        }
        Operator::In => format!("e.{} in {}", p, next()),
        Operator::IsNull => format!("e.{} is null", p),
        Operator::IsNotNull => format!("e.{} is not null", p),
        Operator::True => format!("e.{} = true", p),
        Operator::False => format!("e.{} = false", p),
    }
}

fn parse_subject(name: &str) -> Result<(Subject, &str), String> {
    const PREFIXES: &[(&str, Subject)] = &[
        ("find", Subject::Select),
        ("read", Subject::Select),
        ("get", Subject::Select),
        ("query", Subject::Select),
        ("search", Subject::Select),
        ("stream", Subject::Select),
        ("count", Subject::Count),
        ("exists", Subject::Exists),
        ("delete", Subject::Delete),
        ("remove", Subject::Delete),
    ];
    for (prefix, subject) in PREFIXES {
        if name == *prefix {
            return Ok((*subject, ""));
        }
        if let Some(rest) = name.strip_prefix(prefix).and_then(|r| r.strip_prefix('_')) {
            return Ok((*subject, rest));
        }
    }
    Err(format!("`{}` does not start with a known query prefix", name))
}

/// `distinct`, `first`, `top<N>` and free words (`find_users_by_...`) before `by`.
fn parse_head(head: &str) -> Result<(bool, Option<u32>), String> {
    let mut distinct = false;
    let mut limit = None;
    for word in head.split('_').filter(|w| !w.is_empty()) {
        if word == "distinct" {
            distinct = true;
        } else if word == "first" {
            limit = Some(1);
        } else if let Some(n) = word
            .strip_prefix("top")
            .or_else(|| word.strip_prefix("first"))
            .filter(|n| n.chars().all(|c| c.is_ascii_digit()))
        {
            let n: u32 = if n.is_empty() {
                1
            } else {
                n.parse()
                    .map_err(|_| format!("invalid limit `{}`", word))?
            };
            if n == 0 {
                return Err("limit must be positive".to_string());
            }
            limit = Some(n);
        }
    }
    Ok((distinct, limit))
}

fn parse_predicate(criteria: &str) -> Result<Vec<Vec<Part>>, String> {
    criteria
        .split("_or_")
        .map(|group| group.split("_and_").map(parse_part).collect())
        .collect()
}

fn parse_part(text: &str) -> Result<Part, String> {
    for (suffix, operator) in OPERATORS {
        if let Some(property) = text.strip_suffix(suffix) {
            if property.is_empty() {
                break;
            }
            return Ok(Part {
                property: property.to_string(),
                operator: *operator,
            });
        }
    }
    if text.is_empty() || text.starts_with('_') || text.ends_with('_') {
        return Err(format!("invalid property `{}`", text));
    }
    Ok(Part {
        property: text.to_string(),
        operator: Operator::Equals,
    })
}

fn parse_order(order: &str) -> Result<Vec<(String, Direction)>, String> {
    let mut clauses = Vec::new();
    for clause in order.split("_and_") {
        let (property, direction) = if let Some(p) = clause.strip_suffix("_desc") {
            (p, Direction::Desc)
        } else if let Some(p) = clause.strip_suffix("_asc") {
            (p, Direction::Asc)
        } else {
            (clause, Direction::Asc)
        };
        if property.is_empty() {
            return Err(format!("invalid ordering `{}`", clause));
        }
        clauses.push((property.to_string(), direction));
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_equality() {
        let tree = PartTree::parse("find_by_name").unwrap();
        assert_eq!(tree.subject, Subject::Select);
        assert_eq!(tree.arity(), 1);
        assert_eq!(
            tree.render("User", &["name"]),
            "select e from User e where e.name = :name"
        );
    }

    #[test]
    fn test_and_or_operators() {
        let tree =
            PartTree::parse("find_by_last_name_and_age_greater_than_or_email_is_null").unwrap();
        assert_eq!(tree.predicate.len(), 2);
        assert_eq!(tree.arity(), 2);
        assert_eq!(
            tree.render("User", &["last_name", "age"]),
            "select e from User e where e.last_name = :last_name and e.age > :age or e.email is null"
        );
    }

    #[test]
    fn test_between_consumes_two() {
        let tree = PartTree::parse("count_by_age_between").unwrap();
        assert_eq!(tree.subject, Subject::Count);
        assert_eq!(tree.arity(), 2);
        assert_eq!(
            tree.render("User", &["low", "high"]),
            "select count(e) from User e where e.age between :low and :high"
        );
    }

    #[test]
    fn test_head_and_ordering() {
        let tree =
            PartTree::parse("find_distinct_top3_by_status_order_by_created_at_desc").unwrap();
        assert!(tree.distinct);
        assert_eq!(tree.limit, Some(3));
        assert_eq!(tree.order, vec![("created_at".to_string(), Direction::Desc)]);
        assert_eq!(
            tree.render("User", &["status"]),
            "select distinct e from User e where e.status = :status order by e.created_at desc"
        );
    }

    #[test]
    fn test_no_criteria() {
        let tree = PartTree::parse("find_all_order_by_name").unwrap();
        assert!(tree.predicate.is_empty());
        assert_eq!(tree.render("User", &[]), "select e from User e order by e.name asc");

        let plain = PartTree::parse("count").unwrap();
        assert_eq!(plain.render("User", &[]), "select count(e) from User e");
    }

    #[test]
    fn test_rejects_unknown_prefix_and_dangling_by() {
        assert!(PartTree::parse("fetch_by_name").is_err());
        assert!(PartTree::parse("find_by").is_err());
        assert!(PartTree::parse("find_by_name_and_").is_err());
        assert!(PartTree::parse("find_top0_by_name").is_err());
    }
}
