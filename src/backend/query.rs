//! Row queries
//!
//! A small filter/order model for selecting rows, with two interpretations:
//! PostgREST query parameters for the hosted backend, and direct evaluation
//! against JSON rows for the in-memory backend.
//!
//! # Example
//!
//! ```rust
//! use share_everything::backend::query::{Filter, Query};
//!
//! let query = Query::new()
//!     .filter(Filter::or(vec![
//!         Filter::and(vec![Filter::eq("sender", "alice"), Filter::eq("receiver", "bob")]),
//!         Filter::and(vec![Filter::eq("sender", "bob"), Filter::eq("receiver", "alice")]),
//!     ]))
//!     .order_by("timestamp", true);
//!
//! let params = query.to_postgrest_params();
//! assert_eq!(params[1].0, "or");
//! assert_eq!(params[1].1, "(and(sender.eq.alice,receiver.eq.bob),and(sender.eq.bob,receiver.eq.alice))");
//! ```

use std::cmp::Ordering;

use serde_json::Value;

/// Row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// All children match
    And(Vec<Filter>),
    /// Any child matches
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Evaluate the filter against a JSON row
    ///
    /// A missing column never matches. An empty `And` matches everything and
    /// an empty `Or` matches nothing.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(column, expected) => {
                row.get(column).map_or(false, |actual| actual == expected)
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(row)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }

    /// Top-level query parameters for this filter
    fn push_params(&self, params: &mut Vec<(String, String)>) {
        match self {
            Filter::Eq(column, value) => {
                params.push((column.clone(), format!("eq.{}", render_value(value))));
            }
            Filter::And(filters) => {
                for filter in filters {
                    filter.push_params(params);
                }
            }
            Filter::Or(filters) => {
                params.push(("or".to_string(), format!("({})", logic_list(filters))));
            }
        }
    }

    /// Expression form used inside `or=(...)` / `and(...)` lists
    fn logic_expr(&self) -> String {
        match self {
            Filter::Eq(column, value) => {
                format!("{}.eq.{}", column, quote_value(&render_value(value)))
            }
            Filter::And(filters) => format!("and({})", logic_list(filters)),
            Filter::Or(filters) => format!("or({})", logic_list(filters)),
        }
    }
}

fn logic_list(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::logic_expr)
        .collect::<Vec<_>>()
        .join(",")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Double-quote a value that contains PostgREST reserved characters
fn quote_value(value: &str) -> String {
    let reserved =
        |c: char| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | '\\') || c.is_whitespace();
    if !value.chars().any(reserved) {
        return value.to_string();
    }

    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Sort order on a single column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: true }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: false }
    }

    /// Compare two rows on the order column; missing values sort last
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = match (a.get(&self.column), b.get(&self.column)) {
            (Some(x), Some(y)) => compare_values(x, y),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// A select query: optional filter, order and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order { column: column.into(), ascending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs for `GET /rest/v1/<table>`
    pub fn to_postgrest_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(filter) = &self.filter {
            filter.push_params(&mut params);
        }
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Apply the query to a set of rows in memory
    ///
    /// Sorting is stable, so rows that tie on the order column keep their
    /// insertion order.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
        let mut selected: Vec<Value> = rows
            .into_iter()
            .filter(|row| self.filter.as_ref().map_or(true, |f| f.matches(row)))
            .cloned()
            .collect();

        if let Some(order) = &self.order {
            selected.sort_by(|a, b| order.compare(a, b));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}
