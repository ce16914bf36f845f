//! Equality and ordering filters for table calls.

use std::cmp::Ordering;

use serde_json::Value;

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Which rows a `select`, `update`, or `delete` applies to.
///
/// Filters are ANDed equality checks on top-level columns. An empty
/// query matches every row.
///
/// ```rust
/// use classdesk_remote::{Order, Query};
///
/// let query = Query::all()
///     .eq("teacher_id", "t1")
///     .order_by("scheduled_start", Order::Asc);
/// assert_eq!(query.filters().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
    order: Option<(String, Order)>,
}

impl Query {
    /// A query that matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds `column = value`.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    /// Sorts results by `column`. A later call replaces an earlier one.
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn order(&self) -> Option<(&str, Order)> {
        self.order.as_ref().map(|(c, o)| (c.as_str(), *o))
    }

    /// Returns `true` if `row` satisfies every equality filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }

    /// Sorts `rows` in place by the ordering clause, if any.
    pub fn sort(&self, rows: &mut [Value]) {
        if let Some((column, order)) = self.order() {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(column), b.get(column));
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }
    }
}

/// Orders two column values. Missing and null sort first; strings
/// compare lexically (RFC 3339 timestamps sort chronologically this way).
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
