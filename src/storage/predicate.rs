//! Storage-level predicates
//!
//! A [`Predicate`] is a conjunction of column comparisons rendered as a
//! `WHERE` clause with positional `?` placeholders. Values never appear in
//! the SQL text; they travel in [`Predicate::params`] and are bound by SQLite.

use crate::storage::schema::{quote_ident, Column, Value};
use serde::{Deserialize, Serialize};

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gte,
    Lte,
}

impl Comparison {
    fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
        }
    }
}

/// Conjunction of column comparisons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicate {
    /// The predicate matching every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Builder method: add `column <op> ?`
    pub fn compare(mut self, column: &Column, op: Comparison, value: Value) -> Self {
        self.clauses
            .push(format!("{} {} ?", column.quoted(), op.as_sql()));
        self.params.push(value);
        self
    }

    /// Builder method: add `column = ?`
    pub fn eq(self, column: &Column, value: Value) -> Self {
        self.compare(column, Comparison::Eq, value)
    }

    /// Combine two predicates with AND, keeping parameter order
    pub fn and(mut self, other: Predicate) -> Self {
        self.clauses.extend(other.clauses);
        self.params.extend(other.params);
        self
    }

    /// True when the predicate has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Rendered ` WHERE ...` clause, empty when matching everything
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Bound values in placeholder order
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// ORDER BY and pagination of a select
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    /// Column to sort by (must already be validated against the schema)
    pub column: &'static str,
    pub order: SortOrder,
    /// Maximum rows to return; `None` for all
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Ordering {
    pub fn new(column: &'static str, order: SortOrder) -> Self {
        Self {
            column,
            order,
            limit: None,
            offset: 0,
        }
    }

    /// Builder method: page window
    pub fn page(mut self, limit: Option<u32>, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Rendered ` ORDER BY ... LIMIT ... OFFSET ...` suffix
    pub fn to_sql(&self) -> String {
        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
        let limit = self.limit.map(i64::from).unwrap_or(-1);
        format!(
            " ORDER BY {} {} LIMIT {} OFFSET {}",
            quote_ident(self.column),
            self.order.as_sql(),
            limit,
            self.offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::ColumnType;

    const USER_ID: Column = Column::new("user_id", ColumnType::Integer);
    const IP: Column = Column::new("ip", ColumnType::Text);

    #[test]
    fn test_empty_predicate_matches_all() {
        let p = Predicate::all();
        assert!(p.is_empty());
        assert_eq!(p.where_clause(), "");
        assert!(p.params().is_empty());
    }

    #[test]
    fn test_values_are_placeholders() {
        let p = Predicate::all()
            .eq(&USER_ID, Value::Integer(5))
            .eq(&IP, Value::Text("1.2.3.4' OR 1=1 --".into()));

        assert_eq!(p.where_clause(), " WHERE \"user_id\" = ? AND \"ip\" = ?");
        assert_eq!(p.params().len(), 2);
        assert!(!p.where_clause().contains("OR 1=1"));
    }

    #[test]
    fn test_and_keeps_param_order() {
        let a = Predicate::all().eq(&USER_ID, Value::Integer(1));
        let b = Predicate::all().compare(&IP, Comparison::Gte, Value::Text("a".into()));
        let p = a.and(b);

        assert_eq!(p.where_clause(), " WHERE \"user_id\" = ? AND \"ip\" >= ?");
        assert_eq!(
            p.params(),
            &[Value::Integer(1), Value::Text("a".into())]
        );
    }

    #[test]
    fn test_ordering_sql() {
        let o = Ordering::new("id", SortOrder::Desc);
        assert_eq!(o.to_sql(), " ORDER BY \"id\" DESC LIMIT -1 OFFSET 0");

        let o = Ordering::new("date_created", SortOrder::Asc).page(Some(20), 40);
        assert_eq!(
            o.to_sql(),
            " ORDER BY \"date_created\" ASC LIMIT 20 OFFSET 40"
        );
    }
}
