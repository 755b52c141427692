//! Log query arguments
//!
//! [`LogQuery`] is the structured form of the filter arguments callers pass
//! to `get_logs` and `count`. Every filter is optional; an all-default query
//! matches every record.

use crate::query::error::{QueryError, QueryResult};
use crate::storage::SortOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size
pub const DEFAULT_NUMBER: u32 = 20;

/// Filter, ordering and pagination arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogQuery {
    /// Exact user id (0 selects anonymous requests)
    pub user_id: Option<u64>,
    /// Exact access key
    pub key: Option<String>,
    /// Exact API version
    pub version: Option<String>,
    /// Exact originating address
    pub ip: Option<String>,
    /// Inclusive lower bound on `date_created`
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `date_created`
    pub end_date: Option<DateTime<Utc>>,
    /// Page size; 0 returns every match
    pub number: u32,
    /// Rows to skip
    pub offset: u32,
    /// Column to sort by
    pub orderby: String,
    /// Sort direction
    pub order: SortOrder,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            key: None,
            version: None,
            ip: None,
            start_date: None,
            end_date: None,
            number: DEFAULT_NUMBER,
            offset: 0,
            orderby: "id".to_string(),
            order: SortOrder::Desc,
        }
    }
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an untyped argument bag, rejecting unknown fields
    pub fn from_args(args: serde_json::Value) -> QueryResult<Self> {
        if args.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(args).map_err(|e| QueryError::InvalidArgument(e.to_string()))
    }

    /// Builder method: filter by user
    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Builder method: filter by access key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Builder method: filter by API version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Builder method: filter by address
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Builder method: only records created at or after `start`
    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    /// Builder method: only records created at or before `end`
    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Builder method: inclusive creation-date window
    pub fn between(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.since(start).until(end)
    }

    /// Builder method: page size (0 for all)
    pub fn number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    /// Builder method: rows to skip
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Builder method: sort column and direction
    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.orderby = column.into();
        self.order = order;
        self
    }

    /// Same filters with ordering and pagination reset
    pub fn filters_only(&self) -> Self {
        Self {
            user_id: self.user_id,
            key: self.key.clone(),
            version: self.version.clone(),
            ip: self.ip.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            ..Self::default()
        }
    }
}
