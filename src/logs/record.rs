//! API request log records
//!
//! [`LogRecord`] is one persisted request; [`LogRecordPatch`] is the partial
//! form callers hand to insert and update. Unknown keys in an untyped field
//! bag are rejected rather than dropped.

use crate::storage::schema::{timestamp_from_micros, Column, ColumnType, Schema, Value};
use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Canonical type tag of every row in the log table
pub const API_REQUEST_LOG_TYPE: &str = "api_request_log";

const COLUMNS: &[Column] = &[
    Column::new("id", ColumnType::Integer),
    Column::new("user_id", ColumnType::Integer),
    Column::new("key", ColumnType::Text).max_len(32),
    Column::new("version", ColumnType::Text).max_len(30),
    Column::new("request", ColumnType::Text),
    Column::new("ip", ColumnType::Text).max_len(100),
    Column::new("time", ColumnType::Float),
    Column::new("date_created", ColumnType::Timestamp),
];

/// One API request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Assigned by storage, never reused
    pub id: u64,
    /// Requesting user; 0 for anonymous requests
    pub user_id: u64,
    /// Access key identifier
    pub key: String,
    /// API version requested
    pub version: String,
    /// Raw request descriptor
    pub request: String,
    /// Originating address
    pub ip: String,
    /// Request duration in seconds
    pub time: f64,
    /// Set once at insert
    pub date_created: DateTime<Utc>,
}

impl LogRecord {
    pub fn is_anonymous(&self) -> bool {
        self.user_id == 0
    }
}

impl Schema for LogRecord {
    const TABLE: &'static str = "api_request_logs";
    const PRIMARY_KEY: &'static str = "id";
    const VERSION: &'static str = "1.0";

    fn columns() -> &'static [Column] {
        COLUMNS
    }

    fn column_defaults() -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Integer(0)),
            ("user_id", Value::Integer(0)),
            ("key", Value::Text("public".to_string())),
            ("version", Value::Text(String::new())),
            ("request", Value::Text(String::new())),
            ("ip", Value::Text(String::new())),
            ("time", Value::Float(0.0)),
            ("date_created", Value::Timestamp(Utc::now().trunc_subsecs(6))),
        ]
    }

    fn immutable_columns() -> &'static [&'static str] {
        &["date_created"]
    }

    fn indexed_columns() -> &'static [&'static str] {
        &["user_id"]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created: i64 = row.get("date_created")?;
        let date_created = timestamp_from_micros(created)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(7, created))?;

        Ok(Self {
            id: row.get::<_, i64>("id")?.max(0) as u64,
            user_id: row.get::<_, i64>("user_id")?.max(0) as u64,
            key: row.get("key")?,
            version: row.get("version")?,
            request: row.get("request")?,
            ip: row.get("ip")?,
            time: row.get("time")?,
            date_created,
        })
    }
}

/// Partial log record used for insert and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogRecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    /// Type tag requested by the caller. Inserts always use [`API_REQUEST_LOG_TYPE`].
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl LogRecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an untyped field bag, rejecting unknown keys
    pub fn from_fields(fields: serde_json::Value) -> StorageResult<Self> {
        serde_json::from_value(fields).map_err(|e| StorageError::InvalidArgument(e.to_string()))
    }

    /// Builder method: set user
    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Builder method: set access key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Builder method: set API version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Builder method: set request descriptor
    pub fn request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    /// Builder method: set originating address
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Builder method: set duration
    pub fn time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    /// Builder method: set creation time
    pub fn date_created(mut self, date_created: DateTime<Utc>) -> Self {
        self.date_created = Some(date_created);
        self
    }

    /// Builder method: set type tag
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// True when no column is set (the type tag is not a column)
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.key.is_none()
            && self.version.is_none()
            && self.request.is_none()
            && self.ip.is_none()
            && self.time.is_none()
            && self.date_created.is_none()
    }

    /// Column values of the supplied fields, in column order
    pub fn values(&self) -> StorageResult<Vec<(&'static str, Value)>> {
        let mut values = Vec::new();

        if let Some(user_id) = self.user_id {
            let user_id = i64::try_from(user_id).map_err(|_| {
                StorageError::InvalidArgument(format!("user_id out of range: {}", user_id))
            })?;
            values.push(("user_id", Value::Integer(user_id)));
        }
        if let Some(key) = &self.key {
            values.push(("key", Value::Text(key.clone())));
        }
        if let Some(version) = &self.version {
            values.push(("version", Value::Text(version.clone())));
        }
        if let Some(request) = &self.request {
            values.push(("request", Value::Text(request.clone())));
        }
        if let Some(ip) = &self.ip {
            values.push(("ip", Value::Text(ip.clone())));
        }
        if let Some(time) = self.time {
            if !time.is_finite() {
                return Err(StorageError::InvalidArgument(format!(
                    "time must be finite, got {}",
                    time
                )));
            }
            values.push(("time", Value::Float(time)));
        }
        if let Some(date_created) = self.date_created {
            values.push(("date_created", Value::Timestamp(date_created)));
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_and_defaults_align() {
        let names: Vec<&str> = LogRecord::columns().iter().map(|c| c.name).collect();
        let defaults: Vec<&str> = LogRecord::column_defaults()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names, defaults);

        for (name, value) in LogRecord::column_defaults() {
            let column = LogRecord::column(name).unwrap();
            assert!(column.validate(&value).is_ok(), "default of {} invalid", name);
        }
    }

    #[test]
    fn test_key_defaults_to_public() {
        let defaults = LogRecord::column_defaults();
        let key = defaults.iter().find(|(name, _)| *name == "key").unwrap();
        assert_eq!(key.1, Value::Text("public".into()));
    }

    #[test]
    fn test_ddl() {
        let sql = LogRecord::create_table_sql("wp_api_request_logs");
        assert!(sql.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("\"time\" REAL NOT NULL"));
        assert!(sql.contains("\"date_created\" INTEGER NOT NULL"));

        let indexes = LogRecord::create_index_sql("wp_api_request_logs");
        assert_eq!(indexes.len(), 1);
        assert!(indexes[0].contains("(\"user_id\")"));
    }

    #[test]
    fn test_mutability() {
        assert!(LogRecord::is_mutable("ip"));
        assert!(!LogRecord::is_mutable("id"));
        assert!(!LogRecord::is_mutable("date_created"));
    }

    #[test]
    fn test_patch_from_fields() {
        let patch = LogRecordPatch::from_fields(json!({
            "user_id": 5,
            "ip": "1.2.3.4",
            "time": 0.2,
            "type": "sale"
        }))
        .unwrap();

        assert_eq!(patch.user_id, Some(5));
        assert_eq!(patch.data_type.as_deref(), Some("sale"));
        assert_eq!(
            patch.values().unwrap(),
            vec![
                ("user_id", Value::Integer(5)),
                ("ip", Value::Text("1.2.3.4".into())),
                ("time", Value::Float(0.2)),
            ]
        );
    }

    #[test]
    fn test_patch_rejects_unknown_keys() {
        let err = LogRecordPatch::from_fields(json!({ "user_id": 1, "referrer": "x" }))
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument(_)));

        // Ids are assigned by storage, never supplied
        let err = LogRecordPatch::from_fields(json!({ "id": 3 })).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument(_)));
    }

    #[test]
    fn test_patch_rejects_out_of_range_values() {
        let patch = LogRecordPatch::new().user_id(u64::MAX);
        assert!(matches!(
            patch.values(),
            Err(StorageError::InvalidArgument(_))
        ));

        let patch = LogRecordPatch::new().time(f64::NAN);
        assert!(patch.values().is_err());
    }

    #[test]
    fn test_patch_is_empty_ignores_type() {
        assert!(LogRecordPatch::new().data_type("x").is_empty());
        assert!(!LogRecordPatch::new().ip("::1").is_empty());
    }
}
