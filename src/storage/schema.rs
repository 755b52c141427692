//! Schema descriptors
//!
//! A [`Schema`] describes one table: its ordered columns with their semantic
//! types, the default value of every column, and how a row is hydrated back
//! into a record. The generic [`Store`](crate::storage::Store) uses it to
//! validate and fill input; the query layer uses it to decide which fields
//! are filterable and orderable.

use crate::storage::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Semantic storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Text,
    Float,
    Timestamp,
}

impl ColumnType {
    /// SQLite column affinity for this type
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Float => "REAL",
            ColumnType::Timestamp => "INTEGER",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Text => write!(f, "string"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    /// Maximum length in characters for text columns
    pub max_len: Option<usize>,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            max_len: None,
        }
    }

    /// Builder method: limit text width
    pub const fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Column name quoted for use in SQL
    pub fn quoted(&self) -> String {
        quote_ident(self.name)
    }

    /// Check that a value fits this column
    pub fn validate(&self, value: &Value) -> StorageResult<()> {
        let type_ok = matches!(
            (self.ty, value),
            (ColumnType::Integer, Value::Integer(_))
                | (ColumnType::Text, Value::Text(_))
                | (ColumnType::Float, Value::Float(_))
                | (ColumnType::Float, Value::Integer(_))
                | (ColumnType::Timestamp, Value::Timestamp(_))
        );
        if !type_ok {
            return Err(StorageError::InvalidArgument(format!(
                "column {} expects a {} value, got {}",
                self.name,
                self.ty,
                value.column_type()
            )));
        }

        if let Value::Timestamp(ts) = value {
            if ts.timestamp_subsec_nanos() % 1_000 != 0 {
                return Err(StorageError::InvalidArgument(format!(
                    "column {} stores microseconds, got {}",
                    self.name,
                    ts.to_rfc3339()
                )));
            }
        }

        if let (Some(max), Value::Text(text)) = (self.max_len, value) {
            let len = text.chars().count();
            if len > max {
                return Err(StorageError::ValueTooLong {
                    column: self.name.to_string(),
                    len,
                    max,
                });
            }
        }

        Ok(())
    }
}

/// A single column value, bound as a SQL parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Text(String),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// The semantic type this value carries
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Integer(_) => ColumnType::Integer,
            Value::Text(_) => ColumnType::Text,
            Value::Float(_) => ColumnType::Float,
            Value::Timestamp(_) => ColumnType::Timestamp,
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Integer(v) => SqlValue::Integer(*v),
            Value::Text(v) => SqlValue::Text(v.clone()),
            Value::Float(v) => SqlValue::Real(*v),
            Value::Timestamp(v) => SqlValue::Integer(timestamp_to_micros(v)),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Stored form of a timestamp: microseconds since the Unix epoch
pub fn timestamp_to_micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Inverse of [`timestamp_to_micros`]; `None` outside chrono's range
pub fn timestamp_from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

/// Describes a table and how its rows map to a record type
pub trait Schema: Sized {
    /// Unprefixed table name
    const TABLE: &'static str;
    /// Auto-assigned integer key column
    const PRIMARY_KEY: &'static str;
    /// Schema version recorded when the table is created
    const VERSION: &'static str;

    /// Ordered column set
    fn columns() -> &'static [Column];

    /// Default value of each column, in column order
    fn column_defaults() -> Vec<(&'static str, Value)>;

    /// Columns that may only be written at insert time (the primary key is always immutable)
    fn immutable_columns() -> &'static [&'static str] {
        &[]
    }

    /// Columns that get a non-unique secondary index
    fn indexed_columns() -> &'static [&'static str] {
        &[]
    }

    /// Hydrate a record from a row selected in [`columns`](Self::columns) order
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Look up a column by name
    fn column(name: &str) -> Option<&'static Column> {
        Self::columns().iter().find(|c| c.name == name)
    }

    /// Whether a column may be changed after insert
    fn is_mutable(name: &str) -> bool {
        name != Self::PRIMARY_KEY && !Self::immutable_columns().contains(&name)
    }

    /// DDL for the table, derived from the column set
    fn create_table_sql(table: &str) -> String {
        let columns: Vec<String> = Self::columns()
            .iter()
            .map(|c| {
                if c.name == Self::PRIMARY_KEY {
                    format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", c.quoted())
                } else {
                    format!("{} {} NOT NULL", c.quoted(), c.ty.sql_type())
                }
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            quote_ident(table),
            columns.join(",\n    ")
        )
    }

    /// DDL for the secondary indexes
    fn create_index_sql(table: &str) -> Vec<String> {
        Self::indexed_columns()
            .iter()
            .map(|col| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    quote_ident(&format!("{}_{}", table, col)),
                    quote_ident(table),
                    quote_ident(col)
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_validate_type_mismatch() {
        let col = Column::new("user_id", ColumnType::Integer);
        assert!(col.validate(&Value::Integer(5)).is_ok());

        let err = col.validate(&Value::Text("5".into())).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument(_)));
    }

    #[test]
    fn test_validate_float_accepts_integer() {
        let col = Column::new("time", ColumnType::Float);
        assert!(col.validate(&Value::Integer(2)).is_ok());
        assert!(col.validate(&Value::Float(0.25)).is_ok());
    }

    #[test]
    fn test_validate_max_len_counts_chars() {
        let col = Column::new("ip", ColumnType::Text).max_len(4);
        assert!(col.validate(&Value::Text("éééé".into())).is_ok());

        let err = col.validate(&Value::Text("12345".into())).unwrap_err();
        assert!(matches!(
            err,
            StorageError::ValueTooLong { len: 5, max: 4, .. }
        ));
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident("key"), "\"key\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_timestamp_micros() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::microseconds(900_001);
        let micros = timestamp_to_micros(&ts);
        assert_eq!(micros % 1_000_000, 900_001);
        assert_eq!(timestamp_from_micros(micros), Some(ts));

        // Integer order follows time past year 9999
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert!(timestamp_to_micros(&far) > micros);
        assert_eq!(timestamp_from_micros(timestamp_to_micros(&far)), Some(far));
    }

    #[test]
    fn test_validate_rejects_sub_microsecond() {
        let col = Column::new("date_created", ColumnType::Timestamp);
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert!(col.validate(&Value::Timestamp(ts + Duration::microseconds(7))).is_ok());
        assert!(matches!(
            col.validate(&Value::Timestamp(ts + Duration::nanoseconds(7))),
            Err(StorageError::InvalidArgument(_))
        ));
    }
}
