//! Generic SQLite record store
//!
//! [`Store<T>`] owns one table described by a [`Schema`] and exposes the
//! row-level operations every record type needs: insert over defaults,
//! partial update, delete by key, single-row get, filtered select and count.
//!
//! The connection lives behind a `std::sync::Mutex`; single-row statements
//! rely on SQLite's own atomicity and nothing here holds the lock across
//! more than one logical operation.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::hooks::{MutationEvent, MutationHook, MutationKind};
use crate::storage::predicate::{Ordering, Predicate};
use crate::storage::schema::{quote_ident, Column, Schema, Value};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

/// Table recording the schema version of every installed table
const VERSIONS_TABLE: &str = "schema_versions";

/// Runtime configuration for a store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Prepended to the schema's table name
    pub table_prefix: String,
    /// How long a statement waits on a locked database
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("reqlog_data/reqlog.db"),
            table_prefix: String::new(),
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl StoreConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    /// Builder method: set table prefix
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}

/// Record store over one SQLite table
pub struct Store<T: Schema> {
    conn: Mutex<Connection>,
    table: String,
    path: PathBuf,
    hooks: RwLock<Vec<Arc<dyn MutationHook>>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Schema> Store<T> {
    /// Open the database and create the table if it is absent
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &config.database_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let store = Self {
            conn: Mutex::new(conn),
            table: format!("{}{}", config.table_prefix, T::TABLE),
            path: config.database_path.clone(),
            hooks: RwLock::new(Vec::new()),
            _record: PhantomData,
        };

        if !store.table_exists()? {
            store.create_table()?;
        }

        Ok(store)
    }

    /// Full (prefixed) table name
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register an observer of committed mutations
    pub fn add_hook(&self, hook: Arc<dyn MutationHook>) {
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        hooks.push(hook);
    }

    /// Check whether the table exists
    pub fn table_exists(&self) -> StorageResult<bool> {
        let conn = self.lock()?;
        table_exists(&conn, &self.table)
    }

    /// Create the table and its indexes, then record the schema version
    pub fn create_table(&self) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let create = |sql: &str| {
            tx.execute(sql, []).map_err(|e| {
                StorageError::Table(format!("failed to create {}: {}", self.table, e))
            })
        };

        create(&T::create_table_sql(&self.table))?;
        for index_sql in T::create_index_sql(&self.table) {
            create(&index_sql)?;
        }
        create(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                table_name TEXT PRIMARY KEY,
                version TEXT NOT NULL
            )",
            VERSIONS_TABLE
        ))?;

        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (table_name, version) VALUES (?1, ?2)",
                VERSIONS_TABLE
            ),
            params![self.table, T::VERSION],
        )?;
        tx.commit()?;

        tracing::info!(table = %self.table, version = T::VERSION, "Created table");
        Ok(())
    }

    /// Schema version recorded when the table was created
    pub fn db_version(&self) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        if !table_exists(&conn, VERSIONS_TABLE)? {
            return Ok(None);
        }

        let version = conn
            .query_row(
                &format!(
                    "SELECT version FROM {} WHERE table_name = ?1",
                    VERSIONS_TABLE
                ),
                params![self.table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    /// Insert a row built from the schema defaults overlaid with `values`.
    ///
    /// Returns the id assigned by SQLite.
    pub fn insert(&self, values: Vec<(&'static str, Value)>, data_type: &str) -> StorageResult<u64> {
        let mut row = T::column_defaults();
        row.retain(|(name, _)| *name != T::PRIMARY_KEY);

        for (name, value) in values {
            let column = lookup::<T>(name)?;
            if name == T::PRIMARY_KEY {
                return Err(StorageError::InvalidArgument(format!(
                    "{} is assigned by storage",
                    name
                )));
            }
            column.validate(&value)?;
            match row.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => row.push((name, value)),
            }
        }

        for (name, value) in &row {
            lookup::<T>(name)?.validate(value)?;
        }

        let columns: Vec<String> = row.iter().map(|(name, _)| quote_ident(name)).collect();
        let placeholders = vec!["?"; row.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            columns.join(", "),
            placeholders
        );

        let id = {
            let conn = self.lock()?;
            conn.execute(&sql, params_from_iter(row.iter().map(|(_, v)| v)))?;
            conn.last_insert_rowid() as u64
        };

        tracing::debug!(table = %self.table, id, data_type, "Inserted row");
        self.notify(MutationKind::Insert, data_type, id);
        Ok(id)
    }

    /// Apply a partial update to row `id`, optionally constrained by `filter`.
    ///
    /// Returns the number of affected rows.
    pub fn update(
        &self,
        id: u64,
        values: Vec<(&'static str, Value)>,
        filter: Option<&Predicate>,
        data_type: &str,
    ) -> StorageResult<usize> {
        if id == 0 {
            return Err(StorageError::InvalidArgument(
                "update requires a non-zero id".to_string(),
            ));
        }
        if values.is_empty() {
            return Ok(0);
        }

        for (name, value) in &values {
            let column = lookup::<T>(name)?;
            if !T::is_mutable(name) {
                return Err(StorageError::ImmutableColumn(name.to_string()));
            }
            column.validate(value)?;
        }

        let mut predicate = self.by_id(id)?;
        if let Some(filter) = filter {
            predicate = predicate.and(filter.clone());
        }

        let assignments: Vec<String> = values
            .iter()
            .map(|(name, _)| format!("{} = ?", quote_ident(name)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_ident(&self.table),
            assignments.join(", "),
            predicate.where_clause()
        );

        let bound = values
            .iter()
            .map(|(_, v)| v)
            .chain(predicate.params().iter());

        let affected = {
            let conn = self.lock()?;
            conn.execute(&sql, params_from_iter(bound))?
        };

        if affected > 0 {
            tracing::debug!(table = %self.table, id, data_type, "Updated row");
            self.notify(MutationKind::Update, data_type, id);
        }
        Ok(affected)
    }

    /// Physically delete row `id`. Returns the number of removed rows.
    pub fn delete(&self, id: u64, data_type: &str) -> StorageResult<usize> {
        if id == 0 {
            return Err(StorageError::InvalidArgument(
                "delete requires a non-zero id".to_string(),
            ));
        }

        let predicate = self.by_id(id)?;
        let sql = format!(
            "DELETE FROM {}{}",
            quote_ident(&self.table),
            predicate.where_clause()
        );

        let removed = {
            let conn = self.lock()?;
            conn.execute(&sql, params_from_iter(predicate.params()))?
        };

        if removed > 0 {
            tracing::debug!(table = %self.table, id, data_type, "Deleted row");
            self.notify(MutationKind::Delete, data_type, id);
        }
        Ok(removed)
    }

    /// Fetch a single row by id
    pub fn get(&self, id: u64) -> StorageResult<Option<T>> {
        if id == 0 {
            return Ok(None);
        }

        let predicate = self.by_id(id)?;
        let sql = format!(
            "SELECT {} FROM {}{}",
            self.column_list(),
            quote_ident(&self.table),
            predicate.where_clause()
        );

        let conn = self.lock()?;
        let record = conn
            .query_row(&sql, params_from_iter(predicate.params()), T::from_row)
            .optional()?;
        Ok(record)
    }

    /// Select the rows matching `predicate`, sorted and paged by `ordering`
    pub fn select(&self, predicate: &Predicate, ordering: &Ordering) -> StorageResult<Vec<T>> {
        lookup::<T>(ordering.column)?;

        let sql = format!(
            "SELECT {} FROM {}{}{}",
            self.column_list(),
            quote_ident(&self.table),
            predicate.where_clause(),
            ordering.to_sql()
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(predicate.params()), T::from_row)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Count the rows matching `predicate`
    pub fn count(&self, predicate: &Predicate) -> StorageResult<u64> {
        let sql = format!(
            "SELECT COUNT({}) FROM {}{}",
            quote_ident(T::PRIMARY_KEY),
            quote_ident(&self.table),
            predicate.where_clause()
        );

        let conn = self.lock()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(predicate.params()), |row| {
            row.get(0)
        })?;
        Ok(count.max(0) as u64)
    }

    fn by_id(&self, id: u64) -> StorageResult<Predicate> {
        let id = i64::try_from(id)
            .map_err(|_| StorageError::InvalidArgument(format!("id out of range: {}", id)))?;
        Ok(Predicate::all().eq(lookup::<T>(T::PRIMARY_KEY)?, Value::Integer(id)))
    }

    fn column_list(&self) -> String {
        T::columns()
            .iter()
            .map(Column::quoted)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn notify(&self, kind: MutationKind, data_type: &str, id: u64) {
        let hooks: Vec<Arc<dyn MutationHook>> = self
            .hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if hooks.is_empty() {
            return;
        }

        let event = MutationEvent {
            kind,
            data_type: data_type.to_string(),
            id,
        };
        for hook in hooks.iter() {
            hook.on_mutation(&event);
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

fn lookup<T: Schema>(name: &str) -> StorageResult<&'static Column> {
    T::column(name).ok_or_else(|| StorageError::UnknownColumn(name.to_string()))
}

fn table_exists(conn: &Connection, table: &str) -> StorageResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
