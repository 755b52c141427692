//! API request logs
//!
//! [`ApiRequestLogs`] is the caller-facing contract of the crate. It pairs the
//! log table's [`Store`] with a change token in an injected cache backend:
//!
//! ```text
//! insert / update / delete ──► Store<LogRecord> ──(success)──► bump last_changed
//! get_logs / count ──────────► QueryEngine ──► Store<LogRecord>
//!                                   └── cached results keyed by last_changed
//! ```
//!
//! Mutations never return errors. Storage and validation failures are logged
//! and reported as `None`/`false`; only a missing table that cannot be created
//! fails [`ApiRequestLogs::open`].

mod record;

pub use record::{LogRecord, LogRecordPatch, API_REQUEST_LOG_TYPE};

use crate::cache::{CacheBackend, ChangeToken, ChangeTokenCache};
use crate::config::{CacheConfig, Config};
use crate::query::{build_filter, LogQuery, QueryEngine, QueryResult};
use crate::storage::{MutationHook, StorageResult, Store, StoreConfig};
use std::sync::Arc;

/// The API request log store
pub struct ApiRequestLogs {
    store: Arc<Store<LogRecord>>,
    tokens: ChangeTokenCache,
    queries: QueryEngine,
    cache_group: String,
}

impl ApiRequestLogs {
    /// Open the log table described by `config`, creating it if absent
    pub fn from_config(config: &Config, cache: Arc<dyn CacheBackend>) -> StorageResult<Self> {
        Self::open(&config.storage.store_config(), &config.cache, cache)
    }

    /// Open the log table, creating it if absent
    pub fn open(
        store_config: &StoreConfig,
        cache_config: &CacheConfig,
        cache: Arc<dyn CacheBackend>,
    ) -> StorageResult<Self> {
        let store = Arc::new(Store::open(store_config)?);
        let tokens = ChangeTokenCache::new(cache);
        let queries = QueryEngine::new(Arc::clone(&store), tokens.clone(), &cache_config.group)
            .with_result_cache(cache_config.cache_queries);

        Ok(Self {
            store,
            tokens,
            queries,
            cache_group: cache_config.group.clone(),
        })
    }

    /// Insert a log record. Returns the new id, or `None` if the write failed.
    ///
    /// The record is always written under [`API_REQUEST_LOG_TYPE`], whatever
    /// type tag the caller supplied.
    pub fn insert(&self, fields: LogRecordPatch) -> Option<u64> {
        if let Some(requested) = fields.data_type.as_deref() {
            if requested != API_REQUEST_LOG_TYPE {
                tracing::debug!(requested, "Overriding type tag on API request log insert");
            }
        }

        let values = match fields.values() {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected API request log insert");
                return None;
            }
        };

        match self.store.insert(values, API_REQUEST_LOG_TYPE) {
            Ok(id) => {
                self.set_last_changed();
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to insert API request log");
                None
            }
        }
    }

    /// Update log `id`, optionally only if it also matches `filter`.
    ///
    /// Returns false for a zero/absent id, a rejected field, or when no row changed.
    pub fn update(
        &self,
        id: impl Into<Option<u64>>,
        fields: LogRecordPatch,
        filter: Option<&LogQuery>,
    ) -> bool {
        let id = match id.into() {
            Some(id) if id > 0 => id,
            _ => return false,
        };

        let values = match fields.values() {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(id, error = %e, "Rejected API request log update");
                return false;
            }
        };

        let predicate = match filter.map(build_filter).transpose() {
            Ok(predicate) => predicate,
            Err(e) => {
                tracing::warn!(id, error = %e, "Rejected API request log update filter");
                return false;
            }
        };

        match self
            .store
            .update(id, values, predicate.as_ref(), API_REQUEST_LOG_TYPE)
        {
            Ok(0) => false,
            Ok(_) => {
                self.set_last_changed();
                true
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Failed to update API request log");
                false
            }
        }
    }

    /// Delete log `id`. A zero/absent id is refused without touching storage.
    pub fn delete(&self, id: impl Into<Option<u64>>) -> bool {
        let id = match id.into() {
            Some(id) if id > 0 => id,
            _ => return false,
        };

        match self.store.delete(id, API_REQUEST_LOG_TYPE) {
            Ok(0) => false,
            Ok(_) => {
                self.set_last_changed();
                true
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Failed to delete API request log");
                false
            }
        }
    }

    /// Fetch a single log by id
    pub fn get(&self, id: u64) -> Option<LogRecord> {
        match self.store.get(id) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(id, error = %e, "Failed to read API request log");
                None
            }
        }
    }

    /// Logs matching `args`, ordered and paged as requested
    pub fn get_logs(&self, args: &LogQuery) -> QueryResult<Vec<LogRecord>> {
        self.queries.get_logs(args)
    }

    /// Number of logs matching the filters in `args`
    pub fn count(&self, args: &LogQuery) -> QueryResult<u64> {
        self.queries.count(args)
    }

    /// Current change token of the log cache group
    pub fn last_changed(&self) -> ChangeToken {
        self.tokens.get(&self.cache_group)
    }

    /// Advance the change token of the log cache group
    pub fn set_last_changed(&self) -> ChangeToken {
        self.tokens.bump(&self.cache_group)
    }

    /// Register an observer of committed mutations
    pub fn add_hook(&self, hook: Arc<dyn MutationHook>) {
        self.store.add_hook(hook);
    }

    /// Full table name including prefix
    pub fn table_name(&self) -> &str {
        self.store.table_name()
    }

    /// Schema version recorded when the table was created
    pub fn db_version(&self) -> StorageResult<Option<String>> {
        self.store.db_version()
    }

    pub fn cache_group(&self) -> &str {
        &self.cache_group
    }
}
