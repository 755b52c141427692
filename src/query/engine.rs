//! Query Engine
//!
//! Executes [`LogQuery`] reads against the log store. When result caching is
//! enabled, each distinct query owns one cache entry holding its result and
//! the change token it was computed under. An entry whose token differs from
//! the group's current token is stale: it is recomputed and overwritten in
//! place, so the number of entries never grows with the number of writes.

use crate::cache::ChangeTokenCache;
use crate::logs::LogRecord;
use crate::query::args::LogQuery;
use crate::query::error::QueryResult;
use crate::query::filter::{build_filter, build_ordering};
use crate::storage::Store;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cached query result tagged with the token it was computed under
#[derive(Serialize, Deserialize)]
struct CachedResult<R> {
    token: u64,
    value: R,
}

/// Executes filtered reads over the log table
pub struct QueryEngine {
    store: Arc<Store<LogRecord>>,
    tokens: ChangeTokenCache,
    group: String,
    cache_results: bool,
}

impl QueryEngine {
    pub fn new(
        store: Arc<Store<LogRecord>>,
        tokens: ChangeTokenCache,
        group: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tokens,
            group: group.into(),
            cache_results: false,
        }
    }

    /// Builder method: memoize results keyed by the change token
    pub fn with_result_cache(mut self, enabled: bool) -> Self {
        self.cache_results = enabled;
        self
    }

    /// Records matching `args`, ordered and paged as requested
    pub fn get_logs(&self, args: &LogQuery) -> QueryResult<Vec<LogRecord>> {
        let predicate = build_filter(args)?;
        let ordering = build_ordering(args)?;

        self.cached("get_logs", args, || {
            Ok(self.store.select(&predicate, &ordering)?)
        })
    }

    /// Number of records matching the filters of `args`; pagination is ignored
    pub fn count(&self, args: &LogQuery) -> QueryResult<u64> {
        let predicate = build_filter(args)?;

        self.cached("count", &args.filters_only(), || {
            Ok(self.store.count(&predicate)?)
        })
    }

    fn cached<R, F>(&self, op: &str, args: &LogQuery, load: F) -> QueryResult<R>
    where
        R: Serialize + DeserializeOwned,
        F: FnOnce() -> QueryResult<R>,
    {
        if !self.cache_results {
            return load();
        }

        let key = match serde_json::to_string(args) {
            Ok(json) => format!("{}:{}", op, json),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode query cache key");
                return load();
            }
        };
        let token = self.tokens.get(&self.group).as_micros();
        let backend = self.tokens.backend();

        match backend.get(&key, &self.group) {
            Ok(Some(raw)) => match serde_json::from_str::<CachedResult<R>>(&raw) {
                Ok(entry) if entry.token == token => {
                    tracing::debug!(op, group = %self.group, "Query cache hit");
                    return Ok(entry.value);
                }
                Ok(_) => tracing::debug!(op, group = %self.group, "Query cache entry is stale"),
                Err(e) => tracing::debug!(op, error = %e, "Discarding undecodable cache entry"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(op, error = %e, "Query cache read failed"),
        }

        let value = load()?;

        let entry = CachedResult {
            token,
            value: &value,
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = backend.set(&key, &raw, &self.group) {
                    tracing::warn!(op, error = %e, "Query cache write failed");
                }
            }
            Err(e) => tracing::warn!(op, error = %e, "Failed to encode query result"),
        }

        Ok(value)
    }
}
