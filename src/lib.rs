//! # Reqlog
//!
//! API request log store - records who called an API, with which key and
//! version, from which address, how long the request took and when, and
//! answers filtered counts and listings over those records.
//!
//! ## Features
//!
//! - **Schema-driven storage**: `Store<T>` over SQLite, validated against a column descriptor
//! - **Safe filtering**: Every filter value is a bound parameter
//! - **Cache coherence**: A `last_changed` token advanced on every successful mutation
//! - **Pluggable cache**: Any `CacheBackend`, with an in-memory implementation included
//!
//! ## Modules
//!
//! - [`storage`]: Schema descriptors and the generic record store
//! - [`logs`]: The API request log table and its caller-facing operations
//! - [`query`]: Filter arguments, predicate building and query execution
//! - [`cache`]: Cache backends and change tokens
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reqlog::{ApiRequestLogs, Config, LogQuery, LogRecordPatch, MemoryCache};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     reqlog::logging::init(&config.logging)?;
//!
//!     let logs = ApiRequestLogs::from_config(&config, Arc::new(MemoryCache::new()))?;
//!
//!     // Record a request
//!     let id = logs.insert(
//!         LogRecordPatch::new()
//!             .user_id(5)
//!             .version("v2")
//!             .ip("203.0.113.9")
//!             .time(0.042),
//!     );
//!     println!("Logged request {:?}", id);
//!
//!     // How many requests did user 5 make?
//!     let total = logs.count(&LogQuery::new().user_id(5))?;
//!     println!("User 5 made {} requests", total);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod logging;
pub mod logs;
pub mod query;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    Column, ColumnType, MutationEvent, MutationHook, MutationKind, Predicate, Schema, SortOrder,
    StorageError, StorageResult, Store, StoreConfig, Value,
};

pub use logs::{ApiRequestLogs, LogRecord, LogRecordPatch, API_REQUEST_LOG_TYPE};

pub use query::{build_filter, LogQuery, QueryEngine, QueryError, QueryResult};

pub use cache::{CacheBackend, CacheError, ChangeToken, ChangeTokenCache, MemoryCache};

pub use config::{CacheConfig, Config, ConfigError, LoggingConfig, StorageConfig};
