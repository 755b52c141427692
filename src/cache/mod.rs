//! Cache backend and change tokens
//!
//! The store never talks to a cache directly; it is handed an
//! `Arc<dyn CacheBackend>` and uses it for two things:
//!
//! - the per-group **change token** (key `last_changed`), advanced on every
//!   successful mutation
//! - optional cached query results keyed by the current token
//!
//! Cache failures never fail the caller. They are logged and the read or
//! write falls through to the database.

mod memory;
mod token;

pub use memory::MemoryCache;
pub use token::{ChangeToken, ChangeTokenCache, LAST_CHANGED_KEY};

use thiserror::Error;

/// Errors reported by a cache backend
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend could not be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Key-value cache with grouped keys
pub trait CacheBackend: Send + Sync {
    /// Read `key` in `group`
    fn get(&self, key: &str, group: &str) -> Result<Option<String>, CacheError>;

    /// Write `key` in `group`, replacing any previous value
    fn set(&self, key: &str, value: &str, group: &str) -> Result<(), CacheError>;
}
