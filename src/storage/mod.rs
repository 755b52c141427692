//! Reqlog Storage Layer
//!
//! This module provides the generic record store the log table is built on:
//!
//! - **schema**: Column descriptors, semantic types and default values
//! - **predicate**: Parametrized WHERE clauses and ordering
//! - **store**: `Store<T>` over one SQLite table
//! - **hooks**: Observers of committed mutations
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   field values → Schema defaults + validation → INSERT/UPDATE/DELETE → hooks
//!
//! Read Path:
//!   Predicate + Ordering → SELECT/COUNT → Schema::from_row → records
//! ```

pub mod error;
pub mod hooks;
pub mod predicate;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use hooks::{MutationEvent, MutationHook, MutationKind};
pub use predicate::{Comparison, Ordering, Predicate, SortOrder};
pub use schema::{timestamp_from_micros, timestamp_to_micros, Column, ColumnType, Schema, Value};
pub use store::{Store, StoreConfig};
