//! Reqlog Query Engine
//!
//! Answers filtered reads over the API request log:
//!
//! - **args**: `LogQuery` filter, ordering and pagination arguments
//! - **filter**: Pure translation of arguments into a storage predicate
//! - **engine**: Execution of `get_logs` and `count`, with optional result caching
//!
//! # Example
//!
//! ```rust,ignore
//! use reqlog::query::LogQuery;
//!
//! // Requests made by user 5 with the public key during January
//! let query = LogQuery::new()
//!     .user_id(5)
//!     .key("public")
//!     .between(jan_1, jan_31);
//!
//! let total = logs.count(&query)?;
//! let page = logs.get_logs(&query.number(50))?;
//! ```

mod args;
mod engine;
mod error;
mod filter;

pub use args::{LogQuery, DEFAULT_NUMBER};
pub use engine::QueryEngine;
pub use error::{QueryError, QueryResult};
pub use filter::{build_filter, build_ordering};
