//! Change tokens
//!
//! A change token is a time-based marker stored per cache group. Writers
//! only ever advance it, so two concurrent bumps commute: readers just ask
//! whether what they cached is older than the current token.

use crate::cache::CacheBackend;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Cache key holding the token of a group
pub const LAST_CHANGED_KEY: &str = "last_changed";

/// Opaque, monotonically advancing marker (microseconds since the Unix epoch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChangeToken(u64);

impl ChangeToken {
    /// Token for the current time
    pub fn now() -> Self {
        Self(Utc::now().timestamp_micros().max(0) as u64)
    }

    /// Smallest token strictly after `self` that is not in the past
    pub fn next(self) -> Self {
        Self::now().max(Self(self.0.saturating_add(1)))
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChangeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChangeToken {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Reads and advances change tokens in a cache backend
#[derive(Clone)]
pub struct ChangeTokenCache {
    backend: Arc<dyn CacheBackend>,
}

impl ChangeTokenCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// The backend tokens are stored in
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Advance the token of `group`. Never fails; a backend write error is logged.
    pub fn bump(&self, group: &str) -> ChangeToken {
        let token = match self.read(group) {
            Some(current) => current.next(),
            None => ChangeToken::now(),
        };

        if let Err(e) = self
            .backend
            .set(LAST_CHANGED_KEY, &token.to_string(), group)
        {
            tracing::warn!(group, error = %e, "Failed to store change token");
        }
        token
    }

    /// Current token of `group`, created on first read
    pub fn get(&self, group: &str) -> ChangeToken {
        match self.read(group) {
            Some(token) => token,
            None => self.bump(group),
        }
    }

    fn read(&self, group: &str) -> Option<ChangeToken> {
        match self.backend.get(LAST_CHANGED_KEY, group) {
            Ok(Some(raw)) => match raw.parse() {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::debug!(group, value = %raw, error = %e, "Ignoring unparseable change token");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(group, error = %e, "Failed to read change token");
                None
            }
        }
    }
}
