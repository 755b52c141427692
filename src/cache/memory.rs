//! In-process cache backend

use crate::cache::{CacheBackend, CacheError};
use std::collections::HashMap;
use std::sync::RwLock;

/// HashMap-backed cache: group → key → value
#[derive(Debug, Default)]
pub struct MemoryCache {
    groups: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys across all groups
    pub fn len(&self) -> usize {
        self.groups
            .read()
            .map(|groups| groups.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every key in a group (what an eviction would do)
    pub fn flush_group(&self, group: &str) {
        if let Ok(mut groups) = self.groups.write() {
            groups.remove(group);
        }
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str, group: &str) -> Result<Option<String>, CacheError> {
        let groups = self
            .groups
            .read()
            .map_err(|e| CacheError::Lock(e.to_string()))?;

        Ok(groups.get(group).and_then(|keys| keys.get(key)).cloned())
    }

    fn set(&self, key: &str, value: &str, group: &str) -> Result<(), CacheError> {
        let mut groups = self
            .groups
            .write()
            .map_err(|e| CacheError::Lock(e.to_string()))?;

        groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_are_separate() {
        let cache = MemoryCache::new();
        cache.set("last_changed", "1", "a").unwrap();
        cache.set("last_changed", "2", "b").unwrap();

        assert_eq!(cache.get("last_changed", "a").unwrap().as_deref(), Some("1"));
        assert_eq!(cache.get("last_changed", "b").unwrap().as_deref(), Some("2"));
        assert_eq!(cache.get("missing", "a").unwrap(), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_flush_group() {
        let cache = MemoryCache::new();
        cache.set("k", "v", "a").unwrap();
        cache.set("k", "v", "b").unwrap();

        cache.flush_group("a");

        assert_eq!(cache.get("k", "a").unwrap(), None);
        assert_eq!(cache.get("k", "b").unwrap().as_deref(), Some("v"));
    }
}
