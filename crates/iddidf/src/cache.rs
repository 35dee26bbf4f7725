//! Cache of parsed dictionaries keyed by `version__build`.
//!
//! The key ignores the dictionary's content and path: two
//! different dictionaries that declare the same `IDD_Version` and
//! `IDD_BUILD` collide, and the second parse returns the schema built by the
//! first. A collision with differing source text is reported through a
//! `tracing` warning but is otherwise honoured.
//!
//! The map is guarded by a mutex, so one cache may be shared across threads.
//! Callers that want every parse to be fresh pass no cache at all.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::model::Schema;

lazy_static! {
    static ref GLOBAL_CACHE: SchemaCache = SchemaCache::new();
}

/// A shared map from cache key to a previously built schema.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: Mutex<FxHashMap<String, Arc<Schema>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache, alive for the life of the process.
    pub fn global() -> &'static SchemaCache {
        &GLOBAL_CACHE
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<String, Arc<Schema>>> {
        // Every update is a single map call, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the schema cached under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<Schema>> {
        let hit = self.lock().get(key).cloned();
        debug!(key, hit = hit.is_some(), "schema cache lookup");
        hit
    }

    /// Stores a schema under its own cache key, replacing any previous entry.
    pub fn insert(&self, schema: Arc<Schema>) {
        let key = schema.cache_key();
        debug!(key = %key, "storing schema in cache");
        self.lock().insert(key, schema);
    }

    /// Returns true if a schema is cached under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every cached schema.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VersionNumber;

    fn schema(version: &str, build: &str) -> Arc<Schema> {
        Arc::new(Schema {
            descriptor: "/test".to_string(),
            version: version.to_string(),
            version_number: VersionNumber::parse(version).unwrap_or_default(),
            build: build.to_string(),
            groups: vec![],
            single_line_types: vec![],
            source_digest: [0u8; 32],
        })
    }

    #[test]
    fn test_insert_and_get() {
        let cache = SchemaCache::new();
        assert!(cache.is_empty());
        cache.insert(schema("1.2.0", "abc"));
        assert!(cache.contains("1.2.0__abc"));
        assert_eq!(cache.get("1.2.0__abc").unwrap().build, "abc");
        assert!(cache.get("1.2.0__abd").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = SchemaCache::new();
        cache.insert(schema("1.2.0", "abc"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(SchemaCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.insert(schema("1.0.0", &format!("b{i}"))))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}
