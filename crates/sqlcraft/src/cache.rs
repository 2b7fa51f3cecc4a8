//! Bounded LRU cache of assembled SQL text.
//!
//! Statements whose shape does not depend on their values can be assembled
//! once and looked up by a caller-chosen key afterwards:
//!
//! ```ignore
//! let cache = QueryCache::new(64);
//! let sql = cache.get_or_try_insert_with("user_by_id", || {
//!     select().from("users").where_("id", "=", 0).to_sql()
//! })?;
//! ```

use crate::error::SqlResult;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct QueryCache {
    inner: Mutex<QueryCacheInner>,
}

#[derive(Debug)]
struct QueryCacheInner {
    capacity: usize,
    map: HashMap<String, Arc<str>>,
    order: VecDeque<String>,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` entries. Zero disables storage.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueryCacheInner {
                capacity,
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueryCacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        let mut inner = self.lock();
        let Some(sql) = inner.map.get(key).cloned() else {
            trace_probe(key, false);
            return None;
        };
        inner.touch(key);
        trace_probe(key, true);
        Some(sql)
    }

    /// Store `sql` under `key`, replacing any previous entry, and return it.
    pub fn insert(&self, key: impl Into<String>, sql: impl Into<Arc<str>>) -> Arc<str> {
        let key = key.into();
        let sql = sql.into();
        let mut inner = self.lock();
        if inner.map.insert(key.clone(), Arc::clone(&sql)).is_some() {
            inner.touch(&key);
        } else {
            inner.order.push_back(key);
        }
        inner.evict_if_needed();
        sql
    }

    pub fn remove(&self, key: &str) -> Option<Arc<str>> {
        let mut inner = self.lock();
        let removed = inner.map.remove(key);
        if removed.is_some() {
            inner.remove_from_order(key);
        }
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().map.contains_key(key)
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached SQL for `key`, assembling and storing it on a miss.
    ///
    /// `f` runs without the lock held; errors are returned and nothing is stored.
    pub fn get_or_try_insert_with<F>(&self, key: &str, f: F) -> SqlResult<Arc<str>>
    where
        F: FnOnce() -> SqlResult<String>,
    {
        if let Some(sql) = self.get(key) {
            return Ok(sql);
        }
        let sql = f()?;
        let mut inner = self.lock();
        // another thread may have filled the entry meanwhile
        if let Some(existing) = inner.map.get(key).cloned() {
            inner.touch(key);
            return Ok(existing);
        }
        let sql: Arc<str> = sql.into();
        inner.map.insert(key.to_string(), Arc::clone(&sql));
        inner.order.push_back(key.to_string());
        inner.evict_if_needed();
        Ok(sql)
    }
}

impl QueryCacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn remove_from_order(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k.as_str() == key) {
            let _ = self.order.remove(pos);
        }
    }

    fn evict_if_needed(&mut self) {
        if self.capacity == 0 {
            self.map.clear();
            self.order.clear();
            return;
        }

        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            let _ = self.map.remove(&oldest);
        }
    }
}

#[cfg(feature = "tracing")]
fn trace_probe(key: &str, hit: bool) {
    tracing::trace!(target: "sqlcraft.cache", key, hit, "query cache probe");
}

#[cfg(not(feature = "tracing"))]
fn trace_probe(_key: &str, _hit: bool) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlError;

    #[test]
    fn lru_evicts_oldest() {
        let cache = QueryCache::new(2);
        cache.insert("a", "SELECT 1");
        cache.insert("b", "SELECT 2");
        assert!(cache.get("a").is_some());
        cache.insert("c", "SELECT 3");
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_replaces_existing() {
        let cache = QueryCache::new(4);
        cache.insert("a", "SELECT 1");
        cache.insert("a", "SELECT 2");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").as_deref(), Some("SELECT 2"));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = QueryCache::new(0);
        let sql = cache.insert("a", "SELECT 1");
        assert_eq!(&*sql, "SELECT 1");
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let cache = QueryCache::new(4);
        cache.insert("a", "SELECT 1");
        cache.insert("b", "SELECT 2");
        assert_eq!(cache.remove("a").as_deref(), Some("SELECT 1"));
        assert!(cache.remove("a").is_none());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn get_or_try_insert_with_runs_once() {
        let cache = QueryCache::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            let sql = cache
                .get_or_try_insert_with("k", || {
                    calls += 1;
                    Ok("SELECT 1".to_string())
                })
                .unwrap();
            assert_eq!(&*sql, "SELECT 1");
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn get_or_try_insert_with_propagates_errors() {
        let cache = QueryCache::new(4);
        let err = cache
            .get_or_try_insert_with("k", || Err(SqlError::assembly("boom")))
            .unwrap_err();
        assert!(err.is_assembly());
        assert!(!cache.contains("k"));
    }
}
