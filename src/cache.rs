//! Connection-scoped cache
//!
//! Values computed once per connection (session) and shared by every query
//! that runs on it. Each key has its own `OnceCell`, so concurrent first
//! callers wait on a single computation instead of racing, and a value is
//! only visible once it has been fully computed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

pub struct ConnectionCache<V> {
    entries: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V> Default for ConnectionCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> ConnectionCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell for `key`, created empty on first use
    fn cell(&self, key: &str) -> Arc<OnceCell<V>> {
        // The map is only touched for lookups and inserts; a poisoned lock
        // still holds a consistent map.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Cached value for `key`, if it has been computed
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Return the cached value for `key`, computing it with `compute` on a miss.
    ///
    /// Concurrent callers for the same key share one computation. If
    /// `compute` fails nothing is stored and the next caller tries again.
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.cell(key);
        cell.get_or_try_init(compute).await.cloned()
    }

    /// Number of keys holding a computed value
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn computes_once_per_key() {
        let cache: ConnectionCache<Vec<String>> = ConnectionCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_compute("Organizations", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(vec!["1".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["1".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached() {
        let cache: ConnectionCache<u32> = ConnectionCache::new();

        let first = cache
            .get_or_try_compute("k", || async { Err::<u32, _>("boom") })
            .await;
        assert_eq!(first, Err("boom"));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());

        let second = cache
            .get_or_try_compute("k", || async { Ok::<_, &str>(7) })
            .await;
        assert_eq!(second, Ok(7));
        assert_eq!(cache.get("k"), Some(7));
    }

    #[tokio::test]
    async fn concurrent_first_access_shares_one_computation() {
        let cache: Arc<ConnectionCache<u32>> = Arc::new(ConnectionCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_compute("k", || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, ()>(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocking_callers_see_cached_value() {
        let cache: ConnectionCache<&'static str> = ConnectionCache::new();
        let value = tokio_test::block_on(
            cache.get_or_try_compute("k", || async { Ok::<_, ()>("v") }),
        );
        assert_eq!(value, Ok("v"));
        assert_eq!(cache.get("k"), Some("v"));
    }
}
