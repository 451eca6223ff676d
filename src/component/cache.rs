use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Process-local cache of long-lived connections, keyed by a durable
/// connection identifier (for example a connection string).
///
/// Concurrent first use may establish more than one connection; the first
/// one stored wins and later ones are dropped. Entries are never evicted.
#[derive(Debug)]
pub struct ConnectionCache<T: Clone> {
    entries: DashMap<String, T>,
}

impl<T: Clone> Default for ConnectionCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: Clone> ConnectionCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Cached connection for `key`, establishing one with `connect` on miss.
    ///
    /// `connect` runs without any lock held. A failed attempt caches nothing.
    pub fn get_or_try_connect<E, F>(&self, key: &str, connect: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }
        let fresh = connect()?;
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(winner) => {
                debug!(key = %key, "Connection race lost, using cached connection");
                Ok(winner.get().clone())
            }
            Entry::Vacant(slot) => Ok(slot.insert(fresh).value().clone()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_connects_once_per_key() {
        let cache = ConnectionCache::<Arc<String>>::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let conn: Result<_, ()> = cache.get_or_try_connect("db://a", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new("conn-a".to_string()))
            });
            assert_eq!(conn.unwrap().as_str(), "conn-a");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let cache = ConnectionCache::<u32>::new();
        let err: Result<u32, &str> = cache.get_or_try_connect("k", || Err("refused"));
        assert_eq!(err, Err("refused"));
        assert!(cache.is_empty());
        let ok: Result<u32, &str> = cache.get_or_try_connect("k", || Ok(7));
        assert_eq!(ok, Ok(7));
    }

    #[test]
    fn test_first_insert_wins_across_threads() {
        let cache = Arc::new(ConnectionCache::<usize>::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .get_or_try_connect::<(), _>("shared", || Ok(i))
                        .unwrap()
                })
            })
            .collect();
        let seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(seen.iter().all(|v| *v == seen[0]));
    }
}
