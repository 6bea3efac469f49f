//! Bounded phrase -> token graph cache.
//!
//! Analyzing a phrase is the one call that leaves the process, so graphs
//! are cached per (language, phrase). Lookups and inserts both update the
//! recency order and are serialized behind a mutex; a race between two
//! misses only costs a duplicate analyzer call.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::graph::node::TokenGraph;

/// Default number of cached graphs.
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Thread-safe LRU of analyzed phrases. A zero limit disables caching.
pub struct TokensCache {
    limit: usize,
    graphs: Option<Mutex<LruCache<CacheKey, Arc<TokenGraph>>>>,
}

impl std::fmt::Debug for TokensCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokensCache")
            .field("limit", &self.limit)
            .field("len", &self.len())
            .finish()
    }
}

impl Default for TokensCache {
    fn default() -> Self {
        TokensCache::new(DEFAULT_CACHE_SIZE)
    }
}

/// `(language, phrase)`.
type CacheKey = (String, String);

fn key(phrase: &str, language: &str) -> CacheKey {
    (language.to_string(), phrase.to_string())
}

impl TokensCache {
    pub fn new(limit: usize) -> Self {
        TokensCache {
            limit,
            graphs: NonZeroUsize::new(limit).map(|capacity| Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The cached graph of `phrase`, marking it most recently used.
    pub fn get(&self, phrase: &str, language: &str) -> Option<Arc<TokenGraph>> {
        self.graphs.as_ref()?.lock().get(&key(phrase, language)).cloned()
    }

    pub fn has(&self, phrase: &str, language: &str) -> bool {
        self.graphs
            .as_ref()
            .is_some_and(|graphs| graphs.lock().contains(&key(phrase, language)))
    }

    /// Insert a graph, evicting the least recently used one when full.
    pub fn set(&self, phrase: &str, language: &str, graph: Arc<TokenGraph>) {
        let Some(graphs) = self.graphs.as_ref() else {
            return;
        };
        let key = key(phrase, language);
        if let Some((evicted, _)) = graphs.lock().push(key.clone(), graph) {
            if evicted != key {
                log::debug!("Evicted [{}:{}] from tokens cache.", evicted.0, evicted.1);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.graphs.as_ref().map_or(0, |graphs| graphs.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(graphs) = self.graphs.as_ref() {
            graphs.lock().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn graph(phrase: &str) -> Arc<TokenGraph> {
        Arc::new(TokenGraph::empty(phrase))
    }

    #[test]
    fn test_get_and_set() {
        let cache = TokensCache::new(2);
        assert!(cache.get("congress", "en").is_none());

        cache.set("congress", "en", graph("congress"));
        assert!(cache.has("congress", "en"));
        assert!(!cache.has("congress", "he"));
        assert_eq!(cache.get("congress", "en").unwrap().phrase(), "congress");
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = TokensCache::new(2);
        cache.set("a", "en", graph("a"));
        cache.set("b", "en", graph("b"));
        cache.get("a", "en");
        cache.set("c", "en", graph("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.has("a", "en"));
        assert!(!cache.has("b", "en"));
        assert!(cache.has("c", "en"));
    }

    #[test]
    fn test_language_and_phrase_stay_apart() {
        let cache = TokensCache::new(4);
        cache.set("b:c", "a", graph("b:c"));
        cache.set("c", "a:b", graph("c"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b:c", "a").unwrap().phrase(), "b:c");
        assert_eq!(cache.get("c", "a:b").unwrap().phrase(), "c");
        assert!(!cache.has("c", "a"));
    }

    #[test]
    fn test_zero_limit_disables() {
        let cache = TokensCache::new(0);
        cache.set("a", "en", graph("a"));
        assert!(cache.is_empty());
        assert!(cache.get("a", "en").is_none());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(TokensCache::new(16));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        let phrase = format!("{t}-{i}");
                        cache.set(&phrase, "en", graph(&phrase));
                        cache.get(&phrase, "en");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
    }
}
