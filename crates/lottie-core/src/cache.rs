//! Host-owned cache of parsed compositions.
//!
//! Strong entries are bounded by an LRU; weak entries only remember
//! compositions that are still alive elsewhere and never keep one alive.

use crate::composition::Composition;
use crate::config::ParseConfig;
use crate::error::ParseError;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, Weak};

const DEFAULT_CAPACITY: usize = 16;

pub struct CompositionCache {
    strong: Mutex<LruCache<String, Arc<Composition>>>,
    weak: Mutex<HashMap<String, Weak<Composition>>>,
}

impl Default for CompositionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for CompositionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionCache")
            .field("strong", &self.strong.lock().map(|c| c.len()).unwrap_or(0))
            .finish_non_exhaustive()
    }
}

impl CompositionCache {
    /// `capacity` strong entries; zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            strong: Mutex::new(LruCache::new(capacity)),
            weak: Mutex::new(HashMap::new()),
        }
    }

    /// Strong hit first (refreshing its recency), then a live weak entry.
    pub fn get(&self, key: &str) -> Option<Arc<Composition>> {
        if let Some(hit) = self.strong.lock().ok()?.get(key).cloned() {
            return Some(hit);
        }
        let mut weak = self.weak.lock().ok()?;
        match weak.get(key).map(Weak::upgrade) {
            Some(Some(hit)) => Some(hit),
            Some(None) => {
                weak.remove(key);
                None
            }
            None => None,
        }
    }

    /// Keeps `composition` alive until it falls out of the LRU.
    pub fn insert(&self, key: impl Into<String>, composition: Arc<Composition>) {
        let key = key.into();
        if let Ok(mut weak) = self.weak.lock() {
            prune(&mut weak);
            weak.insert(key.clone(), Arc::downgrade(&composition));
        }
        if let Ok(mut strong) = self.strong.lock() {
            if let Some((evicted, _)) = strong.push(key, composition) {
                tracing::trace!(key = %evicted, "composition evicted from strong cache");
            }
        }
    }

    /// Remembers `composition` only while something else holds it.
    pub fn insert_weak(&self, key: impl Into<String>, composition: &Arc<Composition>) {
        if let Ok(mut weak) = self.weak.lock() {
            prune(&mut weak);
            weak.insert(key.into(), Arc::downgrade(composition));
        }
    }

    /// Returns the cached composition or parses `json` and caches the result.
    /// Parse failures are not cached.
    pub fn get_or_parse(&self, key: &str, json: &str, config: &ParseConfig) -> Result<Arc<Composition>, ParseError> {
        if let Some(hit) = self.get(key) {
            tracing::debug!(key, "composition cache hit");
            return Ok(hit);
        }
        let model = serde_json::from_str(json)?;
        let composition = Arc::new(Composition::from_model(model, config)?);
        self.insert(key, composition.clone());
        Ok(composition)
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut strong) = self.strong.lock() {
            strong.pop(key);
        }
        if let Ok(mut weak) = self.weak.lock() {
            weak.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut strong) = self.strong.lock() {
            strong.clear();
        }
        if let Ok(mut weak) = self.weak.lock() {
            weak.clear();
        }
    }

    /// Strong entries currently held.
    pub fn len(&self) -> usize {
        self.strong.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn prune(weak: &mut HashMap<String, Weak<Composition>>) {
    weak.retain(|_, w| w.strong_count() > 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"fr": 30, "ip": 0, "op": 30, "w": 10, "h": 10, "layers": []}"#;

    #[test]
    fn parses_once_and_shares() {
        let cache = CompositionCache::new(2);
        let a = cache.get_or_parse("a", DOC, &ParseConfig::default()).unwrap();
        let b = cache.get_or_parse("a", "not json", &ParseConfig::default()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn evicted_entries_survive_weakly_while_in_use() {
        let cache = CompositionCache::new(1);
        let a = cache.get_or_parse("a", DOC, &ParseConfig::default()).unwrap();
        cache.get_or_parse("b", DOC, &ParseConfig::default()).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_some_and(|hit| Arc::ptr_eq(&hit, &a)));
        drop(a);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn weak_entries_do_not_keep_compositions_alive() {
        let cache = CompositionCache::default();
        let comp = Arc::new(Composition::from_json(DOC).unwrap());
        cache.insert_weak("w", &comp);
        assert!(cache.get("w").is_some());
        drop(comp);
        assert!(cache.get("w").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn parse_errors_are_not_cached() {
        let cache = CompositionCache::default();
        assert!(cache.get_or_parse("bad", "{", &ParseConfig::default()).is_err());
        assert!(cache.get("bad").is_none());
    }

    #[test]
    fn dropped_weak_entries_are_pruned_on_insert() {
        let cache = CompositionCache::new(1);
        for n in 0..8 {
            let comp = cache.get_or_parse(&format!("k{n}"), DOC, &ParseConfig::default()).unwrap();
            cache.insert_weak(format!("w{n}"), &comp);
        }
        // The strong survivor and its alias.
        assert_eq!(cache.weak.lock().unwrap().len(), 2);
        assert!(cache.get("k7").is_some());
        assert!(cache.get("k0").is_none());
    }
}
