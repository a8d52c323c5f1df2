use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::model::SearchQuery;

/// In-memory TTL cache for search results, keyed by the full query so that
/// two searches differing in any parameter never share an entry. Expired
/// entries are dropped lazily on lookup; nothing survives a restart.
pub struct ResultCache<V> {
    entries: RwLock<HashMap<SearchQuery, (Instant, V)>>,
    ttl: Duration,
    enabled: bool,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            enabled,
        }
    }

    pub fn from_config(cfg: &common::CacheConfig) -> Self {
        Self::new(Duration::from_secs(cfg.ttl_seconds()), cfg.enabled())
    }

    pub async fn get(&self, key: &SearchQuery) -> Option<V> {
        if !self.enabled {
            return None;
        }

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                    debug!(topic = %key.topic, "cache hit");
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but is stale; evict it under the write lock.
        let mut entries = self.entries.write().await;
        if let Some((stored_at, _)) = entries.get(key) {
            if stored_at.elapsed() >= self.ttl {
                entries.remove(key);
                debug!(topic = %key.topic, "cache entry expired");
            }
        }
        None
    }

    pub async fn put(&self, key: SearchQuery, value: V) {
        if !self.enabled {
            return;
        }
        let mut entries = self.entries.write().await;
        entries.insert(key, (Instant::now(), value));
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
