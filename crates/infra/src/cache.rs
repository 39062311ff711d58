//! Read-through cache of resolved matrix decisions.
//!
//! Entries are never patched: any matrix write invalidates the whole cache.
//! Readers fill it with [`DecisionCache::fill`], which drops the value when an
//! invalidation happened after the reader took its [`Generation`] token, so a
//! decision read before a write can't outlive it.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use gestor_core::{LevelId, ModuleId};

/// Snapshot of the invalidation counter taken before a store read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub entries: usize,
}

#[derive(Debug)]
pub struct DecisionCache {
    enabled: bool,
    entries: RwLock<HashMap<(LevelId, ModuleId), bool>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DecisionCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, level_id: LevelId, module_id: ModuleId) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        let hit = self
            .entries
            .read()
            .ok()
            .and_then(|m| m.get(&(level_id, module_id)).copied());
        let counter = if hit.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    /// Store a decision read under `seen`; ignored if the cache was
    /// invalidated since.
    pub fn fill(&self, level_id: LevelId, module_id: ModuleId, granted: bool, seen: Generation) {
        if !self.enabled {
            return;
        }
        if let Ok(mut map) = self.entries.write() {
            if self.generation.load(Ordering::SeqCst) == seen.0 {
                map.insert((level_id, module_id), granted);
            }
        }
    }

    pub fn invalidate(&self) {
        // Bump under the write lock so a concurrent fill sees either the old
        // map and old generation, or the cleared map and new generation.
        match self.entries.write() {
            Ok(mut map) => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                map.clear();
            }
            Err(poisoned) => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                poisoned.into_inner().clear();
            }
        }
        tracing::debug!("matrix decision cache invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.generation.load(Ordering::SeqCst),
            entries: self.entries.read().map(|m| m.len()).unwrap_or(0),
        }
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_then_hit() {
        let cache = DecisionCache::default();
        let (l, m) = (LevelId::new(), ModuleId::new());

        assert_eq!(cache.get(l, m), None);
        cache.fill(l, m, true, cache.generation());
        assert_eq!(cache.get(l, m), Some(true));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn invalidate_clears_everything() {
        let cache = DecisionCache::default();
        let (l, m) = (LevelId::new(), ModuleId::new());
        cache.fill(l, m, false, cache.generation());

        cache.invalidate();
        assert_eq!(cache.get(l, m), None);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn stale_fill_is_dropped() {
        let cache = DecisionCache::default();
        let (l, m) = (LevelId::new(), ModuleId::new());

        let seen = cache.generation();
        cache.invalidate();
        cache.fill(l, m, true, seen);
        assert_eq!(cache.get(l, m), None);
    }

    #[test]
    fn disabled_cache_never_stores() {
        let cache = DecisionCache::disabled();
        let (l, m) = (LevelId::new(), ModuleId::new());
        cache.fill(l, m, true, cache.generation());
        assert_eq!(cache.get(l, m), None);
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
