use std::collections::{HashMap, VecDeque};

use crate::renderer::snapshot::Snapshot;
use crate::scene::entity::EntityKey;

/// Default number of snapshots an input keeps per draw-graph build.
pub const DEFAULT_SNAPSHOT_CACHE_CAPACITY: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SnapshotKey {
    pub(crate) entity: EntityKey,
    pub(crate) generation: u64,
}

/// Hit/miss counters of a snapshot cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to resolve.
    pub misses: u64,
    /// Snapshots currently held.
    pub entries: usize,
}

/// Small LRU of resolved snapshots keyed by entity state and upstream generation.
#[derive(Debug)]
pub(crate) struct SnapshotCache {
    entries: HashMap<SnapshotKey, Snapshot>,
    lru: VecDeque<SnapshotKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_CACHE_CAPACITY)
    }
}

impl SnapshotCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: VecDeque::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub(crate) fn get(&mut self, key: &SnapshotKey) -> Option<Snapshot> {
        match self.entries.get(key).cloned() {
            Some(snapshot) => {
                self.hits = self.hits.saturating_add(1);
                self.touch(*key);
                Some(snapshot)
            }
            None => {
                self.misses = self.misses.saturating_add(1);
                None
            }
        }
    }

    pub(crate) fn insert(&mut self, key: SnapshotKey, snapshot: Snapshot) {
        if self.capacity == 0 {
            return;
        }
        self.entries.insert(key, snapshot);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    fn touch(&mut self, key: SnapshotKey) {
        if let Some(pos) = self.lru.iter().position(|k| *k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}
