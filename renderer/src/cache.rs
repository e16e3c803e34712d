// vexel/renderer/src/cache.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The layer cache: a byte-budgeted, strictly-LRU pixmap cache keyed by
//! encoding hash.

use hashbrown::HashMap;
use log::warn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use vexel_raster::Pixmap;

pub const DEFAULT_CACHE_BYTES: usize = 64 * 1024 * 1024;

const NIL: usize = usize::MAX;

/// An intrusive doubly-linked LRU list over a slab of nodes. Shared by the
/// layer cache and the sharded cache.
#[derive(Debug, Default)]
pub(crate) struct LruList<K> {
    nodes: Vec<LruNode<K>>,
    head: usize,
    tail: usize,
    free: Vec<usize>,
}

#[derive(Debug)]
struct LruNode<K> {
    key: K,
    prev: usize,
    next: usize,
}

impl<K: Clone> LruList<K> {
    pub(crate) fn new() -> LruList<K> {
        LruList { nodes: vec![], head: NIL, tail: NIL, free: vec![] }
    }

    pub(crate) fn push_front(&mut self, key: K) -> usize {
        let node = LruNode { key, prev: NIL, next: self.head };
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        if self.head != NIL {
            self.nodes[self.head].prev = index;
        }
        self.head = index;
        if self.tail == NIL {
            self.tail = index;
        }
        index
    }

    pub(crate) fn remove(&mut self, index: usize) {
        let (prev, next) = (self.nodes[index].prev, self.nodes[index].next);
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.free.push(index);
    }

    pub(crate) fn touch(&mut self, index: usize) {
        if self.head == index {
            return;
        }
        let key = self.nodes[index].key.clone();
        self.remove(index);
        let new_index = self.push_front(key);
        // push_front reuses the slot just freed, keeping external indices
        // stable.
        debug_assert_eq!(new_index, index);
    }

    pub(crate) fn tail_key(&self) -> Option<K> {
        if self.tail == NIL {
            None
        } else {
            Some(self.nodes[self.tail].key.clone())
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }
}

struct CacheEntry {
    pixmap: Arc<Pixmap>,
    size_bytes: usize,
    version: u64,
    #[allow(dead_code)]
    last_used: u64,
    lru_index: usize,
}

struct LayerCacheInner {
    entries: HashMap<u64, CacheEntry>,
    lru: LruList<u64>,
    size: usize,
    max_size: usize,
}

impl LayerCacheInner {
    fn remove_entry(&mut self, hash: u64) {
        if let Some(entry) = self.entries.remove(&hash) {
            self.size -= entry.size_bytes;
            self.lru.remove(entry.lru_index);
        }
    }

    fn evict_until(&mut self, budget: usize) {
        while self.size > budget {
            match self.lru.tail_key() {
                Some(tail) => self.remove_entry(tail),
                None => break,
            }
        }
    }
}

/// Counters for cache observability. `hits + misses` equals the number of
/// `get` calls since the last `reset_stats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
    pub size_bytes: usize,
}

/// A thread-safe LRU cache of rendered layer pixmaps, bounded by total
/// bytes. One RW-mutex guards the entry map, the LRU order, and the size
/// accounting; hit/miss counters are atomic.
pub struct LayerCache {
    inner: RwLock<LayerCacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
    access_counter: AtomicU64,
}

impl Default for LayerCache {
    fn default() -> LayerCache {
        LayerCache::new(DEFAULT_CACHE_BYTES)
    }
}

impl LayerCache {
    pub fn new(max_size_bytes: usize) -> LayerCache {
        let max_size = if max_size_bytes == 0 {
            DEFAULT_CACHE_BYTES
        } else {
            max_size_bytes
        };
        LayerCache {
            inner: RwLock::new(LayerCacheInner {
                entries: HashMap::new(),
                lru: LruList::new(),
                size: 0,
                max_size,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            access_counter: AtomicU64::new(0),
        }
    }

    /// Looks up a cached pixmap, refreshing its LRU position on a hit. An
    /// optimistic read-lock probe filters misses before the write lock is
    /// taken.
    pub fn get(&self, hash: u64) -> Option<Arc<Pixmap>> {
        {
            let inner = self.inner.read().unwrap();
            if !inner.entries.contains_key(&hash) {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        }

        let mut inner = self.inner.write().unwrap();
        // Re-check: the entry may have been evicted between the locks.
        let lru_index = match inner.entries.get(&hash) {
            Some(entry) => entry.lru_index,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        inner.lru.touch(lru_index);
        let stamp = self.access_counter.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
        let entry = inner.entries.get_mut(&hash).unwrap();
        entry.last_used = stamp;
        Some(entry.pixmap.clone())
    }

    /// Inserts a rendered pixmap. Empty and over-budget pixmaps are
    /// declined. Existing entries under the same key are replaced, and the
    /// LRU tail is evicted until the new entry fits.
    pub fn put(&self, hash: u64, pixmap: Arc<Pixmap>, version: u64) -> bool {
        let size_bytes = pixmap.size_bytes();
        let mut inner = self.inner.write().unwrap();
        if size_bytes == 0 || size_bytes > inner.max_size {
            warn!("layer cache declined entry of {} bytes", size_bytes);
            return false;
        }

        inner.remove_entry(hash);
        let budget = inner.max_size - size_bytes;
        inner.evict_until(budget);

        let lru_index = inner.lru.push_front(hash);
        inner.size += size_bytes;
        let last_used = self.access_counter.fetch_add(1, Ordering::Relaxed);
        inner.entries.insert(
            hash,
            CacheEntry { pixmap, size_bytes, version, last_used, lru_index },
        );
        true
    }

    pub fn invalidate(&self, hash: u64) {
        self.inner.write().unwrap().remove_entry(hash);
    }

    pub fn invalidate_all(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.entries.clear();
        inner.lru.clear();
        inner.size = 0;
    }

    /// Evicts least-recently-used entries until the total drops to
    /// `target_bytes`.
    pub fn trim(&self, target_bytes: usize) {
        self.inner.write().unwrap().evict_until(target_bytes);
    }

    /// Replaces the budget. A non-positive budget restores the 64 MiB
    /// default. Shrinking evicts immediately.
    pub fn set_max_size(&self, megabytes: i64) {
        let max_size = if megabytes <= 0 {
            DEFAULT_CACHE_BYTES
        } else {
            megabytes as usize * 1024 * 1024
        };
        let mut inner = self.inner.write().unwrap();
        inner.max_size = max_size;
        inner.evict_until(max_size);
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.inner.read().unwrap().entries.contains_key(&hash)
    }

    pub fn get_version(&self, hash: u64) -> Option<u64> {
        self.inner
            .read()
            .unwrap()
            .entries
            .get(&hash)
            .map(|entry| entry.version)
    }

    pub fn entry_count(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    pub fn size(&self) -> usize {
        self.inner.read().unwrap().size
    }

    pub fn max_size(&self) -> usize {
        self.inner.read().unwrap().max_size
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read().unwrap();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: inner.entries.len(),
            size_bytes: inner.size,
        }
    }

    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
