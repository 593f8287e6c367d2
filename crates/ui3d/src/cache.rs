//! Content-addressed snapshot cache.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use htmlmesh_core::ImageData;
use lru::LruCache;
use sha2::{Digest, Sha256};

/// SHA-256 digest (lowercase hex) of a fragment's serialized inner markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash serialized markup.
    pub fn of_markup(markup: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(markup.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counters reported by [`SnapshotCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required rasterization.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Resident entries.
    pub len: usize,
    /// Maximum resident entries.
    pub capacity: usize,
}

struct CacheInner {
    entries: LruCache<ContentHash, ImageData>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Bounded LRU map from content hash to decoded snapshot.
///
/// Shared between builders through an `Arc`; the lock is never held across
/// an await point.
pub struct SnapshotCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl SnapshotCache {
    /// Capacity used by [`SnapshotCache::default`].
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create an empty cache holding at most `capacity` snapshots (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(cap),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            capacity,
        }
    }

    /// Look up a snapshot, marking it as recently used.
    pub fn get(&self, hash: &ContentHash) -> Option<ImageData> {
        let mut inner = self.lock();
        match inner.entries.get(hash).cloned() {
            Some(data) => {
                inner.hits += 1;
                Some(data)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Check residency without touching recency or counters.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.lock().entries.contains(hash)
    }

    /// Store a snapshot. Overwrites an existing entry for the same hash.
    pub fn insert(&self, hash: ContentHash, data: ImageData) {
        let mut inner = self.lock();
        if let Some((evicted, _)) = inner.entries.push(hash.clone(), data) {
            if evicted != hash {
                inner.evictions += 1;
                tracing::debug!(hash = %evicted, "evicted snapshot from cache");
            }
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    /// Number of resident snapshots.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of resident snapshots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            len: inner.entries.len(),
            capacity: self.capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("stats", &self.stats())
            .finish()
    }
}
