//! Bounded, thread-safe cache of controller resolutions.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use super::key::LookupKey;
use crate::config::INITIAL_CAPACITY;
use crate::controller::ControllerDescriptor;

/// Outcome of a lookup as stored in the cache. `NotFound` memoizes misses
/// and never leaves the resolver.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Arc<ControllerDescriptor>),
    NotFound,
}

impl Resolution {
    pub fn from_option(found: Option<Arc<ControllerDescriptor>>) -> Self {
        found.map_or(Self::NotFound, Self::Found)
    }

    pub fn into_option(self) -> Option<Arc<ControllerDescriptor>> {
        match self {
            Self::Found(descriptor) => Some(descriptor),
            Self::NotFound => None,
        }
    }
}

/// LRU map from lookup key to resolution, bounded by entry count.
///
/// All methods take `&self`; the cache locks internally, so callers never
/// hold a lock across a registry scan.
pub struct ResolutionCache {
    entries: Mutex<LruCache<LookupKey, Resolution, ahash::RandomState>>,
}

impl ResolutionCache {
    pub fn new(max_size: NonZeroUsize) -> Self {
        // Start from the initial key table and grow the bound afterwards,
        // so a large maximum does not allocate up front.
        let initial = NonZeroUsize::new(INITIAL_CAPACITY.min(max_size.get())).unwrap_or(max_size);
        let mut entries = LruCache::with_hasher(initial, ahash::RandomState::new());
        entries.resize(max_size);

        Self {
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<LookupKey, Resolution, ahash::RandomState>> {
        // Entries are written whole, a panic elsewhere cannot leave one half-updated
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a cached resolution and mark it most recently used.
    pub fn get(&self, key: &LookupKey) -> Option<Resolution> {
        self.lock().get(key).cloned()
    }

    /// Insert or overwrite, evicting the least recently used entry when full.
    pub fn put(&self, key: LookupKey, resolution: Resolution) {
        self.lock().put(key, resolution);
    }

    /// Check for a key without touching its recency.
    pub fn contains(&self, key: &LookupKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.lock();
        f.debug_struct("ResolutionCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish()
    }
}
