//! Least-recently-used cache of built rows, shared between the primary
//! thread and the pre-load workers.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::item::ItemId;

struct CacheState<E> {
    entries: LruCache<ItemId, Arc<Mutex<E>>>,
    /// Bumped by every `evict_all`; builds started under an older
    /// generation are not inserted.
    generation: u64,
}

/// Bounded map from item id to a shared, pre-measured element.
pub struct ElementCache<E> {
    state: Mutex<CacheState<E>>,
}

impl<E> ElementCache<E> {
    pub const DEFAULT_CAPACITY: usize = 30;

    /// A cache holding at most `capacity` elements (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `id`, marking it most recently used.
    pub fn get(&self, id: ItemId) -> Option<Arc<Mutex<E>>> {
        self.state().entries.get(&id).cloned()
    }

    /// Whether `id` is cached. Does not touch recency.
    pub fn contains(&self, id: ItemId) -> bool {
        self.state().entries.contains(&id)
    }

    /// Insert or replace `id`, evicting the least recently used entry if
    /// full.
    pub fn put(&self, id: ItemId, element: Arc<Mutex<E>>) {
        Self::insert(&mut self.state(), id, element);
    }

    /// Insert only if no `evict_all` happened since `generation` was read.
    /// Returns whether the element was inserted.
    pub fn put_if_current(&self, id: ItemId, element: Arc<Mutex<E>>, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!(id, "dropping row built for a stale width");
            return false;
        }
        Self::insert(&mut state, id, element);
        true
    }

    fn insert(state: &mut CacheState<E>, id: ItemId, element: Arc<Mutex<E>>) {
        if let Some((evicted, _)) = state.entries.push(id, element) {
            if evicted != id {
                tracing::debug!(evicted, "evicted row from cache");
            }
        }
    }

    /// Drop every entry.
    pub fn evict_all(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.generation += 1;
        tracing::debug!(generation = state.generation, "row cache cleared");
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state().entries.cap().get()
    }
}

impl<E> Default for ElementCache<E> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

// =========================================================================
// Tests
// =========================================================================
