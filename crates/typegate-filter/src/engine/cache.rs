//! Decision caches.
//!
//! Both caches hand out a shared `OnceLock` cell per key, then release the
//! map shard before computing. Racing callers on the same key block on the
//! cell and observe the single computed verdict; callers on other keys never
//! wait on archive I/O.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use typegate_core::types::{OriginId, TypeHandle};

type VerdictCell = Arc<OnceLock<bool>>;

struct TypeEntry {
    // Weak so the cache never keeps an unloaded type alive. While the entry
    // exists the allocation (and therefore the address key) cannot be reused.
    handle: Weak<TypeHandle>,
    verdict: VerdictCell,
}

/// Entry count that triggers the first sweep of dropped handles.
pub const PURGE_FLOOR: usize = 1024;

/// Per-type verdicts keyed by handle identity.
///
/// Entries for dropped handles are swept whenever the map grows past
/// `purge_at`, which is then reset to twice the surviving size. Sweeps are
/// amortized O(1) per insert and the map stays within twice the live set.
pub struct TypeVerdictCache {
    map: DashMap<usize, TypeEntry>,
    purge_at: AtomicUsize,
}

impl Default for TypeVerdictCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeVerdictCache {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            purge_at: AtomicUsize::new(PURGE_FLOOR),
        }
    }

    pub fn get(&self, ty: &Arc<TypeHandle>) -> Option<bool> {
        self.map
            .get(&key(ty))
            .and_then(|e| e.value().verdict.get().copied())
    }

    /// Return the cached verdict or compute it at most once.
    pub fn get_or_compute<F>(&self, ty: &Arc<TypeHandle>, compute: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let (cell, inserted) = match self.map.entry(key(ty)) {
            Entry::Occupied(e) => (Arc::clone(&e.get().verdict), false),
            Entry::Vacant(v) => {
                let cell = VerdictCell::default();
                v.insert(TypeEntry {
                    handle: Arc::downgrade(ty),
                    verdict: Arc::clone(&cell),
                });
                (cell, true)
            }
        };
        // shard guard is released here; retain() below locks every shard
        if inserted && self.map.len() >= self.purge_at.load(Ordering::Relaxed) {
            self.purge_unloaded();
        }
        *cell.get_or_init(compute)
    }

    /// Drop entries whose type handle is gone. Returns how many were removed.
    pub fn purge_unloaded(&self) -> usize {
        let before = self.map.len();
        self.map.retain(|_, e| e.handle.strong_count() > 0);
        let after = self.map.len();
        self.purge_at
            .store((after * 2).max(PURGE_FLOOR), Ordering::Relaxed);
        before.saturating_sub(after)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn key(ty: &Arc<TypeHandle>) -> usize {
    Arc::as_ptr(ty) as usize
}

/// Origin trust verdicts. Append-only for the process lifetime.
#[derive(Default)]
pub struct OriginVerdictCache {
    map: DashMap<OriginId, VerdictCell>,
}

impl OriginVerdictCache {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    pub fn get_or_compute<F>(&self, origin: &OriginId, compute: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let existing = self.map.get(origin).map(|c| Arc::clone(c.value()));
        let cell = match existing {
            Some(c) => c,
            None => Arc::clone(self.map.entry(origin.clone()).or_default().value()),
        };
        *cell.get_or_init(compute)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
