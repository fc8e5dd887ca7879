//! Texture bookkeeping for the batched renderer.
//!
//! [`SlotTable`] is the per-batch table of bound texture units, cleared on every flush.
//! [`CachePool`] holds textures of cached subtrees across frames and evicts entries that were not
//! used during the last full pass.

use std::collections::HashMap;

use crate::render::gpu::device::TextureId;

/// Texture units bound for the batch being accumulated.
#[derive(Debug)]
pub(crate) struct SlotTable {
    slots: Vec<TextureId>,
    max_slots: usize,
}

impl SlotTable {
    pub(crate) fn new(max_slots: usize) -> Self {
        Self {
            slots: Vec::with_capacity(max_slots),
            max_slots,
        }
    }

    pub(crate) fn lookup(&self, id: TextureId) -> Option<usize> {
        self.slots.iter().position(|&s| s == id)
    }

    pub(crate) fn is_full(&self) -> bool {
        self.slots.len() >= self.max_slots
    }

    /// Bind `id` to the next free slot. Callers flush first when the table is full.
    pub(crate) fn bind(&mut self, id: TextureId) -> usize {
        self.slots.push(id);
        self.slots.len() - 1
    }

    pub(crate) fn bound(&self) -> &[TextureId] {
        &self.slots
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CacheEntry {
    pub(crate) texture: TextureId,
    used: bool,
}

/// Persistent cache-texture list keyed by cache id.
#[derive(Debug, Default)]
pub(crate) struct CachePool {
    entries: HashMap<u64, CacheEntry>,
}

impl CachePool {
    /// Look up `cache_id` and mark it used on a hit.
    pub(crate) fn touch(&mut self, cache_id: u64) -> Option<CacheEntry> {
        let e = self.entries.get_mut(&cache_id)?;
        e.used = true;
        Some(*e)
    }

    /// Register a fresh upload, already marked used.
    pub(crate) fn insert(&mut self, cache_id: u64, texture: TextureId) {
        self.entries.insert(
            cache_id,
            CacheEntry {
                texture,
                used: true,
            },
        );
    }

    /// Drop every entry not used since the last call and reset the flag on the rest.
    ///
    /// Returns the textures to release, in ascending id order.
    pub(crate) fn evict_unused(&mut self) -> Vec<TextureId> {
        let mut evicted = Vec::new();
        self.entries.retain(|_, e| {
            if e.used {
                e.used = false;
                true
            } else {
                evicted.push(e.texture);
                false
            }
        });
        evicted.sort_unstable();
        evicted
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, cache_id: u64) -> bool {
        self.entries.contains_key(&cache_id)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/render/gpu/textures.rs"]
mod tests;
