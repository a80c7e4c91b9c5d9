use crate::{
    object::ObjectId,
    obs::sink::{MetricsEvent, record},
    store::RowRef,
};
use std::{collections::HashMap, hash::Hash};

///
/// IdentityCache
///
/// Per-call visited map keyed by identity, never by structure: two equal
/// objects with different ids are two entries. Lives for one top-level
/// copy and is dropped with it.
///

#[derive(Debug)]
pub(crate) struct IdentityCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> IdentityCache<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        let hit = self.entries.get(key);
        if hit.is_some() {
            record(MetricsEvent::IdentityCacheHit);
        }

        hit
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hit = self.entries.get_mut(key);
        if hit.is_some() {
            record(MetricsEvent::IdentityCacheHit);
        }

        hit
    }

    /// Register `key`. A second insert for the same key keeps the first
    /// value.
    pub(crate) fn insert(&mut self, key: K, value: V) -> &mut V {
        self.entries.entry(key).or_insert(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Copy-in: source object → row it produced.
pub(crate) type CopyCache = IdentityCache<ObjectId, RowRef>;

///
/// DetachEntry
/// Detached object produced for a row, and the shallowest depth it was
/// filled at.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct DetachEntry {
    pub(crate) object: ObjectId,
    pub(crate) min_depth: u32,
}

/// Copy-out: source row → detached object.
pub(crate) type DetachCache = IdentityCache<RowRef, DetachEntry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        obs::metrics,
        store::{RowKey, StoreId, TableKey},
    };

    #[test]
    fn unseen_keys_are_absent() {
        let cache = CopyCache::new();

        assert!(cache.get(&ObjectId(0)).is_none());
    }

    #[test]
    fn insert_is_idempotent_per_key() {
        let mut cache = CopyCache::new();
        let first = RowRef::new(StoreId(1), TableKey(0), RowKey(0));
        let second = RowRef::new(StoreId(1), TableKey(0), RowKey(1));

        cache.insert(ObjectId(3), first);
        cache.insert(ObjectId(3), second);

        assert_eq!(cache.get(&ObjectId(3)), Some(&first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_ids_never_merge() {
        let mut cache = CopyCache::new();
        cache.insert(ObjectId(0), RowRef::new(StoreId(1), TableKey(0), RowKey(0)));
        cache.insert(ObjectId(1), RowRef::new(StoreId(1), TableKey(0), RowKey(1)));

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn hits_are_counted() {
        metrics::reset();
        let row = RowRef::new(StoreId(1), TableKey(0), RowKey(0));
        let mut cache = DetachCache::new();
        cache.insert(
            row,
            DetachEntry {
                object: ObjectId(0),
                min_depth: 2,
            },
        );

        if let Some(entry) = cache.get_mut(&row) {
            entry.min_depth = 1;
        }
        assert!(cache.get(&row).is_some_and(|e| e.min_depth == 1));
        assert_eq!(metrics::snapshot().ops.identity_cache_hits, 2);
    }
}
