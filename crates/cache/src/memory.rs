// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory FIFO-eviction cache backend.

use crate::{Cache, CacheError, InsertOutcome, UpdateOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use relayq_core::{DedupKey, Stage};
use std::collections::{HashMap, VecDeque};

/// The max receive-batch size (10 messages per round); a capacity below
/// this effectively disables the cache (all operations succeed, no state
/// is kept).
pub const MIN_EFFECTIVE_CAPACITY: usize = 10;

struct Inner {
    capacity: usize,
    entries: HashMap<DedupKey, Stage>,
    /// Insertion order, for FIFO eviction. `Update` never reorders it.
    order: VecDeque<DedupKey>,
}

/// Bounded, thread-safe in-process dedup cache.
///
/// Eviction order is strictly insertion order: the oldest *inserted* id is
/// evicted first, regardless of how recently it was updated.
pub struct MemoryCache {
    inner: Mutex<Inner>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    fn disabled(capacity: usize) -> bool {
        capacity < MIN_EFFECTIVE_CAPACITY
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn insert(&self, id: &DedupKey, stage: Stage) -> Result<InsertOutcome, CacheError> {
        let mut inner = self.inner.lock();
        if Self::disabled(inner.capacity) || stage.is_none() {
            return Ok(InsertOutcome::Ok);
        }
        if inner.entries.contains_key(id) {
            return Ok(InsertOutcome::Found);
        }
        while inner.order.len() >= inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        inner.order.push_back(id.clone());
        inner.entries.insert(id.clone(), stage);
        Ok(InsertOutcome::Ok)
    }

    async fn update(&self, id: &DedupKey, stage: Stage) -> Result<UpdateOutcome, CacheError> {
        let mut inner = self.inner.lock();
        if Self::disabled(inner.capacity) || stage.is_none() {
            return Ok(UpdateOutcome::Ok);
        }
        if let Some(entry) = inner.entries.get_mut(id) {
            *entry = stage;
            Ok(UpdateOutcome::Ok)
        } else {
            Ok(UpdateOutcome::NotFound)
        }
    }

    async fn delete(&self, id: &DedupKey) -> Result<(), CacheError> {
        let mut inner = self.inner.lock();
        if Self::disabled(inner.capacity) {
            return Ok(());
        }
        if inner.entries.remove(id).is_some() {
            // Lazy removal from `order`: the stale entry is skipped by
            // `insert`'s eviction loop once it reaches the front, since
            // `entries.remove` above already makes it absent from the map.
            inner.order.retain(|k| k != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayq_core::Stage;

    fn key(s: &str) -> DedupKey {
        DedupKey::from(s.to_string())
    }

    #[tokio::test]
    async fn insert_then_insert_is_found() {
        let cache = MemoryCache::new(10);
        assert_eq!(cache.insert(&key("a"), Stage::Recv).await.unwrap(), InsertOutcome::Ok);
        assert_eq!(cache.insert(&key("a"), Stage::Recv).await.unwrap(), InsertOutcome::Found);
    }

    #[tokio::test]
    async fn insert_delete_insert_is_ok_twice() {
        let cache = MemoryCache::new(10);
        assert_eq!(cache.insert(&key("a"), Stage::Recv).await.unwrap(), InsertOutcome::Ok);
        cache.delete(&key("a")).await.unwrap();
        assert_eq!(cache.insert(&key("a"), Stage::Recv).await.unwrap(), InsertOutcome::Ok);
    }

    #[tokio::test]
    async fn capacity_plus_one_evicts_exactly_the_first() {
        let cache = MemoryCache::new(10);
        for i in 0..10 {
            cache.insert(&key(&i.to_string()), Stage::Recv).await.unwrap();
        }
        cache.insert(&key("10"), Stage::Recv).await.unwrap();
        assert_eq!(cache.len(), 10);
        // "0" was evicted, so inserting it again is a fresh claim.
        assert_eq!(cache.insert(&key("0"), Stage::Recv).await.unwrap(), InsertOutcome::Ok);
        // "1".."10" are all still present.
        assert_eq!(cache.insert(&key("1"), Stage::Recv).await.unwrap(), InsertOutcome::Found);
    }

    #[tokio::test]
    async fn update_does_not_reorder_eviction() {
        let cache = MemoryCache::new(2);
        cache.insert(&key("a"), Stage::Recv).await.unwrap();
        cache.insert(&key("b"), Stage::Recv).await.unwrap();
        // Touch "a" via update; FIFO order is still a, b.
        cache.update(&key("a"), Stage::Exec).await.unwrap();
        cache.insert(&key("c"), Stage::Recv).await.unwrap();
        // "a" was still the oldest by insertion order, so it was evicted.
        assert_eq!(cache.insert(&key("a"), Stage::Recv).await.unwrap(), InsertOutcome::Ok);
        assert_eq!(cache.insert(&key("b"), Stage::Recv).await.unwrap(), InsertOutcome::Found);
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let cache = MemoryCache::new(10);
        assert_eq!(
            cache.update(&key("ghost"), Stage::Exec).await.unwrap(),
            UpdateOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn capacity_below_batch_size_disables_caching() {
        let cache = MemoryCache::new(9);
        assert_eq!(cache.insert(&key("a"), Stage::Recv).await.unwrap(), InsertOutcome::Ok);
        // Disabled: a second insert of the same id is still "Ok", not "Found".
        assert_eq!(cache.insert(&key("a"), Stage::Recv).await.unwrap(), InsertOutcome::Ok);
    }

    #[tokio::test]
    async fn none_stage_is_a_no_op_for_insert() {
        let cache = MemoryCache::new(10);
        cache.insert(&key("a"), Stage::None).await.unwrap();
        assert_eq!(cache.len(), 0);
    }
}
