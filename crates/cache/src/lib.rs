// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relayq-cache: the deduplication cache (§4.4).
//!
//! `Cache` is a narrow three-operation trait; the engine never knows which
//! backend it is talking to. `memory` is an in-process FIFO-eviction store,
//! `redis` is a TTL-backed remote store for coordinating multiple
//! `relayq` instances (the `multiplier` knob).

pub mod memory;
pub mod redis_backend;
pub mod url;

use async_trait::async_trait;
use relayq_core::{DedupKey, Stage};
use thiserror::Error;

/// Result of `Cache::insert`: `Ok` on a fresh claim, `Found` if another
/// caller already holds the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Ok,
    Found,
}

/// Result of `Cache::update`: `Ok` on success, `NotFound` if the entry is
/// gone (e.g. TTL expiry between stages on the remote backend).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Ok,
    NotFound,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),
    #[error("invalid cache URL: {0}")]
    InvalidUrl(String),
}

/// The dedup cache contract (§4.4). All three operations are idempotent
/// with respect to their own error returns; `stage = Stage::None` is a
/// documented no-op for `insert`/`update`.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Atomically claim `id` at `stage`. Two concurrent inserters of the
    /// same id must see exactly one `Ok` and one `Found`.
    async fn insert(&self, id: &DedupKey, stage: Stage) -> Result<InsertOutcome, CacheError>;

    /// Advance an already-claimed id to `stage`.
    async fn update(&self, id: &DedupKey, stage: Stage) -> Result<UpdateOutcome, CacheError>;

    /// Remove `id` entirely, regardless of its current stage.
    async fn delete(&self, id: &DedupKey) -> Result<(), CacheError>;
}

pub use memory::MemoryCache;
pub use redis_backend::RedisCache;
pub use url::open_cache;
