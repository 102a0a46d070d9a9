// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relayq-pool: the worker pool (§4.2).
//!
//! A weighted semaphore and nothing else. It does not own tasks: the
//! engine spawns one per message and suspends on [`WorkerPool::acquire`]
//! when the pool is saturated. The pool is stateless concurrency
//! accounting, not a worker-queue abstraction.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Concurrency cap is clamped to this range; values outside it fall back
/// to the default.
pub const MIN_WORKERS: u32 = 1;
pub const MAX_WORKERS: u32 = 10;
pub const DEFAULT_WORKERS: u32 = 4;

/// Clamp a configured worker count to `[MIN_WORKERS, MAX_WORKERS]`,
/// defaulting out-of-range values to `DEFAULT_WORKERS`.
pub fn clamp_workers(requested: u32) -> u32 {
    if (MIN_WORKERS..=MAX_WORKERS).contains(&requested) {
        requested
    } else {
        DEFAULT_WORKERS
    }
}

/// A permit held by one in-flight subprocess. Dropping it releases the slot.
pub type WorkerPermit = OwnedSemaphorePermit;

/// Bounds the number of concurrently executing subprocesses.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(workers: u32) -> Self {
        let workers = clamp_workers(workers);
        Self { semaphore: Arc::new(Semaphore::new(workers as usize)) }
    }

    /// Suspend until a permit is available, or until `acquire` is aborted
    /// by the semaphore closing (engine shutdown).
    pub async fn acquire(&self) -> Result<WorkerPermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
