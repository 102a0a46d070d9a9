// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relayq-engine: the processing engine (§4.1), tying the cache, worker
//! pool, subprocess runner, and delete batcher into the round loop.

mod round;

use relayq_cache::Cache;
use relayq_core::{DedupMode, RemovalPolicy};
use relayq_pool::WorkerPool;
use relayq_queue::{DeleteBatcher, QueueClient};
use relayq_runner::SubprocessRunner;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// SQS's receive batch limit; also the round's message-batch size.
pub const MAX_BATCH: u32 = 10;

/// Fatal outcomes for a `ProcessingEngine::run` call. Per-message failures
/// never surface here, only receive-retry exhaustion and a cache that is
/// unreachable when the engine needs it to make progress.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("receive retries exhausted: {0}")]
    ReceiveExhausted(String),
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),
}

/// Round-independent knobs, bundled so `ProcessingEngine::new` doesn't
/// grow a parameter for every flag in the CLI's table.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub policy: RemovalPolicy,
    pub dedup_mode: DedupMode,
    pub max_retries: u32,
    pub wait_time_seconds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: RemovalPolicy::default(),
            dedup_mode: DedupMode::default(),
            max_retries: 4,
            wait_time_seconds: 0,
        }
    }
}

/// One receive -> dispatch -> delete loop bound to a single queue URL.
/// A `multiplier` deployment runs several of these sharing one `cache`.
pub struct ProcessingEngine {
    queue: Arc<dyn QueueClient>,
    queue_url: String,
    cache: Arc<dyn Cache>,
    runner: SubprocessRunner,
    pool: WorkerPool,
    batcher: DeleteBatcher,
    config: EngineConfig,
    round: u64,
}

impl ProcessingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn QueueClient>,
        queue_url: String,
        cache: Arc<dyn Cache>,
        runner: SubprocessRunner,
        pool: WorkerPool,
        batcher: DeleteBatcher,
        config: EngineConfig,
    ) -> Self {
        Self { queue, queue_url, cache, runner, pool, batcher, config, round: 0 }
    }

    /// Runs rounds until `cancel` fires (returns `Ok(())`) or an
    /// unrecoverable error occurs.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), EngineError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let messages = match self.receive_with_retry(&cancel).await? {
                Some(messages) => messages,
                None => return Ok(()),
            };

            round::run_round(self, messages, &cancel).await;
            self.round += 1;
        }
    }

    async fn receive_with_retry(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<relayq_core::Message>>, EngineError> {
        let mut attempt = 0u32;
        let mut rng = rand::thread_rng();
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let wait = (self.config.wait_time_seconds > 0).then_some(self.config.wait_time_seconds);
            match self.queue.receive_messages(&self.queue_url, MAX_BATCH, wait).await {
                Ok(messages) => return Ok(Some(messages)),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(EngineError::ReceiveExhausted(err.to_string()));
                    }
                    let delay = relayq_core::backoff_delay(attempt, &mut rng);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Ok(None),
                    }
                }
            }
        }
    }
}
