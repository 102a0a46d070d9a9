// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One round's body: pre-delete, cache-gated dispatch, barrier, post-delete.

use crate::ProcessingEngine;
use futures_util::future::join_all;
use relayq_cache::{Cache, InsertOutcome, UpdateOutcome};
use relayq_core::{DedupKey, ExecutionResult, Message, RemovalPolicy, ResultError, Stage};
use relayq_pool::WorkerPool;
use relayq_queue::DeleteEntry;
use relayq_runner::{RunError, SubprocessRunner};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub(crate) async fn run_round(
    engine: &mut ProcessingEngine,
    messages: Vec<Message>,
    cancel: &CancellationToken,
) {
    if messages.is_empty() {
        return;
    }

    if engine.config.policy == RemovalPolicy::BeforeExecution {
        let entries = delete_entries(messages.iter().enumerate());
        if let Err(err) = engine.batcher.delete(entries).await {
            tracing::error!(error = %err, "pre-execution delete batch failed");
        }
    }

    let mut results: Vec<ExecutionResult> = Vec::with_capacity(messages.len());
    let mut tasks = Vec::with_capacity(messages.len());
    let mut dedup_keys: Vec<DedupKey> = Vec::with_capacity(messages.len());
    let mut claimed_this_round: HashSet<DedupKey> = HashSet::new();

    for (index, message) in messages.into_iter().enumerate() {
        let dedup_key = message.dedup_key(engine.config.dedup_mode);
        let result = ExecutionResult::new(engine.round, index, message);
        dedup_keys.push(dedup_key.clone());

        match engine.cache.insert(&dedup_key, Stage::Recv).await {
            Ok(InsertOutcome::Found) => {
                results.push(result.cache_skip());
                continue;
            }
            Ok(InsertOutcome::Ok) => {
                claimed_this_round.insert(dedup_key.clone());
            }
            Err(err) => {
                results.push(result.fail_at(Stage::Recv, ResultError::CacheUnavailable(err.to_string())));
                continue;
            }
        }

        let pool = engine.pool.clone();
        let cache = Arc::clone(&engine.cache);
        let runner = engine.runner.clone();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(process_message(result, dedup_key, pool, cache, runner, cancel)));
    }

    for handle in join_all(tasks).await {
        match handle {
            Ok(result) => results.push(result),
            Err(join_err) => tracing::error!(error = %join_err, "message task panicked"),
        }
    }

    for result in &results {
        log_result(result);
    }

    if engine.config.policy != RemovalPolicy::BeforeExecution {
        let entries = delete_entries(results.iter().enumerate().filter(|(_, r)| {
            let same_round_duplicate = matches!(r.error, Some(ResultError::CacheFound))
                && claimed_this_round.contains(&dedup_keys[r.index]);
            engine.config.policy.should_delete(r, same_round_duplicate)
        }));
        if !entries.is_empty() {
            if let Err(err) = engine.batcher.delete(entries).await {
                tracing::error!(error = %err, "post-execution delete batch failed");
            }
        }
    }
}

fn delete_entries<'a>(iter: impl Iterator<Item = (usize, &'a ExecutionResult)>) -> Vec<DeleteEntry> {
    iter.map(|(i, r)| DeleteEntry {
        id: i.to_string(),
        receipt_handle: r.message.receipt_handle.as_str().to_string(),
    })
    .collect()
}

/// The per-message lifecycle: `Lock` (acquire a permit) -> `Exec` (cache
/// update + run the subprocess) -> `Done`. Failures freeze `result.stage`
/// at the point they occurred; cancellation is observed at every
/// suspension point.
async fn process_message(
    result: ExecutionResult,
    dedup_key: DedupKey,
    pool: WorkerPool,
    cache: Arc<dyn Cache>,
    runner: SubprocessRunner,
    cancel: CancellationToken,
) -> ExecutionResult {
    let permit = tokio::select! {
        permit = pool.acquire() => match permit {
            Ok(permit) => permit,
            Err(_) => return result.fail_at(Stage::Lock, ResultError::Cancelled),
        },
        _ = cancel.cancelled() => return result.fail_at(Stage::Lock, ResultError::Cancelled),
    };

    match cache.update(&dedup_key, Stage::Exec).await {
        Ok(UpdateOutcome::Ok) => {}
        Ok(UpdateOutcome::NotFound) => {
            drop(permit);
            return result.fail_at(Stage::Lock, ResultError::CacheNotFound);
        }
        Err(err) => {
            drop(permit);
            return result.fail_at(Stage::Lock, ResultError::CacheUnavailable(err.to_string()));
        }
    }

    let outcome = runner.exec(&result.message.body, &cancel).await;
    drop(permit);

    if let Err(err) = outcome {
        // `Launch` means the command never actually ran (pipe/exec-lookup
        // failure), so it freezes at `Lock` alongside the other pre-exec
        // failures above, not at `Exec` with the outcomes that did run.
        let (stage, result_err) = match err {
            RunError::Launch { .. } => (Stage::Lock, ResultError::LaunchFailed(err.to_string())),
            RunError::Cancelled => (Stage::Exec, ResultError::Cancelled),
            RunError::Exit(_) | RunError::TimedOut(_) => {
                (Stage::Exec, ResultError::CommandFailed(err.to_string()))
            }
        };
        return result.fail_at(stage, result_err);
    }

    match cache.update(&dedup_key, Stage::Done).await {
        Ok(UpdateOutcome::Ok) => result.succeed(),
        Ok(UpdateOutcome::NotFound) => result.fail_at(Stage::Exec, ResultError::CacheNotFound),
        Err(err) => result.fail_at(Stage::Exec, ResultError::CacheUnavailable(err.to_string())),
    }
}

fn log_result(result: &ExecutionResult) {
    match &result.error {
        None => tracing::info!(
            round = result.round,
            index = result.index,
            id = %result.message.id,
            stage = %result.stage,
            "message processed"
        ),
        Some(ResultError::CacheFound) => tracing::info!(
            round = result.round,
            index = result.index,
            id = %result.message.id,
            stage = %result.stage,
            "message skipped, already claimed"
        ),
        Some(err) => tracing::warn!(
            round = result.round,
            index = result.index,
            id = %result.message.id,
            stage = %result.stage,
            error = %err,
            "message failed"
        ),
    }
}
