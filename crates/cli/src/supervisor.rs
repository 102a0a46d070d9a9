// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `multiplier` supervisor: runs N independent engine instances
//! sharing one cache, reporting only the first fatal error (§7, §9).

use relayq_engine::ProcessingEngine;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct MultiplierError(pub String);

impl fmt::Display for MultiplierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "multiplier instance failed: {}", self.0)
    }
}

impl std::error::Error for MultiplierError {}

/// Runs every engine instance to completion. The first instance to return
/// a fatal error latches its message via `OnceLock` and wakes `latched`;
/// every other instance is cancelled through the shared token and any
/// error of its own is only logged, per the multiplier note in §7.
pub async fn run(engines: Vec<ProcessingEngine>, cancel: CancellationToken) -> Result<(), MultiplierError> {
    let first_error: Arc<OnceLock<String>> = Arc::new(OnceLock::new());
    let latched = Arc::new(Notify::new());

    let watcher = {
        let first_error = first_error.clone();
        let latched = latched.clone();
        tokio::spawn(async move {
            latched.notified().await;
            if let Some(message) = first_error.get() {
                tracing::error!(error = %message, "multiplier shutting down after a fatal instance error");
            }
        })
    };

    let mut handles = Vec::with_capacity(engines.len());
    for (instance, mut engine) in engines.into_iter().enumerate() {
        let cancel = cancel.clone();
        let first_error = first_error.clone();
        let latched = latched.clone();
        handles.push(tokio::spawn(async move {
            if let Err(err) = engine.run(cancel.clone()).await {
                if first_error.set(err.to_string()).is_ok() {
                    latched.notify_waiters();
                } else {
                    tracing::warn!(instance, error = %err, "additional multiplier instance error, first error already reported");
                }
                cancel.cancel();
            }
        }));
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "multiplier instance task panicked");
        }
    }
    latched.notify_waiters();
    let _ = watcher.await;

    match first_error.get() {
        Some(message) => Err(MultiplierError(message.clone())),
        None => Ok(()),
    }
}
