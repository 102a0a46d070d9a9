// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-message outcome of one engine round.

use crate::{Message, Stage};
use thiserror::Error;

/// Why a message's processing stopped short of `Stage::Done`.
///
/// `CacheFound` is not a failure in the usual sense, it is the expected
/// control-flow signal for "another task already claimed this id", but it
/// is still carried here because the removal policy needs to distinguish it
/// from every other stopping point.
#[derive(Debug, Clone, Error)]
pub enum ResultError {
    /// `Cache::insert` reported the id was already claimed this round.
    #[error("already claimed this round")]
    CacheFound,
    /// `Cache::update` reported the id was no longer present (e.g. TTL expiry).
    #[error("cache entry expired before update")]
    CacheNotFound,
    /// The cache backend itself failed (connection error, etc).
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),
    /// The subprocess could not be spawned (pipe setup, exec lookup, ...).
    #[error("failed to launch command: {0}")]
    LaunchFailed(String),
    /// The subprocess ran and exited non-zero, or was signal-terminated.
    #[error("command failed: {0}")]
    CommandFailed(String),
    /// The round was aborted by context cancellation.
    #[error("cancelled")]
    Cancelled,
}

/// Outcome of processing a single message within one round.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Round this message was received in, for log ordering.
    pub round: u64,
    /// Position within the round's receive batch, for log ordering.
    pub index: usize,
    pub message: Message,
    pub stage: Stage,
    pub error: Option<ResultError>,
}

impl ExecutionResult {
    pub fn new(round: u64, index: usize, message: Message) -> Self {
        Self { round, index, message, stage: Stage::None, error: None }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.stage == Stage::Done
    }

    /// Dedup-skip path: `Cache::insert` returned `CacheFound` for this id.
    pub fn cache_skip(mut self) -> Self {
        self.stage = Stage::Recv;
        self.error = Some(ResultError::CacheFound);
        self
    }

    pub fn fail_at(mut self, stage: Stage, error: ResultError) -> Self {
        self.stage = stage;
        self.error = Some(error);
        self
    }

    pub fn succeed(mut self) -> Self {
        self.stage = Stage::Done;
        self.error = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg() -> Message {
        Message::new("id", "rh", b"body".to_vec())
    }

    #[test]
    fn fresh_result_is_not_success() {
        let r = ExecutionResult::new(1, 0, msg());
        assert!(!r.is_success());
        assert_eq!(r.stage, Stage::None);
    }

    #[test]
    fn succeed_marks_done_with_no_error() {
        let r = ExecutionResult::new(1, 0, msg()).succeed();
        assert!(r.is_success());
    }

    #[test]
    fn cache_skip_freezes_at_recv() {
        let r = ExecutionResult::new(1, 0, msg()).cache_skip();
        assert_eq!(r.stage, Stage::Recv);
        assert!(matches!(r.error, Some(ResultError::CacheFound)));
        assert!(!r.is_success());
    }
}
