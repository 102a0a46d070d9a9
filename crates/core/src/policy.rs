// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-execution deletion policy (§4.6).

use crate::{ExecutionResult, ResultError, Stage};
use std::str::FromStr;

/// Governs when a received message is deleted from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Delete iff the command succeeded. Default.
    #[default]
    Succeed,
    /// Delete iff the command succeeded, OR it ran at all (exit code irrelevant).
    /// A cache-skip or a pre-exec failure is still never deleted here.
    IgnoreFailure,
    /// Deletion already happened before execution; never delete again here.
    BeforeExecution,
}

impl FromStr for RemovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeed" => Ok(RemovalPolicy::Succeed),
            "ignore_failure" => Ok(RemovalPolicy::IgnoreFailure),
            "before_execution" => Ok(RemovalPolicy::BeforeExecution),
            other => Err(format!("unknown removal policy: {other}")),
        }
    }
}

impl RemovalPolicy {
    /// Whether `result` should be acknowledged in the post-execution delete batch.
    ///
    /// The pre-execution cache-skip path (`Stage::Recv` + `CacheFound`) is
    /// eligible except under `BeforeExecution`, where the pre-delete step
    /// already covered it, and except when `same_round_duplicate` is set: a
    /// second delivery of an id claimed earlier in the very same round is
    /// covered by its sibling's own delete entry, so adding one here would
    /// just double up on the same id. A `CacheFound` whose claim predates
    /// this round (a stale redelivery of an already-completed message) is
    /// not a same-round duplicate and is still always deleted.
    pub fn should_delete(self, result: &ExecutionResult, same_round_duplicate: bool) -> bool {
        if self == RemovalPolicy::BeforeExecution {
            return false;
        }
        if matches!(result.error, Some(ResultError::CacheFound)) {
            return !same_round_duplicate;
        }
        match self {
            RemovalPolicy::BeforeExecution => unreachable!(),
            RemovalPolicy::Succeed => result.error.is_none(),
            RemovalPolicy::IgnoreFailure => {
                result.error.is_none() || result.stage == Stage::Exec
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    fn msg() -> Message {
        Message::new("id", "rh", b"body".to_vec())
    }

    #[test]
    fn parses_known_names() {
        assert_eq!("succeed".parse(), Ok(RemovalPolicy::Succeed));
        assert_eq!("ignore_failure".parse(), Ok(RemovalPolicy::IgnoreFailure));
        assert_eq!("before_execution".parse(), Ok(RemovalPolicy::BeforeExecution));
        assert!("bogus".parse::<RemovalPolicy>().is_err());
    }

    #[test]
    fn succeed_deletes_only_clean_success() {
        let ok = ExecutionResult::new(1, 0, msg()).succeed();
        assert!(RemovalPolicy::Succeed.should_delete(&ok, false));

        let failed = ExecutionResult::new(1, 0, msg())
            .fail_at(Stage::Exec, ResultError::CommandFailed("exit 1".into()));
        assert!(!RemovalPolicy::Succeed.should_delete(&failed, false));
    }

    #[test]
    fn ignore_failure_deletes_when_command_ran_regardless_of_outcome() {
        let failed = ExecutionResult::new(1, 0, msg())
            .fail_at(Stage::Exec, ResultError::CommandFailed("exit 1".into()));
        assert!(RemovalPolicy::IgnoreFailure.should_delete(&failed, false));

        let pre_exec_failure = ExecutionResult::new(1, 0, msg())
            .fail_at(Stage::Lock, ResultError::CacheUnavailable("down".into()));
        assert!(!RemovalPolicy::IgnoreFailure.should_delete(&pre_exec_failure, false));
    }

    #[test]
    fn cache_skip_is_always_deleted_except_before_execution() {
        let skip = ExecutionResult::new(1, 0, msg()).cache_skip();
        assert!(RemovalPolicy::Succeed.should_delete(&skip, false));
        assert!(RemovalPolicy::IgnoreFailure.should_delete(&skip, false));
        assert!(!RemovalPolicy::BeforeExecution.should_delete(&skip, false));
    }

    #[test]
    fn same_round_duplicate_is_not_deleted_even_under_succeed() {
        let skip = ExecutionResult::new(1, 1, msg()).cache_skip();
        assert!(!RemovalPolicy::Succeed.should_delete(&skip, true));
        assert!(!RemovalPolicy::IgnoreFailure.should_delete(&skip, true));
    }

    #[test]
    fn before_execution_never_deletes_post_round() {
        let ok = ExecutionResult::new(1, 0, msg()).succeed();
        assert!(!RemovalPolicy::BeforeExecution.should_delete(&ok, false));
    }
}
