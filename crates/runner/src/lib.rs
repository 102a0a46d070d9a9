// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relayq-runner: the subprocess runner (§4.3).
//!
//! Spawns the configured command directly, never through a shell. Pipes
//! the message body to its stdin, lets stdout/stderr inherit the parent's
//! streams, and honors both a per-command timeout and external
//! cancellation.

mod kill;

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// Grace period between SIGTERM and SIGKILL when escalating a kill.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// `None` means no per-command deadline.
    pub timeout: Option<Duration>,
    pub kill_grace: Duration,
}

impl RunnerConfig {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args, timeout: None, kill_grace: DEFAULT_KILL_GRACE }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A command failed to run to a successful (exit code 0) completion.
#[derive(Debug, Error)]
pub enum RunError {
    /// Pipe setup or process spawn itself failed, distinct from the
    /// command running and exiting non-zero.
    #[error("failed to launch {program}: {source}")]
    Launch { program: String, #[source] source: std::io::Error },
    /// The process ran and exited non-zero, or was terminated by a signal.
    #[error("command exited with status: {0}")]
    Exit(String),
    /// The timeout elapsed and the child was killed.
    #[error("command timed out after {0:?} and was killed")]
    TimedOut(Duration),
    /// The caller's cancellation token fired and the child was killed.
    #[error("command was cancelled")]
    Cancelled,
}

/// Runs one subprocess per invocation from a shared command template.
#[derive(Clone)]
pub struct SubprocessRunner {
    config: RunnerConfig,
}

impl SubprocessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Spawn the configured command, write `body` to its stdin then close
    /// it, and wait for the outcome, honoring `self.config.timeout` and
    /// `cancel`, whichever comes first.
    pub async fn exec(&self, body: &[u8], cancel: &CancellationToken) -> Result<(), RunError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|source| RunError::Launch {
            program: self.config.program.clone(),
            source,
        })?;

        write_stdin(&mut child, body);

        match self.config.timeout {
            Some(timeout) => self.wait_with_timeout(child, timeout, cancel).await,
            None => self.wait_with_cancel(child, cancel).await,
        }
    }

    async fn wait_with_cancel(
        &self,
        mut child: Child,
        cancel: &CancellationToken,
    ) -> Result<(), RunError> {
        tokio::select! {
            status = child.wait() => classify(status),
            _ = cancel.cancelled() => {
                kill::terminate(&mut child, self.config.kill_grace).await;
                Err(RunError::Cancelled)
            }
        }
    }

    async fn wait_with_timeout(
        &self,
        mut child: Child,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), RunError> {
        tokio::select! {
            status = child.wait() => classify(status),
            _ = tokio::time::sleep(timeout) => {
                kill::terminate(&mut child, self.config.kill_grace).await;
                Err(RunError::TimedOut(timeout))
            }
            _ = cancel.cancelled() => {
                kill::terminate(&mut child, self.config.kill_grace).await;
                Err(RunError::Cancelled)
            }
        }
    }
}

/// Write the body and close stdin from a detached task, so a child that
/// reads slowly (or not at all) never blocks us from observing its exit.
fn write_stdin(child: &mut Child, body: &[u8]) {
    let Some(mut stdin) = child.stdin.take() else { return };
    let body = body.to_vec();
    tokio::spawn(async move {
        if let Err(err) = stdin.write_all(&body).await {
            tracing::debug!(error = %err, "child closed stdin before body was fully written");
        }
        drop(stdin);
    });
}

/// `Success` iff the process exited with code 0; non-zero exit, signal
/// termination, and I/O failures waiting on the child are all command
/// failures, distinguishable from a launch failure by the `RunError` variant.
fn classify(status: std::io::Result<std::process::ExitStatus>) -> Result<(), RunError> {
    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(RunError::Exit(status.to_string())),
        Err(err) => Err(RunError::Exit(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(program: &str, args: &[&str]) -> RunnerConfig {
        RunnerConfig::new(program, args.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn successful_exit_is_ok() {
        let runner = SubprocessRunner::new(cfg("true", &[]));
        let cancel = CancellationToken::new();
        assert!(runner.exec(b"hello", &cancel).await.is_ok());
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_command_failure() {
        let runner = SubprocessRunner::new(cfg("false", &[]));
        let cancel = CancellationToken::new();
        let err = runner.exec(b"hello", &cancel).await.unwrap_err();
        assert!(matches!(err, RunError::Exit(_)));
    }

    #[tokio::test]
    async fn unknown_program_is_a_launch_failure() {
        let runner = SubprocessRunner::new(cfg("relayq-definitely-not-a-real-binary", &[]));
        let cancel = CancellationToken::new();
        let err = runner.exec(b"hello", &cancel).await.unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }

    #[tokio::test]
    async fn body_is_delivered_via_stdin() {
        let runner = SubprocessRunner::new(cfg("sh", &["-c", "read line; test \"$line\" = hi"]));
        let cancel = CancellationToken::new();
        assert!(runner.exec(b"hi\n", &cancel).await.is_ok());
    }

    #[tokio::test]
    async fn cancellation_kills_a_long_running_child() {
        let runner = SubprocessRunner::new(cfg("sleep", &["10"]));
        let cancel = CancellationToken::new();
        let cancel2 = cancel.clone();

        let started = std::time::Instant::now();
        let handle = tokio::spawn(async move { runner.exec(b"", &cancel2).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let result = handle.await.unwrap();

        assert!(matches!(result, Err(RunError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn timeout_kills_a_child_that_overruns_its_deadline() {
        let runner = SubprocessRunner::new(
            cfg("sleep", &["10"]).with_timeout(Some(Duration::from_millis(50))),
        );
        let cancel = CancellationToken::new();
        let result = runner.exec(b"", &cancel).await;
        assert!(matches!(result, Err(RunError::TimedOut(_))));
    }
}
