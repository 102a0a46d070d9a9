// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The operator-visible flag surface (§6).

use clap::Parser;
use relayq_core::{DedupMode, RemovalPolicy};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "relayqd", version, about = "message-queue notifier")]
pub struct Cli {
    /// Queue name to poll.
    #[arg(long)]
    pub queue: String,

    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Override endpoint, for SQS-compatible local testing (e.g. localstack).
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub profile: Option<String>,

    /// Create the queue if it does not already exist.
    #[arg(long, default_value_t = false)]
    pub createqueue: bool,

    #[arg(long = "max-retries", default_value_t = 4)]
    pub max_retries: u32,

    /// `0` disables long-polling.
    #[arg(long = "wait-time-seconds", default_value_t = 0)]
    pub wait_time_seconds: u32,

    /// Concurrency cap, clamped to [1, 10] by `relayq-pool`.
    #[arg(long, default_value_t = 4)]
    pub workers: u32,

    /// Number of independent engine instances sharing one cache.
    #[arg(long, default_value_t = 1)]
    pub multiplier: u32,

    /// Per-command deadline, e.g. "30s". Unset means no deadline.
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    #[arg(long = "remove-policy", default_value = "succeed", value_parser = remove_policy_parser)]
    pub remove_policy: RemovalPolicy,

    /// `memory://?capacity=N` or `redis://[user:pass@]host[:port]/[db]?lifetime=..&prefix=..`
    #[arg(long, default_value = "memory://?capacity=0")]
    pub cache: String,

    #[arg(long = "dedup-by", default_value = "message-id", value_parser = dedup_mode_parser)]
    pub dedup_by: DedupMode,

    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// The program to invoke per message, fed the body on stdin.
    pub command: String,

    /// Arguments passed through to `command` verbatim, never through a shell.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command_args: Vec<String>,
}

impl Cli {
    pub fn command_program(&self) -> String {
        self.command.clone()
    }

    pub fn command_arguments(&self) -> Vec<String> {
        self.command_args.clone()
    }
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

fn remove_policy_parser(s: &str) -> Result<RemovalPolicy, String> {
    s.parse()
}

fn dedup_mode_parser(s: &str) -> Result<DedupMode, String> {
    s.parse()
}
