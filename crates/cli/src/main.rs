// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relayqd`: the message-queue notifier binary.

mod cli;
mod config;
mod logging;
mod supervisor;

use clap::Parser;
use cli::Cli;
use relayq_cache::Cache;
use relayq_engine::{EngineConfig, ProcessingEngine};
use relayq_pool::WorkerPool;
use relayq_queue::{DeleteBatcher, QueueClient};
use relayq_runner::{RunnerConfig, SubprocessRunner};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _logging_guard = logging::init(&cli.log_level, cli.log_file.as_deref());

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            tracing::error!(error = %err, "relayqd exiting with an unrecoverable error");
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    config::validate(&cli)?;

    let cache = config::open_configured_cache(&cli)?;
    let queue = config::connect_queue(&cli).await;
    let queue_url = config::resolve_queue_url(queue.as_ref(), &cli).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    let mut engines = build_engines(&cli, queue, queue_url, cache);

    if engines.len() == 1 {
        let mut engine = engines.remove(0);
        engine.run(cancel).await?;
    } else {
        supervisor::run(engines, cancel).await?;
    }

    Ok(())
}

fn build_engines(
    cli: &Cli,
    queue: Arc<dyn QueueClient>,
    queue_url: String,
    cache: Arc<dyn Cache>,
) -> Vec<ProcessingEngine> {
    let runner_config = RunnerConfig::new(cli.command_program(), cli.command_arguments())
        .with_timeout(cli.timeout);

    let config = EngineConfig {
        policy: cli.remove_policy,
        dedup_mode: cli.dedup_by,
        max_retries: cli.max_retries,
        wait_time_seconds: cli.wait_time_seconds,
    };

    (0..cli.multiplier)
        .map(|_| {
            let runner = SubprocessRunner::new(runner_config.clone());
            let pool = WorkerPool::new(cli.workers);
            let batcher = DeleteBatcher::new(queue.clone(), queue_url.clone());
            ProcessingEngine::new(
                queue.clone(),
                queue_url.clone(),
                cache.clone(),
                runner,
                pool,
                batcher,
                config,
            )
        })
        .collect()
}
