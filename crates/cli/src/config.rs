// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-up validation and client construction. Every error here is fatal
//! before any engine instance starts (§7).

use crate::cli::Cli;
use relayq_cache::{open_cache, Cache, CacheError};
use relayq_queue::sqs::{Endpoint, SqsQueueClient};
use relayq_queue::{QueueClient, QueueError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--queue must not be empty")]
    MissingQueue,
    #[error("--workers must be at least 1")]
    InvalidWorkers,
    #[error("--multiplier must be at least 1")]
    InvalidMultiplier,
    #[error("invalid --cache URL: {0}")]
    InvalidCache(#[from] CacheError),
    #[error("could not resolve queue: {0}")]
    Queue(#[from] QueueError),
}

/// Catches the flag combinations that are nonsensical before any network
/// call is made, so a typo surfaces immediately instead of after a
/// credential round-trip.
pub fn validate(cli: &Cli) -> Result<(), ConfigError> {
    if cli.queue.trim().is_empty() {
        return Err(ConfigError::MissingQueue);
    }
    if cli.workers == 0 {
        return Err(ConfigError::InvalidWorkers);
    }
    if cli.multiplier == 0 {
        return Err(ConfigError::InvalidMultiplier);
    }
    Ok(())
}

pub fn open_configured_cache(cli: &Cli) -> Result<Arc<dyn Cache>, ConfigError> {
    Ok(open_cache(&cli.cache)?)
}

pub async fn connect_queue(cli: &Cli) -> Arc<dyn QueueClient> {
    let endpoint = Endpoint {
        region: Some(cli.region.clone()),
        endpoint_url: cli.endpoint.clone(),
        profile: cli.profile.clone(),
    };
    Arc::new(SqsQueueClient::connect(endpoint).await)
}

pub async fn resolve_queue_url(
    client: &dyn QueueClient,
    cli: &Cli,
) -> Result<String, ConfigError> {
    Ok(client.get_queue_url(&cli.queue, cli.createqueue).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["relayqd"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["handler.sh"]);
        Cli::parse_from(full)
    }

    #[test]
    fn rejects_a_zero_worker_count() {
        let c = cli(&["--queue", "q", "--workers", "0"]);
        assert!(matches!(validate(&c), Err(ConfigError::InvalidWorkers)));
    }

    #[test]
    fn rejects_a_zero_multiplier() {
        let c = cli(&["--queue", "q", "--multiplier", "0"]);
        assert!(matches!(validate(&c), Err(ConfigError::InvalidMultiplier)));
    }

    #[test]
    fn rejects_an_empty_queue_name() {
        let c = cli(&["--queue", " "]);
        assert!(matches!(validate(&c), Err(ConfigError::MissingQueue)));
    }

    #[test]
    fn accepts_defaults() {
        let c = cli(&["--queue", "q"]);
        assert!(validate(&c).is_ok());
    }
}
