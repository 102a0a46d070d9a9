// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relayq-queue: the `QueueClient` contract (§6), its AWS SQS
//! implementation, and the batched delete pipeline (§4.7).

pub mod batcher;
pub mod sqs;

use async_trait::async_trait;
use relayq_core::Message;
use thiserror::Error;

/// One acknowledgement request: which delivery to delete, keyed by a
/// caller-chosen id used to correlate `Failed` entries back to the
/// message that raised them.
#[derive(Debug, Clone)]
pub struct DeleteEntry {
    pub id: String,
    pub receipt_handle: String,
}

/// A delete entry the queue rejected, with its reason code.
#[derive(Debug, Clone)]
pub struct FailedDelete {
    pub id: String,
    pub sender_fault: bool,
    pub code: String,
}

#[derive(Debug, Default)]
pub struct DeleteBatchResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedDelete>,
}

#[derive(Debug, Error)]
pub enum QueueError {
    /// `GetQueueURL` found no such queue (and `create_if_absent` was false).
    #[error("queue does not exist: {0}")]
    NotFound(String),
    /// Anything else: network failure, throttling, malformed response.
    /// Retriable per the receive-retry backoff in the engine (§4.1).
    #[error("queue error: {0}")]
    Other(String),
}

/// Narrow boundary over the remote queue protocol (SQS in this workspace,
/// but the engine never references `aws-sdk-sqs` directly).
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn get_queue_url(&self, name: &str, create_if_absent: bool) -> Result<String, QueueError>;

    /// `max_count` is clamped to the protocol's batch limit (10) by the
    /// implementation, not the caller.
    async fn receive_messages(
        &self,
        queue_url: &str,
        max_count: u32,
        wait_time_seconds: Option<u32>,
    ) -> Result<Vec<Message>, QueueError>;

    async fn delete_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<DeleteBatchResult, QueueError>;
}

pub use batcher::DeleteBatcher;
pub use sqs::SqsQueueClient;
