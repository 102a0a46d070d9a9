// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The delete batcher (§4.7): groups acknowledgements into batches of at
//! most ten, sends them through a [`QueueClient`], and folds receipt-handle
//! races back into successes rather than surfacing them as failures.

use crate::{DeleteBatchResult, DeleteEntry, FailedDelete, QueueClient, QueueError};
use std::sync::Arc;

/// SQS's batch delete limit. `DeleteBatcher` never sends more than this
/// many entries in a single `delete_message_batch` call.
const MAX_BATCH_SIZE: usize = 10;

/// A failure code meaning the receipt handle is stale or the message is
/// already gone, functionally a success, since the outcome we wanted
/// (the message will not be redelivered) already holds.
fn is_benign(code: &str) -> bool {
    matches!(
        code,
        "ReceiptHandleIsInvalid" | "InvalidParameterValue" | "AWS.SimpleQueueService.NonExistentQueue"
    )
}

/// Batches deletes and tracks consecutive batch-level failures. If
/// `fail_max` is set and that many batches in a row come back with at
/// least one non-benign failure, the next `delete` call panics. This
/// hook is off by default (§9).
pub struct DeleteBatcher {
    client: Arc<dyn QueueClient>,
    queue_url: String,
    fail_max: Option<u32>,
    consecutive_failures: u32,
}

impl DeleteBatcher {
    pub fn new(client: Arc<dyn QueueClient>, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            fail_max: None,
            consecutive_failures: 0,
        }
    }

    pub fn with_fail_max(mut self, fail_max: Option<u32>) -> Self {
        self.fail_max = fail_max;
        self
    }

    /// Deletes `entries` in batches of up to ten, returning every entry
    /// that failed for a reason other than "it was already gone."
    ///
    /// # Panics
    ///
    /// Panics if `fail_max` is set and this call extends a run of
    /// non-benign batch failures past that limit.
    pub async fn delete(&mut self, entries: Vec<DeleteEntry>) -> Result<Vec<FailedDelete>, QueueError> {
        let mut failures = Vec::new();
        let mut any_non_benign = false;

        for chunk in entries.chunks(MAX_BATCH_SIZE) {
            let result = self
                .client
                .delete_message_batch(&self.queue_url, chunk.to_vec())
                .await?;
            let DeleteBatchResult { failed, .. } = result;
            for f in failed {
                if is_benign(&f.code) {
                    continue;
                }
                any_non_benign = true;
                failures.push(f);
            }
        }

        if any_non_benign {
            self.consecutive_failures += 1;
            if let Some(max) = self.fail_max {
                assert!(
                    self.consecutive_failures <= max,
                    "delete batcher exceeded {max} consecutive failing batches",
                );
            }
        } else {
            self.consecutive_failures = 0;
        }

        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use relayq_core::Message;

    struct StubClient {
        failed: Vec<FailedDelete>,
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl QueueClient for StubClient {
        async fn get_queue_url(&self, _name: &str, _create: bool) -> Result<String, QueueError> {
            unimplemented!()
        }

        async fn receive_messages(
            &self,
            _queue_url: &str,
            _max_count: u32,
            _wait_time_seconds: Option<u32>,
        ) -> Result<Vec<Message>, QueueError> {
            unimplemented!()
        }

        async fn delete_message_batch(
            &self,
            _queue_url: &str,
            entries: Vec<DeleteEntry>,
        ) -> Result<DeleteBatchResult, QueueError> {
            self.calls.lock().push(entries.len());
            Ok(DeleteBatchResult {
                succeeded: entries.iter().map(|e| e.id.clone()).collect(),
                failed: self.failed.clone(),
            })
        }
    }

    fn entries(n: usize) -> Vec<DeleteEntry> {
        (0..n)
            .map(|i| DeleteEntry { id: i.to_string(), receipt_handle: format!("rh-{i}") })
            .collect()
    }

    #[tokio::test]
    async fn splits_into_batches_of_ten() {
        let client = Arc::new(StubClient { failed: Vec::new(), calls: Mutex::new(Vec::new()) });
        let mut batcher = DeleteBatcher::new(client.clone(), "q");
        batcher.delete(entries(23)).await.unwrap();
        assert_eq!(*client.calls.lock(), vec![10, 10, 3]);
    }

    #[tokio::test]
    async fn stale_receipt_handle_is_not_reported_as_a_failure() {
        let failed = vec![FailedDelete {
            id: "0".into(),
            sender_fault: true,
            code: "ReceiptHandleIsInvalid".into(),
        }];
        let client = Arc::new(StubClient { failed, calls: Mutex::new(Vec::new()) });
        let mut batcher = DeleteBatcher::new(client, "q");
        let failures = batcher.delete(entries(1)).await.unwrap();
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn other_failure_codes_are_reported() {
        let failed = vec![FailedDelete {
            id: "0".into(),
            sender_fault: false,
            code: "InternalError".into(),
        }];
        let client = Arc::new(StubClient { failed, calls: Mutex::new(Vec::new()) });
        let mut batcher = DeleteBatcher::new(client, "q");
        let failures = batcher.delete(entries(1)).await.unwrap();
        assert_eq!(failures.len(), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "exceeded 1 consecutive failing batches")]
    async fn fail_max_panics_once_the_run_exceeds_the_limit() {
        let failed = vec![FailedDelete {
            id: "0".into(),
            sender_fault: false,
            code: "InternalError".into(),
        }];
        let client = Arc::new(StubClient { failed, calls: Mutex::new(Vec::new()) });
        let mut batcher = DeleteBatcher::new(client, "q").with_fail_max(Some(1));
        batcher.delete(entries(1)).await.unwrap();
        batcher.delete(entries(1)).await.unwrap();
    }

    #[tokio::test]
    async fn a_benign_failure_resets_the_consecutive_count() {
        let client = Arc::new(StubClient { failed: Vec::new(), calls: Mutex::new(Vec::new()) });
        let mut batcher = DeleteBatcher::new(client, "q").with_fail_max(Some(1));
        batcher.delete(entries(1)).await.unwrap();
        batcher.delete(entries(1)).await.unwrap();
        assert_eq!(batcher.consecutive_failures, 0);
    }
}
