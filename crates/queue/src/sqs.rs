// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The AWS SQS-backed [`QueueClient`].

use crate::{DeleteBatchResult, DeleteEntry, FailedDelete, QueueClient, QueueError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, Message as SqsMessage};
use aws_sdk_sqs::Client;
use relayq_core::Message;

/// SQS's receive-message batch limit.
const MAX_RECEIVE_COUNT: i32 = 10;

#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub profile: Option<String>,
}

pub struct SqsQueueClient {
    client: Client,
}

impl SqsQueueClient {
    pub async fn connect(endpoint: Endpoint) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = endpoint.region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = endpoint.profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        let mut builder = aws_sdk_sqs::config::Builder::from(&config);
        if let Some(url) = endpoint.endpoint_url {
            builder = builder.endpoint_url(url);
        }
        Self { client: Client::from_conf(builder.build()) }
    }

    fn to_message(raw: SqsMessage) -> Option<Message> {
        let id = raw.message_id?;
        let receipt_handle = raw.receipt_handle?;
        let body = raw.body.unwrap_or_default().into_bytes();
        Some(Message::new(id, receipt_handle, body))
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn get_queue_url(&self, name: &str, create_if_absent: bool) -> Result<String, QueueError> {
        let existing = self.client.get_queue_url().queue_name(name).send().await;
        match existing {
            Ok(output) => output
                .queue_url
                .ok_or_else(|| QueueError::Other("GetQueueUrl returned no url".into())),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_queue_does_not_exist())
                    .unwrap_or(false);
                if not_found && create_if_absent {
                    let created = self
                        .client
                        .create_queue()
                        .queue_name(name)
                        .send()
                        .await
                        .map_err(|e| QueueError::Other(e.to_string()))?;
                    created
                        .queue_url
                        .ok_or_else(|| QueueError::Other("CreateQueue returned no url".into()))
                } else if not_found {
                    Err(QueueError::NotFound(name.to_string()))
                } else {
                    Err(QueueError::Other(err.to_string()))
                }
            }
        }
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        max_count: u32,
        wait_time_seconds: Option<u32>,
    ) -> Result<Vec<Message>, QueueError> {
        let max_count = (max_count as i32).clamp(1, MAX_RECEIVE_COUNT);
        let mut request = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_count);
        if let Some(wait) = wait_time_seconds {
            request = request.wait_time_seconds(wait.clamp(0, 20) as i32);
        }
        let output = request.send().await.map_err(|e| QueueError::Other(e.to_string()))?;
        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(Self::to_message)
            .collect())
    }

    async fn delete_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<DeleteBatchResult, QueueError> {
        let request_entries: Vec<DeleteMessageBatchRequestEntry> = entries
            .iter()
            .map(|entry| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(entry.id.clone())
                    .receipt_handle(entry.receipt_handle.clone())
                    .build()
                    .map_err(|e| QueueError::Other(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let output = self
            .client
            .delete_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|e| QueueError::Other(e.to_string()))?;

        let succeeded = output
            .successful
            .into_iter()
            .map(|e| e.id)
            .collect();
        let failed = output
            .failed
            .into_iter()
            .map(|e| FailedDelete { id: e.id, sender_fault: e.sender_fault, code: e.code })
            .collect();

        Ok(DeleteBatchResult { succeeded, failed })
    }
}
