// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message model received from the queue.

use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque, server-assigned identifier. Unique within one visibility window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token required to acknowledge a message. May change on re-receive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single message received from the queue.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub receipt_handle: ReceiptHandle,
    pub body: Vec<u8>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id: MessageId::new(id),
            receipt_handle: ReceiptHandle::new(receipt_handle),
            body: body.into(),
        }
    }

    /// SHA-256 digest of the body, hex-encoded. Computed locally since the
    /// queue protocol abstracted behind `QueueClient` does not surface one.
    pub fn body_hash(&self) -> DedupKey {
        let digest = Sha256::digest(&self.body);
        DedupKey(format!("{digest:x}"))
    }

    /// The dedup key under the configured [`DedupMode`].
    pub fn dedup_key(&self, mode: DedupMode) -> DedupKey {
        match mode {
            DedupMode::MessageId => DedupKey(self.id.as_str().to_owned()),
            DedupMode::BodyDigest => self.body_hash(),
        }
    }
}

/// Which identity the dedup cache claims uniqueness under.
///
/// Behavior is identical either way; only the key fed to the cache differs,
/// so the cache itself never needs to know which mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupMode {
    /// Use the queue-assigned message id (default).
    #[default]
    MessageId,
    /// Use a digest of the message body, so redeliveries of identical
    /// content dedup even when the queue hands out a fresh id.
    BodyDigest,
}

impl std::str::FromStr for DedupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message-id" => Ok(DedupMode::MessageId),
            "body-digest" => Ok(DedupMode::BodyDigest),
            other => Err(format!("unknown dedup mode: {other}")),
        }
    }
}

/// The identity under which the cache claims uniqueness for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DedupKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_by_message_id() {
        let m = Message::new("abc", "rh-1", b"hello".to_vec());
        assert_eq!(m.dedup_key(DedupMode::MessageId).as_str(), "abc");
    }

    #[test]
    fn dedup_mode_parses_known_names() {
        assert_eq!("message-id".parse(), Ok(DedupMode::MessageId));
        assert_eq!("body-digest".parse(), Ok(DedupMode::BodyDigest));
        assert!("bogus".parse::<DedupMode>().is_err());
    }

    #[test]
    fn dedup_key_by_body_digest_is_stable() {
        let a = Message::new("id-a", "rh-1", b"same body".to_vec());
        let b = Message::new("id-b", "rh-2", b"same body".to_vec());
        assert_eq!(
            a.dedup_key(DedupMode::BodyDigest),
            b.dedup_key(DedupMode::BodyDigest)
        );
    }

    #[test]
    fn body_digest_differs_for_different_bodies() {
        let a = Message::new("id", "rh", b"one".to_vec());
        let b = Message::new("id", "rh", b"two".to_vec());
        assert_ne!(a.body_hash(), b.body_hash());
    }
}
