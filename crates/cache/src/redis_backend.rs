// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis-backed remote cache, for coordinating multiple `relayq` instances.

use crate::{Cache, CacheError, InsertOutcome, UpdateOutcome};
use async_trait::async_trait;
use redis::AsyncCommands;
use relayq_core::{DedupKey, Stage};
use std::time::Duration;

/// Key = `prefix + id`; value = the single-byte stage encoding from
/// [`relayq_core::Stage::to_byte`]. Lifetime is the remote store's TTL.
pub struct RedisCache {
    client: redis::Client,
    prefix: String,
    lifetime: Duration,
}

impl RedisCache {
    pub fn new(url: &str, prefix: impl Into<String>, lifetime: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(Self { client, prefix: prefix.into(), lifetime })
    }

    fn key(&self, id: &DedupKey) -> String {
        format!("{}{}", self.prefix, id.as_str())
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn insert(&self, id: &DedupKey, stage: Stage) -> Result<InsertOutcome, CacheError> {
        if stage.is_none() {
            return Ok(InsertOutcome::Ok);
        }
        let mut conn = self.conn().await?;
        let key = self.key(id);
        let ttl = self.lifetime.as_secs().max(1);
        let set: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(stage.to_byte())
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(if set.is_some() { InsertOutcome::Ok } else { InsertOutcome::Found })
    }

    async fn update(&self, id: &DedupKey, stage: Stage) -> Result<UpdateOutcome, CacheError> {
        if stage.is_none() {
            return Ok(UpdateOutcome::Ok);
        }
        let mut conn = self.conn().await?;
        let key = self.key(id);
        let ttl = self.lifetime.as_secs().max(1);
        let set: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(stage.to_byte())
            .arg("XX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(if set.is_some() { UpdateOutcome::Ok } else { UpdateOutcome::NotFound })
    }

    async fn delete(&self, id: &DedupKey) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        let key = self.key(id);
        let _: () = conn.del(&key).await.map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }
}
