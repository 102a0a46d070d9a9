// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parse the `--cache` flag into a concrete [`Cache`] implementation.
//!
//! Two schemes: `memory://?capacity=N` and
//! `redis://[user:pass@]host[:port]/[db]?lifetime=..&prefix=..`.

use crate::{Cache, CacheError, MemoryCache, RedisCache};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PREFIX: &str = "relayq:";
const DEFAULT_LIFETIME_SECS: u64 = 3600;

pub fn open_cache(spec: &str) -> Result<Arc<dyn Cache>, CacheError> {
    let parsed = url::Url::parse(spec).map_err(|e| CacheError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "memory" => {
            let capacity = parsed
                .query_pairs()
                .find(|(k, _)| k == "capacity")
                .map(|(_, v)| v.parse::<usize>())
                .transpose()
                .map_err(|e| CacheError::InvalidUrl(format!("capacity: {e}")))?
                .unwrap_or(0);
            Ok(Arc::new(MemoryCache::new(capacity)))
        }
        "redis" => {
            let prefix = parsed
                .query_pairs()
                .find(|(k, _)| k == "prefix")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
            let lifetime = parsed
                .query_pairs()
                .find(|(k, _)| k == "lifetime")
                .map(|(_, v)| v.parse::<u64>())
                .transpose()
                .map_err(|e| CacheError::InvalidUrl(format!("lifetime: {e}")))?
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(DEFAULT_LIFETIME_SECS));

            // Redis connection URLs don't carry our query params; strip them
            // before handing the URL to the client.
            let mut conn_url = parsed.clone();
            conn_url.set_query(None);
            Ok(Arc::new(RedisCache::new(conn_url.as_str(), prefix, lifetime)?))
        }
        other => Err(CacheError::InvalidUrl(format!("unsupported cache scheme: {other}"))),
    }
}
