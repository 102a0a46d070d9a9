// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential-with-jitter backoff for receive retries (§4.1).

use rand::Rng;
use std::time::Duration;

const BASE: Duration = Duration::from_millis(200);
/// `2^attempt - 1` is capped at 50, i.e. `attempt` saturates at 6 (2^6-1=63 -> capped to 50).
const MAX_MULTIPLIER: u64 = 50;

/// Full jitter backoff: `sleep = uniform(0, min(2^attempt - 1, 50) * 200ms)`.
///
/// `attempt` is 1-based (the first retry passes 1). Deterministic given an
/// injected `rng` so callers can test the bound without flakiness.
pub fn backoff_delay(attempt: u32, rng: &mut impl Rng) -> Duration {
    let multiplier = 2u64.saturating_pow(attempt).saturating_sub(1).min(MAX_MULTIPLIER);
    let max = BASE * multiplier as u32;
    if max.is_zero() {
        return Duration::ZERO;
    }
    let millis = rng.gen_range(0..=max.as_millis() as u64);
    Duration::from_millis(millis)
}
