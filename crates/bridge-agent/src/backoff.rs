// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry backoff for the HTTP sink (§4.5): base 500 ms, factor 2, cap 10 s,
//! jitter ±250 ms. Mirrors the shape of the bridge manager's reconnect
//! backoff in `patze-adapters`, with this subsystem's own constants.

use std::time::Duration;

use rand::Rng;

const BASE: Duration = Duration::from_millis(500);
const FACTOR: u32 = 2;
const CAP: Duration = Duration::from_secs(10);
const JITTER: Duration = Duration::from_millis(250);

/// Delay before the `attempt`-th retry (1-indexed), doubling from `base`,
/// capped, then jittered by up to ±250 ms (never below zero).
pub fn delay_for_attempt(attempt: u32) -> Duration {
    let multiplier = FACTOR.saturating_pow(attempt.saturating_sub(1));
    let base = BASE.saturating_mul(multiplier).min(CAP);
    let jitter_ms = rand::thread_rng().gen_range(0..=JITTER.as_millis() as i64 * 2) - JITTER.as_millis() as i64;
    let total_ms = (base.as_millis() as i64 + jitter_ms).max(0) as u64;
    Duration::from_millis(total_ms)
}

/// Whether an HTTP status or transport failure counts as transient
/// (§4.5: "HTTP ≥ 500 or 429 or network error").
pub fn is_transient_status(status: Option<u16>) -> bool {
    match status {
        Some(code) => code >= 500 || code == 429,
        None => true,
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
