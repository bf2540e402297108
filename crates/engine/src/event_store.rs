// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only bounded event log with fan-out subscription (§4.2).
//!
//! Whether bulk eviction should itself emit a `store.evicted` telemetry
//! event is left open upstream; this store silently drops the oldest
//! entries, same as today, and the decision is tracked in DESIGN.md rather
//! than resolved here.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;
use patze_core::Envelope;
use tokio::sync::broadcast;

/// Default bound on retained events (§4.2).
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Broadcast channel depth. Independent of `capacity`: this only bounds how
/// far a slow subscriber may lag before it starts missing events; it does
/// not affect what `events_since` can still replay from the retained log.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 4_096;

pub struct EventStore {
    capacity: usize,
    events: Mutex<VecDeque<Envelope>>,
    seen: Mutex<HashSet<(String, String)>>,
    tx: broadcast::Sender<Envelope>,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            seen: Mutex::new(HashSet::new()),
            tx,
        }
    }

    /// Append one event, evicting the oldest entries in bulk if the bound is
    /// exceeded, then broadcast it to subscribers.
    ///
    /// Returns `None` without appending or broadcasting when `event`'s
    /// `(machineId, id)` pair (§3.1) has already been seen — the dedup key
    /// a sink retry after a successful-but-unacknowledged POST would
    /// otherwise double-append and double-project (§8.2).
    pub fn append(&self, event: Envelope) -> Option<Envelope> {
        let key = event.dedup_key();
        {
            let mut seen = self.seen.lock();
            if !seen.insert(key) {
                return None;
            }
        }
        {
            let mut events = self.events.lock();
            events.push_back(event.clone());
            while events.len() > self.capacity {
                if let Some(evicted) = events.pop_front() {
                    self.seen.lock().remove(&evicted.dedup_key());
                }
            }
        }
        // A subscriber that has no receiver yet, or has lagged past the
        // channel depth, simply misses the broadcast; append itself never
        // blocks or fails on their account (§4.2 ordering guarantee).
        let _ = self.tx.send(event.clone());
        Some(event)
    }

    /// Append all events in order, broadcasting each in turn. Duplicates are
    /// silently dropped from the returned vec, same as a single `append`.
    pub fn append_many(&self, events: Vec<Envelope>) -> Vec<Envelope> {
        events.into_iter().filter_map(|e| self.append(e)).collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events with `id` strictly greater than `last_event_id`, in store
    /// order, for SSE resume (§4.4). Returns `None` when `last_event_id` is
    /// no longer within the retained window, signaling the caller must ask
    /// the client to refetch `/snapshot` instead of replaying partial
    /// history (§9 open question, resolved here: no replay beyond the
    /// retained log, ever returned implicitly as a refetch signal).
    pub fn events_since(&self, last_event_id: Option<&str>) -> Option<Vec<Envelope>> {
        let events = self.events.lock();
        let Some(last_id) = last_event_id else {
            return Some(events.iter().cloned().collect());
        };
        match events.iter().position(|e| e.id.as_str() == last_id) {
            Some(idx) => Some(events.iter().skip(idx + 1).cloned().collect()),
            None => None,
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "event_store_tests.rs"]
mod tests;
