// src/debounce.rs

//! Per-key debounce timer table.
//!
//! Each pipeline instance owns one [`DebounceTable`]. Incoming change events
//! are folded per key (normally the changed path): scheduling a key that
//! already has a pending timer cancels the old timer and re-arms a fresh one
//! carrying the *latest* event (last-write-wins coalescing). When a timer
//! elapses without being superseded, a tick is delivered on the table's
//! channel and [`DebounceTable::take_settled`] yields the coalesced event
//! exactly once.
//!
//! Two different keys never interfere; two different tables (pipelines)
//! never share timers.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::watch::ChangeEvent;

/// Identity used to group bursts of events into one scheduled action.
pub type DebounceKey = String;

/// Sent on the table's channel when a debounce window elapses.
///
/// The generation lets the owner reject ticks from timers that were
/// superseded after the tick was already in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledTick {
    pub key: DebounceKey,
    pub generation: u64,
}

struct PendingTimer {
    generation: u64,
    event: ChangeEvent,
    handle: JoinHandle<()>,
}

/// At most one live timer per key; owned exclusively by one pipeline loop.
pub struct DebounceTable {
    delay: Duration,
    next_generation: u64,
    pending: HashMap<DebounceKey, PendingTimer>,
    tick_tx: mpsc::UnboundedSender<SettledTick>,
}

impl DebounceTable {
    /// Create a table with the given quiet window, plus the receiver the
    /// owning loop selects on for elapsed timers.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<SettledTick>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                next_generation: 0,
                pending: HashMap::new(),
                tick_tx,
            },
            tick_rx,
        )
    }

    /// Cancel any pending timer for `key` and arm a fresh one carrying
    /// `event`.
    ///
    /// Repeated calls within the window collapse into a single eventual
    /// settle using the last call's event. A `Deleted` event debounces like
    /// any other kind; the distinction is handled by the pipeline executor.
    pub fn schedule(&mut self, key: impl Into<DebounceKey>, event: ChangeEvent) {
        let key = key.into();

        if let Some(old) = self.pending.remove(&key) {
            old.handle.abort();
            debug!(key = %key, "superseding pending debounce timer");
        }

        self.next_generation += 1;
        let generation = self.next_generation;

        let tick_tx = self.tick_tx.clone();
        let tick_key = key.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The owner may already have dropped the receiver on shutdown.
            let _ = tick_tx.send(SettledTick {
                key: tick_key,
                generation,
            });
        });

        self.pending.insert(
            key,
            PendingTimer {
                generation,
                event,
                handle,
            },
        );
    }

    /// Resolve an elapsed-timer tick into its coalesced event.
    ///
    /// Returns `None` for stale ticks (the key was rescheduled after the
    /// timer fired but before the tick was consumed), so an action never
    /// runs twice for one window and never runs with superseded data.
    pub fn take_settled(&mut self, tick: &SettledTick) -> Option<ChangeEvent> {
        match self.pending.get(&tick.key) {
            Some(pending) if pending.generation == tick.generation => {
                let pending = self.pending.remove(&tick.key)?;
                Some(pending.event)
            }
            _ => {
                debug!(key = %tick.key, "ignoring stale debounce tick");
                None
            }
        }
    }

    /// Cancel every outstanding timer without invoking any action.
    ///
    /// For process shutdown.
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }

    /// Number of currently armed timers.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for DebounceTable {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
