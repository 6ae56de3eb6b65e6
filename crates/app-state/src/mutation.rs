//! Optimistic mutation bookkeeping
//!
//! A mutation is applied locally before its request is sent. The ledger
//! remembers, per key, the newest mutation in flight. A failed mutation only
//! rolls back if no newer mutation of the same key started after it and the
//! ledger was not reset in between. Resetting is how a fresh server snapshot
//! or a teardown invalidates every rollback still outstanding.

use std::collections::HashMap;
use std::time::Instant;

/// Mutation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// No mutation recorded
    Idle,

    /// Mutation is pending (optimistic update applied)
    Pending,

    /// Mutation succeeded
    Success,

    /// Mutation failed (rolled back)
    Error,
}

/// Optimistic update recorded for reconciliation
#[derive(Debug, Clone)]
pub struct OptimisticUpdate<P> {
    key: String,
    generation: u64,
    epoch: u64,
    previous: P,
    applied_at: Instant,
}

impl<P> OptimisticUpdate<P> {
    /// Key the update applies to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value held before the update was applied
    pub fn previous(&self) -> &P {
        &self.previous
    }

    /// Consume the update, returning the previous value
    pub fn into_previous(self) -> P {
        self.previous
    }

    /// When the update was applied
    pub fn applied_at(&self) -> Instant {
        self.applied_at
    }
}

/// Tracks optimistic mutations per key
#[derive(Debug, Default)]
pub struct MutationLedger {
    next_generation: u64,
    epoch: u64,
    in_flight: HashMap<String, u64>,
    outcomes: HashMap<String, MutationState>,
}

impl MutationLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation of `key`, remembering the `previous` value
    ///
    /// The new mutation supersedes any mutation of the same key still in
    /// flight.
    pub fn begin<P>(&mut self, key: impl Into<String>, previous: P) -> OptimisticUpdate<P> {
        let key = key.into();
        self.next_generation += 1;
        let generation = self.next_generation;

        self.in_flight.insert(key.clone(), generation);
        self.outcomes.insert(key.clone(), MutationState::Pending);

        OptimisticUpdate { key, generation, epoch: self.epoch, previous, applied_at: Instant::now() }
    }

    /// Check if `update` is still the newest mutation of its key
    pub fn is_current<P>(&self, update: &OptimisticUpdate<P>) -> bool {
        update.epoch == self.epoch
            && self
                .in_flight
                .get(&update.key)
                .is_some_and(|generation| *generation == update.generation)
    }

    /// Settle a successful mutation
    pub fn confirm<P>(&mut self, update: &OptimisticUpdate<P>) {
        if self.is_current(update) {
            self.in_flight.remove(&update.key);
            self.outcomes.insert(update.key.clone(), MutationState::Success);
        }
    }

    /// Settle a failed mutation
    ///
    /// Returns `true` if the caller should roll back to the previous value.
    /// A superseded or reset mutation returns `false`; its key now belongs to
    /// newer state.
    pub fn fail<P>(&mut self, update: &OptimisticUpdate<P>) -> bool {
        if !self.is_current(update) {
            return false;
        }

        self.in_flight.remove(&update.key);
        self.outcomes.insert(update.key.clone(), MutationState::Error);
        true
    }

    /// Number of mutations in flight
    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Check if a mutation of `key` is in flight
    pub fn is_pending(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Latest known state of mutations on `key`
    pub fn state(&self, key: &str) -> MutationState {
        self.outcomes.get(key).copied().unwrap_or(MutationState::Idle)
    }

    /// Forget every mutation; results of in-flight ones will be ignored
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.in_flight.clear();
        self.outcomes.clear();
    }
}
