//! Per-index operation counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics so read paths (`&self`) can count too

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operation counters owned by a single index
#[derive(Debug, Default)]
pub struct IndexMetrics {
    inserts: AtomicU64,
    updates: AtomicU64,
    lookups: AtomicU64,
    lookup_misses: AtomicU64,
    deletes: AtomicU64,
    rotations: AtomicU64,
    resizes: AtomicU64,
    probe_cutoffs: AtomicU64,
}

impl IndexMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new key was stored
    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// An existing key's value was overwritten
    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    /// A lookup ran; `hit` is whether it found a value
    pub fn record_lookup(&self, hit: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.lookup_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A live key was removed
    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resize(&self) {
        self.resizes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe_cutoff(&self) {
        self.probe_cutoffs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    pub fn resizes(&self) -> u64 {
        self.resizes.load(Ordering::Relaxed)
    }

    pub fn probe_cutoffs(&self) -> u64 {
        self.probe_cutoffs.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            rotations: self.rotations(),
            resizes: self.resizes(),
            probe_cutoffs: self.probe_cutoffs(),
        }
    }
}

/// Serializable counter values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub updates: u64,
    pub lookups: u64,
    pub lookup_misses: u64,
    pub deletes: u64,
    pub rotations: u64,
    pub resizes: u64,
    pub probe_cutoffs: u64,
}
