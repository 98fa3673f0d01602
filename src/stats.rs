//! Advisory debug counters.
//!
//! Removal touches three bookkeeping structures; a miss in any of them is
//! not an error the caller can act on, so it is counted here instead of
//! raised. Counters are process-wide, relaxed, and purely advisory.

use std::sync::atomic::{AtomicU64, Ordering};

static REMOVE_UNKNOWN: AtomicU64 = AtomicU64::new(0);
static REMOVE_TABLE_MISS: AtomicU64 = AtomicU64::new(0);
static REMOVE_ENTRY_MISS: AtomicU64 = AtomicU64::new(0);

pub(crate) fn note_remove_unknown() {
    REMOVE_UNKNOWN.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_remove_table_miss() {
    REMOVE_TABLE_MISS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_remove_entry_miss() {
    REMOVE_ENTRY_MISS.fetch_add(1, Ordering::Relaxed);
}

/// Snapshot of the removal bookkeeping counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveMisses {
    /// Remove of a fingerprint the identity map never held.
    pub unknown_hash: u64,
    /// A block table had no posting list for the expected block value.
    pub missing_table: u64,
    /// A posting list existed but did not hold the expected slot.
    pub missing_entry: u64,
}

/// Read the current counter values.
#[must_use]
pub fn remove_misses() -> RemoveMisses {
    RemoveMisses {
        unknown_hash: REMOVE_UNKNOWN.load(Ordering::Relaxed),
        missing_table: REMOVE_TABLE_MISS.load(Ordering::Relaxed),
        missing_entry: REMOVE_ENTRY_MISS.load(Ordering::Relaxed),
    }
}

/// Zero all counters. Intended for tests and debug tooling.
pub fn reset() {
    REMOVE_UNKNOWN.store(0, Ordering::Relaxed);
    REMOVE_TABLE_MISS.store(0, Ordering::Relaxed);
    REMOVE_ENTRY_MISS.store(0, Ordering::Relaxed);
}
