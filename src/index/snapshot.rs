//! Read-copy-update publication for a shared [`HammingIndex`].
//!
//! Queries are the hot path and must never block on a writer. The handle
//! therefore never mutates a published index: a writer clones the current
//! snapshot, mutates its private copy, and publishes it by swapping the
//! shared `Arc`. Readers take one `Arc` per query and keep using their
//! snapshot for as long as they hold it; a superseded snapshot is freed
//! when its last reader drops out.
//!
//! ```
//! use proxim::{FuzzyHash, HammingIndex, IndexConfig, SnapshotHandle};
//!
//! # fn main() -> proxim::Result<()> {
//! let index = HammingIndex::new(IndexConfig {
//!     hash_size: 256,
//!     max_distance: 35,
//!     use_multiindex: true,
//! })?;
//! let handle = SnapshotHandle::new(index);
//!
//! let hash = FuzzyHash::from_hex(&"00".repeat(32))?;
//! handle.update(|index| {
//!     index.add(hash.clone());
//! });
//!
//! let snapshot = handle.load();
//! assert!(snapshot.contains(&hash));
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, RwLock};

use super::HammingIndex;

/// Shared handle to the currently published index snapshot.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: RwLock<Arc<HammingIndex>>,
}

impl SnapshotHandle {
    /// Publish an initial index.
    #[must_use]
    pub fn new(index: HammingIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// The current snapshot. Call once per query and keep the `Arc` for
    /// the query's duration; later publications do not affect it.
    #[must_use]
    pub fn load(&self) -> Arc<HammingIndex> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock only means a writer panicked mid-swap; the
            // stored Arc itself is always a complete snapshot.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Publish a replacement snapshot, retiring the previous one once its
    /// readers finish.
    pub fn publish(&self, index: HammingIndex) {
        let next = Arc::new(index);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Clone the current snapshot, apply `mutate` to the private copy, and
    /// publish the result.
    ///
    /// Intended for a single logical writer; concurrent `update` calls do
    /// not corrupt the handle but the last publication wins.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut HammingIndex),
    {
        let mut next = self.load().dup();
        mutate(&mut next);
        self.publish(next);
    }
}
