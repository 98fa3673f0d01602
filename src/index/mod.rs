//! Nearest-neighbor index for fingerprints in the Hamming space.
//!
//! [`HammingIndex`] stores a dynamic set of equal-width fingerprints and
//! answers "which stored fingerprint differs from this one in the fewest
//! bits". Two strategies are available:
//!
//! - **Brute force**: scan every stored fingerprint. Simple, cache
//!   friendly, and measured faster on sets up to a few million entries.
//! - **Multi-index**: split each fingerprint into `max_distance + 1`
//!   blocks and key a posting table per block position. Two fingerprints
//!   within distance `r` differ in at most `r` of the `r + 1` blocks, so
//!   they must agree on at least one — any true match within the radius is
//!   reachable through some block probe. Matches beyond the radius may be
//!   missed; within it, the pigeonhole guarantee is exact.
//!
//! The strategy is chosen at construction; a query makes one indirect call
//! with no per-query branching.
//!
//! ## Writers and readers
//!
//! A single instance is single-writer: `add`/`remove` and friends must not
//! run concurrently with anything else on the same instance. Reads
//! (`contains`, `shortest_distance`) may run in parallel with each other.
//! For concurrent updates, clone the index with [`HammingIndex::dup`],
//! mutate the private copy, and publish it through a
//! [`SnapshotHandle`](crate::SnapshotHandle).
//!
//! ## References
//!
//! - Gog & Venturini (2016). "Fast and compact Hamming distance index"
//! - Norouzi, Punjani & Fleet (2014). "Fast exact search in Hamming space
//!   with multi-index hashing"

mod blocks;
pub mod snapshot;

use std::collections::HashMap;

use crate::fingerprint::FuzzyHash;
use crate::{stats, ProximError, Result};

use blocks::BlockTables;

/// Configuration for a [`HammingIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexConfig {
    /// Fingerprint width in bits; must be a multiple of 64.
    pub hash_size: usize,
    /// The Hamming radius the index is tuned for.
    pub max_distance: usize,
    /// Select the pigeonhole strategy instead of brute force.
    pub use_multiindex: bool,
}

/// Block geometry derived from an [`IndexConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Number of blocks, `max_distance + 1`.
    pub blocks: usize,
    /// Width of each block in bits.
    pub block_size: usize,
    /// Width of the trailing block; exceeds `block_size` when the hash
    /// width is not an exact multiple of the block count.
    pub last_block_size: usize,
    /// Every `block_size`-bit selection out of the trailing block's bits.
    ///
    /// Probing these selections would extend the radius guarantee to the
    /// full trailing block; the current probe uses only its low
    /// `block_size` bits.
    pub last_block_combinations: Vec<Vec<usize>>,
}

impl BlockGeometry {
    fn derive(config: &IndexConfig) -> Result<Self> {
        if config.hash_size == 0 || config.hash_size % 64 != 0 {
            return Err(ProximError::BadHashSize {
                bits: config.hash_size,
                reason: "width must be a positive multiple of 64",
            });
        }
        let blocks = config.max_distance + 1;
        if blocks > 255 {
            return Err(ProximError::TooManyBlocks {
                max_distance: config.max_distance,
                blocks,
            });
        }
        let block_size = config.hash_size / blocks;
        if block_size > 16 {
            return Err(ProximError::BadHashSize {
                bits: config.hash_size,
                reason: "block value would exceed 16 bits; raise max_distance",
            });
        }
        let mut last_block_size = block_size;
        if blocks * block_size < config.hash_size {
            last_block_size = config.hash_size - (blocks - 1) * block_size;
        }
        Ok(Self {
            blocks,
            block_size,
            last_block_size,
            last_block_combinations: combinations(last_block_size, block_size),
        })
    }

    /// Mask selecting the low `block_size` bits.
    #[inline]
    fn block_mask(&self) -> u64 {
        (1u64 << self.block_size) - 1
    }
}

/// All `k`-element selections out of `0..n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        out.push(current.clone());
        // Rightmost position that can still advance.
        let Some(i) = (0..k).rev().find(|&i| current[i] < n - k + i) else {
            return out;
        };
        current[i] += 1;
        for j in i + 1..k {
            current[j] = current[j - 1] + 1;
        }
    }
}

/// A stored fingerprint reported as a query's nearest neighbor, with its
/// Hamming distance to the query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sibling {
    /// The stored fingerprint.
    pub hash: FuzzyHash,
    /// Its Hamming distance to the query.
    pub distance: usize,
}

type SearchFn = fn(&HammingIndex, &FuzzyHash) -> Option<Sibling>;

/// A dynamic set of fingerprints with nearest-neighbor queries under the
/// Hamming metric.
#[derive(Debug, Clone)]
pub struct HammingIndex {
    config: IndexConfig,
    geometry: BlockGeometry,
    /// Stored fingerprints by insertion slot; removal leaves a tombstone
    /// so slots stay stable and are never reused.
    slots: Vec<Option<FuzzyHash>>,
    /// Exact-match map from fingerprint content to its slot.
    identity: HashMap<FuzzyHash, u32>,
    tables: BlockTables,
    search: SearchFn,
}

impl HammingIndex {
    /// Create an empty index.
    ///
    /// Fails when the width is not a positive multiple of 64, when the
    /// radius needs more than 255 blocks, or when blocks would be wider
    /// than the 16-bit block value limit.
    pub fn new(config: IndexConfig) -> Result<Self> {
        let geometry = BlockGeometry::derive(&config)?;
        let search: SearchFn = if config.use_multiindex {
            Self::search_multi_index
        } else {
            Self::search_brute_force
        };
        Ok(Self {
            config,
            geometry,
            slots: Vec::new(),
            identity: HashMap::new(),
            tables: BlockTables::new(),
            search,
        })
    }

    /// The configuration the index was built with.
    #[must_use]
    pub fn config(&self) -> IndexConfig {
        self.config
    }

    /// The derived block geometry.
    #[must_use]
    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    /// Number of slots in the fingerprint array, tombstones included.
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Whether an equal fingerprint is stored.
    #[must_use]
    pub fn contains(&self, hash: &FuzzyHash) -> bool {
        self.identity.contains_key(hash)
    }

    /// Insert a fingerprint. Returns `false` if an equal one is already
    /// stored.
    pub fn add(&mut self, hash: FuzzyHash) -> bool {
        if self.identity.contains_key(&hash) {
            return false;
        }
        let slot = self.slots.len() as u32;
        if self.config.use_multiindex {
            // Extraction shifts the vector in place, so work on a copy.
            let mut probe = hash.clone();
            let mask = self.geometry.block_mask();
            for block in 0..self.geometry.blocks {
                self.tables.insert(block, probe.and_last(mask) as u16, slot);
                probe.rsh(self.geometry.block_size as u32);
            }
        }
        self.identity.insert(hash.clone(), slot);
        self.slots.push(Some(hash));
        true
    }

    /// Remove a fingerprint. Returns `false` if it was not stored.
    ///
    /// The slot is tombstoned rather than compacted, keeping every other
    /// slot stable for snapshots still scanning the array.
    pub fn remove(&mut self, hash: &FuzzyHash) -> bool {
        let Some(slot) = self.identity.remove(hash) else {
            stats::note_remove_unknown();
            return false;
        };
        if self.config.use_multiindex {
            let mut probe = hash.clone();
            let mask = self.geometry.block_mask();
            for block in 0..self.geometry.blocks {
                self.tables.remove(block, probe.and_last(mask) as u16, slot);
                probe.rsh(self.geometry.block_size as u32);
            }
        }
        self.slots[slot as usize] = None;
        true
    }

    /// Insert each fingerprint; `true` only if every insert was new.
    pub fn add_bulk<I>(&mut self, hashes: I) -> bool
    where
        I: IntoIterator<Item = FuzzyHash>,
    {
        let mut all = true;
        for hash in hashes {
            all &= self.add(hash);
        }
        all
    }

    /// Remove each fingerprint; `true` only if every one was stored.
    pub fn remove_bulk<'a, I>(&mut self, hashes: I) -> bool
    where
        I: IntoIterator<Item = &'a FuzzyHash>,
    {
        let mut all = true;
        for hash in hashes {
            all &= self.remove(hash);
        }
        all
    }

    /// Forget every stored fingerprint.
    ///
    /// Reinitializes the identity map and block tables; the slot array is
    /// left as-is until the next full rebuild.
    pub fn remove_all(&mut self) {
        self.identity.clear();
        self.tables.clear();
    }

    /// The stored fingerprint closest to `hash`, with its distance.
    ///
    /// An exact match short-circuits at distance 0. Otherwise the
    /// configured strategy runs; `None` means no candidate improved on the
    /// initial best distance of the full hash width (in particular, the
    /// index was empty or no block probe produced candidates).
    ///
    /// With the multi-index strategy the result is exact for any stored
    /// fingerprint within `max_distance` of the query; beyond the radius
    /// the reported sibling may not be the global minimum.
    #[must_use]
    pub fn shortest_distance(&self, hash: &FuzzyHash) -> Option<Sibling> {
        if self.identity.contains_key(hash) {
            return Some(Sibling {
                hash: hash.clone(),
                distance: 0,
            });
        }
        (self.search)(self, hash)
    }

    /// Deep copy for read-copy-update: the clone owns its own slot array,
    /// identity map, and block tables, and may be mutated while readers
    /// keep querying the original.
    #[must_use]
    pub fn dup(&self) -> Self {
        self.clone()
    }

    fn search_brute_force(&self, hash: &FuzzyHash) -> Option<Sibling> {
        let mut best: Option<Sibling> = None;
        let mut best_distance = self.config.hash_size;
        for stored in self.slots.iter().flatten() {
            let distance = hash.hamming(stored);
            if distance < best_distance {
                best_distance = distance;
                best = Some(Sibling {
                    hash: stored.clone(),
                    distance,
                });
            }
        }
        best
    }

    fn search_multi_index(&self, hash: &FuzzyHash) -> Option<Sibling> {
        let mut best: Option<Sibling> = None;
        let mut best_distance = self.config.hash_size;
        let mut visited = vec![false; self.slots.len()];

        let mut probe = hash.clone();
        let mask = self.geometry.block_mask();
        for block in 0..self.geometry.blocks {
            let value = probe.and_last(mask) as u16;
            for &slot in self.tables.candidates(block, value) {
                let slot = slot as usize;
                if std::mem::replace(&mut visited[slot], true) {
                    continue;
                }
                let Some(stored) = &self.slots[slot] else {
                    continue;
                };
                let distance = hash.hamming(stored);
                if distance < best_distance {
                    best_distance = distance;
                    best = Some(Sibling {
                        hash: stored.clone(),
                        distance,
                    });
                }
            }
            probe.rsh(self.geometry.block_size as u32);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(multi: bool) -> IndexConfig {
        IndexConfig {
            hash_size: 256,
            max_distance: 35,
            use_multiindex: multi,
        }
    }

    #[test]
    fn geometry_for_256_bit_radius_35() {
        let index = HammingIndex::new(config(true)).unwrap();
        let geometry = index.geometry();
        assert_eq!(geometry.blocks, 36);
        assert_eq!(geometry.block_size, 7);
        assert_eq!(geometry.last_block_size, 11);
        // C(11, 7) selections of the trailing block's bits.
        assert_eq!(geometry.last_block_combinations.len(), 330);
        assert_eq!(geometry.last_block_combinations[0], vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(
            geometry.last_block_combinations.last().unwrap(),
            &vec![4, 5, 6, 7, 8, 9, 10]
        );
    }

    #[test]
    fn geometry_exact_division_has_one_combination() {
        let index = HammingIndex::new(IndexConfig {
            hash_size: 128,
            max_distance: 15,
            use_multiindex: true,
        })
        .unwrap();
        let geometry = index.geometry();
        assert_eq!(geometry.blocks, 16);
        assert_eq!(geometry.block_size, 8);
        assert_eq!(geometry.last_block_size, 8);
        assert_eq!(geometry.last_block_combinations.len(), 1);
    }

    #[test]
    fn construction_rejects_bad_configs() {
        assert!(matches!(
            HammingIndex::new(IndexConfig {
                hash_size: 100,
                max_distance: 3,
                use_multiindex: false,
            }),
            Err(ProximError::BadHashSize { bits: 100, .. })
        ));
        assert!(matches!(
            HammingIndex::new(IndexConfig {
                hash_size: 256,
                max_distance: 255,
                use_multiindex: false,
            }),
            Err(ProximError::TooManyBlocks { blocks: 256, .. })
        ));
        // 256 bits over 4 blocks would need 64-bit block values.
        assert!(matches!(
            HammingIndex::new(IndexConfig {
                hash_size: 256,
                max_distance: 3,
                use_multiindex: false,
            }),
            Err(ProximError::BadHashSize { .. })
        ));
    }

    #[test]
    fn combinations_enumeration() {
        assert_eq!(
            combinations(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3],
            ]
        );
        assert_eq!(combinations(3, 3), vec![vec![0, 1, 2]]);
        assert!(combinations(2, 3).is_empty());
    }

    #[test]
    fn double_add_and_unknown_remove_report_false() {
        let mut index = HammingIndex::new(config(true)).unwrap();
        let hash = FuzzyHash::from_hex(&"11".repeat(32)).unwrap();
        let other = FuzzyHash::from_hex(&"22".repeat(32)).unwrap();

        assert!(index.add(hash.clone()));
        assert!(!index.add(hash.clone()));
        assert!(index.contains(&hash));

        assert!(!index.remove(&other));
        assert!(index.remove(&hash));
        assert!(!index.contains(&hash));
        assert!(!index.remove(&hash));
    }

    #[test]
    fn remove_all_resets_membership_but_keeps_slots() {
        let mut index = HammingIndex::new(config(true)).unwrap();
        let hash = FuzzyHash::from_hex(&"ab".repeat(32)).unwrap();
        assert!(index.add(hash.clone()));
        assert_eq!(index.count(), 1);

        index.remove_all();
        assert!(!index.contains(&hash));
        assert_eq!(index.count(), 1);

        // Slots are never reused: a re-add appends.
        assert!(index.add(hash.clone()));
        assert_eq!(index.count(), 2);
        assert!(index.contains(&hash));
    }
}
