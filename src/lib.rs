//! proxim: nearest-neighbor search for binary fingerprints.
//!
//! Provides two tightly coupled primitives for similarity work over
//! fuzzy hashes:
//!
//! - **Hamming index**: [`HammingIndex`] stores fixed-width bit-vectors
//!   ([`FuzzyHash`]) and answers single-nearest-neighbor queries under the
//!   Hamming metric, by brute force or by a pigeonhole multi-index.
//! - **Locality-sensitive digest**: [`Tlsh`] condenses an arbitrary byte
//!   stream into a 35-byte digest whose pairwise Hamming distance tracks
//!   content similarity.
//!
//! # Which Strategy Should I Use?
//!
//! | Situation | Recommendation |
//! |-----------|----------------|
//! | Sets up to a few million fingerprints | Brute force (`use_multiindex: false`) |
//! | Larger sets, queries concentrated within the radius | Multi-index |
//! | Exact global minimum required at any distance | Brute force |
//!
//! Brute force is a straight scan: one XOR + popcount per stored limb,
//! hard to beat while the whole set stays cache resident. The multi-index
//! prunes by the pigeonhole principle — fingerprints within distance `r`
//! must agree with the query on at least one of `r + 1` blocks — so its
//! answer is exact within the configured radius and best-effort beyond it.
//!
//! # Concurrency
//!
//! Instances are single-writer. The intended sharing pattern is
//! read-copy-update via [`SnapshotHandle`]: readers grab the current
//! snapshot once per query, a writer mutates a private
//! [`HammingIndex::dup`] and publishes it atomically. Queries never block.
//!
//! ```
//! use proxim::{FuzzyHash, HammingIndex, IndexConfig};
//!
//! # fn main() -> proxim::Result<()> {
//! let mut index = HammingIndex::new(IndexConfig {
//!     hash_size: 256,
//!     max_distance: 35,
//!     use_multiindex: true,
//! })?;
//!
//! index.add(FuzzyHash::from_hex(
//!     "d3790791d1078229dfdd38df6024e72430b91170f13333660439b2ac4f300fd0",
//! )?);
//!
//! let query = FuzzyHash::from_hex(
//!     "d3790791d1078229dfdd38df6024e72430b91170f13333660439b2ac4f300fd1",
//! )?;
//! let sibling = index.shortest_distance(&query).unwrap();
//! assert_eq!(sibling.distance, 1);
//! # Ok(())
//! # }
//! ```

pub mod digest;
pub mod fingerprint;
pub mod index;
pub mod stats;

mod error;

pub use digest::{Tlsh, CODE_SIZE, DIGEST_SIZE};
pub use error::{ProximError, Result};
pub use fingerprint::{bit_combinations, FuzzyHash};
pub use index::snapshot::SnapshotHandle;
pub use index::{BlockGeometry, HammingIndex, IndexConfig, Sibling};
