//! # Concurrent copy-on-write radix tree
//!
//! This library implements an ordered string index as a compressed-prefix
//! tree (radix tree) with lock-free readers and serialized writers.
//!
//! ## Core design
//!
//! 1. **Compressed edges**: chains of single-successor nodes collapse into
//!    one node carrying the concatenated label
//! 2. **Copy-on-write mutation**: every insert/removal builds complete
//!    replacement nodes, then publishes them with a single reference swap
//! 3. **Lock-free reads**: lookups and enumerations never take the lock;
//!    they observe per-node-consistent state, not whole-tree snapshots
//! 4. **FIFO write serialization**: writers suspend cooperatively and are
//!    served strictly in request order
//!
//! ## Layered indexes
//!
//! The adapters in [`inverted`], [`reversed`], [`suffix`], and [`solver`]
//! reuse the core engine for document scanning, "ends with" queries,
//! substring search, and longest-common-substring extraction.
//!
//! ## Usage Example
//!
//! ```
//! use taproot::RadixTree;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), taproot::TreeError> {
//! let tree = RadixTree::new();
//! tree.put("test", 1).await?;
//! tree.put("team", 2).await?;
//! let keys: Vec<String> = tree.keys_starting_with("te").collect();
//! assert_eq!(keys, ["team", "test"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, missing_debug_implementations)]

// Core modules - the tree engine and its write serialization
pub mod sync; // FIFO write lock
pub mod tree; // node model, search, mutation, traversal
pub mod util; // string helpers

// Layered indexes built on the core engine
pub mod inverted; // keys prefixing / contained in a document
pub mod reversed; // "ends with" queries via key reversal
pub mod solver; // longest common substring
pub mod suffix; // substring search over key suffixes

// Re-exports for convenience
pub use inverted::InvertedRadixTree;
pub use reversed::ReversedRadixTree;
pub use solver::LcsSolver;
pub use suffix::SuffixTree;
pub use sync::{WriteGuard, WriteLock};
pub use tree::{Classification, Descendants, Keys, Node, Pairs, RadixTree, Values};

use thiserror::Error;

/// Errors surfaced by tree mutations.
///
/// `EmptyKey` is caller error. The remaining variants indicate that a
/// mutation constructed an inconsistent replacement — a bug in the
/// mutation protocol rather than bad input — and are never retried. A
/// failed mutation publishes nothing: the tree is left exactly as it was.
#[derive(Error, Debug)]
pub enum TreeError {
    /// A mutation was asked to store an empty key.
    #[error("keys must be non-empty")]
    EmptyKey,

    /// A non-root node was constructed with an empty edge label.
    #[error("edge label must be non-empty for a non-root node")]
    EmptyEdge,

    /// Two children of one node were given the same first edge character.
    #[error("duplicate first edge character {0:?} among sibling nodes")]
    DuplicateEdge(char),

    /// A child-slot update targeted an edge the node does not have.
    #[error("no outgoing edge starting with {0:?} to replace")]
    MissingEdge(char),
}
