//! "Ends with" queries via key reversal.
//!
//! Keys are reversed on the way into the core tree, which turns suffix
//! queries into prefix queries; stored keys are reversed back before being
//! yielded, so callers only ever see keys in their original spelling.

use std::sync::Arc;

use crate::tree::{Node, RadixTree, Values};
use crate::util::reverse;
use crate::TreeError;

/// A radix tree answering "which keys end with this suffix".
#[derive(Debug, Default)]
pub struct ReversedRadixTree<V> {
    tree: RadixTree<V>,
}

impl<V> ReversedRadixTree<V> {
    /// Create an empty tree.
    pub fn new() -> Self {
        ReversedRadixTree {
            tree: RadixTree::new(),
        }
    }

    /// Snapshot of the current root node. Edges hold reversed key text.
    pub fn root(&self) -> Arc<Node<V>> {
        self.tree.root()
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl<V: Clone> ReversedRadixTree<V> {
    /// Insert or overwrite `key`, returning the previous value.
    pub async fn put(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        self.tree.put(&reverse(key), value).await
    }

    /// Insert `key` only if it has no value yet.
    pub async fn put_if_absent(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        self.tree.put_if_absent(&reverse(key), value).await
    }

    /// Remove `key`, returning whether a value was removed.
    pub async fn remove(&self, key: &str) -> Result<bool, TreeError> {
        self.tree.remove(&reverse(key)).await
    }

    /// Value stored for exactly `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.tree.get(&reverse(key))
    }

    /// Keys ending with `suffix`, in their original spelling.
    ///
    /// Order follows the reversed-key sort, not the natural key sort.
    pub fn keys_ending_with(&self, suffix: &str) -> impl Iterator<Item = String> {
        self.tree
            .keys_starting_with(&reverse(suffix))
            .map(|stored| reverse(&stored))
    }

    /// Values of keys ending with `suffix`.
    pub fn values_for_keys_ending_with(&self, suffix: &str) -> Values<V> {
        self.tree.values_for_keys_starting_with(&reverse(suffix))
    }

    /// `(key, value)` pairs for keys ending with `suffix`, keys in their
    /// original spelling.
    pub fn key_value_pairs_for_keys_ending_with(
        &self,
        suffix: &str,
    ) -> impl Iterator<Item = (String, V)> {
        self.tree
            .key_value_pairs_for_keys_starting_with(&reverse(suffix))
            .map(|(stored, value)| (reverse(&stored), value))
    }
}
