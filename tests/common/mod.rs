//! Shared helpers for integration tests.
#![allow(dead_code)] // each test crate uses its own subset

use taproot::{Descendants, RadixTree};

/// Build a tree from `(key, value)` entries.
pub async fn tree_of(entries: &[(&str, i32)]) -> RadixTree<i32> {
    let tree = RadixTree::new();
    for (key, value) in entries {
        tree.put(key, *value).await.expect("put succeeds");
    }
    tree
}

/// Assert the path-compression invariant: every value-less node other than
/// the root forks (has at least two children). Single-child value-less
/// nodes must have been merged away by the mutation protocol.
pub fn assert_path_compressed<V>(tree: &RadixTree<V>) {
    for (key, node) in Descendants::new(String::new(), tree.root()) {
        if node.incoming_edge().is_empty() {
            continue; // the root may hold any number of children
        }
        if node.value().is_none() {
            assert!(
                node.child_count() >= 2,
                "value-less node at {key:?} has {} child(ren); it should have been merged",
                node.child_count()
            );
        }
    }
}

/// All stored keys in sorted order.
pub fn all_keys<V>(tree: &RadixTree<V>) -> Vec<String> {
    tree.keys_starting_with("").collect()
}
