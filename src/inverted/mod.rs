//! Inverted index: which stored keys appear in a given document.
//!
//! The core tree already orders keys for prefix dispatch, so scanning a
//! document for stored keys does not re-dispatch from the root per
//! character: a single walk matches tree edges directly against the
//! document text, emitting every value-bearing node passed on the way.
//! Restarting that walk at each character position answers "which keys
//! occur anywhere in this document".

use std::sync::Arc;

use crate::tree::{Keys, Node, Pairs, RadixTree, Values};
use crate::TreeError;

/// A radix tree queried "in reverse": instead of finding keys matching a
/// query prefix, it finds stored keys that are prefixes (or substrings) of
/// a query document.
#[derive(Debug, Default)]
pub struct InvertedRadixTree<V> {
    tree: RadixTree<V>,
}

impl<V> InvertedRadixTree<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        InvertedRadixTree {
            tree: RadixTree::new(),
        }
    }

    /// Snapshot of the current root node.
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

    /// Keys starting with `prefix`, in sorted order.
    pub fn keys_starting_with(&self, prefix: &str) -> Keys<V> {
        self.tree.keys_starting_with(prefix)
    }

    /// Values of keys starting with `prefix`.
    pub fn values_for_keys_starting_with(&self, prefix: &str) -> Values<V> {
        self.tree.values_for_keys_starting_with(prefix)
    }

    /// `(key, value)` pairs for keys starting with `prefix`.
    pub fn key_value_pairs_for_keys_starting_with(&self, prefix: &str) -> Pairs<V> {
        self.tree.key_value_pairs_for_keys_starting_with(prefix)
    }

    /// Keys sharing the longest possible prefix with `candidate`.
    pub fn closest_keys(&self, candidate: &str) -> Keys<V> {
        self.tree.closest_keys(candidate)
    }
}

impl<V: Clone> InvertedRadixTree<V> {
    /// Insert or overwrite `key`, returning the previous value.
    pub async fn put(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        self.tree.put(key, value).await
    }

    /// Insert `key` only if it has no value yet.
    pub async fn put_if_absent(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        self.tree.put_if_absent(key, value).await
    }

    /// Remove `key`, returning whether a value was removed.
    pub async fn remove(&self, key: &str) -> Result<bool, TreeError> {
        self.tree.remove(key).await
    }

    /// Value stored for exactly `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.tree.get(key)
    }

    /// Walk tree edges directly against `input`, lazily yielding every
    /// stored key that is a prefix of `input`, shortest first.
    pub fn scan_for_keys_at_start_of_input<'a>(&self, input: &'a str) -> PrefixScan<'a, V> {
        PrefixScan::new(self.tree.root(), input)
    }

    /// The longest stored key that is a prefix of `input`, with its value.
    ///
    /// Tracks the deepest value-bearing node of a single scan.
    pub fn scan_for_longest_key_at_start_of_input(&self, input: &str) -> Option<(String, V)> {
        self.scan_for_keys_at_start_of_input(input).last()
    }

    /// Keys that are prefixes of `document`, shortest first.
    pub fn keys_prefixing<'a>(&'a self, document: &'a str) -> impl Iterator<Item = String> + 'a {
        self.scan_for_keys_at_start_of_input(document)
            .map(|(key, _)| key)
    }

    /// Values of keys that are prefixes of `document`.
    pub fn values_for_keys_prefixing<'a>(
        &'a self,
        document: &'a str,
    ) -> impl Iterator<Item = V> + 'a {
        self.scan_for_keys_at_start_of_input(document)
            .map(|(_, value)| value)
    }

    /// `(key, value)` pairs for keys that are prefixes of `document`.
    pub fn key_value_pairs_for_keys_prefixing<'a>(&self, document: &'a str) -> PrefixScan<'a, V> {
        self.scan_for_keys_at_start_of_input(document)
    }

    /// The longest key prefixing `document`.
    pub fn longest_key_prefixing(&self, document: &str) -> Option<String> {
        self.scan_for_longest_key_at_start_of_input(document)
            .map(|(key, _)| key)
    }

    /// The value of the longest key prefixing `document`.
    pub fn value_for_longest_key_prefixing(&self, document: &str) -> Option<V> {
        self.scan_for_longest_key_at_start_of_input(document)
            .map(|(_, value)| value)
    }

    /// The `(key, value)` pair of the longest key prefixing `document`.
    pub fn key_value_pair_for_longest_key_prefixing(&self, document: &str) -> Option<(String, V)> {
        self.scan_for_longest_key_at_start_of_input(document)
    }

    /// Keys occurring anywhere in `document`, one hit per matching
    /// position, by position and then by length.
    pub fn keys_contained_in<'a>(&'a self, document: &'a str) -> impl Iterator<Item = String> + 'a {
        self.scan_contained_in(document).map(|(key, _)| key)
    }

    /// Values of keys occurring anywhere in `document`.
    pub fn values_for_keys_contained_in<'a>(
        &'a self,
        document: &'a str,
    ) -> impl Iterator<Item = V> + 'a {
        self.scan_contained_in(document).map(|(_, value)| value)
    }

    /// `(key, value)` pairs for keys occurring anywhere in `document`.
    pub fn key_value_pairs_for_keys_contained_in<'a>(&self, document: &'a str) -> ContainedScan<'a, V> {
        self.scan_contained_in(document)
    }

    fn scan_contained_in<'a>(&self, document: &'a str) -> ContainedScan<'a, V> {
        ContainedScan {
            root: self.tree.root(),
            document,
            offsets: document.char_indices(),
            current: None,
        }
    }
}

/// Lazy edge-walk of a document against the tree: yields each stored key
/// that prefixes the document, with its value.
#[derive(Debug)]
pub struct PrefixScan<'a, V> {
    input: &'a str,
    node: Arc<Node<V>>,
    matched: usize,
    done: bool,
}

impl<'a, V> PrefixScan<'a, V> {
    fn new(root: Arc<Node<V>>, input: &'a str) -> Self {
        PrefixScan {
            input,
            node: root,
            matched: 0,
            done: false,
        }
    }
}

impl<V: Clone> Iterator for PrefixScan<'_, V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while self.matched < self.input.len() {
            let next_char = match self.input[self.matched..].chars().next() {
                Some(c) => c,
                None => break,
            };
            let Some(child) = self.node.outgoing_edge(next_char) else {
                break;
            };
            // The whole edge must match the document to keep descending.
            let edge_len = child.incoming_edge().len();
            if self.matched + edge_len > self.input.len()
                || !self.input[self.matched..].starts_with(child.incoming_edge())
            {
                break;
            }
            self.node = child;
            self.matched += edge_len;
            if let Some(value) = self.node.value() {
                return Some((self.input[..self.matched].to_string(), value.clone()));
            }
        }
        self.done = true;
        None
    }
}

/// [`PrefixScan`] restarted at every character position of a document.
#[derive(Debug)]
pub struct ContainedScan<'a, V> {
    root: Arc<Node<V>>,
    document: &'a str,
    offsets: std::str::CharIndices<'a>,
    current: Option<PrefixScan<'a, V>>,
}

impl<V: Clone> Iterator for ContainedScan<'_, V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(scan) = &mut self.current {
                if let Some(hit) = scan.next() {
                    return Some(hit);
                }
            }
            let (offset, _) = self.offsets.next()?;
            self.current = Some(PrefixScan::new(
                Arc::clone(&self.root),
                &self.document[offset..],
            ));
        }
    }
}
