//! Substring search over key suffixes.
//!
//! Every suffix of every stored key is indexed in an internal radix tree,
//! mapping to the set of original keys containing it; actual payloads live
//! in a separate key→value table. "Ends with" queries are a single exact
//! lookup in the suffix index; "contains" queries enumerate the index by
//! prefix and dereference through the value table, skipping keys already
//! emitted.
//!
//! Compound mutations (a put touches one table entry plus one index entry
//! per suffix) are serialized by an adapter-level write lock; the core
//! tree's own lock only covers individual index operations.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::sync::WriteLock;
use crate::tree::{Node, RadixTree, Values};
use crate::util::suffixes;
use crate::TreeError;

/// A string index answering "ends with" and "contains" queries.
#[derive(Debug, Default)]
pub struct SuffixTree<V> {
    /// suffix → original keys containing it.
    index: RadixTree<BTreeSet<String>>,
    /// original key → payload.
    values: RwLock<HashMap<String, V>>,
    write_lock: WriteLock,
}

impl<V> SuffixTree<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        SuffixTree {
            index: RadixTree::new(),
            values: RwLock::new(HashMap::new()),
            write_lock: WriteLock::new(),
        }
    }

    /// Snapshot of the suffix index's root node.
    pub fn root(&self) -> Arc<Node<BTreeSet<String>>> {
        self.index.root()
    }

    /// Number of distinct suffixes indexed (not the number of keys).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of keys stored.
    pub fn key_count(&self) -> usize {
        self.values.read().len()
    }
}

impl<V: Clone> SuffixTree<V> {
    /// Insert or overwrite `key`, returning the previous value.
    ///
    /// New keys have all their suffixes indexed; overwriting an existing
    /// key only swaps the payload.
    pub async fn put(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }
        let _guard = self.write_lock.acquire().await;
        let previous = self.values.write().insert(key.to_string(), value);
        if previous.is_none() {
            self.add_suffixes(key).await?;
        }
        Ok(previous)
    }

    /// Insert `key` only if it is not stored yet; returns the existing
    /// value without overwriting when one is present.
    pub async fn put_if_absent(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }
        let _guard = self.write_lock.acquire().await;
        if let Some(existing) = self.values.read().get(key) {
            return Ok(Some(existing.clone()));
        }
        self.values.write().insert(key.to_string(), value);
        self.add_suffixes(key).await?;
        Ok(None)
    }

    /// Remove `key`, pruning suffix entries that no longer reference any
    /// key. Returns whether the key was stored.
    pub async fn remove(&self, key: &str) -> Result<bool, TreeError> {
        let _guard = self.write_lock.acquire().await;
        if !self.values.read().contains_key(key) {
            return Ok(false);
        }
        self.remove_suffixes(key).await?;
        self.values.write().remove(key);
        Ok(true)
    }

    /// Value stored for exactly `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.values.read().get(key).cloned()
    }

    /// Keys ending with `suffix`, in sorted order.
    pub fn keys_ending_with(&self, suffix: &str) -> Vec<String> {
        self.index
            .get(suffix)
            .map(|refs| refs.into_iter().collect())
            .unwrap_or_default()
    }

    /// Values of keys ending with `suffix`. Keys whose payload vanished
    /// under a concurrent remove are skipped.
    pub fn values_ending_with(&self, suffix: &str) -> Vec<V> {
        let values = self.values.read();
        self.keys_ending_with(suffix)
            .into_iter()
            .filter_map(|key| values.get(&key).cloned())
            .collect()
    }

    /// `(key, value)` pairs for keys ending with `suffix`.
    pub fn key_value_pairs_ending_with(&self, suffix: &str) -> Vec<(String, V)> {
        let values = self.values.read();
        self.keys_ending_with(suffix)
            .into_iter()
            .filter_map(|key| values.get(&key).cloned().map(|value| (key, value)))
            .collect()
    }

    /// Keys containing `fragment` anywhere, lazily and without duplicates.
    pub fn keys_containing(&self, fragment: &str) -> KeysContaining {
        KeysContaining {
            sets: self.index.values_for_keys_starting_with(fragment),
            current: BTreeSet::new().into_iter(),
            seen: HashSet::new(),
        }
    }

    /// Values of keys containing `fragment`.
    pub fn values_for_keys_containing<'a>(
        &'a self,
        fragment: &str,
    ) -> impl Iterator<Item = V> + 'a {
        self.keys_containing(fragment)
            .filter_map(move |key| self.values.read().get(&key).cloned())
    }

    /// `(key, value)` pairs for keys containing `fragment`.
    pub fn key_value_pairs_for_keys_containing<'a>(
        &'a self,
        fragment: &str,
    ) -> impl Iterator<Item = (String, V)> + 'a {
        self.keys_containing(fragment).filter_map(move |key| {
            let value = self.values.read().get(&key).cloned()?;
            Some((key, value))
        })
    }

    async fn add_suffixes(&self, key: &str) -> Result<(), TreeError> {
        for suffix in suffixes(key) {
            let mut refs = self.index.get(suffix).unwrap_or_default();
            refs.insert(key.to_string());
            self.index.put(suffix, refs).await?;
        }
        Ok(())
    }

    async fn remove_suffixes(&self, key: &str) -> Result<(), TreeError> {
        for suffix in suffixes(key) {
            if let Some(mut refs) = self.index.get(suffix) {
                refs.remove(key);
                if refs.is_empty() {
                    self.index.remove(suffix).await?;
                } else {
                    self.index.put(suffix, refs).await?;
                }
            }
        }
        Ok(())
    }
}

/// Lazy, deduplicating walk over the key sets reachable under a fragment.
#[derive(Debug)]
pub struct KeysContaining {
    sets: Values<BTreeSet<String>>,
    current: std::collections::btree_set::IntoIter<String>,
    seen: HashSet<String>,
}

impl Iterator for KeysContaining {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.current.next() {
                if self.seen.insert(key.clone()) {
                    return Some(key);
                }
                continue;
            }
            self.current = self.sets.next()?.into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn banana_contains_ana() {
        let tree: SuffixTree<char> = SuffixTree::new();
        tree.put("banana", 'X').await.expect("put");
        let keys: Vec<String> = tree.keys_containing("ana").collect();
        assert_eq!(keys, ["banana"]);
        assert_eq!(tree.keys_ending_with("ana"), ["banana"]);
        assert_eq!(tree.keys_ending_with("nan"), Vec::<String>::new());
    }

    #[tokio::test]
    async fn len_counts_suffix_entries() {
        let tree: SuffixTree<char> = SuffixTree::new();
        tree.put("banana", 'X').await.expect("put");
        // banana, anana, nana, ana, na, a
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.key_count(), 1);
    }

    #[tokio::test]
    async fn containing_dedups_across_positions() {
        let tree: SuffixTree<u32> = SuffixTree::new();
        tree.put("banana", 1).await.expect("put");
        tree.put("bandana", 2).await.expect("put");
        // "an" occurs twice in each key; each key must come back once.
        let keys: Vec<String> = tree.keys_containing("an").collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"banana".to_string()));
        assert!(keys.contains(&"bandana".to_string()));
    }

    #[tokio::test]
    async fn remove_prunes_unshared_suffixes() {
        let tree: SuffixTree<u32> = SuffixTree::new();
        tree.put("banana", 1).await.expect("put");
        tree.put("bandana", 2).await.expect("put");
        assert!(tree.remove("banana").await.expect("remove"));
        assert_eq!(tree.get("banana"), None);
        let keys: Vec<String> = tree.keys_containing("ana").collect();
        assert_eq!(keys, ["bandana"]);
        // Suffixes unique to "banana" are gone entirely.
        assert!(tree.keys_ending_with("nana").is_empty());
        assert!(!tree.remove("banana").await.expect("second remove"));
    }

    #[tokio::test]
    async fn overwrite_keeps_index_intact() {
        let tree: SuffixTree<u32> = SuffixTree::new();
        tree.put("banana", 1).await.expect("put");
        let suffix_count = tree.len();
        let previous = tree.put("banana", 9).await.expect("overwrite");
        assert_eq!(previous, Some(1));
        assert_eq!(tree.get("banana"), Some(9));
        assert_eq!(tree.len(), suffix_count);
    }

    #[tokio::test]
    async fn put_if_absent_returns_existing_payload() {
        let tree: SuffixTree<u32> = SuffixTree::new();
        tree.put("banana", 1).await.expect("put");
        assert_eq!(
            tree.put_if_absent("banana", 2).await.expect("put_if_absent"),
            Some(1)
        );
        assert_eq!(tree.get("banana"), Some(1));
        assert_eq!(
            tree.put_if_absent("mango", 3).await.expect("put_if_absent"),
            None
        );
        assert_eq!(tree.get("mango"), Some(3));
    }

    #[tokio::test]
    async fn values_resolve_through_the_payload_table() {
        let tree: SuffixTree<&str> = SuffixTree::new();
        tree.put("banana", "fruit").await.expect("put");
        tree.put("cabana", "hut").await.expect("put");
        let mut values: Vec<&str> = tree.values_for_keys_containing("ana").collect();
        values.sort();
        assert_eq!(values, ["fruit", "hut"]);
        let pairs: Vec<(String, &str)> = tree.key_value_pairs_ending_with("bana").into_iter().collect();
        assert_eq!(pairs, [("cabana".to_string(), "hut")]);
    }
}
