//! The radix tree engine.
//!
//! Keys are stored on compressed edges: each node carries the character
//! sequence consumed to reach it, so a chain of single-successor nodes
//! collapses into one edge. Mutations never edit a node in place. Every
//! insert and removal builds complete replacement nodes and then publishes
//! them with a single reference swap — either one child slot of the parent
//! or the root reference. Readers therefore never need the write lock: they
//! traverse whatever node graph is reachable when they start, and the worst
//! a concurrent writer can do is make them see the tree as it was a moment
//! ago.
//!
//! Writers are serialized by a FIFO [`WriteLock`](crate::sync::WriteLock);
//! see the `sync` module for the ordering guarantees.

mod node;
mod search;
mod traversal;

pub use node::Node;
pub use search::Classification;
pub use traversal::{Descendants, Keys, Pairs, Values};

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, trace};

use crate::sync::WriteLock;
use crate::util::common_prefix_len;
use crate::TreeError;

use search::{search, SearchOutcome};

/// A concurrent radix tree mapping string keys to values.
///
/// Reads (`get`, the `*_starting_with` family, `closest_keys`, `len`,
/// traversal) take no lock. Writes (`put`, `put_if_absent`, `remove`)
/// suspend until the single write lock is theirs and are applied in
/// request order.
///
/// Values are cloned when copy-on-write restructuring or a query needs an
/// owned copy; wrap expensive payloads in `Arc`.
///
/// # Example
///
/// ```ignore
/// let tree = RadixTree::new();
/// tree.put("test", 1).await?;
/// tree.put("tester", 2).await?;
/// tree.put("team", 3).await?;
/// assert_eq!(tree.get("test"), Some(1));
/// let keys: Vec<String> = tree.keys_starting_with("te").collect();
/// assert_eq!(keys, ["team", "test", "tester"]);
/// ```
pub struct RadixTree<V> {
    root: ArcSwap<Node<V>>,
    write_lock: WriteLock,
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RadixTree<V> {
    /// Create an empty tree.
    pub fn new() -> Self {
        RadixTree {
            root: ArcSwap::new(Node::root()),
            write_lock: WriteLock::new(),
        }
    }

    /// Snapshot of the current root node.
    ///
    /// The returned handle stays valid indefinitely; it simply stops
    /// reflecting later mutations. Adapters drive their own walks off it.
    pub fn root(&self) -> Arc<Node<V>> {
        self.root.load_full()
    }

    /// Number of keys currently stored. Recomputed by traversal on every
    /// call; value-bearing nodes are counted, pass-through nodes are not.
    pub fn len(&self) -> usize {
        Descendants::new(String::new(), self.root())
            .filter(|(_, node)| node.value().is_some())
            .count()
    }

    /// Whether the tree stores no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys starting with `prefix`, in sorted key order.
    pub fn keys_starting_with(&self, prefix: &str) -> Keys<V> {
        Keys::new(self.descendants_of_prefix(prefix))
    }

    /// Values of keys starting with `prefix`, in key order.
    pub fn values_for_keys_starting_with(&self, prefix: &str) -> Values<V> {
        Values::new(self.descendants_of_prefix(prefix))
    }

    /// `(key, value)` pairs for keys starting with `prefix`, in key order.
    pub fn key_value_pairs_for_keys_starting_with(&self, prefix: &str) -> Pairs<V> {
        Pairs::new(self.descendants_of_prefix(prefix))
    }

    /// Keys sharing the longest possible prefix with `candidate`.
    ///
    /// If `candidate` is stored or is a prefix of stored keys, those keys
    /// are returned; otherwise the walk backs up to the deepest node whose
    /// edge overlaps the candidate and enumerates that subtree. No overlap
    /// at all yields nothing.
    pub fn closest_keys(&self, candidate: &str) -> Keys<V> {
        Keys::new(self.closest_subtree(candidate))
    }

    /// Values for [`closest_keys`](Self::closest_keys).
    pub fn values_for_closest_keys(&self, candidate: &str) -> Values<V> {
        Values::new(self.closest_subtree(candidate))
    }

    /// `(key, value)` pairs for [`closest_keys`](Self::closest_keys).
    pub fn key_value_pairs_for_closest_keys(&self, candidate: &str) -> Pairs<V> {
        Pairs::new(self.closest_subtree(candidate))
    }

    /// The subtree covering every key that starts with `prefix`, with the
    /// accumulated key of its top node.
    fn descendants_of_prefix(&self, prefix: &str) -> Descendants<V> {
        let outcome = search(self.root(), prefix);
        match outcome.classification {
            Classification::ExactMatch => {
                Descendants::new(prefix.to_string(), outcome.node_found)
            }
            Classification::KeyEndsMidEdge => {
                // The rest of the edge is shared by every key below it.
                let edge_suffix =
                    &outcome.node_found.incoming_edge()[outcome.bytes_matched_in_node..];
                let mut start_key = String::with_capacity(prefix.len() + edge_suffix.len());
                start_key.push_str(prefix);
                start_key.push_str(edge_suffix);
                Descendants::new(start_key, outcome.node_found)
            }
            Classification::IncompleteMatchToEndOfEdge
            | Classification::IncompleteMatchToMiddleOfEdge => Descendants::empty(),
        }
    }

    fn closest_subtree(&self, candidate: &str) -> Descendants<V> {
        let outcome = search(self.root(), candidate);
        match outcome.classification {
            Classification::ExactMatch => {
                Descendants::new(candidate.to_string(), outcome.node_found)
            }
            Classification::KeyEndsMidEdge => {
                let edge_suffix =
                    &outcome.node_found.incoming_edge()[outcome.bytes_matched_in_node..];
                let mut start_key = String::with_capacity(candidate.len() + edge_suffix.len());
                start_key.push_str(candidate);
                start_key.push_str(edge_suffix);
                Descendants::new(start_key, outcome.node_found)
            }
            Classification::IncompleteMatchToMiddleOfEdge => {
                // Back up to the start of the diverging edge and take that
                // whole subtree: it holds the keys sharing the candidate's
                // longest matched prefix.
                let parent_key =
                    &candidate[..outcome.bytes_matched - outcome.bytes_matched_in_node];
                let edge = outcome.node_found.incoming_edge();
                let mut start_key = String::with_capacity(parent_key.len() + edge.len());
                start_key.push_str(parent_key);
                start_key.push_str(edge);
                Descendants::new(start_key, outcome.node_found)
            }
            Classification::IncompleteMatchToEndOfEdge => {
                if outcome.bytes_matched == 0 {
                    // Not even the first character matched.
                    return Descendants::empty();
                }
                let start_key = candidate[..outcome.bytes_matched].to_string();
                Descendants::new(start_key, outcome.node_found)
            }
        }
    }
}

impl<V: Clone> RadixTree<V> {
    /// Value stored for exactly `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        let outcome = search(self.root(), key);
        match outcome.classification {
            Classification::ExactMatch => outcome.node_found.value().cloned(),
            _ => None,
        }
    }

    /// Insert or overwrite `key`, returning the previously stored value.
    ///
    /// Fails on an empty key. Suspends until the write lock is available.
    pub async fn put(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        self.put_internal(key, value, true).await
    }

    /// Insert `key` only if it has no value yet.
    ///
    /// Returns the existing value without overwriting when one is present;
    /// returns `None` after actually storing. Fails on an empty key.
    pub async fn put_if_absent(&self, key: &str, value: V) -> Result<Option<V>, TreeError> {
        self.put_internal(key, value, false).await
    }

    async fn put_internal(
        &self,
        key: &str,
        value: V,
        overwrite: bool,
    ) -> Result<Option<V>, TreeError> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }
        let _guard = self.write_lock.acquire().await;
        let outcome = search(self.root(), key);
        trace!(key, classification = ?outcome.classification, "classified insert");

        match outcome.classification {
            Classification::ExactMatch => {
                let found = &outcome.node_found;
                let existing = found.value().cloned();
                if !overwrite && existing.is_some() {
                    return Ok(existing);
                }
                let replacement = Node::new(
                    found.incoming_edge(),
                    Some(value),
                    found.outgoing_edges(),
                    false,
                )?;
                self.splice(&outcome, replacement)?;
                Ok(existing)
            }
            Classification::KeyEndsMidEdge => {
                // The key is a strict prefix of the edge: split the edge,
                // keeping the original node's payload on the lower half.
                let found = &outcome.node_found;
                let edge = found.incoming_edge();
                let (matched, edge_suffix) = edge.split_at(outcome.bytes_matched_in_node);
                let lower = Node::new(
                    edge_suffix,
                    found.value().cloned(),
                    found.outgoing_edges(),
                    false,
                )?;
                let replacement = Node::new(matched, Some(value), vec![lower], false)?;
                debug!(key, split_edge = edge, "split edge for new key");
                self.splice(&outcome, replacement)?;
                Ok(None)
            }
            Classification::IncompleteMatchToEndOfEdge => {
                // The found node (possibly the root) simply gains a child
                // for the unmatched remainder of the key.
                let found = &outcome.node_found;
                let key_suffix = &key[outcome.bytes_matched..];
                let leaf = Node::new(key_suffix, Some(value), Vec::new(), false)?;
                let mut children = found.outgoing_edges();
                children.push(leaf);
                let is_root = outcome.parent.is_none();
                let replacement = Node::new(
                    found.incoming_edge(),
                    found.value().cloned(),
                    children,
                    is_root,
                )?;
                self.splice(&outcome, replacement)?;
                Ok(None)
            }
            Classification::IncompleteMatchToMiddleOfEdge => {
                // Key and edge diverge partway: a fresh parent keeps the
                // common portion and forks to the old node and the new key.
                let found = &outcome.node_found;
                let edge = found.incoming_edge();
                let key_from_node_start = &key[outcome.bytes_matched - outcome.bytes_matched_in_node..];
                let common = &edge[..common_prefix_len(key_from_node_start, edge)];
                let edge_suffix = &edge[common.len()..];
                let key_suffix = &key[outcome.bytes_matched..];

                let new_leaf = Node::new(key_suffix, Some(value), Vec::new(), false)?;
                let old_branch = Node::new(
                    edge_suffix,
                    found.value().cloned(),
                    found.outgoing_edges(),
                    false,
                )?;
                let replacement =
                    Node::new(common, None, vec![new_leaf, old_branch], false)?;
                debug!(key, forked_edge = edge, "forked edge for diverging key");
                self.splice(&outcome, replacement)?;
                Ok(None)
            }
        }
    }

    /// Remove `key`, returning whether a value was actually removed.
    ///
    /// Merges any single-child chains the removal leaves behind, so path
    /// compression survives arbitrary put/remove sequences.
    pub async fn remove(&self, key: &str) -> Result<bool, TreeError> {
        let _guard = self.write_lock.acquire().await;
        let outcome = search(self.root(), key);
        if outcome.classification != Classification::ExactMatch {
            return Ok(false);
        }
        let found = &outcome.node_found;
        if found.value().is_none() {
            // A pass-through node matched; the key itself is not stored.
            return Ok(false);
        }
        let parent = match &outcome.parent {
            Some(parent) => parent,
            // The root never carries a value, so a removable match always
            // sits below it.
            None => return Ok(false),
        };

        let children = found.outgoing_edges();
        match children.len() {
            n if n > 1 => {
                // Other keys pass through here: just clear the value.
                let replacement =
                    Node::new(found.incoming_edge(), None, children, false)?;
                parent.update_outgoing_edge(replacement)?;
            }
            1 => {
                // Collapse into the only child: concatenated edge, child's
                // payload.
                let child = &children[0];
                let merged_edge =
                    concat_edges(found.incoming_edge(), child.incoming_edge());
                let replacement = Node::new(
                    &merged_edge,
                    child.value().cloned(),
                    child.outgoing_edges(),
                    false,
                )?;
                debug!(key, merged_edge = %merged_edge, "merged removed node into child");
                parent.update_outgoing_edge(replacement)?;
            }
            _ => {
                self.remove_leaf(&outcome, parent)?;
            }
        }
        Ok(true)
    }

    /// Drop a childless node from its parent, merging the parent with a
    /// lone surviving sibling when that keeps paths compressed.
    fn remove_leaf(
        &self,
        outcome: &SearchOutcome<V>,
        parent: &Arc<Node<V>>,
    ) -> Result<(), TreeError> {
        let removed_first_char = outcome.node_found.first_char();
        let remaining: Vec<Arc<Node<V>>> = parent
            .outgoing_edges()
            .into_iter()
            .filter(|sibling| sibling.first_char() != removed_first_char)
            .collect();
        let parent_is_root = outcome.grandparent.is_none();

        if remaining.len() == 1 && parent.value().is_none() {
            if let Some(grandparent) = &outcome.grandparent {
                // The parent was only there to fork; fold it into the
                // survivor. The root is left alone even when value-less.
                let survivor = &remaining[0];
                let merged_edge = concat_edges(parent.incoming_edge(), survivor.incoming_edge());
                let merged = Node::new(
                    &merged_edge,
                    survivor.value().cloned(),
                    survivor.outgoing_edges(),
                    false,
                )?;
                debug!(merged_edge = %merged_edge, "merged orphaned parent into sibling");
                grandparent.update_outgoing_edge(merged)?;
                return Ok(());
            }
        }

        let rebuilt = Node::new(
            parent.incoming_edge(),
            parent.value().cloned(),
            remaining,
            parent_is_root,
        )?;
        match &outcome.grandparent {
            Some(grandparent) => grandparent.update_outgoing_edge(rebuilt)?,
            None => self.root.store(rebuilt),
        }
        Ok(())
    }

    /// Publish `replacement` for the searched-for node: one child-slot
    /// store, or the root reference when the node has no parent.
    fn splice(&self, outcome: &SearchOutcome<V>, replacement: Arc<Node<V>>) -> Result<(), TreeError> {
        match &outcome.parent {
            Some(parent) => parent.update_outgoing_edge(replacement),
            None => {
                self.root.store(replacement);
                Ok(())
            }
        }
    }
}

impl<V: fmt::Debug> RadixTree<V> {
    /// ASCII rendering of the tree structure, values in parentheses.
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        render(&self.root(), &mut out, "", true, true);
        out
    }
}

fn render<V: fmt::Debug>(
    node: &Arc<Node<V>>,
    out: &mut String,
    prefix: &str,
    is_tail: bool,
    is_root: bool,
) {
    out.push_str(prefix);
    if !is_root {
        out.push_str(if is_tail { "└── ○ " } else { "├── ○ " });
    } else {
        out.push('○');
        if !node.incoming_edge().is_empty() {
            out.push(' ');
        }
    }
    out.push_str(node.incoming_edge());
    if let Some(value) = node.value() {
        out.push_str(&format!(" ({value:?})"));
    }
    out.push('\n');

    let children = node.outgoing_edges();
    let extension = if is_root {
        ""
    } else if is_tail {
        "    "
    } else {
        "│   "
    };
    let child_prefix = format!("{prefix}{extension}");
    let last = children.len().saturating_sub(1);
    for (i, child) in children.iter().enumerate() {
        render(child, out, &child_prefix, i == last, false);
    }
}

fn concat_edges(a: &str, b: &str) -> String {
    let mut merged = String::with_capacity(a.len() + b.len());
    merged.push_str(a);
    merged.push_str(b);
    merged
}

impl<V: fmt::Debug> fmt::Debug for RadixTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadixTree")
            .field("root", &self.root())
            .field("queued_writers", &self.write_lock.queued_writers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn sample_tree() -> RadixTree<i32> {
        let tree = RadixTree::new();
        tree.put("test", 1).await.expect("put test");
        tree.put("tester", 2).await.expect("put tester");
        tree.put("team", 3).await.expect("put team");
        tree
    }

    #[tokio::test]
    async fn put_and_get_round_trip() {
        let tree = sample_tree().await;
        assert_eq!(tree.get("test"), Some(1));
        assert_eq!(tree.get("tester"), Some(2));
        assert_eq!(tree.get("team"), Some(3));
        assert_eq!(tree.get("te"), None);
        assert_eq!(tree.get("testers"), None);
        assert_eq!(tree.len(), 3);
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let tree: RadixTree<i32> = RadixTree::new();
        assert!(matches!(tree.put("", 1).await, Err(TreeError::EmptyKey)));
        assert!(matches!(
            tree.put_if_absent("", 1).await,
            Err(TreeError::EmptyKey)
        ));
    }

    #[tokio::test]
    async fn overwrite_returns_previous_value() {
        let tree = sample_tree().await;
        let previous = tree.put("test", 10).await.expect("overwrite");
        assert_eq!(previous, Some(1));
        assert_eq!(tree.get("test"), Some(10));
        assert_eq!(tree.len(), 3);
    }

    #[tokio::test]
    async fn put_if_absent_short_circuits_on_existing_value() {
        let tree = sample_tree().await;
        let existing = tree.put_if_absent("test", 99).await.expect("put_if_absent");
        assert_eq!(existing, Some(1));
        assert_eq!(tree.get("test"), Some(1));
    }

    #[tokio::test]
    async fn put_if_absent_fills_a_pass_through_node() {
        let tree = sample_tree().await;
        // "te" exists structurally but has no value.
        let existing = tree.put_if_absent("te", 5).await.expect("put_if_absent");
        assert_eq!(existing, None);
        assert_eq!(tree.get("te"), Some(5));
        assert_eq!(tree.len(), 4);
    }

    #[tokio::test]
    async fn prefix_enumeration_is_sorted() {
        let tree = sample_tree().await;
        let keys: Vec<String> = tree.keys_starting_with("te").collect();
        assert_eq!(keys, ["team", "test", "tester"]);
        let values: Vec<i32> = tree.values_for_keys_starting_with("tes").collect();
        assert_eq!(values, [1, 2]);
        assert_eq!(tree.keys_starting_with("x").count(), 0);
    }

    #[tokio::test]
    async fn remove_detaches_only_the_requested_key() {
        let tree = sample_tree().await;
        assert_eq!(tree.remove("test").await.expect("remove"), true);
        assert_eq!(tree.get("test"), None);
        assert_eq!(tree.get("tester"), Some(2));
        assert_eq!(tree.get("team"), Some(3));
        assert_eq!(tree.len(), 2);
    }

    #[tokio::test]
    async fn remove_missing_key_is_a_no_op() {
        let tree = sample_tree().await;
        assert_eq!(tree.remove("toast").await.expect("remove"), false);
        assert_eq!(tree.remove("te").await.expect("remove"), false);
        assert_eq!(tree.remove("").await.expect("remove"), false);
        assert_eq!(tree.len(), 3);
    }

    #[tokio::test]
    async fn closest_keys_backtracks_to_shared_prefix() {
        let tree = sample_tree().await;
        // Candidate stops inside the "st" edge.
        let keys: Vec<String> = tree.closest_keys("tes").collect();
        assert_eq!(keys, ["test", "tester"]);
        // Candidate runs past "te" with no matching child.
        let keys: Vec<String> = tree.closest_keys("tex").collect();
        assert_eq!(keys, ["team", "test", "tester"]);
        // Candidate diverges in the middle of the "am" edge.
        let keys: Vec<String> = tree.closest_keys("teak").collect();
        assert_eq!(keys, ["team"]);
        // Stored keys match themselves.
        let keys: Vec<String> = tree.closest_keys("team").collect();
        assert_eq!(keys, ["team"]);
        assert_eq!(tree.closest_keys("zoo").count(), 0);
    }

    #[tokio::test]
    async fn pretty_print_shows_structure_and_values() {
        let tree = sample_tree().await;
        let rendered = tree.pretty_print();
        let expected = "\
○
└── ○ te
    ├── ○ am (3)
    └── ○ st (1)
        └── ○ er (2)
";
        assert_eq!(rendered, expected);
    }
}
