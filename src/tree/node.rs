//! Node representation and construction.
//!
//! A node is an edge label plus one of four payload shapes: leaf, leaf with
//! value, branch, branch with value. The shape is a tagged union so that a
//! node never carries storage for a value or child list it does not have.
//!
//! Nodes are immutable once built, with one exception: each child slot is an
//! atomically swappable reference. Replacing a slot's contents is the single
//! publication step of every mutation, which is what lets readers run
//! without the write lock.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use smallvec::SmallVec;

use crate::TreeError;

/// One child slot: the first character of the child's edge (fixed for the
/// slot's lifetime) and the atomically replaceable child reference.
pub(crate) struct Edge<V> {
    first_char: char,
    slot: ArcSwap<Node<V>>,
}

/// Children sorted by `first_char`, unique per node. Small fan-out is the
/// common case, so a couple of slots live inline.
pub(crate) type EdgeList<V> = SmallVec<[Edge<V>; 2]>;

enum NodeKind<V> {
    /// No value, no children. Only ever observable as an empty root.
    Leaf,
    /// Terminates a key, no children.
    ValueLeaf(V),
    /// Pass-through node on the way to longer keys.
    Branch(EdgeList<V>),
    /// Terminates a key and continues to longer keys.
    ValueBranch(V, EdgeList<V>),
}

/// A single tree node: the incoming edge label plus payload.
pub struct Node<V> {
    edge: Box<str>,
    kind: NodeKind<V>,
}

impl<V> Node<V> {
    /// The empty root: no value, no children, empty edge.
    pub(crate) fn root() -> Arc<Self> {
        Arc::new(Node {
            edge: "".into(),
            kind: NodeKind::Branch(SmallVec::new()),
        })
    }

    /// Build a node, selecting the narrowest representation.
    ///
    /// Fails if `edge` is empty for a non-root node, or if two children
    /// share a first edge character. Children are sorted by first character
    /// so that lookup can binary-search.
    pub(crate) fn new(
        edge: &str,
        value: Option<V>,
        children: Vec<Arc<Node<V>>>,
        is_root: bool,
    ) -> Result<Arc<Self>, TreeError> {
        if edge.is_empty() && !is_root {
            return Err(TreeError::EmptyEdge);
        }
        let kind = if children.is_empty() {
            match value {
                Some(v) => NodeKind::ValueLeaf(v),
                None => NodeKind::Leaf,
            }
        } else {
            let edges = build_edge_list(children)?;
            match value {
                Some(v) => NodeKind::ValueBranch(v, edges),
                None => NodeKind::Branch(edges),
            }
        };
        Ok(Arc::new(Node {
            edge: edge.into(),
            kind,
        }))
    }

    /// The label consumed to reach this node from its parent. Empty only
    /// for the root.
    pub fn incoming_edge(&self) -> &str {
        &self.edge
    }

    /// First character of the incoming edge; `None` only for the root.
    pub fn first_char(&self) -> Option<char> {
        self.edge.chars().next()
    }

    /// The value terminating a key at this node, if any.
    pub fn value(&self) -> Option<&V> {
        match &self.kind {
            NodeKind::Leaf | NodeKind::Branch(_) => None,
            NodeKind::ValueLeaf(v) | NodeKind::ValueBranch(v, _) => Some(v),
        }
    }

    /// The child whose edge starts with `first_char`, if any.
    pub fn outgoing_edge(&self, first_char: char) -> Option<Arc<Node<V>>> {
        let edges = self.edges()?;
        let idx = edges
            .binary_search_by_key(&first_char, |e| e.first_char)
            .ok()?;
        Some(edges[idx].slot.load_full())
    }

    /// Snapshot of every child, in first-character order.
    pub fn outgoing_edges(&self) -> Vec<Arc<Node<V>>> {
        match self.edges() {
            Some(edges) => edges.iter().map(|e| e.slot.load_full()).collect(),
            None => Vec::new(),
        }
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.edges().map_or(0, |e| e.len())
    }

    /// Swap in a replacement child for the slot matching `child`'s first
    /// edge character.
    ///
    /// This store is the publication point of a mutation: a concurrent
    /// reader observes either the old or the new subtree, never a mixture
    /// within the slot. The slot must already exist; asking to update an
    /// edge that is not present means the mutation protocol constructed an
    /// inconsistent replacement.
    pub(crate) fn update_outgoing_edge(&self, child: Arc<Node<V>>) -> Result<(), TreeError> {
        let first_char = child.first_char().ok_or(TreeError::EmptyEdge)?;
        let edges = self.edges().ok_or(TreeError::MissingEdge(first_char))?;
        let idx = edges
            .binary_search_by_key(&first_char, |e| e.first_char)
            .map_err(|_| TreeError::MissingEdge(first_char))?;
        edges[idx].slot.store(child);
        Ok(())
    }

    fn edges(&self) -> Option<&EdgeList<V>> {
        match &self.kind {
            NodeKind::Leaf | NodeKind::ValueLeaf(_) => None,
            NodeKind::Branch(edges) | NodeKind::ValueBranch(_, edges) => Some(edges),
        }
    }
}

fn build_edge_list<V>(children: Vec<Arc<Node<V>>>) -> Result<EdgeList<V>, TreeError> {
    let mut edges: EdgeList<V> = SmallVec::with_capacity(children.len());
    for child in children {
        let first_char = child.first_char().ok_or(TreeError::EmptyEdge)?;
        edges.push(Edge {
            first_char,
            slot: ArcSwap::new(child),
        });
    }
    edges.sort_unstable_by_key(|e| e.first_char);
    for pair in edges.windows(2) {
        if pair[0].first_char == pair[1].first_char {
            return Err(TreeError::DuplicateEdge(pair[0].first_char));
        }
    }
    Ok(edges)
}

impl<V: fmt::Debug> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first_chars: Vec<char> = self
            .edges()
            .map(|edges| edges.iter().map(|e| e.first_char).collect())
            .unwrap_or_default();
        f.debug_struct("Node")
            .field("edge", &self.edge)
            .field("value", &self.value())
            .field("children", &first_chars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(edge: &str, value: i32) -> Arc<Node<i32>> {
        Node::new(edge, Some(value), Vec::new(), false).expect("leaf builds")
    }

    #[test]
    fn rejects_empty_edge_for_non_root() {
        let err = Node::<i32>::new("", None, Vec::new(), false).unwrap_err();
        assert!(matches!(err, TreeError::EmptyEdge));
        assert!(Node::<i32>::new("", None, Vec::new(), true).is_ok());
    }

    #[test]
    fn rejects_duplicate_first_characters() {
        let children = vec![leaf("apple", 1), leaf("ant", 2)];
        let err = Node::new("x", None, children, false).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateEdge('a')));
    }

    #[test]
    fn children_are_sorted_by_first_character() {
        let children = vec![leaf("st", 1), leaf("am", 2), leaf("n", 3)];
        let node = Node::new("te", None, children, false).expect("node builds");
        let edges: Vec<String> = node
            .outgoing_edges()
            .iter()
            .map(|c| c.incoming_edge().to_string())
            .collect();
        assert_eq!(edges, ["am", "n", "st"]);
    }

    #[test]
    fn narrowest_variant_is_selected() {
        let void_leaf = Node::<i32>::new("a", None, Vec::new(), false).expect("builds");
        assert!(void_leaf.value().is_none());
        assert_eq!(void_leaf.child_count(), 0);

        let value_leaf = leaf("a", 7);
        assert_eq!(value_leaf.value(), Some(&7));

        let branch = Node::new("a", None, vec![leaf("b", 1)], false).expect("builds");
        assert!(branch.value().is_none());
        assert_eq!(branch.child_count(), 1);

        let full = Node::new("a", Some(9), vec![leaf("b", 1)], false).expect("builds");
        assert_eq!(full.value(), Some(&9));
        assert_eq!(full.child_count(), 1);
    }

    #[test]
    fn outgoing_edge_dispatches_on_first_character() {
        let node = Node::new("te", None, vec![leaf("st", 1), leaf("am", 2)], false)
            .expect("node builds");
        let st = node.outgoing_edge('s').expect("child for 's'");
        assert_eq!(st.incoming_edge(), "st");
        assert!(node.outgoing_edge('z').is_none());
    }

    #[test]
    fn update_outgoing_edge_replaces_matching_slot() {
        let node = Node::new("te", None, vec![leaf("st", 1), leaf("am", 2)], false)
            .expect("node builds");
        node.update_outgoing_edge(leaf("sting", 5)).expect("update");
        let replaced = node.outgoing_edge('s').expect("child for 's'");
        assert_eq!(replaced.incoming_edge(), "sting");
        assert_eq!(replaced.value(), Some(&5));
    }

    #[test]
    fn update_outgoing_edge_rejects_unknown_edge() {
        let node = Node::new("te", None, vec![leaf("st", 1)], false).expect("node builds");
        let err = node.update_outgoing_edge(leaf("zoo", 9)).unwrap_err();
        assert!(matches!(err, TreeError::MissingEdge('z')));
    }
}
