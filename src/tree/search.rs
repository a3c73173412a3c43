//! Key descent and match classification.
//!
//! A search walks from the root, dispatching on the first unmatched
//! character at each level and then comparing the key against the child's
//! edge. The outcome is summarized by two counters — bytes of the key
//! matched overall, and bytes matched within the deepest node's own edge —
//! which, together with the key and edge lengths, fully determine one of
//! four classifications. Every mutation shape is driven off that
//! classification alone.

use std::sync::Arc;

use super::node::Node;
use crate::util::common_prefix_len;

/// Categorical outcome of matching a key against the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Key fully matched, ending exactly at the end of the node's edge.
    ExactMatch,
    /// Key fully matched but stopped partway through the node's edge.
    KeyEndsMidEdge,
    /// Key characters remain and the node's edge was fully consumed.
    IncompleteMatchToEndOfEdge,
    /// Key characters remain and matching stopped partway through the edge.
    IncompleteMatchToMiddleOfEdge,
}

/// Everything one descent learned, enough to drive any mutation:
/// the deepest node reached, its parent and grandparent, and the two
/// match counters.
#[derive(Debug)]
pub(crate) struct SearchOutcome<V> {
    pub node_found: Arc<Node<V>>,
    pub parent: Option<Arc<Node<V>>>,
    pub grandparent: Option<Arc<Node<V>>>,
    /// Bytes of the key matched overall. Always a char boundary in the key.
    pub bytes_matched: usize,
    /// Bytes matched within `node_found`'s own edge.
    pub bytes_matched_in_node: usize,
    pub classification: Classification,
}

/// Descend from `root` matching `key`, without mutating and without the
/// write lock. Runs against whatever nodes are reachable at call time.
pub(crate) fn search<V>(root: Arc<Node<V>>, key: &str) -> SearchOutcome<V> {
    let mut current = root;
    let mut parent: Option<Arc<Node<V>>> = None;
    let mut grandparent: Option<Arc<Node<V>>> = None;
    let mut bytes_matched = 0;
    let mut bytes_matched_in_node = 0;

    while bytes_matched < key.len() {
        let next_char = match key[bytes_matched..].chars().next() {
            Some(c) => c,
            None => break,
        };
        let Some(child) = current.outgoing_edge(next_char) else {
            break;
        };
        grandparent = parent.take();
        parent = Some(current);
        current = child;

        let common = common_prefix_len(&key[bytes_matched..], current.incoming_edge());
        bytes_matched += common;
        bytes_matched_in_node = common;
        if common < current.incoming_edge().len() {
            break;
        }
    }

    let classification = classify(
        key.len(),
        current.incoming_edge().len(),
        bytes_matched,
        bytes_matched_in_node,
    );
    SearchOutcome {
        node_found: current,
        parent,
        grandparent,
        bytes_matched,
        bytes_matched_in_node,
        classification,
    }
}

/// Pure classification of the two match counters against the key and edge
/// lengths. Exactly one of the four cases applies to any outcome a correct
/// descent can produce; anything else is an internal-consistency failure
/// and aborts before any mutation is published.
fn classify(
    key_len: usize,
    edge_len: usize,
    bytes_matched: usize,
    bytes_matched_in_node: usize,
) -> Classification {
    if bytes_matched == key_len {
        if bytes_matched_in_node == edge_len {
            return Classification::ExactMatch;
        }
        if bytes_matched_in_node < edge_len {
            return Classification::KeyEndsMidEdge;
        }
    } else if bytes_matched < key_len {
        if bytes_matched_in_node == edge_len {
            return Classification::IncompleteMatchToEndOfEdge;
        }
        if bytes_matched_in_node < edge_len {
            return Classification::IncompleteMatchToMiddleOfEdge;
        }
    }
    panic!(
        "unclassifiable search: matched {bytes_matched}/{key_len} key bytes, \
         {bytes_matched_in_node}/{edge_len} edge bytes"
    );
}
