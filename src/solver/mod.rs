//! Longest common substring over a set of documents.
//!
//! Each added document contributes all of its suffixes to a generalized
//! suffix index whose values are the sets of source documents. A common
//! substring of all documents is then exactly an accumulated key whose
//! subtree's document tags cover the whole document set; the solver walks
//! the lazy traversal keeping the longest such key.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::sync::WriteLock;
use crate::tree::{Descendants, Node, RadixTree};
use crate::util::suffixes;
use crate::TreeError;

/// Longest-common-substring solver over added documents.
#[derive(Debug, Default)]
pub struct LcsSolver {
    /// suffix → documents containing it (generalized suffix index).
    index: RadixTree<BTreeSet<String>>,
    documents: RwLock<BTreeSet<String>>,
    write_lock: WriteLock,
}

impl LcsSolver {
    /// Create a solver with no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, indexing all of its suffixes tagged with the
    /// document itself. Returns `false` if it was already added.
    pub async fn add(&self, document: &str) -> Result<bool, TreeError> {
        if document.is_empty() {
            return Err(TreeError::EmptyKey);
        }
        let _guard = self.write_lock.acquire().await;
        if self.documents.read().contains(document) {
            return Ok(false);
        }
        self.documents.write().insert(document.to_string());
        for suffix in suffixes(document) {
            let mut refs = self.index.get(suffix).unwrap_or_default();
            refs.insert(document.to_string());
            self.index.put(suffix, refs).await?;
        }
        debug!(document, "indexed document suffixes");
        Ok(true)
    }

    /// Number of documents added.
    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    /// The longest substring common to every added document, or `None`
    /// when no documents were added or they share nothing.
    ///
    /// Ties are broken in favor of the first candidate in traversal
    /// order.
    pub fn longest_common_substring(&self) -> Option<String> {
        let documents = self.documents.read().clone();
        if documents.is_empty() {
            return None;
        }
        let mut best: Option<String> = None;
        for (key, node) in Descendants::new(String::new(), self.index.root()) {
            let best_len = best.as_ref().map_or(0, String::len);
            if key.len() > best_len && subtree_covers_all(&key, node, &documents) {
                best = Some(key);
            }
        }
        best
    }
}

/// Whether the union of document tags below `node` covers every document.
/// Stops walking as soon as coverage is reached.
fn subtree_covers_all(
    key: &str,
    node: Arc<Node<BTreeSet<String>>>,
    documents: &BTreeSet<String>,
) -> bool {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (_, descendant) in Descendants::new(key.to_string(), node) {
        if let Some(refs) = descendant.value() {
            for tag in refs {
                if let Some(original) = documents.get(tag.as_str()) {
                    seen.insert(original.as_str());
                }
            }
            if seen.len() == documents.len() {
                return true;
            }
        }
    }
    false
}
