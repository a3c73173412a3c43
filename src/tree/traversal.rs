//! Lazy depth-first traversal.
//!
//! [`Descendants`] walks a subtree with an explicit stack, yielding each
//! node paired with the key accumulated on the way down. Children are
//! pushed in reverse child order so they pop in forward sorted order,
//! giving a pre-order walk whose value-bearing nodes appear in key order.
//! Every range query and `len` is a filter or projection over this walk.
//!
//! The iterator holds reference-counted node handles, so it stays valid
//! while concurrent mutations swap slots elsewhere in the tree; it simply
//! observes whichever child references were current when each node was
//! expanded. Abandoning it early is free.

use std::sync::Arc;

use super::node::Node;

/// Pre-order walk over a node and all of its descendants, yielding
/// `(accumulated key, node)` pairs.
#[derive(Debug)]
pub struct Descendants<V> {
    stack: Vec<(String, Arc<Node<V>>)>,
}

impl<V> Descendants<V> {
    /// Walk `start` and everything below it. `start_key` is the full key
    /// leading to `start` (its own edge included).
    pub fn new(start_key: String, start: Arc<Node<V>>) -> Self {
        Descendants {
            stack: vec![(start_key, start)],
        }
    }

    /// A walk that yields nothing.
    pub fn empty() -> Self {
        Descendants { stack: Vec::new() }
    }
}

impl<V> Iterator for Descendants<V> {
    type Item = (String, Arc<Node<V>>);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, node) = self.stack.pop()?;
        let children = node.outgoing_edges();
        for child in children.into_iter().rev() {
            let mut child_key = String::with_capacity(key.len() + child.incoming_edge().len());
            child_key.push_str(&key);
            child_key.push_str(child.incoming_edge());
            self.stack.push((child_key, child));
        }
        Some((key, node))
    }
}

/// Keys of the value-bearing nodes of a walk, in sorted order.
#[derive(Debug)]
pub struct Keys<V> {
    inner: Descendants<V>,
}

impl<V> Keys<V> {
    pub(crate) fn new(inner: Descendants<V>) -> Self {
        Keys { inner }
    }
}

impl<V> Iterator for Keys<V> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, node) = self.inner.next()?;
            if node.value().is_some() {
                return Some(key);
            }
        }
    }
}

/// Values of the value-bearing nodes of a walk, in key order.
#[derive(Debug)]
pub struct Values<V> {
    inner: Descendants<V>,
}

impl<V> Values<V> {
    pub(crate) fn new(inner: Descendants<V>) -> Self {
        Values { inner }
    }
}

impl<V: Clone> Iterator for Values<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (_, node) = self.inner.next()?;
            if let Some(value) = node.value() {
                return Some(value.clone());
            }
        }
    }
}

/// `(key, value)` pairs of the value-bearing nodes of a walk, in key order.
#[derive(Debug)]
pub struct Pairs<V> {
    inner: Descendants<V>,
}

impl<V> Pairs<V> {
    pub(crate) fn new(inner: Descendants<V>) -> Self {
        Pairs { inner }
    }
}

impl<V: Clone> Iterator for Pairs<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, node) = self.inner.next()?;
            if let Some(value) = node.value() {
                return Some((key, value.clone()));
            }
        }
    }
}
