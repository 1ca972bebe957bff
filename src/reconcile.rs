//! Keyed reconciliation of retained nodes against freshly computed data.
//!
//! Nodes are matched by key, never by position, so state stored on a node
//! (emphasis, paint order) survives a relayout as long as its key does.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<K> {
    pub inserted: Vec<K>,
    pub updated: Vec<K>,
    pub removed: Vec<K>,
}

impl<K> Default for Reconciled<K> {
    fn default() -> Self {
        Self {
            inserted: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<K> Reconciled<K> {
    pub fn is_unchanged(&self) -> bool {
        self.inserted.is_empty() && self.removed.is_empty()
    }
}

/// Rebuilds `nodes` in the order of `next`. Matching nodes are updated in
/// place, new keys are created, keys missing from `next` are dropped.
pub fn reconcile_ordered<N, D, K>(
    nodes: &mut Vec<N>,
    next: &[D],
    node_key: impl Fn(&N) -> K,
    data_key: impl Fn(&D) -> K,
    mut create: impl FnMut(&D) -> N,
    mut update: impl FnMut(&mut N, &D),
) -> Reconciled<K>
where
    K: Ord + Clone + Debug,
{
    let mut previous: BTreeMap<K, N> = nodes.drain(..).map(|n| (node_key(&n), n)).collect();
    let mut result = Reconciled::default();

    for data in next {
        let key = data_key(data);
        match previous.remove(&key) {
            Some(mut node) => {
                update(&mut node, data);
                nodes.push(node);
                result.updated.push(key);
            }
            None => {
                nodes.push(create(data));
                result.inserted.push(key);
            }
        }
    }
    result.removed = previous.into_keys().collect();

    tracing::trace!(
        inserted = result.inserted.len(),
        updated = result.updated.len(),
        removed = result.removed.len(),
        "ordered reconcile complete"
    );
    result
}

/// Like [`reconcile_ordered`], but surviving nodes keep their current
/// relative order and new nodes are appended in `next` order.
pub fn reconcile_retained<N, D, K>(
    nodes: &mut Vec<N>,
    next: &[D],
    node_key: impl Fn(&N) -> K,
    data_key: impl Fn(&D) -> K,
    mut create: impl FnMut(&D) -> N,
    mut update: impl FnMut(&mut N, &D),
) -> Reconciled<K>
where
    K: Ord + Clone + Debug,
{
    let incoming: BTreeMap<K, &D> = next.iter().map(|d| (data_key(d), d)).collect();
    let mut seen: BTreeSet<K> = BTreeSet::new();
    let mut result = Reconciled::default();

    nodes.retain_mut(|node| {
        let key = node_key(node);
        match incoming.get(&key) {
            Some(data) if !seen.contains(&key) => {
                update(node, *data);
                seen.insert(key.clone());
                result.updated.push(key);
                true
            }
            _ => {
                result.removed.push(key);
                false
            }
        }
    });

    for data in next {
        let key = data_key(data);
        if seen.insert(key.clone()) {
            nodes.push(create(data));
            result.inserted.push(key);
        }
    }

    tracing::trace!(
        inserted = result.inserted.len(),
        updated = result.updated.len(),
        removed = result.removed.len(),
        "retained reconcile complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        key: u32,
        value: &'static str,
        hovered: bool,
    }

    fn node(key: u32, value: &'static str) -> Node {
        Node {
            key,
            value,
            hovered: false,
        }
    }

    fn ordered(nodes: &mut Vec<Node>, next: &[(u32, &'static str)]) -> Reconciled<u32> {
        reconcile_ordered(
            nodes,
            next,
            |n| n.key,
            |d| d.0,
            |d| node(d.0, d.1),
            |n, d| n.value = d.1,
        )
    }

    #[test]
    fn ordered_follows_new_order_and_keeps_node_state() {
        let mut nodes = vec![node(1, "a"), node(2, "b"), node(3, "c")];
        nodes[1].hovered = true;
        let result = ordered(&mut nodes, &[(2, "B"), (4, "d"), (1, "a")]);
        let keys: Vec<u32> = nodes.iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![2, 4, 1]);
        assert!(nodes[0].hovered);
        assert_eq!(nodes[0].value, "B");
        assert_eq!(result.inserted, vec![4]);
        assert_eq!(result.updated, vec![2, 1]);
        assert_eq!(result.removed, vec![3]);
        assert!(!result.is_unchanged());
    }

    #[test]
    fn retained_keeps_existing_order_and_appends() {
        let mut nodes = vec![node(3, "c"), node(1, "a"), node(2, "b")];
        let result = reconcile_retained(
            &mut nodes,
            &[(1, "A"), (2, "b"), (5, "e")],
            |n| n.key,
            |d| d.0,
            |d| node(d.0, d.1),
            |n, d| n.value = d.1,
        );
        let keys: Vec<u32> = nodes.iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![1, 2, 5]);
        assert_eq!(nodes[0].value, "A");
        assert_eq!(result.removed, vec![3]);
        assert_eq!(result.inserted, vec![5]);
    }

    #[test]
    fn identical_data_is_unchanged() {
        let mut nodes = vec![node(1, "a"), node(2, "b")];
        let result = ordered(&mut nodes, &[(1, "a"), (2, "b")]);
        assert!(result.is_unchanged());
        assert_eq!(result.updated, vec![1, 2]);
    }
}
