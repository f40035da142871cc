use tracing::trace;

use super::{compare, Divergence, Leaf, Node, NodeRef, Order};
use crate::bitset::ByteBitset;
use crate::shared::Shared;

/// A branching point of the trie.
///
/// Children are split by kind: `leaf_bits` marks the bytes whose child is a
/// [`Leaf`] stored inline in `leaves`, `node_bits` marks the bytes whose
/// child is another internal node in `nodes`. Both arrays are ordered by
/// byte, so the slot of a child is the rank of its byte in the matching
/// bitset. The two bitsets are always disjoint.
#[derive(Debug, Clone)]
pub(crate) struct Internal<V> {
    pub(crate) segment: Vec<u8>,
    leaf_bits: ByteBitset,
    node_bits: ByteBitset,
    leaves: Vec<Leaf<V>>,
    nodes: Vec<Shared<Internal<V>>>,
    pub(crate) value: Option<V>,
    count: usize,
}

impl<V> Internal<V> {
    pub(crate) fn new(segment: Vec<u8>, value: Option<V>) -> Self {
        Internal {
            segment,
            leaf_bits: ByteBitset::new_empty(),
            node_bits: ByteBitset::new_empty(),
            leaves: Vec::new(),
            nodes: Vec::new(),
            count: usize::from(value.is_some()),
            value,
        }
    }

    pub(crate) fn with_leaves(
        segment: Vec<u8>,
        value: Option<V>,
        leaves: impl IntoIterator<Item = Leaf<V>>,
    ) -> Self {
        let mut node = Self::new(segment, value);
        for leaf in leaves {
            node.put_leaf(leaf);
        }
        node
    }

    /// Number of values stored in this subtree, including the node's own.
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn children_bits(&self) -> ByteBitset {
        self.leaf_bits.union(&self.node_bits)
    }

    pub(crate) fn child(&self, byte: u8) -> Option<NodeRef<'_, V>> {
        if let Some(slot) = self.leaf_bits.position(byte) {
            return Some(NodeRef::Leaf(&self.leaves[slot]));
        }
        let slot = self.node_bits.position(byte)?;
        Some(NodeRef::Internal(&*self.nodes[slot]))
    }

    /// Children in ascending byte order.
    pub(crate) fn children(&self) -> impl DoubleEndedIterator<Item = (u8, NodeRef<'_, V>)> + '_ {
        self.children_bits()
            .iter()
            .filter_map(move |byte| self.child(byte).map(|child| (byte, child)))
    }

    pub(crate) fn take_value(&mut self) -> Option<V> {
        let value = self.value.take();
        if value.is_some() {
            self.count -= 1;
        }
        value
    }

    pub(crate) fn set_value(&mut self, value: Option<V>) {
        self.take_value();
        self.count += usize::from(value.is_some());
        self.value = value;
    }

    /// Installs `leaf` under its first byte, replacing whatever was there.
    pub(crate) fn put_leaf(&mut self, leaf: Leaf<V>) {
        let byte = leaf.segment[0];
        self.take_child(byte);
        let slot = self.leaf_bits.rank(byte);
        self.leaf_bits.set(byte);
        self.leaves.insert(slot, leaf);
        self.count += 1;
    }

    pub(crate) fn put_node(&mut self, node: Shared<Internal<V>>) {
        let byte = node.segment[0];
        self.take_child(byte);
        let slot = self.node_bits.rank(byte);
        self.node_bits.set(byte);
        self.count += node.count();
        self.nodes.insert(slot, node);
    }

    pub(crate) fn put_child(&mut self, child: Node<V>) {
        match child {
            Node::Leaf(leaf) => self.put_leaf(leaf),
            Node::Internal(node) => self.put_node(node),
        }
    }

    pub(crate) fn take_child(&mut self, byte: u8) -> Option<Node<V>> {
        if let Some(slot) = self.leaf_bits.position(byte) {
            self.leaf_bits.unset(byte);
            self.count -= 1;
            return Some(Node::Leaf(self.leaves.remove(slot)));
        }
        let slot = self.node_bits.position(byte)?;
        self.node_bits.unset(byte);
        let node = self.nodes.remove(slot);
        self.count -= node.count();
        Some(Node::Internal(node))
    }

    /// Replaces the child under `byte` with the result of `f`.
    ///
    /// `f` receives the current child, if any, and returns the child that
    /// should take its place. Returning `None` removes the slot.
    pub(crate) fn modify_child<F>(&mut self, byte: u8, f: F)
    where
        F: FnOnce(Option<Node<V>>) -> Option<Node<V>>,
    {
        let current = self.take_child(byte);
        if let Some(child) = f(current) {
            debug_assert_eq!(child.segment().first(), Some(&byte));
            self.put_child(child);
        }
    }
}

impl<V: Clone> Internal<V> {
    /// Restores the compression invariant after children or the value were
    /// removed.
    ///
    /// | children | value | result                                   |
    /// |----------|-------|------------------------------------------|
    /// | 0        | no    | gone                                     |
    /// | 0        | yes   | a leaf holding the value                 |
    /// | 1        | no    | the child, with this segment prepended   |
    /// | otherwise        | this node, unchanged                     |
    pub(crate) fn compact(mut self) -> Option<Node<V>> {
        match (self.leaves.len(), self.nodes.len(), self.value.take()) {
            (0, 0, None) => None,
            (0, 0, Some(value)) => {
                trace!(segment_len = self.segment.len(), "collapsing childless node into a leaf");
                Some(Node::Leaf(Leaf::new(self.segment, value)))
            }
            (1, 0, None) => {
                let leaf = self.leaves.pop()?;
                trace!(segment_len = self.segment.len(), "merging node into its only leaf");
                Some(Node::Leaf(leaf).prefixed(&self.segment))
            }
            (0, 1, None) => {
                let child = self.nodes.pop()?;
                trace!(segment_len = self.segment.len(), "merging node into its only child");
                Some(Node::Internal(child).prefixed(&self.segment))
            }
            (_, _, value) => {
                self.value = value;
                Some(Node::internal(self))
            }
        }
    }

    pub(crate) fn upsert<F>(
        mut this: Shared<Self>,
        key: &[u8],
        depth: usize,
        value: V,
        combine: &mut F,
        order: Order,
    ) -> (Node<V>, bool)
    where
        F: FnMut(V, V) -> V,
    {
        let rest = &key[depth..];
        match compare(rest, &this.segment) {
            Divergence::Equal => {
                let node = this.make_mut();
                let (value, inserted) = match node.take_value() {
                    Some(existing) => (order.apply(existing, value, combine), false),
                    None => (value, true),
                };
                node.set_value(Some(value));
                (Node::Internal(this), inserted)
            }
            Divergence::SegmentIsPrefix => {
                let split = depth + this.segment.len();
                let mut inserted = true;
                this.make_mut().modify_child(key[split], |child| {
                    Some(match child {
                        Some(child) => {
                            let (child, added) = child.upsert(key, split, value, combine, order);
                            inserted = added;
                            child
                        }
                        None => Node::Leaf(Leaf::new(key[split..].to_vec(), value)),
                    })
                });
                (Node::Internal(this), inserted)
            }
            Divergence::KeyIsPrefix => {
                let existing = Node::Internal(this).strip_segment(rest.len());
                let mut parent = Internal::new(rest.to_vec(), Some(value));
                parent.put_child(existing);
                (Node::internal(parent), true)
            }
            Divergence::At(common) => {
                let segment = rest[..common].to_vec();
                let existing = Node::Internal(this).strip_segment(common);
                let mut parent = Internal::new(segment, None);
                parent.put_child(existing);
                parent.put_leaf(Leaf::new(rest[common..].to_vec(), value));
                (Node::internal(parent), true)
            }
        }
    }

    /// Removes `key`, which must be present in this subtree.
    pub(crate) fn remove(this: Shared<Self>, key: &[u8], depth: usize) -> (Option<Node<V>>, V) {
        let mut node = this.into_inner();
        let split = depth + node.segment.len();
        let removed = match key.get(split) {
            None => node
                .take_value()
                .expect("removed key is stored in this node"),
            Some(&byte) => {
                let child = node
                    .take_child(byte)
                    .expect("removed key continues into a child");
                let (rest, removed) = child.remove(key, split);
                if let Some(rest) = rest {
                    node.put_child(rest);
                }
                removed
            }
        };
        (node.compact(), removed)
    }

    pub(crate) fn merge<F>(left: Shared<Self>, right: Shared<Self>, combine: &mut F) -> Node<V>
    where
        F: FnMut(V, V) -> V,
    {
        match compare(&left.segment, &right.segment) {
            Divergence::Equal => {
                let mut left = left.into_inner();
                let mut right = right.into_inner();
                let mut merged = Internal::new(std::mem::take(&mut left.segment), None);
                for byte in left.children_bits().union(&right.children_bits()).iter() {
                    let child = match (left.take_child(byte), right.take_child(byte)) {
                        (Some(l), Some(r)) => l.merge(r, combine),
                        (Some(child), None) | (None, Some(child)) => child,
                        (None, None) => continue,
                    };
                    merged.put_child(child);
                }
                let value = match (left.take_value(), right.take_value()) {
                    (Some(l), Some(r)) => Some(combine(l, r)),
                    (l, r) => l.or(r),
                };
                merged.set_value(value);
                Node::internal(merged)
            }
            Divergence::KeyIsPrefix => {
                // The right node continues below the left one.
                let split = left.segment.len();
                let right = Node::Internal(right).strip_segment(split);
                let mut left = left;
                left.make_mut().modify_child(right.segment()[0], |child| {
                    Some(match child {
                        Some(child) => child.merge(right, combine),
                        None => right,
                    })
                });
                Node::Internal(left)
            }
            Divergence::SegmentIsPrefix => {
                let split = right.segment.len();
                let left = Node::Internal(left).strip_segment(split);
                let mut right = right;
                right.make_mut().modify_child(left.segment()[0], |child| {
                    Some(match child {
                        Some(child) => left.merge(child, combine),
                        None => left,
                    })
                });
                Node::Internal(right)
            }
            Divergence::At(common) => {
                trace!(common, "merging diverging nodes under a new parent");
                let mut parent = Internal::new(left.segment[..common].to_vec(), None);
                parent.put_child(Node::Internal(left).strip_segment(common));
                parent.put_child(Node::Internal(right).strip_segment(common));
                Node::internal(parent)
            }
        }
    }
}

#[cfg(test)]
impl<V> Internal<V> {
    pub(crate) fn assert_invariants(&self) {
        assert!(self.leaf_bits.is_disjoint(&self.node_bits));
        assert_eq!(self.leaves.len(), self.leaf_bits.count() as usize);
        assert_eq!(self.nodes.len(), self.node_bits.count() as usize);
        let children = self.leaves.len() + self.nodes.len();
        assert!(
            children >= 2 || (children == 1 && self.value.is_some()),
            "node with {children} children and value {} should have been compacted",
            self.value.is_some()
        );
        let mut count = usize::from(self.value.is_some());
        for (byte, child) in self.children() {
            assert_eq!(child.segment().first(), Some(&byte));
            count += child.count();
            if let NodeRef::Internal(node) = child {
                node.assert_invariants();
            }
        }
        assert_eq!(count, self.count);
    }
}
