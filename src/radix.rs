//! Path-compressed radix trie over byte strings.
//!
//! A tree is either a single [`Leaf`] or an [`Internal`] node. Every node
//! stores the segment of the key that is shared by everything below it since
//! its parent. Internal nodes keep two disjoint [`ByteBitset`]s that tell
//! whether the child selected by a byte is a leaf (stored inline) or another
//! internal node (stored behind a [`Shared`] reference so that unmodified
//! subtrees are reused by every version of the tree).
//!
//! All mutating operations take the node by value and return the new node.
//! A node that is still referenced from another version is copied before it
//! is touched, a node that is uniquely owned is edited in place.
//!
//! Invariants maintained by every operation:
//! * concatenating the segments on the path from the root to a value yields
//!   exactly the key of that value,
//! * an internal node has at least two children, or one child and a value,
//! * a child's segment starts with the byte it is indexed under,
//! * children are ordered ascending by that byte.
//!
//! [`ByteBitset`]: crate::bitset::ByteBitset

mod internal;
mod leaf;

pub(crate) use internal::Internal;
pub(crate) use leaf::Leaf;

use arrayvec::ArrayVec;

use crate::shared::Shared;

/// Outcome of matching the remainder of a search key against a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Divergence {
    /// Key and segment are identical.
    Equal,
    /// The key ends inside the segment.
    KeyIsPrefix,
    /// The segment ends before the key does.
    SegmentIsPrefix,
    /// Both continue but differ after this many equal bytes.
    At(usize),
}

pub(crate) fn compare(key: &[u8], segment: &[u8]) -> Divergence {
    let common = key
        .iter()
        .zip(segment)
        .take_while(|(a, b)| a == b)
        .count();
    match (common == key.len(), common == segment.len()) {
        (true, true) => Divergence::Equal,
        (true, false) => Divergence::KeyIsPrefix,
        (false, true) => Divergence::SegmentIsPrefix,
        (false, false) => Divergence::At(common),
    }
}

/// Argument order used when an upsert meets a key that is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    /// `combine(existing, incoming)`
    ExistingFirst,
    /// `combine(incoming, existing)`
    IncomingFirst,
}

impl Order {
    pub(crate) fn apply<V, F>(self, existing: V, incoming: V, combine: &mut F) -> V
    where
        F: FnMut(V, V) -> V,
    {
        match self {
            Order::ExistingFirst => combine(existing, incoming),
            Order::IncomingFirst => combine(incoming, existing),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node<V> {
    Leaf(Leaf<V>),
    Internal(Shared<Internal<V>>),
}

/// Borrowed view of a [`Node`], also used for children inside an
/// [`Internal`] where leaves and internal nodes live in separate arrays.
pub(crate) enum NodeRef<'a, V> {
    Leaf(&'a Leaf<V>),
    Internal(&'a Internal<V>),
}

impl<V> Clone for NodeRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for NodeRef<'_, V> {}

impl<'a, V> NodeRef<'a, V> {
    pub(crate) fn segment(self) -> &'a [u8] {
        match self {
            NodeRef::Leaf(leaf) => &leaf.segment,
            NodeRef::Internal(node) => &node.segment,
        }
    }

    pub(crate) fn count(self) -> usize {
        match self {
            NodeRef::Leaf(_) => 1,
            NodeRef::Internal(node) => node.count(),
        }
    }

    pub(crate) fn get(self, key: &[u8]) -> Option<&'a V> {
        let mut node = self;
        let mut depth = 0;
        loop {
            match node {
                NodeRef::Leaf(leaf) => {
                    return (key[depth..] == leaf.segment[..]).then_some(&leaf.value);
                }
                NodeRef::Internal(internal) => {
                    if !key[depth..].starts_with(&internal.segment) {
                        return None;
                    }
                    depth += internal.segment.len();
                    let Some(&next) = key.get(depth) else {
                        return internal.value.as_ref();
                    };
                    node = internal.child(next)?;
                }
            }
        }
    }
}

impl<V> Node<V> {
    pub(crate) fn internal(node: Internal<V>) -> Self {
        Node::Internal(Shared::new(node))
    }

    pub(crate) fn as_ref(&self) -> NodeRef<'_, V> {
        match self {
            Node::Leaf(leaf) => NodeRef::Leaf(leaf),
            Node::Internal(node) => NodeRef::Internal(&**node),
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.as_ref().count()
    }

    pub(crate) fn segment(&self) -> &[u8] {
        self.as_ref().segment()
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<&V> {
        self.as_ref().get(key)
    }
}

impl<V: Clone> Node<V> {
    /// Drops the first `n` bytes of this node's segment.
    pub(crate) fn strip_segment(self, n: usize) -> Self {
        match self {
            Node::Leaf(mut leaf) => {
                leaf.segment.drain(..n);
                Node::Leaf(leaf)
            }
            Node::Internal(mut shared) => {
                shared.make_mut().segment.drain(..n);
                Node::Internal(shared)
            }
        }
    }

    /// Prepends `prefix` to this node's segment.
    pub(crate) fn prefixed(self, prefix: &[u8]) -> Self {
        if prefix.is_empty() {
            return self;
        }
        match self {
            Node::Leaf(mut leaf) => {
                leaf.segment.splice(0..0, prefix.iter().copied());
                Node::Leaf(leaf)
            }
            Node::Internal(mut shared) => {
                shared
                    .make_mut()
                    .segment
                    .splice(0..0, prefix.iter().copied());
                Node::Internal(shared)
            }
        }
    }

    /// Stores `value` under `key`, of which the first `depth` bytes have
    /// already been matched by the ancestors of this node.
    ///
    /// Returns the new node and whether a new key was added.
    pub(crate) fn upsert<F>(
        self,
        key: &[u8],
        depth: usize,
        value: V,
        combine: &mut F,
        order: Order,
    ) -> (Self, bool)
    where
        F: FnMut(V, V) -> V,
    {
        match self {
            Node::Leaf(leaf) => leaf.upsert(key, depth, value, combine, order),
            Node::Internal(shared) => Internal::upsert(shared, key, depth, value, combine, order),
        }
    }

    /// Removes `key`, which must be stored below this node.
    ///
    /// Returns what is left of the node after compaction together with the
    /// removed value.
    pub(crate) fn remove(self, key: &[u8], depth: usize) -> (Option<Self>, V) {
        match self {
            Node::Leaf(leaf) => {
                debug_assert_eq!(&key[depth..], &leaf.segment[..]);
                (None, leaf.value)
            }
            Node::Internal(shared) => Internal::remove(shared, key, depth),
        }
    }

    /// Merges two nodes that sit at the same position in their trees.
    ///
    /// For keys stored in both, the result holds `combine(left, right)`.
    pub(crate) fn merge<F>(self, other: Self, combine: &mut F) -> Self
    where
        F: FnMut(V, V) -> V,
    {
        match (self, other) {
            (left, Node::Leaf(right)) => {
                let Leaf { segment, value } = right;
                left.upsert(&segment, 0, value, combine, Order::ExistingFirst)
                    .0
            }
            (Node::Leaf(left), right) => {
                let Leaf { segment, value } = left;
                right
                    .upsert(&segment, 0, value, combine, Order::IncomingFirst)
                    .0
            }
            (Node::Internal(left), Node::Internal(right)) => Internal::merge(left, right, combine),
        }
    }
}

/// Depth-first iterator over the `(key, value)` pairs below a node, in
/// ascending key order.
///
/// The traversal keeps an explicit stack with one level per visited
/// internal node instead of recursing, so deep trees cannot exhaust the
/// call stack. Keys are rebuilt in a single buffer that is truncated back to
/// the parent's length whenever a child is visited.
pub(crate) struct Iter<'a, V> {
    stack: Vec<(usize, ArrayVec<NodeRef<'a, V>, 256>)>,
    key: Vec<u8>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(root: Option<&'a Node<V>>) -> Self {
        let mut iter = Iter {
            stack: Vec::new(),
            key: Vec::new(),
            remaining: 0,
        };
        if let Some(root) = root {
            iter.remaining = root.count();
            let mut level = ArrayVec::new();
            level.push(root.as_ref());
            iter.stack.push((0, level));
        }
        iter
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, level) = self.stack.last_mut()?;
            let Some(node) = level.pop() else {
                self.stack.pop();
                continue;
            };
            let depth = *depth;
            self.key.truncate(depth);
            self.key.extend_from_slice(node.segment());
            match node {
                NodeRef::Leaf(leaf) => {
                    self.remaining = self.remaining.saturating_sub(1);
                    return Some((self.key.clone(), &leaf.value));
                }
                NodeRef::Internal(internal) => {
                    // Reversed, because we pop from the end.
                    let children = internal.children().rev().map(|(_, child)| child).collect();
                    self.stack.push((self.key.len(), children));
                    if let Some(value) = &internal.value {
                        self.remaining = self.remaining.saturating_sub(1);
                        return Some((self.key.clone(), value));
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> std::iter::FusedIterator for Iter<'_, V> {}

#[cfg(test)]
impl<V> Node<V> {
    /// Walks the whole tree and panics if a structural invariant is broken.
    pub(crate) fn assert_invariants(&self) {
        if let Node::Internal(node) = self {
            node.assert_invariants();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(root: Option<Node<u32>>, key: &[u8], value: u32) -> Node<u32> {
        match root {
            None => Node::Leaf(Leaf::new(key.to_vec(), value)),
            Some(root) => {
                root.upsert(key, 0, value, &mut |_, new| new, Order::ExistingFirst)
                    .0
            }
        }
    }

    #[test]
    fn compare_outcomes() {
        assert_eq!(compare(b"abc", b"abc"), Divergence::Equal);
        assert_eq!(compare(b"ab", b"abc"), Divergence::KeyIsPrefix);
        assert_eq!(compare(b"abcd", b"abc"), Divergence::SegmentIsPrefix);
        assert_eq!(compare(b"abx", b"abc"), Divergence::At(2));
        assert_eq!(compare(b"", b""), Divergence::Equal);
        assert_eq!(compare(b"x", b"y"), Divergence::At(0));
    }

    #[test]
    fn leaf_splits_on_divergence() {
        let root = set(None, b"foo", 1);
        let root = set(Some(root), b"far", 2);
        root.assert_invariants();
        let NodeRef::Internal(internal) = root.as_ref() else {
            panic!("two diverging keys need an internal node");
        };
        assert_eq!(internal.segment, b"f");
        assert_eq!(internal.count(), 2);
        assert!(internal.value.is_none());
        assert_eq!(root.get(b"foo"), Some(&1));
        assert_eq!(root.get(b"far"), Some(&2));
        assert_eq!(root.get(b"f"), None);
    }

    #[test]
    fn prefix_keys_live_in_node_values() {
        let root = set(None, b"foobar", 2);
        let root = set(Some(root), b"foo", 1);
        root.assert_invariants();
        assert_eq!(root.get(b"foo"), Some(&1));
        assert_eq!(root.get(b"foobar"), Some(&2));
        assert_eq!(root.get(b"fo"), None);
        assert_eq!(root.get(b"foob"), None);
        assert_eq!(root.count(), 2);
    }

    #[test]
    fn removing_a_leaf_collapses_its_parent() {
        let root = set(None, b"abc", 1);
        let root = set(Some(root), b"abd", 2);
        let (root, removed) = root.remove(b"abd", 0);
        assert_eq!(removed, 2);
        let root = root.expect("one key is left");
        let NodeRef::Leaf(leaf) = root.as_ref() else {
            panic!("a single key is stored as a leaf");
        };
        assert_eq!(leaf.segment, b"abc");
    }

    #[test]
    fn removing_a_node_value_collapses_into_the_only_child() {
        let mut root = set(None, b"a", 0);
        for key in [&b"abx"[..], b"aby", b"ab"] {
            root = set(Some(root), key, 1);
        }
        root.assert_invariants();
        let (root, _) = root.remove(b"a", 0);
        let root = root.expect("keys remain");
        root.assert_invariants();
        assert_eq!(root.segment(), b"ab");
        assert_eq!(root.get(b"ab"), Some(&1));
        assert_eq!(root.get(b"abx"), Some(&1));
    }

    #[test]
    fn iter_reconstructs_keys_in_order() {
        let mut root = None;
        for (i, key) in ["b", "a", "abc", "ab", "", "ba"].iter().enumerate() {
            root = Some(set(root, key.as_bytes(), i as u32));
        }
        let root = root.expect("keys were inserted");
        let keys: Vec<Vec<u8>> = Iter::new(Some(&root)).map(|(k, _)| k).collect();
        let expected: Vec<Vec<u8>> = ["", "a", "ab", "abc", "b", "ba"]
            .iter()
            .map(|k| k.as_bytes().to_vec())
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn merge_synthesizes_parent_for_diverging_segments() {
        let left = set(set(None, b"xa1", 1).into(), b"xa2", 2);
        let right = set(set(None, b"xb1", 3).into(), b"xb2", 4);
        let merged = left.merge(right, &mut |l, r| l + r);
        merged.assert_invariants();
        assert_eq!(merged.segment(), b"x");
        assert_eq!(merged.count(), 4);
        for (key, value) in [(&b"xa1"[..], 1), (b"xa2", 2), (b"xb1", 3), (b"xb2", 4)] {
            assert_eq!(merged.get(key), Some(&value));
        }
    }

    #[test]
    fn merge_respects_argument_order() {
        let left = set(set(None, b"k", 10).into(), b"kz", 0);
        let right = Node::Leaf(Leaf::new(b"k".to_vec(), 3));
        let merged = left.clone().merge(right.clone(), &mut |l, r| l - r);
        assert_eq!(merged.get(b"k"), Some(&7));
        let merged = right.merge(left, &mut |l, r| l * 100 + r);
        assert_eq!(merged.get(b"k"), Some(&310));
    }
}
