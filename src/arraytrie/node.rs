use tracing::trace;

use crate::codec::KeyEncoding;
use crate::map::PersistentMap;
use crate::shared::Shared;

pub(crate) type ChildMap<K, V> = PersistentMap<K, ArrayTrieNode<K, V>>;

/// A node of an [`ArrayTrie`](super::ArrayTrie).
///
/// `prefix` is never empty and its first element is the key this node is
/// stored under in its parent's child map. A node without a value always
/// has at least two children.
#[derive(Clone)]
pub(crate) struct ArrayTrieNode<K, V> {
    pub(crate) prefix: Vec<K>,
    pub(crate) value: Option<V>,
    pub(crate) children: Shared<ChildMap<K, V>>,
}

fn common_len<K: PartialEq>(a: &[K], b: &[K]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl<K, V> ArrayTrieNode<K, V> {
    pub(crate) fn new(prefix: Vec<K>, value: Option<V>) -> Self {
        Self::with_children(prefix, value, ChildMap::new())
    }

    pub(crate) fn with_children(prefix: Vec<K>, value: Option<V>, children: ChildMap<K, V>) -> Self {
        debug_assert!(!prefix.is_empty());
        ArrayTrieNode {
            prefix,
            value,
            children: Shared::new(children),
        }
    }

    /// Number of values in this subtree. Walks the whole subtree.
    pub(crate) fn count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += usize::from(node.value.is_some());
            stack.extend(node.children.values());
        }
        count
    }
}

impl<K: KeyEncoding + PartialEq, V> ArrayTrieNode<K, V> {
    pub(crate) fn get(&self, keys: &[K]) -> Option<&V> {
        let mut node = self;
        let mut keys = keys;
        loop {
            let rest = keys.strip_prefix(node.prefix.as_slice())?;
            let Some(first) = rest.first() else {
                return node.value.as_ref();
            };
            node = node.children.get(first)?;
            keys = rest;
        }
    }

    /// The value stored at `keys` or at its nearest ancestor on this
    /// route, falling back to `best`.
    pub(crate) fn resolve<'a>(&'a self, keys: &[K], mut best: Option<&'a V>) -> Option<&'a V> {
        let mut node = self;
        let mut keys = keys;
        loop {
            let Some(rest) = keys.strip_prefix(node.prefix.as_slice()) else {
                return best;
            };
            if let Some(value) = &node.value {
                best = Some(value);
            }
            let Some(child) = rest.first().and_then(|first| node.children.get(first)) else {
                return best;
            };
            node = child;
            keys = rest;
        }
    }

    /// Restricts `keys` to the nodes below it, returning the children that
    /// the path-relative trie is made of together with the nearest value
    /// seen on the way down.
    ///
    /// A value stored exactly at `keys` counts as seen. When `keys` ends
    /// inside this node's prefix the node is below the path and its value
    /// stays with the node.
    pub(crate) fn subtree_with_cover<'a>(
        &'a self,
        keys: &[K],
        current: Option<&'a V>,
    ) -> (ChildMap<K, V>, Option<&'a V>)
    where
        K: Clone,
        V: Clone,
    {
        let common = common_len(&self.prefix, keys);
        if common == keys.len() {
            return match self.prefix[common..].first() {
                None => ((*self.children).clone(), self.value.as_ref().or(current)),
                Some(first) => {
                    let node = self.clone().strip(common);
                    (PersistentMap::from([(first.clone(), node)]), current)
                }
            };
        }
        if common < self.prefix.len() {
            return (ChildMap::new(), current);
        }
        let current = self.value.as_ref().or(current);
        let rest = &keys[common..];
        match self.children.get(&rest[0]) {
            Some(child) => child.subtree_with_cover(rest, current),
            None => (ChildMap::new(), current),
        }
    }
}

impl<K: KeyEncoding + Clone + PartialEq, V: Clone> ArrayTrieNode<K, V> {
    /// Drops the first `n` elements of the prefix.
    fn strip(mut self, n: usize) -> Self {
        self.prefix.drain(..n);
        self
    }

    pub(crate) fn prefixed(mut self, prefix: &[K]) -> Self {
        self.prefix.splice(0..0, prefix.iter().cloned());
        self
    }

    fn put_child(&mut self, child: Self) {
        let first = child.prefix[0].clone();
        self.children.make_mut().insert(first, child);
    }

    /// Path-compresses a node that lost its value or a child.
    pub(crate) fn compact(self) -> Option<Self> {
        if self.value.is_some() || self.children.count_at_least(2) {
            return Some(self);
        }
        let only = self.children.values().next().cloned();
        match only {
            None => None,
            Some(child) => {
                trace!(
                    prefix_len = self.prefix.len(),
                    "merging trie node into its only child"
                );
                Some(child.prefixed(&self.prefix))
            }
        }
    }

    /// Stores `value` at `keys`, which must share this node's first element.
    pub(crate) fn insert(mut self, keys: &[K], value: V) -> (Self, Option<V>) {
        let common = common_len(&self.prefix, keys);
        if common == self.prefix.len() {
            let rest = &keys[common..];
            let Some(first) = rest.first() else {
                let replaced = self.value.replace(value);
                return (self, replaced);
            };
            let children = self.children.make_mut();
            let (child, replaced) = match children.remove(first) {
                Some(child) => child.insert(rest, value),
                None => (Self::new(rest.to_vec(), Some(value)), None),
            };
            children.insert(first.clone(), child);
            return (self, replaced);
        }

        let mut parent = if common == keys.len() {
            Self::new(keys.to_vec(), Some(value))
        } else {
            let mut parent = Self::new(keys[..common].to_vec(), None);
            parent.put_child(Self::new(keys[common..].to_vec(), Some(value)));
            parent
        };
        parent.put_child(self.strip(common));
        (parent, None)
    }

    /// Removes the value at `keys`, which must be stored in this subtree.
    pub(crate) fn remove(mut self, keys: &[K]) -> (Option<Self>, V) {
        let rest = &keys[self.prefix.len()..];
        let removed = match rest.first() {
            None => self
                .value
                .take()
                .expect("removed path ends at this node"),
            Some(first) => {
                let children = self.children.make_mut();
                let child = children
                    .remove(first)
                    .expect("removed path continues into a child");
                let (child, removed) = child.remove(rest);
                if let Some(child) = child {
                    children.insert(first.clone(), child);
                }
                removed
            }
        };
        (self.compact(), removed)
    }

    /// Keeps only the values whose path starts with `keys`.
    pub(crate) fn including(self, keys: &[K]) -> Option<Self> {
        let common = common_len(&self.prefix, keys);
        if common == keys.len() {
            return Some(self);
        }
        if common < self.prefix.len() {
            return None;
        }
        let rest = &keys[common..];
        let child = self.children.get(&rest[0])?.clone().including(rest)?;
        // Our own value sits above `keys`, so only the child survives.
        Some(child.prefixed(&self.prefix))
    }

    /// Drops every value whose path starts with `keys`.
    pub(crate) fn excluding(mut self, keys: &[K]) -> Option<Self> {
        let common = common_len(&self.prefix, keys);
        if common == keys.len() {
            return None;
        }
        if common < self.prefix.len() {
            return Some(self);
        }
        let rest = &keys[common..];
        let Some(child) = self.children.get(&rest[0]) else {
            return Some(self);
        };
        match child.clone().excluding(rest) {
            Some(child) => self.put_child(child),
            None => {
                self.children.make_mut().remove(&rest[0]);
            }
        }
        self.compact()
    }

    /// The children that make up the trie below `keys`, with `keys`
    /// stripped from their paths. A value stored exactly at `keys` is
    /// dropped.
    pub(crate) fn subtree(&self, keys: &[K]) -> ChildMap<K, V> {
        let common = common_len(&self.prefix, keys);
        if common == keys.len() {
            return match self.prefix[common..].first() {
                None => (*self.children).clone(),
                Some(first) => PersistentMap::from([(first.clone(), self.clone().strip(common))]),
            };
        }
        if common < self.prefix.len() {
            return ChildMap::new();
        }
        let rest = &keys[common..];
        match self.children.get(&rest[0]) {
            Some(child) => child.subtree(rest),
            None => ChildMap::new(),
        }
    }

    /// Merges two nodes stored under the same key.
    ///
    /// Values stored on both sides become `combine(left, right)` with
    /// `self` on the left.
    pub(crate) fn merge<F>(self, other: Self, combine: &mut F) -> Self
    where
        F: FnMut(V, V) -> V,
    {
        let common = common_len(&self.prefix, &other.prefix);
        match (common == self.prefix.len(), common == other.prefix.len()) {
            (true, true) => {
                let value = match (self.value, other.value) {
                    (Some(left), Some(right)) => Some(combine(left, right)),
                    (left, right) => left.or(right),
                };
                let mut children = self.children.into_inner();
                children.merge(other.children.into_inner(), |left, right| {
                    left.merge(right, &mut *combine)
                });
                Self::with_children(self.prefix, value, children)
            }
            (true, false) => {
                let below = other.strip(common);
                let first = below.prefix[0].clone();
                let mut node = self;
                let children = node.children.make_mut();
                let child = match children.remove(&first) {
                    Some(existing) => existing.merge(below, combine),
                    None => below,
                };
                children.insert(first, child);
                node
            }
            (false, true) => {
                let below = self.strip(common);
                let first = below.prefix[0].clone();
                let mut node = other;
                let children = node.children.make_mut();
                let child = match children.remove(&first) {
                    Some(existing) => below.merge(existing, combine),
                    None => below,
                };
                children.insert(first, child);
                node
            }
            (false, false) => {
                trace!(common, "merging diverging trie nodes under a new parent");
                let mut parent = Self::new(self.prefix[..common].to_vec(), None);
                parent.put_child(self.strip(common));
                parent.put_child(other.strip(common));
                parent
            }
        }
    }
}

#[cfg(test)]
impl<K: KeyEncoding + PartialEq, V> ArrayTrieNode<K, V> {
    pub(crate) fn assert_invariants(&self) {
        assert!(!self.prefix.is_empty());
        assert!(
            self.value.is_some() || self.children.count_at_least(2),
            "valueless trie node with fewer than two children"
        );
        for (key, child) in self.children.iter() {
            assert!(child.prefix.first() == Some(&key));
            child.assert_invariants();
        }
    }
}
