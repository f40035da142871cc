//! Persistent tries over sequences of keys.
//!
//! An [`ArrayTrie`] stores values under paths such as `["usr", "local",
//! "bin"]`. It uses the same path compression as the byte-level radix
//! engine, but every level keeps its children in a [`PersistentMap`] keyed
//! by the first element of the child's prefix. Besides point operations it
//! offers views scoped to a path prefix:
//!
//! * [`including`](ArrayTrie::including) and [`excluding`](ArrayTrie::excluding)
//!   split a trie into the part below a path and everything else,
//! * [`subtree`](ArrayTrie::subtree) re-roots a trie at a path,
//! * [`supertree`](ArrayTrie::supertree) grafts a trie below a path.
//!
//! ```
//! use persistent_collections::arraytrie::ArrayTrie;
//!
//! let mut trie = ArrayTrie::new();
//! trie.insert(&["a".to_string(), "b".to_string()], 1);
//! trie.insert(&["a".to_string(), "c".to_string()], 2);
//! assert_eq!(trie.child_keys(), vec!["a".to_string()]);
//!
//! let below = trie.subtree(&["a".to_string()]);
//! assert_eq!(below.get(&["b".to_string()]), Some(&1));
//! assert_eq!(below.get(&["c".to_string()]), Some(&2));
//! ```

mod node;

use std::fmt;

use crate::codec::KeyEncoding;
use crate::map::PersistentMap;
use crate::shared::Shared;

pub(crate) use node::{ArrayTrieNode, ChildMap};

pub struct ArrayTrie<K, V> {
    pub(crate) children: ChildMap<K, V>,
}

impl<K, V> ArrayTrie<K, V> {
    pub const fn new() -> Self {
        ArrayTrie {
            children: PersistentMap::new(),
        }
    }

    pub(crate) fn from_children(children: ChildMap<K, V>) -> Self {
        ArrayTrie { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of stored values. Walks the whole trie.
    pub fn len(&self) -> usize {
        self.children.values().map(ArrayTrieNode::count).sum()
    }

    /// Returns true if the trie holds at least `n` values.
    ///
    /// Every node holds a value or has at least two children, so each
    /// pending node accounts for at least one more value. The walk stops
    /// as soon as that bound reaches `n`.
    pub fn count_at_least(&self, n: usize) -> bool {
        let mut found = 0;
        let mut pending: Vec<&ArrayTrieNode<K, V>> = self.children.values().collect();
        while found + pending.len() < n {
            let Some(node) = pending.pop() else {
                return false;
            };
            found += usize::from(node.value.is_some());
            pending.extend(node.children.values());
        }
        true
    }

    /// Iterates over `(path, value)` pairs in ascending order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }
}

impl<K: KeyEncoding + PartialEq, V> ArrayTrie<K, V> {
    pub fn get(&self, path: &[K]) -> Option<&V> {
        let first = path.first()?;
        self.children.get(first)?.get(path)
    }

    pub fn contains(&self, path: &[K]) -> bool {
        self.get(path).is_some()
    }

    /// The keys of the top level of the trie.
    pub fn child_keys(&self) -> Vec<K> {
        self.children.keys().collect()
    }
}

impl<K: KeyEncoding + Clone + PartialEq, V: Clone> ArrayTrie<K, V> {
    /// Stores `value` at `path` and returns the value it replaced.
    ///
    /// The empty path cannot hold a value; inserting there does nothing.
    pub fn insert(&mut self, path: &[K], value: V) -> Option<V> {
        let first = path.first()?;
        let (node, replaced) = match self.children.remove(first) {
            Some(node) => node.insert(path, value),
            None => (ArrayTrieNode::new(path.to_vec(), Some(value)), None),
        };
        self.children.insert(first.clone(), node);
        replaced
    }

    pub fn remove(&mut self, path: &[K]) -> Option<V> {
        self.get(path)?;
        let first = path.first()?;
        let (node, removed) = self.children.remove(first)?.remove(path);
        if let Some(node) = node {
            self.children.insert(first.clone(), node);
        }
        Some(removed)
    }

    /// Keeps only the values whose path starts with `path`.
    ///
    /// Values stored at strict ancestors of `path` are dropped as well, so
    /// `including(path)` and `excluding(path)` always split the trie into
    /// two disjoint halves.
    pub fn including(&self, path: &[K]) -> Self {
        let Some(first) = path.first() else {
            return self.clone();
        };
        let node = self
            .children
            .get(first)
            .and_then(|node| node.clone().including(path));
        match node {
            Some(node) => ArrayTrie::from_children(PersistentMap::from([(first.clone(), node)])),
            None => ArrayTrie::new(),
        }
    }

    /// Drops every value whose path starts with `path`.
    pub fn excluding(&self, path: &[K]) -> Self {
        let Some(first) = path.first() else {
            return ArrayTrie::new();
        };
        let Some(node) = self.children.get(first) else {
            return self.clone();
        };
        let mut trie = self.clone();
        match node.clone().excluding(path) {
            Some(node) => {
                trie.children.insert(first.clone(), node);
            }
            None => {
                trie.children.remove(first);
            }
        }
        trie
    }

    /// The trie below `path`, with `path` stripped from every key.
    ///
    /// A value stored exactly at `path` has no place in the result and is
    /// dropped.
    pub fn subtree(&self, path: &[K]) -> Self {
        let Some(first) = path.first() else {
            return self.clone();
        };
        match self.children.get(first) {
            Some(node) => ArrayTrie::from_children(node.subtree(path)),
            None => ArrayTrie::new(),
        }
    }

    /// This trie grafted below `path`, so that every key gains `path` as a
    /// prefix.
    pub fn supertree(&self, path: &[K]) -> Self {
        let Some(first) = path.first() else {
            return self.clone();
        };
        let Some(only) = self.children.values().next() else {
            return self.clone();
        };
        let root = if self.children.count_at_least(2) {
            ArrayTrieNode {
                prefix: path.to_vec(),
                value: None,
                children: Shared::new(self.children.clone()),
            }
        } else {
            only.clone().prefixed(path)
        };
        ArrayTrie::from_children(PersistentMap::from([(first.clone(), root)]))
    }

    /// Merges `other` into this trie.
    ///
    /// Paths present on both sides end up with `combine(ours, theirs)`.
    pub fn merge<F>(&mut self, other: Self, mut combine: F)
    where
        F: FnMut(V, V) -> V,
    {
        self.children
            .merge(other.children, |left, right| left.merge(right, &mut combine));
    }

    /// Merges `other` into this trie, letting its values win.
    pub fn overwrite(&mut self, other: Self) {
        self.merge(other, |_, theirs| theirs);
    }

    /// All `(path, value)` pairs in ascending order.
    pub fn elements(&self) -> Vec<(Vec<K>, V)> {
        self.iter()
            .map(|(path, value)| (path, value.clone()))
            .collect()
    }
}

impl<K: Clone, V: Clone> Clone for ArrayTrie<K, V> {
    fn clone(&self) -> Self {
        ArrayTrie {
            children: self.children.clone(),
        }
    }
}

impl<K, V> Default for ArrayTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq + Clone, V: PartialEq> PartialEq for ArrayTrie<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<K: Eq + Clone, V: Eq> Eq for ArrayTrie<K, V> {}

impl<K: fmt::Debug + Clone, V: fmt::Debug> fmt::Debug for ArrayTrie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: KeyEncoding + Clone + PartialEq, V: Clone> FromIterator<(Vec<K>, V)> for ArrayTrie<K, V> {
    fn from_iter<I: IntoIterator<Item = (Vec<K>, V)>>(iter: I) -> Self {
        let mut trie = ArrayTrie::new();
        for (path, value) in iter {
            trie.insert(&path, value);
        }
        trie
    }
}

impl<'a, K: Clone, V> IntoIterator for &'a ArrayTrie<K, V> {
    type Item = (Vec<K>, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the `(path, value)` pairs of an [`ArrayTrie`].
///
/// Like the byte-level iterator it keeps an explicit stack and a single
/// path buffer that is truncated back to the parent's length for every
/// node it visits.
pub struct Iter<'a, K, V> {
    stack: Vec<(usize, &'a ArrayTrieNode<K, V>)>,
    path: Vec<K>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn new(trie: &'a ArrayTrie<K, V>) -> Self {
        let mut stack: Vec<_> = trie.children.values().map(|node| (0, node)).collect();
        stack.reverse();
        Iter {
            stack,
            path: Vec::new(),
        }
    }
}

impl<'a, K: Clone, V> Iterator for Iter<'a, K, V> {
    type Item = (Vec<K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, node)) = self.stack.pop() {
            self.path.truncate(depth);
            self.path.extend_from_slice(&node.prefix);
            let depth = self.path.len();
            let start = self.stack.len();
            self.stack
                .extend(node.children.values().map(|child| (depth, child)));
            // Reversed, because we pop from the end.
            self.stack[start..].reverse();
            if let Some(value) = &node.value {
                return Some((self.path.clone(), value));
            }
        }
        None
    }
}

impl<K: Clone, V> std::iter::FusedIterator for Iter<'_, K, V> {}

#[cfg(test)]
impl<K: KeyEncoding + PartialEq, V> ArrayTrie<K, V> {
    pub(crate) fn assert_invariants(&self) {
        for (key, node) in self.children.iter() {
            assert!(node.prefix.first() == Some(&key));
            node.assert_invariants();
        }
    }
}
