//! Sets of key paths.

use std::fmt;

use crate::arraytrie::{self, ArrayTrie};
use crate::codec::KeyEncoding;

/// An [`ArrayTrie`] without values: a set of paths.
pub struct ArrayTrieSet<K> {
    trie: ArrayTrie<K, ()>,
}

impl<K> ArrayTrieSet<K> {
    pub const fn new() -> Self {
        ArrayTrieSet {
            trie: ArrayTrie::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.trie.iter(),
        }
    }

    pub fn as_trie(&self) -> &ArrayTrie<K, ()> {
        &self.trie
    }

    pub fn into_trie(self) -> ArrayTrie<K, ()> {
        self.trie
    }
}

impl<K: KeyEncoding + PartialEq> ArrayTrieSet<K> {
    pub fn contains(&self, path: &[K]) -> bool {
        self.trie.contains(path)
    }

    pub fn child_keys(&self) -> Vec<K> {
        self.trie.child_keys()
    }
}

impl<K: KeyEncoding + Clone + PartialEq> ArrayTrieSet<K> {
    /// Adds `path` and returns true if it was not present yet. The empty
    /// path is never stored.
    pub fn insert(&mut self, path: &[K]) -> bool {
        !path.is_empty() && self.trie.insert(path, ()).is_none()
    }

    /// Removes `path` and returns true if it was present.
    pub fn remove(&mut self, path: &[K]) -> bool {
        self.trie.remove(path).is_some()
    }

    pub fn including(&self, path: &[K]) -> Self {
        self.trie.including(path).into()
    }

    pub fn excluding(&self, path: &[K]) -> Self {
        self.trie.excluding(path).into()
    }

    pub fn subtree(&self, path: &[K]) -> Self {
        self.trie.subtree(path).into()
    }

    pub fn supertree(&self, path: &[K]) -> Self {
        self.trie.supertree(path).into()
    }

    /// Adds every path of `other`.
    pub fn union(&mut self, other: Self) {
        self.trie.overwrite(other.trie);
    }

    /// Same as [`union`](Self::union); sets carry no values to overwrite.
    pub fn overwrite(&mut self, other: Self) {
        self.union(other);
    }
}

impl<K> From<ArrayTrie<K, ()>> for ArrayTrieSet<K> {
    fn from(trie: ArrayTrie<K, ()>) -> Self {
        ArrayTrieSet { trie }
    }
}

impl<K: Clone> Clone for ArrayTrieSet<K> {
    fn clone(&self) -> Self {
        ArrayTrieSet {
            trie: self.trie.clone(),
        }
    }
}

impl<K> Default for ArrayTrieSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq + Clone> PartialEq for ArrayTrieSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.trie == other.trie
    }
}

impl<K: Eq + Clone> Eq for ArrayTrieSet<K> {}

impl<K: fmt::Debug + Clone> fmt::Debug for ArrayTrieSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: KeyEncoding + Clone + PartialEq> FromIterator<Vec<K>> for ArrayTrieSet<K> {
    fn from_iter<I: IntoIterator<Item = Vec<K>>>(iter: I) -> Self {
        let mut set = ArrayTrieSet::new();
        set.extend(iter);
        set
    }
}

impl<K: KeyEncoding + Clone + PartialEq> Extend<Vec<K>> for ArrayTrieSet<K> {
    fn extend<I: IntoIterator<Item = Vec<K>>>(&mut self, iter: I) {
        for path in iter {
            self.insert(&path);
        }
    }
}

impl<'a, K: Clone> IntoIterator for &'a ArrayTrieSet<K> {
    type Item = Vec<K>;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the paths of an [`ArrayTrieSet`] in ascending order.
pub struct Iter<'a, K> {
    inner: arraytrie::Iter<'a, K, ()>,
}

impl<K: Clone> Iterator for Iter<'_, K> {
    type Item = Vec<K>;

    fn next(&mut self) -> Option<Vec<K>> {
        self.inner.next().map(|(path, _)| path)
    }
}
