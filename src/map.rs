//! A persistent map over byte-encodable keys.
//!
//! [`PersistentMap`] is a thin facade over the radix engine: keys are turned
//! into bytes with [`KeyEncoding`] and the tree is rooted in at most one
//! node. Cloning a map only copies the root reference, and every write
//! copies just the nodes on the path to the change, so old versions stay
//! valid and cheap to keep around.
//!
//! ```
//! use persistent_collections::map::PersistentMap;
//!
//! let mut v1 = PersistentMap::new();
//! v1.insert("foo".to_string(), 1);
//! v1.insert("foobar".to_string(), 2);
//!
//! let v2 = v1.without(&"foo".to_string());
//! assert_eq!(v1.get(&"foo".to_string()), Some(&1));
//! assert_eq!(v2.get(&"foo".to_string()), None);
//! assert_eq!(v2.len(), 1);
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::codec::KeyEncoding;
use crate::radix::{self, Leaf, Node, Order};

pub struct PersistentMap<K, V> {
    root: Option<Node<V>>,
    _key: PhantomData<K>,
}

impl<K, V> PersistentMap<K, V> {
    pub const fn new() -> Self {
        PersistentMap {
            root: None,
            _key: PhantomData,
        }
    }

    /// Number of stored pairs. This is cached in the nodes and O(1).
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, Node::count)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns true if the map holds at least `n` pairs.
    pub fn count_at_least(&self, n: usize) -> bool {
        self.len() >= n
    }

    /// Iterates over the stored values in ascending key order.
    pub fn values(&self) -> Values<'_, V> {
        Values {
            inner: radix::Iter::new(self.root.as_ref()),
        }
    }

    pub(crate) fn raw_iter(&self) -> radix::Iter<'_, V> {
        radix::Iter::new(self.root.as_ref())
    }
}

impl<K: KeyEncoding, V> PersistentMap<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.root.as_ref()?.get(&key.encode())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over the pairs in ascending order of their encoded keys.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.raw_iter(),
            _key: PhantomData,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// The pair with the smallest encoded key.
    pub fn first(&self) -> Option<(K, &V)> {
        self.iter().next()
    }
}

impl<K: KeyEncoding, V: Clone> PersistentMap<K, V> {
    /// Stores `value` under `key` and returns the value it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut replaced = None;
        self.upsert_bytes(&key.encode(), value, |old, new| {
            replaced = Some(old);
            new
        });
        replaced
    }

    /// Stores `value` under `key`, or `combine(existing, value)` if the key
    /// is already present.
    pub fn upsert<F>(&mut self, key: K, value: V, combine: F)
    where
        F: FnMut(V, V) -> V,
    {
        self.upsert_bytes(&key.encode(), value, combine);
    }

    fn upsert_bytes<F>(&mut self, key: &[u8], value: V, mut combine: F)
    where
        F: FnMut(V, V) -> V,
    {
        let root = match self.root.take() {
            None => Node::Leaf(Leaf::new(key.to_vec(), value)),
            Some(root) => {
                root.upsert(key, 0, value, &mut combine, Order::ExistingFirst)
                    .0
            }
        };
        self.root = Some(root);
    }

    /// Removes `key` and returns its value.
    ///
    /// Removing an absent key leaves the map, and every node in it, as it
    /// was.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let key = key.encode();
        self.root.as_ref()?.get(&key)?;
        let (root, removed) = self.root.take()?.remove(&key, 0);
        self.root = root;
        Some(removed)
    }

    /// Merges `other` into this map.
    ///
    /// Keys present on both sides end up with `combine(ours, theirs)`.
    pub fn merge<F>(&mut self, other: Self, mut combine: F)
    where
        F: FnMut(V, V) -> V,
    {
        self.root = match (self.root.take(), other.root) {
            (Some(left), Some(right)) => Some(left.merge(right, &mut combine)),
            (left, right) => left.or(right),
        };
    }

    /// Merges `other` into this map, letting its values win.
    pub fn overwrite(&mut self, other: Self) {
        self.merge(other, |_, theirs| theirs);
    }

    /// Returns a new version with `key` set to `value`.
    pub fn update(&self, key: K, value: V) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    /// Returns a new version without `key`.
    pub fn without(&self, key: &K) -> Self {
        let mut next = self.clone();
        next.remove(key);
        next
    }

    /// Returns the merge of both versions, leaving them untouched.
    pub fn merged<F>(&self, other: &Self, combine: F) -> Self
    where
        F: FnMut(V, V) -> V,
    {
        let mut next = self.clone();
        next.merge(other.clone(), combine);
        next
    }
}

impl<K, V: Clone> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        PersistentMap {
            root: self.root.clone(),
            _key: PhantomData,
        }
    }
}

impl<K, V> Default for PersistentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: PartialEq> PartialEq for PersistentMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.raw_iter().eq(other.raw_iter())
    }
}

impl<K, V: Eq> Eq for PersistentMap<K, V> {}

impl<K: KeyEncoding + fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: KeyEncoding, V: Clone> FromIterator<(K, V)> for PersistentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = PersistentMap::new();
        map.extend(iter);
        map
    }
}

impl<K: KeyEncoding, V: Clone> Extend<(K, V)> for PersistentMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: KeyEncoding, V: Clone, const N: usize> From<[(K, V); N]> for PersistentMap<K, V> {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a, K: KeyEncoding, V> IntoIterator for &'a PersistentMap<K, V> {
    type Item = (K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the pairs of a [`PersistentMap`], decoding keys on the fly.
pub struct Iter<'a, K, V> {
    inner: radix::Iter<'a, V>,
    _key: PhantomData<K>,
}

impl<'a, K: KeyEncoding, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (bytes, value) = self.inner.next()?;
        let key = K::decode(&bytes).expect("stored keys are produced by KeyEncoding::encode");
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: KeyEncoding, V> ExactSizeIterator for Iter<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K: KeyEncoding, V> Iterator for Keys<'_, K, V> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: KeyEncoding, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, V> {
    inner: radix::Iter<'a, V>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Values<'_, V> {}

#[cfg(test)]
impl<K, V> PersistentMap<K, V> {
    fn assert_invariants(&self) {
        if let Some(root) = &self.root {
            root.assert_invariants();
        }
    }
}
