//! Tries with nearest-ancestor-value lookup.
//!
//! A [`NavArrayTrie`] is an [`ArrayTrie`] that also remembers the value
//! inherited from above its own root. Taking a subtree carries down the
//! most specific value seen on the way, so a path without a value of its
//! own falls back to its closest ancestor that has one.
//!
//! ```
//! use persistent_collections::arraytrie::ArrayTrie;
//! use persistent_collections::nav::NavArrayTrie;
//!
//! let path = |p: &str| p.split('/').map(str::to_string).collect::<Vec<_>>();
//! let mut trie = ArrayTrie::new();
//! trie.insert(&path("etc"), "root:root");
//! trie.insert(&path("etc/ssh/keys"), "root:ssh");
//!
//! let nav = NavArrayTrie::from(trie);
//! let ssh = nav.subtree_with_cover(&path("etc/ssh"));
//! assert_eq!(ssh.ancestor_value(), Some(&"root:root"));
//! assert_eq!(ssh.resolve(&path("keys")), Some(&"root:ssh"));
//! assert_eq!(ssh.resolve(&path("config")), Some(&"root:root"));
//! ```

use std::fmt;

use crate::arraytrie::ArrayTrie;
use crate::codec::KeyEncoding;

pub struct NavArrayTrie<K, V> {
    trie: ArrayTrie<K, V>,
    ancestor_value: Option<V>,
}

impl<K, V> NavArrayTrie<K, V> {
    pub fn new(trie: ArrayTrie<K, V>, ancestor_value: Option<V>) -> Self {
        NavArrayTrie {
            trie,
            ancestor_value,
        }
    }

    pub fn trie(&self) -> &ArrayTrie<K, V> {
        &self.trie
    }

    /// The value inherited from above the root of [`trie`](Self::trie).
    pub fn ancestor_value(&self) -> Option<&V> {
        self.ancestor_value.as_ref()
    }

    pub fn into_parts(self) -> (ArrayTrie<K, V>, Option<V>) {
        (self.trie, self.ancestor_value)
    }
}

impl<K: KeyEncoding + PartialEq, V> NavArrayTrie<K, V> {
    /// Returns true if the single-element path `[key]` holds a value.
    pub fn contains(&self, key: &K) -> bool {
        self.trie.contains(std::slice::from_ref(key))
    }

    /// The value at `path`, or at its nearest ancestor that has one, or
    /// the inherited value.
    pub fn resolve(&self, path: &[K]) -> Option<&V> {
        let inherited = self.ancestor_value.as_ref();
        let Some(first) = path.first() else {
            return inherited;
        };
        match self.trie.children.get(first) {
            Some(node) => node.resolve(path, inherited),
            None => inherited,
        }
    }
}

impl<K: KeyEncoding + Clone + PartialEq, V: Clone> NavArrayTrie<K, V> {
    /// The trie below `path` together with the value it inherits.
    ///
    /// The inherited value is the one stored at `path` itself if there is
    /// one, else the one at its nearest ancestor, else this trie's own
    /// inherited value. This holds even when nothing is stored below
    /// `path`, in which case the result is an empty trie inheriting that
    /// nearest value rather than the root's inherited value.
    pub fn subtree_with_cover(&self, path: &[K]) -> Self {
        let Some(first) = path.first() else {
            return self.clone();
        };
        let inherited = self.ancestor_value.as_ref();
        let (children, cover) = match self.trie.children.get(first) {
            Some(node) => node.subtree_with_cover(path, inherited),
            None => (Default::default(), inherited),
        };
        NavArrayTrie {
            trie: ArrayTrie::from_children(children),
            ancestor_value: cover.cloned(),
        }
    }
}

impl<K, V> From<ArrayTrie<K, V>> for NavArrayTrie<K, V> {
    fn from(trie: ArrayTrie<K, V>) -> Self {
        NavArrayTrie::new(trie, None)
    }
}

impl<K: Clone, V: Clone> Clone for NavArrayTrie<K, V> {
    fn clone(&self) -> Self {
        NavArrayTrie {
            trie: self.trie.clone(),
            ancestor_value: self.ancestor_value.clone(),
        }
    }
}

impl<K, V> Default for NavArrayTrie<K, V> {
    fn default() -> Self {
        NavArrayTrie::new(ArrayTrie::new(), None)
    }
}

impl<K: PartialEq + Clone, V: PartialEq> PartialEq for NavArrayTrie<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ancestor_value == other.ancestor_value && self.trie == other.trie
    }
}

impl<K: fmt::Debug + Clone, V: fmt::Debug> fmt::Debug for NavArrayTrie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavArrayTrie")
            .field("trie", &self.trie)
            .field("ancestor_value", &self.ancestor_value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn p(path: &str) -> Vec<String> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn nav(pairs: &[(&str, u32)], inherited: Option<u32>) -> NavArrayTrie<String, u32> {
        let trie = pairs.iter().map(|(path, v)| (p(path), *v)).collect();
        NavArrayTrie::new(trie, inherited)
    }

    #[test]
    fn cover_is_nearest_ancestor() {
        let n = nav(&[("a", 1), ("a/b/c", 2), ("a/b/c/d", 3)], Some(0));
        assert_eq!(n.subtree_with_cover(&p("a")).ancestor_value(), Some(&1));
        assert_eq!(n.subtree_with_cover(&p("a/b")).ancestor_value(), Some(&1));
        assert_eq!(n.subtree_with_cover(&p("a/b/c")).ancestor_value(), Some(&2));
        assert_eq!(n.subtree_with_cover(&p("a/b/c/d/e")).ancestor_value(), Some(&3));
        assert_eq!(n.subtree_with_cover(&p("x")).ancestor_value(), Some(&0));
    }

    #[test]
    fn cover_keeps_the_restricted_subtree() {
        let n = nav(&[("a", 1), ("a/b/c", 2), ("a/b/d", 3)], None);
        let sub = n.subtree_with_cover(&p("a/b"));
        assert_eq!(sub.ancestor_value(), Some(&1));
        assert_eq!(sub.trie().get(&p("c")), Some(&2));
        assert_eq!(sub.trie().get(&p("d")), Some(&3));
        assert_eq!(sub.trie().len(), 2);

        // The path ends inside a compressed prefix: the node below keeps its
        // own value and the cover comes from above.
        let n = nav(&[("a", 1), ("a/b/c/d", 2)], None);
        let sub = n.subtree_with_cover(&p("a/b"));
        assert_eq!(sub.ancestor_value(), Some(&1));
        assert_eq!(sub.trie().get(&p("c/d")), Some(&2));
    }

    #[test]
    fn failed_descent_carries_nearest_value() {
        let n = nav(&[("a", 1), ("a/b", 2)], Some(0));
        let sub = n.subtree_with_cover(&p("a/b/x/y"));
        assert!(sub.trie().is_empty());
        assert_eq!(sub.ancestor_value(), Some(&2));
        let sub = n.subtree_with_cover(&p("q"));
        assert!(sub.trie().is_empty());
        assert_eq!(sub.ancestor_value(), Some(&0));
    }

    #[test]
    fn contains_checks_single_key_paths() {
        let n = nav(&[("a", 1), ("b/c", 2)], None);
        assert!(n.contains(&"a".to_string()));
        assert!(!n.contains(&"b".to_string()));
        assert!(!n.contains(&"z".to_string()));
    }

    #[test]
    fn empty_path_is_identity() {
        let n = nav(&[("a", 1)], Some(7));
        assert_eq!(n.subtree_with_cover(&[]), n);
        assert_eq!(n.resolve(&[]), Some(&7));
    }

    proptest! {
        #[test]
        fn cover_matches_resolve_and_model(
            pairs in prop::collection::btree_map(prop::collection::vec(0u8..3, 1..5), any::<u16>(), 0..30),
            path in prop::collection::vec(0u8..3, 1..6),
            inherited in any::<Option<u16>>(),
        ) {
            let trie: ArrayTrie<u8, u16> = pairs.clone().into_iter().collect();
            let n = NavArrayTrie::new(trie, inherited);
            let expected = (1..=path.len())
                .rev()
                .find_map(|len| pairs.get(&path[..len]))
                .or(inherited.as_ref());
            let sub = n.subtree_with_cover(&path);
            prop_assert_eq!(sub.ancestor_value(), expected);
            prop_assert_eq!(n.resolve(&path), expected);

            let below: BTreeMap<Vec<u8>, u16> = pairs
                .iter()
                .filter(|(k, _)| k.len() > path.len() && k.starts_with(&path))
                .map(|(k, v)| (k[path.len()..].to_vec(), *v))
                .collect();
            prop_assert_eq!(sub.trie().elements(), below.into_iter().collect::<Vec<_>>());
        }
    }
}
