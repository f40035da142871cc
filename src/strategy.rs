//! Proptest strategies for the collections, for use in downstream property
//! tests.
//!
//! ```
//! use persistent_collections::strategy;
//! use proptest::prelude::*;
//! use proptest::strategy::ValueTree;
//! use proptest::test_runner::TestRunner;
//!
//! let maps = strategy::persistent_map(any::<u16>(), any::<bool>(), 0..20);
//! let map = maps.new_tree(&mut TestRunner::default()).unwrap().current();
//! assert!(map.len() < 20);
//! ```

use std::fmt::Debug;

use proptest::collection::{btree_map, vec, SizeRange};
use proptest::prelude::*;

use crate::arraytrie::ArrayTrie;
use crate::codec::KeyEncoding;
use crate::map::PersistentMap;

/// Maps with up to `size` pairs drawn from `key` and `value`.
pub fn persistent_map<K, V>(
    key: impl Strategy<Value = K>,
    value: impl Strategy<Value = V>,
    size: impl Into<SizeRange>,
) -> impl Strategy<Value = PersistentMap<K, V>>
where
    K: KeyEncoding + Ord + Debug,
    V: Clone + Debug,
{
    btree_map(key, value, size).prop_map(|pairs| pairs.into_iter().collect())
}

/// Tries with up to `size` values stored under paths of 1 to `max_depth`
/// elements.
///
/// A small element alphabet makes paths share prefixes, which is where the
/// interesting restructuring happens.
pub fn array_trie<K, V>(
    element: impl Strategy<Value = K>,
    value: impl Strategy<Value = V>,
    max_depth: usize,
    size: impl Into<SizeRange>,
) -> impl Strategy<Value = ArrayTrie<K, V>>
where
    K: KeyEncoding + Clone + Ord + Debug,
    V: Clone + Debug,
{
    btree_map(vec(element, 1..=max_depth.max(1)), value, size)
        .prop_map(|pairs| pairs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_maps_are_consistent(map in persistent_map(any::<u32>(), any::<u8>(), 0..40)) {
            prop_assert_eq!(map.iter().count(), map.len());
            let keys: Vec<u32> = map.keys().collect();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn generated_tries_respect_depth(trie in array_trie(0u8..3, any::<u8>(), 4, 0..30)) {
            for (path, _) in trie.iter() {
                prop_assert!(!path.is_empty() && path.len() <= 4);
            }
        }
    }
}
