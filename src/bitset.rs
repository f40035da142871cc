//! A 256-bit set over byte values.
//!
//! Internal trie nodes keep one of these per child kind to record which next
//! bytes lead somewhere. Children are stored in dense vectors ordered by
//! byte, and [`ByteBitset::rank`] maps a byte to its slot in that vector.

use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteBitset {
    bits: [u64; 4],
}

impl ByteBitset {
    pub const fn new_empty() -> Self {
        ByteBitset { bits: [0; 4] }
    }

    pub fn is_empty(&self) -> bool {
        (self.bits[0] == 0) && (self.bits[1] == 0) && (self.bits[2] == 0) && (self.bits[3] == 0)
    }

    pub fn count(&self) -> u32 {
        self.bits[0].count_ones()
            + self.bits[1].count_ones()
            + self.bits[2].count_ones()
            + self.bits[3].count_ones()
    }

    pub fn set(&mut self, index: u8) {
        self.bits[usize::from(index >> 6)] |= 1 << (index & 0b111111);
    }

    pub fn unset(&mut self, index: u8) {
        self.bits[usize::from(index >> 6)] &= !(1 << (index & 0b111111));
    }

    pub fn set_value(&mut self, index: u8, value: bool) {
        if value {
            self.set(index);
        } else {
            self.unset(index);
        }
    }

    pub fn is_set(&self, index: u8) -> bool {
        0 != (self.bits[usize::from(index >> 6)] & (1 << (index & 0b111111)))
    }

    /// Number of set bits strictly below `index`.
    ///
    /// This is the position a child selected by `index` occupies (or would
    /// occupy after insertion) in a dense array ordered by byte.
    pub fn rank(&self, index: u8) -> usize {
        let word = usize::from(index >> 6);
        let below = self.bits[word] & ((1u64 << (index & 0b111111)) - 1);
        let mut rank = below.count_ones() as usize;
        for full in &self.bits[..word] {
            rank += full.count_ones() as usize;
        }
        rank
    }

    /// The dense slot of `index`, if it is set.
    pub fn position(&self, index: u8) -> Option<usize> {
        if self.is_set(index) {
            Some(self.rank(index))
        } else {
            None
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        ByteBitset {
            bits: [
                self.bits[0] | other.bits[0],
                self.bits[1] | other.bits[1],
                self.bits[2] | other.bits[2],
                self.bits[3] | other.bits[3],
            ],
        }
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        (self.bits[0] & other.bits[0]) == 0
            && (self.bits[1] & other.bits[1]) == 0
            && (self.bits[2] & other.bits[2]) == 0
            && (self.bits[3] & other.bits[3]) == 0
    }

    pub fn find_first_set(&self) -> Option<u8> {
        if self.bits[0] != 0 {
            return Some(self.bits[0].trailing_zeros() as u8);
        }
        if self.bits[1] != 0 {
            return Some((1 << 6) + (self.bits[1].trailing_zeros() as u8));
        }
        if self.bits[2] != 0 {
            return Some((2 << 6) + (self.bits[2].trailing_zeros() as u8));
        }
        if self.bits[3] != 0 {
            return Some((3 << 6) + (self.bits[3].trailing_zeros() as u8));
        }
        None
    }

    pub fn find_last_set(&self) -> Option<u8> {
        if self.bits[3] != 0 {
            return Some((3 << 6) + (63 - (self.bits[3].leading_zeros() as u8)));
        }
        if self.bits[2] != 0 {
            return Some((2 << 6) + (63 - (self.bits[2].leading_zeros() as u8)));
        }
        if self.bits[1] != 0 {
            return Some((1 << 6) + (63 - (self.bits[1].leading_zeros() as u8)));
        }
        if self.bits[0] != 0 {
            return Some(63 - (self.bits[0].leading_zeros() as u8));
        }
        None
    }

    /// Removes and returns the lowest set bit.
    pub fn drain_next_ascending(&mut self) -> Option<u8> {
        let next = self.find_first_set()?;
        self.unset(next);
        Some(next)
    }

    /// Removes and returns the highest set bit.
    pub fn drain_next_descending(&mut self) -> Option<u8> {
        let next = self.find_last_set()?;
        self.unset(next);
        Some(next)
    }

    /// Iterates over the set bits in ascending order.
    pub fn iter(&self) -> Indices {
        Indices { remaining: *self }
    }
}

impl FromIterator<u8> for ByteBitset {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = ByteBitset::new_empty();
        for index in iter {
            set.set(index);
        }
        set
    }
}

impl fmt::Debug for ByteBitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Ascending iterator over the set bits of a [`ByteBitset`].
#[derive(Clone)]
pub struct Indices {
    remaining: ByteBitset,
}

impl Iterator for Indices {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.remaining.drain_next_ascending()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count() as usize;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Indices {
    fn next_back(&mut self) -> Option<u8> {
        self.remaining.drain_next_descending()
    }
}

impl ExactSizeIterator for Indices {}

impl std::iter::FusedIterator for Indices {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn new_empty_is_empty() {
        let set = ByteBitset::new_empty();
        assert!(set.is_empty());
    }
    #[test]
    fn after_set_unset_is_empty() {
        let mut set = ByteBitset::new_empty();
        set.set(5);
        assert!(set.is_set(5));
        set.unset(5);
        assert!(set.is_empty());
    }
    #[test]
    fn find_first_set_none() {
        let set = ByteBitset::new_empty();
        assert_eq!(None, set.find_first_set());
        assert_eq!(None, set.find_last_set());
    }
    #[test]
    fn rank_counts_bits_below() {
        let set: ByteBitset = [3u8, 64, 65, 200, 255].into_iter().collect();
        assert_eq!(set.rank(0), 0);
        assert_eq!(set.rank(3), 0);
        assert_eq!(set.rank(4), 1);
        assert_eq!(set.rank(64), 1);
        assert_eq!(set.rank(65), 2);
        assert_eq!(set.rank(199), 3);
        assert_eq!(set.rank(255), 4);
        assert_eq!(set.position(200), Some(3));
        assert_eq!(set.position(201), None);
    }
    #[test]
    fn iter_is_ascending_and_reversible() {
        let set: ByteBitset = [255u8, 0, 128, 7].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 7, 128, 255]);
        assert_eq!(set.iter().rev().collect::<Vec<_>>(), vec![255, 128, 7, 0]);
    }
    #[test]
    fn union_and_disjoint() {
        let left: ByteBitset = [1u8, 2].into_iter().collect();
        let right: ByteBitset = [3u8, 200].into_iter().collect();
        assert!(left.is_disjoint(&right));
        let both = left.union(&right);
        assert_eq!(both.iter().collect::<Vec<_>>(), vec![1, 2, 3, 200]);
        assert!(!both.is_disjoint(&left));
    }

    proptest! {
        #[test]
        fn find_first_set(n in 0u8..=255) {
            let mut set = ByteBitset::new_empty();
            set.set(n);
            prop_assert_eq!(Some(n), set.find_first_set());
        }
        #[test]
        fn find_last_set(n in 0u8..=255) {
            let mut set = ByteBitset::new_empty();
            set.set(n);
            prop_assert_eq!(Some(n), set.find_last_set());
        }
        #[test]
        fn rank_matches_model(bytes in prop::collection::btree_set(0u8..=255, 0..64), probe in 0u8..=255) {
            let set: ByteBitset = bytes.iter().copied().collect();
            let expected = bytes.range(..probe).count();
            prop_assert_eq!(set.rank(probe), expected);
            prop_assert_eq!(set.count() as usize, bytes.len());
            let listed: BTreeSet<u8> = set.iter().collect();
            prop_assert_eq!(listed, bytes);
        }
    }
}
