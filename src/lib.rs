#![doc = include_str!("../README.md")]

pub mod arraytrie;
pub mod bitset;
pub mod codec;
pub mod map;
pub mod nav;
mod radix;
pub mod set;
pub mod shared;
pub mod token;

#[cfg(feature = "serde")]
pub mod persist;
#[cfg(feature = "proptest")]
pub mod strategy;

pub use arraytrie::ArrayTrie;
pub use codec::KeyEncoding;
pub use map::PersistentMap;
pub use nav::NavArrayTrie;
pub use set::ArrayTrieSet;
