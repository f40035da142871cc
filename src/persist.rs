//! Persisted form of the collections.
//!
//! * A [`PersistentMap`] is an object mapping the string form of each key
//!   to its value.
//! * An [`ArrayTrie`] is a nested object: every path element maps to
//!   `{ "value": .., "children": { .. } }`, with `value` omitted where
//!   nothing is stored.
//! * An [`ArrayTrieSet`] is a list of paths.
//!
//! Keys are written with [`Display`](fmt::Display) and read back with
//! [`FromStr`]. Decoding fails as a whole on the first key that does not
//! parse.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::arraytrie::ArrayTrie;
use crate::codec::KeyEncoding;
use crate::map::PersistentMap;
use crate::set::ArrayTrieSet;

#[derive(Debug)]
pub enum DecodeError {
    /// The input is not well-formed for the expected shape.
    Json(serde_json::Error),
    /// A key that does not parse into the key type.
    InvalidKey { key: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed input: {err}"),
            Self::InvalidKey { key } => write!(f, "invalid key {key:?}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidKey { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err)
    }
}

fn parse_key<K: FromStr>(text: &str) -> Result<K, DecodeError> {
    text.parse().map_err(|_| {
        debug!(key = text, "rejected persisted key");
        DecodeError::InvalidKey {
            key: text.to_string(),
        }
    })
}

impl<K, V> Serialize for PersistentMap<K, V>
where
    K: KeyEncoding + fmt::Display,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

struct MapVisitor<K, V> {
    marker: PhantomData<PersistentMap<K, V>>,
}

impl<'de, K, V> Visitor<'de> for MapVisitor<K, V>
where
    K: KeyEncoding + FromStr,
    V: Deserialize<'de> + Clone,
{
    type Value = PersistentMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map with string keys")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut map = PersistentMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(parse_key(&key).map_err(de::Error::custom)?, value);
        }
        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for PersistentMap<K, V>
where
    K: KeyEncoding + FromStr,
    V: Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapVisitor {
            marker: PhantomData,
        })
    }
}

impl<K: KeyEncoding + fmt::Display, V: Serialize> PersistentMap<K, V> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<K: KeyEncoding + FromStr, V: DeserializeOwned + Clone> PersistentMap<K, V> {
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let raw: BTreeMap<String, V> = serde_json::from_str(text)?;
        raw.into_iter()
            .map(|(key, value)| parse_key(&key).map(|key| (key, value)))
            .collect()
    }
}

/// One element of a persisted [`ArrayTrie`] path.
#[derive(Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Level<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<T>,
    #[serde(default)]
    children: BTreeMap<String, Level<T>>,
}

impl<T> Default for Level<T> {
    fn default() -> Self {
        Level {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

fn levels<K, V>(trie: &ArrayTrie<K, V>) -> BTreeMap<String, Level<&V>>
where
    K: fmt::Display + Clone,
{
    let mut root: BTreeMap<String, Level<&V>> = BTreeMap::new();
    for (path, value) in trie {
        let Some((last, parents)) = path.split_last() else {
            continue;
        };
        let mut level = &mut root;
        for key in parents {
            level = &mut level.entry(key.to_string()).or_default().children;
        }
        level.entry(last.to_string()).or_default().value = Some(value);
    }
    root
}

fn unfold<K, V>(
    levels: BTreeMap<String, Level<V>>,
    path: &mut Vec<K>,
    trie: &mut ArrayTrie<K, V>,
) -> Result<(), DecodeError>
where
    K: KeyEncoding + Clone + PartialEq + FromStr,
    V: Clone,
{
    for (key, level) in levels {
        path.push(parse_key(&key)?);
        if let Some(value) = level.value {
            trie.insert(path, value);
        }
        unfold(level.children, path, trie)?;
        path.pop();
    }
    Ok(())
}

fn from_levels<K, V>(levels: BTreeMap<String, Level<V>>) -> Result<ArrayTrie<K, V>, DecodeError>
where
    K: KeyEncoding + Clone + PartialEq + FromStr,
    V: Clone,
{
    let mut trie = ArrayTrie::new();
    unfold(levels, &mut Vec::new(), &mut trie)?;
    Ok(trie)
}

impl<K, V> Serialize for ArrayTrie<K, V>
where
    K: fmt::Display + Clone,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        levels(self).serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for ArrayTrie<K, V>
where
    K: KeyEncoding + Clone + PartialEq + FromStr,
    V: Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let levels = BTreeMap::<String, Level<V>>::deserialize(deserializer)?;
        from_levels(levels).map_err(de::Error::custom)
    }
}

impl<K: fmt::Display + Clone, V: Serialize> ArrayTrie<K, V> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<K, V> ArrayTrie<K, V>
where
    K: KeyEncoding + Clone + PartialEq + FromStr,
    V: DeserializeOwned + Clone,
{
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        from_levels(serde_json::from_str(text)?)
    }
}

fn path_strings<K: fmt::Display>(path: Vec<K>) -> Vec<String> {
    path.iter().map(ToString::to_string).collect()
}

fn parse_paths<K>(paths: Vec<Vec<String>>) -> Result<ArrayTrieSet<K>, DecodeError>
where
    K: KeyEncoding + Clone + PartialEq + FromStr,
{
    paths
        .into_iter()
        .map(|path| {
            path.iter()
                .map(|key| parse_key(key))
                .collect::<Result<Vec<K>, _>>()
        })
        .collect()
}

impl<K: fmt::Display + Clone> Serialize for ArrayTrieSet<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter().map(path_strings))
    }
}

impl<'de, K> Deserialize<'de> for ArrayTrieSet<K>
where
    K: KeyEncoding + Clone + PartialEq + FromStr,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let paths = Vec::<Vec<String>>::deserialize(deserializer)?;
        parse_paths(paths).map_err(de::Error::custom)
    }
}

impl<K: fmt::Display + Clone> ArrayTrieSet<K> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<K: KeyEncoding + Clone + PartialEq + FromStr> ArrayTrieSet<K> {
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        parse_paths(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> Vec<String> {
        path.split('/').map(str::to_string).collect()
    }

    #[test]
    fn map_is_an_object_of_string_keys() {
        let map: PersistentMap<String, u32> = [("b".to_string(), 2), ("a".to_string(), 1)].into();
        assert_eq!(map.to_json().unwrap(), r#"{"a":1,"b":2}"#);
        let back = PersistentMap::<String, u32>::from_json(r#"{"b":2,"a":1}"#).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn integer_keys_use_their_decimal_form() {
        let map: PersistentMap<i64, bool> = [(-5, true), (10, false)].into();
        let json = map.to_json().unwrap();
        assert_eq!(json, r#"{"-5":true,"10":false}"#);
        let back: PersistentMap<i64, bool> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn invalid_key_fails_the_whole_decode() {
        let err = PersistentMap::<u32, u8>::from_json(r#"{"1":1,"abc":2}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidKey { ref key } if key == "abc"));

        let err = serde_json::from_str::<PersistentMap<u32, u8>>(r#"{"abc":2}"#).unwrap_err();
        assert!(err.to_string().contains("abc"));

        let err = PersistentMap::<u32, u8>::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn trie_is_nested_levels() {
        let trie: ArrayTrie<String, u8> = [(p("a/b"), 1), (p("a"), 2)].into_iter().collect();
        let json = trie.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"a":{"value":2,"children":{"b":{"value":1,"children":{}}}}}"#
        );
        assert_eq!(ArrayTrie::<String, u8>::from_json(&json).unwrap(), trie);
    }

    #[test]
    fn trie_levels_without_values_are_accepted() {
        let json = r#"{"x":{"children":{"1":{"value":"one"},"2":{"value":"two"}}}}"#;
        let trie = ArrayTrie::<String, String>::from_json(json).unwrap();
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.get(&p("x/1")).map(String::as_str), Some("one"));
        assert_eq!(trie.get(&p("x")), None);
    }

    #[test]
    fn trie_values_need_no_default() {
        use std::num::NonZeroU8;

        let one = NonZeroU8::MIN;
        let trie: ArrayTrie<String, NonZeroU8> = [(p("a"), one), (p("a/b"), one)].into_iter().collect();
        let back = ArrayTrie::<String, NonZeroU8>::from_json(&trie.to_json().unwrap()).unwrap();
        assert_eq!(back, trie);
        let back: ArrayTrie<String, NonZeroU8> =
            serde_json::from_value(serde_json::to_value(&trie).unwrap()).unwrap();
        assert_eq!(back, trie);
    }

    #[test]
    fn trie_with_bad_key() {
        let err = ArrayTrie::<u8, u8>::from_json(r#"{"1":{"children":{"300":{"value":1}}}}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidKey { ref key } if key == "300"));
    }

    #[test]
    fn set_is_a_list_of_paths() {
        let set: ArrayTrieSet<String> = [p("a/b"), p("c")].into_iter().collect();
        let json = set.to_json().unwrap();
        assert_eq!(json, r#"[["a","b"],["c"]]"#);
        assert_eq!(ArrayTrieSet::<String>::from_json(&json).unwrap(), set);
    }
}
