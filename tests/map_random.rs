use std::collections::BTreeMap;

use itertools::Itertools;
use persistent_collections::PersistentMap;
use rand::seq::SliceRandom;
use rand::thread_rng;
use rand::RngCore;

#[test]
fn insert_then_remove_random_keys() {
    const N: usize = 10_000;
    let mut rng = thread_rng();
    let mut map: PersistentMap<u64, u64> = PersistentMap::new();
    let mut model = BTreeMap::new();
    for i in 0..N as u64 {
        let key = rng.next_u64();
        map.insert(key, i);
        model.insert(key, i);
    }
    assert_eq!(map.len(), model.len());
    assert!(map
        .iter()
        .map(|(key, value)| (key, *value))
        .eq(model.iter().map(|(key, value)| (*key, *value))));

    let mut keys = model.keys().copied().collect_vec();
    keys.shuffle(&mut rng);
    for key in keys {
        assert_eq!(map.remove(&key), model.remove(&key));
    }
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.iter().count(), 0);
}

#[test]
fn snapshots_survive_later_writes() {
    let mut rng = thread_rng();
    let mut map: PersistentMap<Vec<u8>, usize> = PersistentMap::new();
    let mut snapshots = Vec::new();
    for i in 0..256 {
        let mut key = vec![0u8; 1 + (rng.next_u32() % 8) as usize];
        rng.fill_bytes(&mut key);
        map.insert(key, i);
        if i % 32 == 0 {
            snapshots.push((map.len(), map.clone()));
        }
    }
    for (len, snapshot) in snapshots {
        assert_eq!(snapshot.len(), len);
        assert_eq!(snapshot.iter().count(), len);
    }
}

#[test]
fn keys_iterate_in_numeric_order() {
    let map: PersistentMap<i32, ()> = [-300, 7, -1, 0, 1_000_000, i32::MIN, i32::MAX]
        .into_iter()
        .map(|key| (key, ()))
        .collect();
    assert!(map.keys().tuple_windows().all(|(a, b)| a < b));
    assert_eq!(map.first().map(|(key, _)| key), Some(i32::MIN));
}
