use persistent_collections::{ArrayTrie, ArrayTrieSet, NavArrayTrie};

fn path(text: &str) -> Vec<String> {
    text.split('/').map(str::to_string).collect()
}

fn fixture() -> ArrayTrie<String, u32> {
    [
        ("usr/bin", 1),
        ("usr/lib", 2),
        ("usr/lib/x86", 3),
        ("usr/local/share", 4),
        ("etc", 5),
    ]
    .into_iter()
    .map(|(p, v)| (path(p), v))
    .collect()
}

#[test]
fn including_and_excluding_split_the_trie() {
    let trie = fixture();
    let inside = trie.including(&path("usr/lib"));
    let outside = trie.excluding(&path("usr/lib"));
    assert_eq!(inside.len(), 2);
    assert_eq!(outside.len(), 3);

    let mut joined = inside.clone();
    joined.overwrite(outside);
    assert_eq!(joined, trie);
}

#[test]
fn subtree_and_supertree() {
    let trie = fixture();
    let usr = trie.subtree(&path("usr"));
    assert_eq!(usr.get(&path("lib/x86")), Some(&3));
    assert_eq!(usr.get(&path("local/share")), Some(&4));
    assert!(!usr.contains(&path("etc")));

    let back = usr.supertree(&path("usr"));
    assert_eq!(back, trie.including(&path("usr")));
}

#[test]
fn merge_combines_shared_paths() {
    let mut left = fixture();
    let mut right = ArrayTrie::new();
    right.insert(&path("etc"), 10);
    right.insert(&path("opt"), 20);
    left.merge(right, |ours, theirs| ours * 100 + theirs);
    assert_eq!(left.get(&path("etc")), Some(&510));
    assert_eq!(left.get(&path("opt")), Some(&20));
    assert_eq!(left.len(), 6);
}

#[test]
fn old_versions_are_untouched() {
    let before = fixture();
    let mut after = before.clone();
    after.remove(&path("usr/lib"));
    after.insert(&path("usr/bin"), 100);
    assert_eq!(before.get(&path("usr/lib")), Some(&2));
    assert_eq!(before.get(&path("usr/bin")), Some(&1));
    assert_eq!(after.get(&path("usr/lib/x86")), Some(&3));
    assert_eq!(after.len(), 4);
}

#[test]
fn nav_resolves_nearest_value() {
    let nav = NavArrayTrie::from(fixture());
    assert_eq!(nav.resolve(&path("usr/lib/x86/extra")), Some(&3));
    assert_eq!(nav.resolve(&path("usr/lib/arm")), Some(&2));
    assert_eq!(nav.resolve(&path("usr/local")), None);

    let lib = nav.subtree_with_cover(&path("usr/lib"));
    assert_eq!(lib.ancestor_value(), Some(&2));
    assert_eq!(lib.resolve(&path("arm")), Some(&2));
    assert_eq!(lib.resolve(&path("x86")), Some(&3));
}

#[test]
fn set_views() {
    let set: ArrayTrieSet<String> = "a(b, c(d)), e".parse().unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(set.child_keys(), vec!["a".to_string(), "e".to_string()]);
    let a = set.subtree(&path("a"));
    assert!(a.contains(&path("c/d")));
    assert_eq!(set.excluding(&path("a")).len(), 1);
}
