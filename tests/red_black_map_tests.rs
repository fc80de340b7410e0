#![cfg(feature = "red-black")]
//! Integration tests for RedBlackMap.

use balanced_map::tree::{BalancedMap, RedBlackMap};
use rstest::rstest;

const SEARCH_EXAMPLE: [&str; 10] = ["S", "E", "A", "R", "C", "H", "X", "M", "P", "L"];

// =============================================================================
// Basic Construction Tests
// =============================================================================

#[rstest]
fn test_new_creates_empty_map() {
    let map: RedBlackMap<i32, String> = RedBlackMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.height(), 0);
    assert_eq!(map.black_height(), 0);
    assert_eq!(map.validate(), Ok(()));
}

#[rstest]
fn test_default_creates_empty_map() {
    let map: RedBlackMap<i32, String> = RedBlackMap::default();
    assert!(map.is_empty());
    assert!(map.is_balanced());
}

#[rstest]
fn test_get_on_empty_map_is_none() {
    let map: RedBlackMap<i32, i32> = RedBlackMap::new();
    assert_eq!(map.get(&1), None);
    assert!(!map.contains_key(&1));
}

// =============================================================================
// Insert and Get Tests
// =============================================================================

#[rstest]
fn test_search_example_sequence() {
    let mut map = RedBlackMap::new();
    for key in SEARCH_EXAMPLE {
        assert_eq!(map.insert(key, 1), None);
    }

    assert_eq!(map.len(), 10);
    assert_eq!(map.height(), 4);
    assert_eq!(map.black_height(), 3);
    for key in SEARCH_EXAMPLE {
        assert_eq!(map.get(key), Some(&1));
    }
    assert_eq!(map.get("Z"), None);
    assert_eq!(map.validate(), Ok(()));
}

#[rstest]
fn test_reinsert_replaces_value() {
    let mut map: RedBlackMap<&str, i32> = SEARCH_EXAMPLE.iter().map(|&key| (key, 1)).collect();
    let height = map.height();

    assert_eq!(map.insert("M", 2), Some(1));
    assert_eq!(map.get("M"), Some(&2));
    assert_eq!(map.len(), 10);
    assert_eq!(map.height(), height);
}

#[rstest]
fn test_borrowed_key_lookup() {
    let mut map = RedBlackMap::new();
    map.insert("apple".to_string(), 3);
    map.insert("banana".to_string(), 5);

    assert_eq!(map.get("apple"), Some(&3));
    assert!(map.contains_key("banana"));
    assert!(!map.contains_key("cherry"));
}

#[rstest]
#[case(&[1, 2, 3], 2, 2)]
#[case(&[1, 2, 3, 4, 5, 6, 7], 3, 3)]
#[case(&[7, 6, 5, 4, 3, 2, 1], 3, 3)]
fn test_small_trees_are_perfect(
    #[case] keys: &[i32],
    #[case] height: usize,
    #[case] black_height: usize,
) {
    let map: RedBlackMap<i32, ()> = keys.iter().map(|&key| (key, ())).collect();
    assert_eq!(map.height(), height);
    assert_eq!(map.black_height(), black_height);
}

// =============================================================================
// Balance Tests
// =============================================================================

#[rstest]
#[case(100, 7, 6)]
#[case(1024, 11, 10)]
fn test_ascending_insertion_stays_logarithmic(
    #[case] count: i32,
    #[case] height: usize,
    #[case] black_height: usize,
) {
    let map: RedBlackMap<i32, i32> = (1..=count).map(|key| (key, key)).collect();
    assert_eq!(map.height(), height);
    assert_eq!(map.black_height(), black_height);
    assert_eq!(map.validate(), Ok(()));
}

#[rstest]
fn test_validate_after_every_insert() {
    let mut map = RedBlackMap::new();
    for key in (0..300).map(|index| (index * 7919) % 1009) {
        map.insert(key, key);
        assert_eq!(map.validate(), Ok(()));
    }
}

// =============================================================================
// Trait Tests
// =============================================================================

#[rstest]
fn test_balanced_map_contract() {
    fn fill<M: BalancedMap<u8, char>>(map: &mut M) {
        for (index, character) in ('a'..='z').enumerate() {
            map.insert(u8::try_from(index).unwrap_or(u8::MAX), character);
        }
    }

    let mut map = RedBlackMap::new();
    fill(&mut map);
    assert_eq!(BalancedMap::len(&map), 26);
    assert_eq!(BalancedMap::get(&map, &25), Some(&'z'));
    assert!(BalancedMap::is_balanced(&map));
}

#[rstest]
fn test_extend_and_clone_are_independent() {
    let mut map: RedBlackMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
    let snapshot = map.clone();
    map.extend((10..20).map(|key| (key, key)));

    assert_eq!(map.len(), 20);
    assert_eq!(snapshot.len(), 10);
    assert_eq!(snapshot.get(&15), None);
}

#[rstest]
fn test_display_and_debug() {
    let map: RedBlackMap<i32, &str> = [(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
    assert_eq!(format!("{map}"), "{1: a, 2: b, 3: c}");
    assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b", 3: "c"}"#);
}
