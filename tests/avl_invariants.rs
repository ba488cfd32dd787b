//! AVL Tree Invariant Tests
//!
//! Tests for ordered index invariants:
//! - In-order traversal is strictly increasing
//! - Every node is height-balanced
//! - Inserted keys round-trip until deleted
//! - Deletes remove exactly one key

use catalog_index::index::AvlTree;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

// =============================================================================
// Helper Functions
// =============================================================================

fn tree_from(keys: &[i64]) -> AvlTree<i64, String> {
    let mut tree = AvlTree::new();
    for &k in keys {
        tree.insert(k, k.to_string());
    }
    tree
}

fn assert_sorted(tree: &AvlTree<i64, String>) {
    let keys: Vec<i64> = tree.in_order().into_iter().map(|(k, _)| *k).collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys not strictly increasing");
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Delete of a two-child root keeps every other key retrievable.
#[test]
fn test_delete_root_scenario() {
    let mut tree = tree_from(&[10, 20, 5, 4, 15]);
    tree.delete(&10);

    assert_eq!(tree.search(&10), None);
    assert_eq!(tree.search(&20).map(String::as_str), Some("20"));
    assert_eq!(tree.search(&15).map(String::as_str), Some("15"));
    assert_eq!(tree.search(&5).map(String::as_str), Some("5"));
    assert_eq!(tree.search(&4).map(String::as_str), Some("4"));
    assert_eq!(tree.len(), 4);
    tree.check_invariants().unwrap();
}

/// Search on an empty tree is absent.
#[test]
fn test_search_empty() {
    let tree: AvlTree<i64, String> = AvlTree::new();
    assert!(tree.search(&0).is_none());
}

/// Re-inserting a key overwrites without growing the tree.
#[test]
fn test_update_semantics() {
    let mut tree = tree_from(&[3, 1, 2, 5, 4]);
    let before = tree.len();

    tree.insert(2, "two".to_string());

    assert_eq!(tree.len(), before);
    assert_eq!(tree.search(&2).map(String::as_str), Some("two"));
    tree.check_invariants().unwrap();
}

// =============================================================================
// Randomized Invariant Tests
// =============================================================================

/// Shuffled inserts then shuffled deletes keep order and balance at every step.
#[test]
fn test_invariants_hold_through_churn() {
    let mut rng = StdRng::seed_from_u64(0xA71);
    let mut keys: Vec<i64> = (0..500).collect();
    keys.shuffle(&mut rng);

    let mut tree = AvlTree::new();
    for &k in &keys {
        tree.insert(k, k.to_string());
        tree.check_invariants().unwrap();
    }
    assert_sorted(&tree);

    keys.shuffle(&mut rng);
    for (i, &k) in keys.iter().enumerate() {
        assert_eq!(tree.delete(&k), Some(k.to_string()));
        assert_eq!(tree.search(&k), None);
        assert_eq!(tree.len(), keys.len() - i - 1);
        tree.check_invariants().unwrap();
    }
    assert!(tree.is_empty());
}

/// Mixed operations agree with BTreeMap.
#[test]
fn test_matches_btreemap() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tree = AvlTree::new();
    let mut model = BTreeMap::new();

    for _ in 0..20_000 {
        let key: i64 = rng.gen_range(-300..300);
        match rng.gen_range(0..3) {
            0 => {
                let value = rng.gen::<u32>().to_string();
                assert_eq!(tree.insert(key, value.clone()), model.insert(key, value));
            }
            1 => assert_eq!(tree.delete(&key), model.remove(&key)),
            _ => assert_eq!(tree.search(&key), model.get(&key)),
        }
    }

    tree.check_invariants().unwrap();
    let ours: Vec<(i64, String)> = tree.in_order().into_iter().map(|(k, v)| (*k, v.clone())).collect();
    let theirs: Vec<(i64, String)> = model.into_iter().collect();
    assert_eq!(ours, theirs);
}

/// Height stays within the AVL bound for ascending and descending loads.
#[test]
fn test_height_bound_for_sorted_input() {
    let n = 4096;
    let ascending = tree_from(&(0..n).collect::<Vec<_>>());
    let descending = tree_from(&(0..n).rev().collect::<Vec<_>>());

    // 1.44 * log2(n + 2)
    let bound = (1.44 * ((n + 2) as f64).log2()).floor() as usize;
    assert!(ascending.height() <= bound);
    assert!(descending.height() <= bound);
}
