//! End-to-end scenarios driven through the public surface of every variant:
//! bulk insertion in adversarial orders, randomized churn with the validator
//! green after every single operation, and ordered traversal through the
//! neighbor queries.

use arbor_test_framework::helpers::{
    assert_strictly_ascending, bst_ascending, bst_descending, leak_keys, leak_range, min_height,
    rbt_ascending, rbt_descending, spt_ascending, spt_descending, IntBsTree, IntRbTree, IntSpTree,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CHURN_SEED: u64 = 0x4152_424f_5220_3031;

fn ascending_keys() -> &'static [i64] {
    leak_range(0, 1000)
}

// ---------------------------------------------------------------------------
// Scenario 1: ascending insertion 0..1000.
// ---------------------------------------------------------------------------

#[test]
fn bst_ascending_insertion() {
    let keys = ascending_keys();
    let mut tree = IntBsTree::natural();
    for key in keys {
        assert!(tree.insert(key).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&0));
    assert_eq!(tree.max(), Some(&999));
    let up = bst_ascending(&tree);
    assert_eq!(up, (0..1000).collect::<Vec<_>>());
    let mut down = bst_descending(&tree);
    down.reverse();
    assert_eq!(down, up);

    tree.remove_all(None);
    assert!(tree.is_empty());
}

#[test]
fn rbt_ascending_insertion() {
    let keys = ascending_keys();
    let mut tree = IntRbTree::natural();
    for key in keys {
        assert!(tree.insert(key).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&0));
    assert_eq!(tree.max(), Some(&999));
    assert_eq!(rbt_ascending(&tree), (0..1000).collect::<Vec<_>>());
    let mut down = rbt_descending(&tree);
    down.reverse();
    assert_eq!(down, (0..1000).collect::<Vec<_>>());

    tree.remove_all(None);
    assert!(tree.is_empty());
}

#[test]
fn spt_ascending_insertion() {
    let keys = ascending_keys();
    let mut tree = IntSpTree::natural();
    for key in keys {
        assert!(tree.insert(key).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&0));
    assert_eq!(tree.max(), Some(&999));
    assert_eq!(spt_ascending(&mut tree), (0..1000).collect::<Vec<_>>());
    let mut down = spt_descending(&mut tree);
    down.reverse();
    assert_eq!(down, (0..1000).collect::<Vec<_>>());

    tree.remove_all(None);
    assert!(tree.is_empty());
}

// ---------------------------------------------------------------------------
// Scenario 2: descending insertion 1000..1.
// ---------------------------------------------------------------------------

#[test]
fn bst_descending_insertion() {
    let keys = leak_range(1, 1001);
    let mut tree = IntBsTree::natural();
    for key in keys.iter().rev() {
        assert!(tree.insert(key).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&1));
    assert_eq!(tree.max(), Some(&1000));
    assert_eq!(bst_ascending(&tree), (1..=1000).collect::<Vec<_>>());
    tree.remove_all(None);
    assert!(tree.is_empty());
}

#[test]
fn rbt_descending_insertion() {
    let keys = leak_range(1, 1001);
    let mut tree = IntRbTree::natural();
    for key in keys.iter().rev() {
        assert!(tree.insert(key).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&1));
    assert_eq!(tree.max(), Some(&1000));
    assert_eq!(rbt_ascending(&tree), (1..=1000).collect::<Vec<_>>());
}

#[test]
fn spt_descending_insertion() {
    let keys = leak_range(1, 1001);
    let mut tree = IntSpTree::natural();
    for key in keys.iter().rev() {
        assert!(tree.insert(key).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&1));
    assert_eq!(tree.max(), Some(&1000));
    assert_eq!(spt_ascending(&mut tree), (1..=1000).collect::<Vec<_>>());
}

// ---------------------------------------------------------------------------
// Scenario 3: interleaved (+i, -i) pairs for i in 1..=1000.
// ---------------------------------------------------------------------------

fn signed_arena() -> &'static [i64] {
    // -1000..=1000; index of value v is (v + 1000).
    leak_range(-1000, 1001)
}

fn signed_expected() -> Vec<i64> {
    let mut want: Vec<i64> = (-1000..=-1).collect();
    want.extend(1..=1000);
    want
}

#[test]
fn bst_interleaved_signed_pairs() {
    let arena = signed_arena();
    let mut tree = IntBsTree::natural();
    for i in 1..=1000i64 {
        assert!(tree.insert(&arena[(i + 1000) as usize]).is_none());
        assert!(tree.insert(&arena[(1000 - i) as usize]).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&-1000));
    assert_eq!(tree.max(), Some(&1000));
    assert_eq!(bst_ascending(&tree), signed_expected());
}

#[test]
fn rbt_interleaved_signed_pairs() {
    let arena = signed_arena();
    let mut tree = IntRbTree::natural();
    for i in 1..=1000i64 {
        assert!(tree.insert(&arena[(i + 1000) as usize]).is_none());
        assert!(tree.insert(&arena[(1000 - i) as usize]).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&-1000));
    assert_eq!(tree.max(), Some(&1000));
    assert_eq!(rbt_ascending(&tree), signed_expected());
}

#[test]
fn spt_interleaved_signed_pairs() {
    let arena = signed_arena();
    let mut tree = IntSpTree::natural();
    for i in 1..=1000i64 {
        assert!(tree.insert(&arena[(i + 1000) as usize]).is_none());
        assert!(tree.insert(&arena[(1000 - i) as usize]).is_none());
        assert!(tree.is_valid());
    }
    assert_eq!(tree.min(), Some(&-1000));
    assert_eq!(tree.max(), Some(&1000));
    assert_eq!(spt_ascending(&mut tree), signed_expected());
}

// ---------------------------------------------------------------------------
// Scenario 4: 10000 random inserts in [0, 1000), then 5000 random removes,
// validator green after every operation.
// ---------------------------------------------------------------------------

fn churn_plan() -> (Vec<i64>, Vec<i64>) {
    let mut rng = StdRng::seed_from_u64(CHURN_SEED);
    let inserts: Vec<i64> = (0..10_000).map(|_| rng.random_range(0..1000)).collect();
    let removes: Vec<i64> = (0..5_000).map(|_| rng.random_range(0..1000)).collect();
    (inserts, removes)
}

#[test]
fn bst_random_churn() {
    let arena = leak_range(0, 1000);
    let (inserts, removes) = churn_plan();
    let mut tree = IntBsTree::natural();
    for key in &inserts {
        tree.insert(&arena[*key as usize]);
        assert!(tree.is_valid());
    }
    for key in &removes {
        tree.remove(key);
        assert!(tree.is_valid());
    }
    let survivors = bst_ascending(&tree);
    assert_strictly_ascending(&survivors);

    // Rebalancing the churned tree reaches the minimum possible height.
    let n = survivors.len();
    tree.rebalance();
    assert!(tree.is_valid());
    assert_eq!(tree.height(), min_height(n));
    assert_eq!(bst_ascending(&tree), survivors);
}

#[test]
fn rbt_random_churn() {
    let arena = leak_range(0, 1000);
    let (inserts, removes) = churn_plan();
    let mut tree = IntRbTree::natural();
    for key in &inserts {
        tree.insert(&arena[*key as usize]);
        assert!(tree.is_valid());
    }
    for key in &removes {
        tree.remove(key);
        assert!(tree.is_valid());
    }
    assert_strictly_ascending(&rbt_ascending(&tree));
}

#[test]
fn spt_random_churn() {
    let arena = leak_range(0, 1000);
    let (inserts, removes) = churn_plan();
    let mut tree = IntSpTree::natural();
    for key in &inserts {
        tree.insert(&arena[*key as usize]);
        assert!(tree.is_valid());
    }
    for key in &removes {
        tree.remove(key);
        assert!(tree.is_valid());
    }
    assert_strictly_ascending(&spt_ascending(&mut tree));
}

// ---------------------------------------------------------------------------
// Scenario 6 for the splay variant: the same churn on a fresh copy, with a
// counting comparator bounding total work qualitatively (amortized
// logarithmic, nowhere near the quadratic worst case).
// ---------------------------------------------------------------------------

#[test]
fn spt_churn_on_copy_stays_amortized() {
    use std::cell::Cell;
    use std::rc::Rc;

    let arena = leak_range(0, 1000);
    let (inserts, removes) = churn_plan();

    let comparisons = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&comparisons);
    let cmp = move |a: &i64, b: &i64| {
        counter.set(counter.get() + 1);
        a.cmp(b)
    };

    let mut tree = arbor_splay::SpTree::new(cmp);
    for key in &inserts {
        tree.insert(&arena[*key as usize]);
    }

    let mut copy = tree.copy();
    for key in &removes {
        let original = tree.remove(key);
        let replayed = copy.remove(key);
        assert_eq!(original.is_some(), replayed.is_some());
    }
    assert!(tree.is_valid() && copy.is_valid());

    // ~20k operations over <= 1000 live keys; the amortized bound keeps the
    // comparison count orders of magnitude below the ~15M a degenerate
    // per-operation linear scan would need.
    assert!(
        comparisons.get() < 5_000_000,
        "comparison count {} suggests amortization is broken",
        comparisons.get()
    );
}

// ---------------------------------------------------------------------------
// remove_min agrees with min, and the new min is the old next(min).
// ---------------------------------------------------------------------------

#[test]
fn rbt_remove_min_chain() {
    let keys = leak_keys(vec![17, 3, 29, 11, 7, 23, 5, 13, 19, 2]);
    let mut tree = IntRbTree::natural();
    for key in keys {
        tree.insert(key);
    }
    while !tree.is_empty() {
        let head = tree.min().copied();
        let follow = tree.min().and_then(|m| tree.next(m)).copied();
        assert_eq!(tree.remove_min().copied(), head);
        assert_eq!(tree.min().copied(), follow);
        assert!(tree.is_valid());
    }
}
