//! Shared helpers for the cross-variant scenario suites.
//!
//! The container crates store borrowed payloads, so the suites lease their
//! integer keys from leaked arenas and walk trees through the public
//! `min`/`next` (and `max`/`prev`) neighbor queries; the library exposes no
//! iterators.

use std::cmp::Ordering;

use arbor_bst::BsTree;
use arbor_rbtree::RbTree;
use arbor_splay::SpTree;

/// Every suite orders plain integers with the same comparator type, so trees
/// built in different places stay combinable.
pub type NumCmp = fn(&i64, &i64) -> Ordering;

pub type IntBsTree = BsTree<'static, i64, NumCmp>;
pub type IntRbTree = RbTree<'static, i64, NumCmp>;
pub type IntSpTree = SpTree<'static, i64, NumCmp>;

/// Leak a half-open integer range for use as a 'static payload arena.
pub fn leak_range(lo: i64, hi: i64) -> &'static [i64] {
    Box::leak((lo..hi).collect::<Vec<_>>().into_boxed_slice())
}

/// Leak an arbitrary key list for use as a 'static payload arena.
pub fn leak_keys(keys: Vec<i64>) -> &'static [i64] {
    Box::leak(keys.into_boxed_slice())
}

/// Smallest `h` with `2^h >= n + 1`: the height of a perfectly balanced
/// tree holding `n` keys.
pub fn min_height(n: usize) -> usize {
    let mut height = 0;
    let mut capacity = 1usize;
    while capacity < n + 1 {
        capacity <<= 1;
        height += 1;
    }
    height
}

pub fn bst_ascending(tree: &IntBsTree) -> Vec<i64> {
    let mut out = Vec::new();
    let mut cur = tree.min();
    while let Some(item) = cur {
        out.push(*item);
        cur = tree.next(item);
    }
    out
}

pub fn bst_descending(tree: &IntBsTree) -> Vec<i64> {
    let mut out = Vec::new();
    let mut cur = tree.max();
    while let Some(item) = cur {
        out.push(*item);
        cur = tree.prev(item);
    }
    out
}

pub fn rbt_ascending(tree: &IntRbTree) -> Vec<i64> {
    let mut out = Vec::new();
    let mut cur = tree.min();
    while let Some(item) = cur {
        out.push(*item);
        cur = tree.next(item);
    }
    out
}

pub fn rbt_descending(tree: &IntRbTree) -> Vec<i64> {
    let mut out = Vec::new();
    let mut cur = tree.max();
    while let Some(item) = cur {
        out.push(*item);
        cur = tree.prev(item);
    }
    out
}

pub fn spt_ascending(tree: &mut IntSpTree) -> Vec<i64> {
    let mut out = Vec::new();
    let mut cur = tree.min();
    while let Some(item) = cur {
        out.push(*item);
        cur = tree.next(item);
    }
    out
}

pub fn spt_descending(tree: &mut IntSpTree) -> Vec<i64> {
    let mut out = Vec::new();
    let mut cur = tree.max();
    while let Some(item) = cur {
        out.push(*item);
        cur = tree.prev(item);
    }
    out
}

/// Assert a sequence is strictly ascending.
pub fn assert_strictly_ascending(seq: &[i64]) {
    for pair in seq.windows(2) {
        assert!(pair[0] < pair[1], "sequence not strictly ascending: {:?}", pair);
    }
}
