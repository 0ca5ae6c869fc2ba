//! Self-adjusting splay tree.
//!
//! `SpTree` shares the plain node shape with the unbalanced tree; what it
//! adds is the access discipline: every operation, lookups included, splays
//! the accessed (or last-touched) node to the root with a top-down pass, so
//! every public method takes the tree exclusively. All higher operations are
//! reductions to three splay primitives: splay-to-key, splay-leftmost and
//! splay-rightmost, each reassembling the tree around two scratch spines
//! hung off a stack header node.

#![cfg_attr(not(test), no_std)]

use core::cmp::Ordering;
use core::fmt;
use core::ptr;

use arbor_core::{
    clone_as_right_spine, dispose_tree, merge_ordered, natural_order, subtree_ordered, Node,
    SetOp,
};

/// Top-down splay toward `key`. The returned node is the new root: the key's
/// node when present, otherwise the last node touched by the descent (one of
/// the key's in-order neighbors).
///
/// At each step the key is compared at the current node; a same-direction
/// grandchild step (zig-zig) rotates before the current node is linked into
/// the far spine, an opposite-direction step (zig-zag) just links. The walk
/// stops at the key or a null child, then the spines are reattached under
/// the stopping node.
///
/// # Safety
/// `root` must be non-null and the root of a valid tree.
unsafe fn splay<'a, T, C>(mut root: *mut Node<'a, T>, key: &T, cmp: &C) -> *mut Node<'a, T>
where
    C: Fn(&T, &T) -> Ordering,
{
    let mut head = Node::scratch();
    let hd: *mut Node<'a, T> = &mut head;
    let mut left_tail = hd;
    let mut right_tail = hd;

    loop {
        match cmp(key, (*root).item_ref()) {
            Ordering::Less => {
                if (*root).left.is_null() {
                    break;
                }
                if cmp(key, (*(*root).left).item_ref()) == Ordering::Less {
                    // Zig-zig: rotate right before linking.
                    let pivot = (*root).left;
                    (*root).left = (*pivot).right;
                    (*pivot).right = root;
                    root = pivot;
                    if (*root).left.is_null() {
                        break;
                    }
                }
                (*right_tail).left = root;
                right_tail = root;
                root = (*root).left;
            }
            Ordering::Greater => {
                if (*root).right.is_null() {
                    break;
                }
                if cmp(key, (*(*root).right).item_ref()) == Ordering::Greater {
                    let pivot = (*root).right;
                    (*root).right = (*pivot).left;
                    (*pivot).left = root;
                    root = pivot;
                    if (*root).right.is_null() {
                        break;
                    }
                }
                (*left_tail).right = root;
                left_tail = root;
                root = (*root).right;
            }
            Ordering::Equal => break,
        }
    }

    (*left_tail).right = (*root).left;
    (*right_tail).left = (*root).right;
    (*root).left = (*hd).right;
    (*root).right = (*hd).left;
    root
}

/// Comparison-free splay to the smallest node.
///
/// # Safety
/// As for [`splay`].
unsafe fn splay_leftmost<'a, T>(mut root: *mut Node<'a, T>) -> *mut Node<'a, T> {
    let mut head = Node::scratch();
    let hd: *mut Node<'a, T> = &mut head;
    let mut right_tail = hd;

    loop {
        if (*root).left.is_null() {
            break;
        }
        let pivot = (*root).left;
        (*root).left = (*pivot).right;
        (*pivot).right = root;
        root = pivot;
        if (*root).left.is_null() {
            break;
        }
        (*right_tail).left = root;
        right_tail = root;
        root = (*root).left;
    }

    (*hd).right = (*root).left;
    (*right_tail).left = (*root).right;
    (*root).left = (*hd).right;
    (*root).right = (*hd).left;
    root
}

/// Comparison-free splay to the largest node; mirror of
/// [`splay_leftmost`].
///
/// # Safety
/// As for [`splay`].
unsafe fn splay_rightmost<'a, T>(mut root: *mut Node<'a, T>) -> *mut Node<'a, T> {
    let mut head = Node::scratch();
    let hd: *mut Node<'a, T> = &mut head;
    let mut left_tail = hd;

    loop {
        if (*root).right.is_null() {
            break;
        }
        let pivot = (*root).right;
        (*root).right = (*pivot).left;
        (*pivot).left = root;
        root = pivot;
        if (*root).right.is_null() {
            break;
        }
        (*left_tail).right = root;
        left_tail = root;
        root = (*root).right;
    }

    (*left_tail).right = (*root).left;
    (*hd).left = (*root).right;
    (*root).left = (*hd).right;
    (*root).right = (*hd).left;
    root
}

/// Splay tree over caller-owned payloads.
///
/// Amortized O(log n) per operation; recently touched keys sit near the
/// root. Because every access reshapes the tree, even read operations take
/// `&mut self`; callers wanting cheap shared reads should pick another
/// variant.
pub struct SpTree<'a, T, C> {
    root: *mut Node<'a, T>,
    cmp: C,
}

unsafe impl<'a, T: Sync, C: Send> Send for SpTree<'a, T, C> {}
unsafe impl<'a, T: Sync, C: Sync> Sync for SpTree<'a, T, C> {}

static_assertions::assert_impl_all!(
    SpTree<'static, u64, fn(&u64, &u64) -> Ordering>: Send, Sync
);

impl<'a, T: Ord> SpTree<'a, T, fn(&T, &T) -> Ordering> {
    /// Tree ordered by the payload type's own `Ord`.
    pub fn natural() -> Self {
        Self::new(natural_order::<T>)
    }
}

impl<'a, T, C> SpTree<'a, T, C>
where
    C: Fn(&T, &T) -> Ordering + Clone,
{
    pub fn new(cmp: C) -> Self {
        Self {
            root: ptr::null_mut(),
            cmp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    /// Splay the key and check the root. A miss still reshapes the tree.
    pub fn search(&mut self, key: &T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            self.root = splay(self.root, key, &self.cmp);
            let root = self.root;
            if (self.cmp)(key, (*root).item_ref()) == Ordering::Equal {
                Some((*root).item_ref())
            } else {
                None
            }
        }
    }

    /// Splay the key; an equal root is overwritten, otherwise the new node
    /// becomes root with the old root as its child on the appropriate side.
    pub fn insert(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                self.root = Node::alloc(item);
                return None;
            }
            self.root = splay(self.root, item, &self.cmp);
            let root = self.root;
            match (self.cmp)(item, (*root).item_ref()) {
                Ordering::Equal => Some((*root).replace_item(item)),
                Ordering::Less => {
                    let node = Node::alloc(item);
                    (*node).left = (*root).left;
                    (*node).right = root;
                    (*root).left = ptr::null_mut();
                    self.root = node;
                    None
                }
                Ordering::Greater => {
                    let node = Node::alloc(item);
                    (*node).right = (*root).right;
                    (*node).left = root;
                    (*root).right = ptr::null_mut();
                    self.root = node;
                    None
                }
            }
        }
    }

    /// Fast path for a payload known to compare <= every current key: splay
    /// to the minimum, compare once, attach as its left child. Amortized
    /// O(1) under monotone insertion; anything else silently breaks
    /// symmetric order.
    pub fn insert_min(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                self.root = Node::alloc(item);
                return None;
            }
            let root = splay_leftmost(self.root);
            self.root = root;
            if (self.cmp)(item, (*root).item_ref()) == Ordering::Equal {
                return Some((*root).replace_item(item));
            }
            (*root).left = Node::alloc(item);
            None
        }
    }

    /// Mirror of [`SpTree::insert_min`] for a payload known to compare >=
    /// every current key.
    pub fn insert_max(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                self.root = Node::alloc(item);
                return None;
            }
            let root = splay_rightmost(self.root);
            self.root = root;
            if (self.cmp)(item, (*root).item_ref()) == Ordering::Equal {
                return Some((*root).replace_item(item));
            }
            (*root).right = Node::alloc(item);
            None
        }
    }

    pub fn min(&mut self) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            self.root = splay_leftmost(self.root);
            Some((*self.root).item_ref())
        }
    }

    pub fn max(&mut self) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            self.root = splay_rightmost(self.root);
            Some((*self.root).item_ref())
        }
    }

    /// Greatest payload strictly below `key`. After splaying, either the
    /// root already sits below the key, or the answer is the maximum of the
    /// root's left subtree, which is splayed up and re-hung.
    pub fn prev(&mut self, key: &T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            self.root = splay(self.root, key, &self.cmp);
            let root = self.root;
            if (self.cmp)(key, (*root).item_ref()) == Ordering::Greater {
                return Some((*root).item_ref());
            }
            if (*root).left.is_null() {
                return None;
            }
            let sub = splay_rightmost((*root).left);
            (*root).left = sub;
            Some((*sub).item_ref())
        }
    }

    /// Least payload strictly above `key`; mirror of [`SpTree::prev`].
    pub fn next(&mut self, key: &T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            self.root = splay(self.root, key, &self.cmp);
            let root = self.root;
            if (self.cmp)(key, (*root).item_ref()) == Ordering::Less {
                return Some((*root).item_ref());
            }
            if (*root).right.is_null() {
                return None;
            }
            let sub = splay_leftmost((*root).right);
            (*root).right = sub;
            Some((*sub).item_ref())
        }
    }

    /// Splay the key; on a root match detach it, splay the left subtree to
    /// its maximum and adopt the right subtree there.
    pub fn remove(&mut self, key: &T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            self.root = splay(self.root, key, &self.cmp);
            let root = self.root;
            if (self.cmp)(key, (*root).item_ref()) != Ordering::Equal {
                return None;
            }
            self.root = if (*root).left.is_null() {
                (*root).right
            } else {
                let left = splay_rightmost((*root).left);
                (*left).right = (*root).right;
                left
            };
            Some(Node::release(root))
        }
    }

    pub fn remove_min(&mut self) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            let root = splay_leftmost(self.root);
            self.root = (*root).right;
            Some(Node::release(root))
        }
    }

    pub fn remove_max(&mut self) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            let root = splay_rightmost(self.root);
            self.root = (*root).left;
            Some(Node::release(root))
        }
    }

    /// Free every node in O(n) time and O(1) space; `hook` runs on each
    /// payload as its node dies.
    pub fn remove_all(&mut self, hook: Option<&mut dyn FnMut(&'a T)>) {
        unsafe {
            let root = self.root;
            self.root = ptr::null_mut();
            dispose_tree(root, hook);
        }
    }

    /// Fresh-node copy sharing payload references. Takes `&mut self` like
    /// every other operation: the threaded walk borrows right links while it
    /// runs (they are restored before returning).
    pub fn copy(&mut self) -> Self {
        unsafe {
            Self {
                root: clone_as_right_spine(self.root),
                cmp: self.cmp.clone(),
            }
        }
    }

    pub fn union(&mut self, other: &mut Self) -> Self {
        self.combine(other, SetOp::Union)
    }

    pub fn intersection(&mut self, other: &mut Self) -> Self {
        self.combine(other, SetOp::Intersection)
    }

    pub fn difference(&mut self, other: &mut Self) -> Self {
        self.combine(other, SetOp::Difference)
    }

    pub fn symmetric_difference(&mut self, other: &mut Self) -> Self {
        self.combine(other, SetOp::SymmetricDifference)
    }

    /// Merge both operands under `op`. The operands are walked with `min`
    /// plus repeated `next`, splaying as they go, hence the exclusive
    /// borrows; those also rule out same-handle operands statically (use
    /// [`SpTree::copy`] for that case). The result is built through the
    /// splay `insert_max` fast path.
    fn combine(&mut self, other: &mut Self, op: SetOp) -> Self {
        let cmp = self.cmp.clone();
        let mut out = Self::new(cmp.clone());
        let mut lhs_at: Option<&'a T> = None;
        let mut lhs_started = false;
        let mut rhs_at: Option<&'a T> = None;
        let mut rhs_started = false;
        merge_ordered(
            || {
                lhs_at = if !lhs_started {
                    lhs_started = true;
                    self.min()
                } else {
                    lhs_at.and_then(|key| self.next(key))
                };
                lhs_at
            },
            || {
                rhs_at = if !rhs_started {
                    rhs_started = true;
                    other.min()
                } else {
                    rhs_at.and_then(|key| other.next(key))
                };
                rhs_at
            },
            &cmp,
            op,
            |item| {
                out.insert_max(item);
            },
        );
        out
    }

    /// Symmetric-order validator; test-facing, the one read that does not
    /// splay.
    pub fn is_valid(&self) -> bool {
        unsafe { subtree_ordered(self.root, None, None, &self.cmp) }
    }
}

impl<'a, T, C> Drop for SpTree<'a, T, C> {
    fn drop(&mut self) {
        unsafe {
            dispose_tree(self.root, None);
        }
    }
}

impl<'a, T, C> fmt::Debug for SpTree<'a, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpTree")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
