//! Unbalanced binary search tree.
//!
//! `BsTree` makes no balancing promises on its mutation paths; instead it
//! offers in-place linearization (`to_list`, `to_reversed_list`) and a
//! size-oblivious Day-Stout-Warren `rebalance` that callers invoke when they
//! want logarithmic height. All descents are iterative and the nodes carry
//! no parent pointers; removal and rebalancing navigate through link
//! pointers instead.

#![cfg_attr(not(test), no_std)]

use core::cmp::Ordering;
use core::fmt;
use core::ptr;

use arbor_core::{
    clone_as_right_spine, dispose_tree, merge_ordered, natural_order, subtree_ordered,
    InorderCursor, Node, SetOp,
};

/// Unbalanced binary search tree over caller-owned payloads.
///
/// The comparator is fixed at construction and is the sole authority on key
/// identity. Payloads are stored by reference; removal returns the displaced
/// reference to the caller.
pub struct BsTree<'a, T, C> {
    root: *mut Node<'a, T>,
    cmp: C,
}

// The handle exclusively owns its nodes; payload references are shared, so
// crossing threads needs `T: Sync`.
unsafe impl<'a, T: Sync, C: Send> Send for BsTree<'a, T, C> {}
unsafe impl<'a, T: Sync, C: Sync> Sync for BsTree<'a, T, C> {}

static_assertions::assert_impl_all!(
    BsTree<'static, u64, fn(&u64, &u64) -> Ordering>: Send, Sync
);

impl<'a, T: Ord> BsTree<'a, T, fn(&T, &T) -> Ordering> {
    /// Tree ordered by the payload type's own `Ord`.
    pub fn natural() -> Self {
        Self::new(natural_order::<T>)
    }
}

impl<'a, T, C> BsTree<'a, T, C>
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

    /// Insert a payload; an equal key is overwritten and its payload handed
    /// back. The node is allocated before any link changes, so a failed
    /// allocation cannot leave a half-linked tree.
    pub fn insert(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe {
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(*link).is_null() {
                let node = *link;
                match (self.cmp)(item, (*node).item_ref()) {
                    Ordering::Less => link = &mut (*node).left,
                    Ordering::Greater => link = &mut (*node).right,
                    Ordering::Equal => return Some((*node).replace_item(item)),
                }
            }
            *link = Node::alloc(item);
            None
        }
    }

    /// Fast path for a payload known to compare <= every current key: walks
    /// the left spine and compares exactly once, against its end. Feeding it
    /// anything else silently breaks symmetric order.
    pub fn insert_min(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe {
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(*link).is_null() && !(**link).left.is_null() {
                link = &mut (**link).left;
            }
            let node = *link;
            if node.is_null() {
                *link = Node::alloc(item);
                return None;
            }
            if (self.cmp)(item, (*node).item_ref()) == Ordering::Equal {
                return Some((*node).replace_item(item));
            }
            (*node).left = Node::alloc(item);
            None
        }
    }

    /// Mirror of [`BsTree::insert_min`] for a payload known to compare >=
    /// every current key.
    pub fn insert_max(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe {
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(*link).is_null() && !(**link).right.is_null() {
                link = &mut (**link).right;
            }
            let node = *link;
            if node.is_null() {
                *link = Node::alloc(item);
                return None;
            }
            if (self.cmp)(item, (*node).item_ref()) == Ordering::Equal {
                return Some((*node).replace_item(item));
            }
            (*node).right = Node::alloc(item);
            None
        }
    }

    pub fn search(&self, key: &T) -> Option<&'a T> {
        unsafe {
            let mut node = self.root;
            while !node.is_null() {
                match (self.cmp)(key, (*node).item_ref()) {
                    Ordering::Less => node = (*node).left,
                    Ordering::Greater => node = (*node).right,
                    Ordering::Equal => return Some((*node).item_ref()),
                }
            }
            None
        }
    }

    pub fn min(&self) -> Option<&'a T> {
        unsafe {
            let mut node = self.root;
            if node.is_null() {
                return None;
            }
            while !(*node).left.is_null() {
                node = (*node).left;
            }
            Some((*node).item_ref())
        }
    }

    pub fn max(&self) -> Option<&'a T> {
        unsafe {
            let mut node = self.root;
            if node.is_null() {
                return None;
            }
            while !(*node).right.is_null() {
                node = (*node).right;
            }
            Some((*node).item_ref())
        }
    }

    /// Greatest payload strictly below `key`. The key itself need not be
    /// present. Remembers the last ancestor where the descent turned right;
    /// that ancestor is the neighbor once the walk falls off the tree.
    pub fn prev(&self, key: &T) -> Option<&'a T> {
        unsafe {
            let mut node = self.root;
            let mut candidate: *mut Node<'a, T> = ptr::null_mut();
            while !node.is_null() {
                if (self.cmp)(key, (*node).item_ref()) == Ordering::Greater {
                    candidate = node;
                    node = (*node).right;
                } else {
                    node = (*node).left;
                }
            }
            if candidate.is_null() {
                None
            } else {
                Some((*candidate).item_ref())
            }
        }
    }

    /// Least payload strictly above `key`; mirror of [`BsTree::prev`].
    pub fn next(&self, key: &T) -> Option<&'a T> {
        unsafe {
            let mut node = self.root;
            let mut candidate: *mut Node<'a, T> = ptr::null_mut();
            while !node.is_null() {
                if (self.cmp)(key, (*node).item_ref()) == Ordering::Less {
                    candidate = node;
                    node = (*node).left;
                } else {
                    node = (*node).right;
                }
            }
            if candidate.is_null() {
                None
            } else {
                Some((*candidate).item_ref())
            }
        }
    }

    /// Remove the node matching `key`, handing back its payload. A target
    /// with two children swaps payloads with its in-order successor and the
    /// successor's node (at most one child) is excised instead.
    pub fn remove(&mut self, key: &T) -> Option<&'a T> {
        unsafe {
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(*link).is_null() {
                let node = *link;
                match (self.cmp)(key, (*node).item_ref()) {
                    Ordering::Less => link = &mut (*node).left,
                    Ordering::Greater => link = &mut (*node).right,
                    Ordering::Equal => {
                        if !(*node).left.is_null() && !(*node).right.is_null() {
                            let mut slink: *mut *mut Node<'a, T> = &mut (*node).right;
                            while !(**slink).left.is_null() {
                                slink = &mut (**slink).left;
                            }
                            let succ = *slink;
                            let displaced = (*node).item;
                            (*node).item = (*succ).item;
                            *slink = (*succ).right;
                            Node::release(succ);
                            return Some(&*displaced);
                        }
                        let child = if (*node).left.is_null() {
                            (*node).right
                        } else {
                            (*node).left
                        };
                        *link = child;
                        return Some(Node::release(node));
                    }
                }
            }
            None
        }
    }

    pub fn remove_min(&mut self) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(**link).left.is_null() {
                link = &mut (**link).left;
            }
            let node = *link;
            *link = (*node).right;
            Some(Node::release(node))
        }
    }

    pub fn remove_max(&mut self) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(**link).right.is_null() {
                link = &mut (**link).right;
            }
            let node = *link;
            *link = (*node).left;
            Some(Node::release(node))
        }
    }

    /// Free every node in O(n) time and O(1) space. `hook` runs on each
    /// payload as its node dies; without it, payloads outlive the tree.
    pub fn remove_all(&mut self, hook: Option<&mut dyn FnMut(&'a T)>) {
        unsafe {
            let root = self.root;
            self.root = ptr::null_mut();
            dispose_tree(root, hook);
        }
    }

    /// Linearize in place into a right spine (ascending order top to
    /// bottom), using right rotations only.
    pub fn to_list(&mut self) {
        unsafe {
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(*link).is_null() {
                if (**link).left.is_null() {
                    link = &mut (**link).right;
                } else {
                    rotate_right_at(link);
                }
            }
        }
    }

    /// Linearize in place into a left spine (descending order top to
    /// bottom), using left rotations only.
    pub fn to_reversed_list(&mut self) {
        unsafe {
            let mut link: *mut *mut Node<'a, T> = &mut self.root;
            while !(*link).is_null() {
                if (**link).right.is_null() {
                    link = &mut (**link).left;
                } else {
                    rotate_left_at(link);
                }
            }
        }
    }

    /// Size-oblivious Day-Stout-Warren rebalance: linearize to a right
    /// spine, then compress by left-rotating every other spine node per pass
    /// until a pass performs no rotation, then pull the root (by then the
    /// maximum) back down to the rightmost position under its left subtree.
    /// Final height is the minimum possible for the key count.
    pub fn rebalance(&mut self) {
        unsafe {
            self.to_list();
            loop {
                let mut link: *mut *mut Node<'a, T> = &mut self.root;
                let mut rotated = false;
                while !(*link).is_null() && !(**link).right.is_null() {
                    rotate_left_at(link);
                    link = &mut (**link).right;
                    rotated = true;
                }
                if !rotated {
                    break;
                }
            }
            let root = self.root;
            if !root.is_null() && !(*root).left.is_null() {
                let new_root = (*root).left;
                (*root).left = ptr::null_mut();
                let mut node = new_root;
                while !(*node).right.is_null() {
                    node = (*node).right;
                }
                (*node).right = root;
                self.root = new_root;
            }
        }
    }

    /// Fresh-node copy sharing payload references; materializes as a right
    /// spine (rebalance afterwards if shape matters).
    pub fn copy(&self) -> Self {
        unsafe {
            Self {
                root: clone_as_right_spine(self.root),
                cmp: self.cmp.clone(),
            }
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        self.combine(other, SetOp::Union)
    }

    pub fn intersection(&self, other: &Self) -> Self {
        self.combine(other, SetOp::Intersection)
    }

    pub fn difference(&self, other: &Self) -> Self {
        self.combine(other, SetOp::Difference)
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.combine(other, SetOp::SymmetricDifference)
    }

    /// Merge both operands' threaded traversals into a right-spine result
    /// (O(1) per emitted node). Operands must share this tree's order.
    fn combine(&self, other: &Self, op: SetOp) -> Self {
        if ptr::eq(self, other) {
            return match op {
                SetOp::Union | SetOp::Intersection => self.copy(),
                SetOp::Difference | SetOp::SymmetricDifference => Self::new(self.cmp.clone()),
            };
        }
        let mut out = Self::new(self.cmp.clone());
        let out_root: *mut *mut Node<'a, T> = &mut out.root;
        let mut tail: *mut Node<'a, T> = ptr::null_mut();
        let mut lhs = InorderCursor::new(self.root);
        let mut rhs = InorderCursor::new(other.root);
        merge_ordered(
            || unsafe {
                let node = lhs.next();
                if node.is_null() {
                    None
                } else {
                    Some((*node).item_ref())
                }
            },
            || unsafe {
                let node = rhs.next();
                if node.is_null() {
                    None
                } else {
                    Some((*node).item_ref())
                }
            },
            &self.cmp,
            op,
            |item| unsafe {
                let fresh = Node::alloc(item);
                if tail.is_null() {
                    *out_root = fresh;
                } else {
                    (*tail).right = fresh;
                }
                tail = fresh;
            },
        );
        out
    }

    /// Symmetric-order validator; test-facing.
    pub fn is_valid(&self) -> bool {
        unsafe { subtree_ordered(self.root, None, None, &self.cmp) }
    }

    /// Node count on the longest root-to-leaf path; diagnostic for the
    /// rebalance property.
    pub fn height(&self) -> usize {
        unsafe fn depth<'a, T>(node: *mut Node<'a, T>) -> usize {
            if node.is_null() {
                0
            } else {
                1 + depth((*node).left).max(depth((*node).right))
            }
        }
        unsafe { depth(self.root) }
    }
}

impl<'a, T, C> Drop for BsTree<'a, T, C> {
    fn drop(&mut self) {
        unsafe {
            dispose_tree(self.root, None);
        }
    }
}

impl<'a, T, C> fmt::Debug for BsTree<'a, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BsTree")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Rotate the subtree at `link` to the right, lifting its left child.
///
/// # Safety
/// `*link` and its left child must be non-null.
unsafe fn rotate_right_at<'a, T>(link: *mut *mut Node<'a, T>) {
    let node = *link;
    let left = (*node).left;
    (*node).left = (*left).right;
    (*left).right = node;
    *link = left;
}

/// Rotate the subtree at `link` to the left, lifting its right child.
///
/// # Safety
/// `*link` and its right child must be non-null.
unsafe fn rotate_left_at<'a, T>(link: *mut *mut Node<'a, T>) {
    let node = *link;
    let right = (*node).right;
    (*node).right = (*right).left;
    (*right).left = node;
    *link = right;
}
