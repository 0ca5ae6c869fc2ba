//! Red-black tree with single-pass top-down insert and delete.
//!
//! The classic invariants hold (no red node has a red child, every
//! root-to-null path crosses the same number of black nodes, the root is
//! black), but unlike the textbook bottom-up algorithms both insert and
//! delete restore them during a single descent: a four-deep sliding window
//! of { anchor, grandparent, parent, current } anchored on a stack scratch
//! header is enough to perform every rotation locally. Nodes carry no parent
//! pointer and nothing recurses on the mutation paths.
//!
//! Insert repairs on the way down by color-flipping any node with two red
//! children and immediately rotating a resulting red-red pair. Delete pushes
//! a red down the search path so that the node finally excised is a red
//! bottom node, maintaining "current black, sibling black, parent red"
//! across iterations.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ptr;

use alloc::boxed::Box;

use arbor_core::{merge_ordered, natural_order, BinaryNode, InorderCursor, SetOp};

const LEFT: usize = 0;
const RIGHT: usize = 1;

/// Red-black tree node: payload reference, two child links, one color bit.
struct RbNode<'a, T> {
    item: *const T,
    left: *mut RbNode<'a, T>,
    right: *mut RbNode<'a, T>,
    red: bool,
    marker: PhantomData<&'a T>,
}

impl<'a, T> RbNode<'a, T> {
    /// Allocate a red leaf; top-down insertion always attaches red.
    fn alloc(item: &'a T) -> *mut Self {
        Box::into_raw(Box::new(Self {
            item,
            left: ptr::null_mut(),
            right: ptr::null_mut(),
            red: true,
            marker: PhantomData,
        }))
    }

    /// Black stack header anchoring the descent windows; carries no payload
    /// and never outlives one operation.
    fn scratch() -> Self {
        Self {
            item: ptr::null(),
            left: ptr::null_mut(),
            right: ptr::null_mut(),
            red: false,
            marker: PhantomData,
        }
    }

    unsafe fn item_ref(&self) -> &'a T {
        &*self.item
    }

    unsafe fn replace_item(&mut self, item: &'a T) -> &'a T {
        let old = &*self.item;
        self.item = item;
        old
    }

    unsafe fn release(node: *mut Self) -> &'a T {
        let boxed = Box::from_raw(node);
        &*boxed.item
    }

    fn link(&self, dir: usize) -> *mut Self {
        if dir == LEFT {
            self.left
        } else {
            self.right
        }
    }

    fn set_link(&mut self, dir: usize, node: *mut Self) {
        if dir == LEFT {
            self.left = node;
        } else {
            self.right = node;
        }
    }
}

impl<'a, T> BinaryNode for RbNode<'a, T> {
    fn left(&self) -> *mut Self {
        self.left
    }

    fn right(&self) -> *mut Self {
        self.right
    }

    fn set_right(&mut self, link: *mut Self) {
        self.right = link;
    }
}

/// Null links count as black.
unsafe fn is_red<'a, T>(node: *const RbNode<'a, T>) -> bool {
    !node.is_null() && (*node).red
}

/// Single rotation toward `dir`, recolored for the top-down passes: the old
/// top turns red, the lifted child black.
///
/// # Safety
/// `node` and its `1 - dir` child must be non-null.
unsafe fn rotate_single<'a, T>(node: *mut RbNode<'a, T>, dir: usize) -> *mut RbNode<'a, T> {
    let save = (*node).link(1 - dir);
    (*node).set_link(1 - dir, (*save).link(dir));
    (*save).set_link(dir, node);
    (*node).red = true;
    (*save).red = false;
    save
}

/// Zig-zag repair: rotate the far child away first, then the node itself.
///
/// # Safety
/// `node`, its `1 - dir` child, and that child's `dir` child must be
/// non-null.
unsafe fn rotate_double<'a, T>(node: *mut RbNode<'a, T>, dir: usize) -> *mut RbNode<'a, T> {
    let inner = rotate_single((*node).link(1 - dir), 1 - dir);
    (*node).set_link(1 - dir, inner);
    rotate_single(node, dir)
}

/// Rotation-based bulk teardown, mirroring the plain-node variant; colors
/// are irrelevant once nodes are dying.
unsafe fn dispose_rb<'a, T>(
    mut node: *mut RbNode<'a, T>,
    mut hook: Option<&mut dyn FnMut(&'a T)>,
) {
    while !node.is_null() {
        if (*node).left.is_null() {
            let right = (*node).right;
            let item = RbNode::release(node);
            if let Some(hook) = hook.as_deref_mut() {
                hook(item);
            }
            node = right;
        } else {
            let left = (*node).left;
            (*node).left = (*left).right;
            (*left).right = node;
            node = left;
        }
    }
}

unsafe fn rb_ordered<'a, T, C>(
    node: *mut RbNode<'a, T>,
    lo: Option<&T>,
    hi: Option<&T>,
    cmp: &C,
) -> bool
where
    C: Fn(&T, &T) -> Ordering,
{
    if node.is_null() {
        return true;
    }
    if (*node).item.is_null() {
        return false;
    }
    let item = (*node).item_ref();
    if let Some(lo) = lo {
        if cmp(lo, item) != Ordering::Less {
            return false;
        }
    }
    if let Some(hi) = hi {
        if cmp(item, hi) != Ordering::Less {
            return false;
        }
    }
    rb_ordered((*node).left, lo, Some(item), cmp)
        && rb_ordered((*node).right, Some(item), hi, cmp)
}

/// Black height of the subtree, counting the null level as one; `None` on a
/// red-red edge or mismatched branch heights.
unsafe fn black_height<'a, T>(node: *mut RbNode<'a, T>) -> Option<usize> {
    if node.is_null() {
        return Some(1);
    }
    if (*node).red && (is_red((*node).left) || is_red((*node).right)) {
        return None;
    }
    let lh = black_height((*node).left)?;
    let rh = black_height((*node).right)?;
    if lh != rh {
        return None;
    }
    Some(lh + usize::from(!(*node).red))
}

/// Red-black tree over caller-owned payloads.
///
/// Same surface as the other variants; the balancing guarantee costs one
/// color bit per node and buys O(log n) height after every operation.
pub struct RbTree<'a, T, C> {
    root: *mut RbNode<'a, T>,
    cmp: C,
}

unsafe impl<'a, T: Sync, C: Send> Send for RbTree<'a, T, C> {}
unsafe impl<'a, T: Sync, C: Sync> Sync for RbTree<'a, T, C> {}

static_assertions::assert_impl_all!(
    RbTree<'static, u64, fn(&u64, &u64) -> Ordering>: Send, Sync
);

impl<'a, T: Ord> RbTree<'a, T, fn(&T, &T) -> Ordering> {
    /// Tree ordered by the payload type's own `Ord`.
    pub fn natural() -> Self {
        Self::new(natural_order::<T>)
    }
}

impl<'a, T, C> RbTree<'a, T, C>
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

    /// Top-down insert. Any node met with two red children is color-flipped;
    /// a red-red pair this creates with the parent is repaired on the spot
    /// with a single rotation (straight window) or a double one (zig-zag),
    /// both performed at the anchor two levels up. An equal key overwrites
    /// and hands back the displaced payload; the root is re-blackened at
    /// exit.
    pub fn insert(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                let node = RbNode::alloc(item);
                (*node).red = false;
                self.root = node;
                return None;
            }

            let mut head = RbNode::scratch();
            let hd: *mut RbNode<'a, T> = &mut head;
            (*hd).right = self.root;

            let mut anchor = hd;
            let mut grand: *mut RbNode<'a, T> = ptr::null_mut();
            let mut parent: *mut RbNode<'a, T> = ptr::null_mut();
            let mut q = self.root;
            let mut dir = LEFT;
            let mut last = LEFT;
            let mut displaced = None;

            loop {
                let mut inserted = false;
                if q.is_null() {
                    q = RbNode::alloc(item);
                    (*parent).set_link(dir, q);
                    inserted = true;
                } else if is_red((*q).left) && is_red((*q).right) {
                    (*q).red = true;
                    (*(*q).left).red = false;
                    (*(*q).right).red = false;
                }

                if is_red(q) && is_red(parent) {
                    let dir2 = usize::from((*anchor).right == grand);
                    if q == (*parent).link(last) {
                        (*anchor).set_link(dir2, rotate_single(grand, 1 - last));
                    } else {
                        (*anchor).set_link(dir2, rotate_double(grand, 1 - last));
                    }
                }

                if inserted {
                    break;
                }
                match (self.cmp)(item, (*q).item_ref()) {
                    Ordering::Equal => {
                        displaced = Some((*q).replace_item(item));
                        break;
                    }
                    ord => {
                        last = dir;
                        dir = usize::from(ord == Ordering::Greater);
                        if !grand.is_null() {
                            anchor = grand;
                        }
                        grand = parent;
                        parent = q;
                        q = (*q).link(dir);
                    }
                }
            }

            self.root = (*hd).right;
            (*self.root).red = false;
            displaced
        }
    }

    /// Fast path for a payload known to compare <= every current key.
    /// One-directional descent down the left spine with the same flip/rotate
    /// maintenance as [`RbTree::insert`] (only the straight rotation shape
    /// can occur); exactly one comparison is made, against the spine end
    /// before the leaf is allocated.
    pub fn insert_min(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe { self.insert_extreme(item, LEFT) }
    }

    /// Mirror of [`RbTree::insert_min`] for a payload known to compare >=
    /// every current key.
    pub fn insert_max(&mut self, item: &'a T) -> Option<&'a T> {
        unsafe { self.insert_extreme(item, RIGHT) }
    }

    unsafe fn insert_extreme(&mut self, item: &'a T, dir: usize) -> Option<&'a T> {
        if self.root.is_null() {
            let node = RbNode::alloc(item);
            (*node).red = false;
            self.root = node;
            return None;
        }

        let mut head = RbNode::scratch();
        let hd: *mut RbNode<'a, T> = &mut head;
        (*hd).right = self.root;

        let mut anchor = hd;
        let mut grand: *mut RbNode<'a, T> = ptr::null_mut();
        let mut parent: *mut RbNode<'a, T> = ptr::null_mut();
        let mut q = self.root;
        let mut displaced = None;

        loop {
            let mut inserted = false;
            if q.is_null() {
                // Spine end: the fast path's single comparison.
                if (self.cmp)(item, (*parent).item_ref()) == Ordering::Equal {
                    displaced = Some((*parent).replace_item(item));
                    break;
                }
                q = RbNode::alloc(item);
                (*parent).set_link(dir, q);
                inserted = true;
            } else if is_red((*q).left) && is_red((*q).right) {
                (*q).red = true;
                (*(*q).left).red = false;
                (*(*q).right).red = false;
            }

            if is_red(q) && is_red(parent) {
                let dir2 = usize::from((*anchor).right == grand);
                // One-directional descent: always a straight line.
                (*anchor).set_link(dir2, rotate_single(grand, 1 - dir));
            }

            if inserted {
                break;
            }
            if !grand.is_null() {
                anchor = grand;
            }
            grand = parent;
            parent = q;
            q = (*q).link(dir);
        }

        self.root = (*hd).right;
        (*self.root).red = false;
        displaced
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

    /// Greatest payload strictly below `key` (which need not be present).
    pub fn prev(&self, key: &T) -> Option<&'a T> {
        unsafe {
            let mut node = self.root;
            let mut candidate: *mut RbNode<'a, T> = ptr::null_mut();
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

    /// Least payload strictly above `key`; mirror of [`RbTree::prev`].
    pub fn next(&self, key: &T) -> Option<&'a T> {
        unsafe {
            let mut node = self.root;
            let mut candidate: *mut RbNode<'a, T> = ptr::null_mut();
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

    /// Top-down delete. The descent keeps pushing a red onto the current
    /// node so the bottom node finally excised is red: with both of the
    /// current node's children black it either color-flips parent, sibling
    /// and current, or borrows redness from the sibling's side with a single
    /// or double rotation at the parent; with a red child off the descent
    /// path it rotates that child onto it. On an equal key the node is
    /// remembered and the walk continues to its in-order successor, whose
    /// payload is copied up before the bottom node is unlinked. Removing an
    /// absent key still performs the full restructuring descent.
    pub fn remove(&mut self, key: &T) -> Option<&'a T> {
        unsafe {
            if self.root.is_null() {
                return None;
            }

            let mut head = RbNode::scratch();
            let hd: *mut RbNode<'a, T> = &mut head;
            (*hd).right = self.root;

            let mut grand: *mut RbNode<'a, T> = ptr::null_mut();
            let mut parent: *mut RbNode<'a, T> = ptr::null_mut();
            let mut q = hd;
            let mut found: *mut RbNode<'a, T> = ptr::null_mut();
            let mut dir = RIGHT;

            while !(*q).link(dir).is_null() {
                let last = dir;
                grand = parent;
                parent = q;
                q = (*q).link(dir);

                let ord = (self.cmp)(key, (*q).item_ref());
                // Equal keys continue toward the in-order successor.
                dir = usize::from(ord != Ordering::Less);
                if ord == Ordering::Equal {
                    found = q;
                }

                if is_red(q) || is_red((*q).link(dir)) {
                    continue;
                }
                if is_red((*q).link(1 - dir)) {
                    // Red child off the descent path: rotate it onto it.
                    let lifted = rotate_single(q, dir);
                    (*parent).set_link(last, lifted);
                    parent = lifted;
                    continue;
                }
                let sibling = (*parent).link(1 - last);
                if sibling.is_null() {
                    continue;
                }
                if !is_red((*sibling).link(1 - last)) && !is_red((*sibling).link(last)) {
                    // Sibling's children both black: flip redness down.
                    (*parent).red = false;
                    (*sibling).red = true;
                    (*q).red = true;
                } else {
                    let dir2 = usize::from((*grand).right == parent);
                    if is_red((*sibling).link(last)) {
                        (*grand).set_link(dir2, rotate_double(parent, last));
                    } else {
                        (*grand).set_link(dir2, rotate_single(parent, last));
                    }
                    // Recolor the rebuilt window: current and the new top
                    // red, the top's children black.
                    let top = (*grand).link(dir2);
                    (*q).red = true;
                    (*top).red = true;
                    (*(*top).left).red = false;
                    (*(*top).right).red = false;
                }
            }

            let mut displaced = None;
            if !found.is_null() {
                displaced = Some(&*(*found).item);
                (*found).item = (*q).item;
                let child = if (*q).left.is_null() {
                    (*q).right
                } else {
                    (*q).left
                };
                (*parent).set_link(usize::from((*parent).right == q), child);
                RbNode::release(q);
            }

            self.root = (*hd).right;
            if !self.root.is_null() {
                (*self.root).red = false;
            }
            displaced
        }
    }

    pub fn remove_min(&mut self) -> Option<&'a T> {
        let key = self.min()?;
        self.remove(key)
    }

    pub fn remove_max(&mut self) -> Option<&'a T> {
        let key = self.max()?;
        self.remove(key)
    }

    /// Free every node in O(n) time and O(1) space; `hook` runs on each
    /// payload as its node dies.
    pub fn remove_all(&mut self, hook: Option<&mut dyn FnMut(&'a T)>) {
        unsafe {
            let root = self.root;
            self.root = ptr::null_mut();
            dispose_rb(root, hook);
        }
    }

    /// Fresh-node copy sharing payload references, rebuilt through the
    /// monotone fast path (O(log n) per element).
    pub fn copy(&self) -> Self {
        let mut out = Self::new(self.cmp.clone());
        let mut cursor = InorderCursor::new(self.root);
        unsafe {
            loop {
                let node = cursor.next();
                if node.is_null() {
                    break;
                }
                out.insert_max((*node).item_ref());
            }
        }
        out
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

    /// Merge both operands' threaded traversals, emitting through
    /// [`RbTree::insert_max`]: O(max(|a| + |b|, |out| log |out|)).
    fn combine(&self, other: &Self, op: SetOp) -> Self {
        if ptr::eq(self, other) {
            return match op {
                SetOp::Union | SetOp::Intersection => self.copy(),
                SetOp::Difference | SetOp::SymmetricDifference => Self::new(self.cmp.clone()),
            };
        }
        let mut out = Self::new(self.cmp.clone());
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
            |item| {
                out.insert_max(item);
            },
        );
        out
    }

    /// Full structural validator: symmetric order, black root, no red-red
    /// edge, uniform black height. Test-facing.
    pub fn is_valid(&self) -> bool {
        unsafe {
            !is_red(self.root)
                && rb_ordered(self.root, None, None, &self.cmp)
                && black_height(self.root).is_some()
        }
    }
}

impl<'a, T, C> Drop for RbTree<'a, T, C> {
    fn drop(&mut self) {
        unsafe {
            dispose_rb(self.root, None);
        }
    }
}

impl<'a, T, C> fmt::Debug for RbTree<'a, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbTree")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
