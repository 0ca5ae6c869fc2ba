//! Threaded (Morris-style) in-order traversal.
//!
//! The cursor yields every node of a binary search tree in ascending order
//! in O(1) auxiliary space: while descending into a left subtree it threads
//! the subtree's rightmost right link back to the current node, and the walk
//! unthreads that link when it passes back through. A fully consumed cursor
//! leaves the tree's topology exactly as it found it; between calls the only
//! deviations from the pristine tree are the still-threaded links.

use core::ptr;

use crate::node::{BinaryNode, Node};

/// In-order walk over any [`BinaryNode`] tree.
pub struct InorderCursor<N> {
    cur: *mut N,
}

impl<N: BinaryNode> InorderCursor<N> {
    pub fn new(root: *mut N) -> Self {
        Self { cur: root }
    }

    /// Advance to the next node in ascending order; null once exhausted.
    ///
    /// # Safety
    /// The cursor must have been created from the root of a valid tree, and
    /// the tree must not be mutated through any other path while the cursor
    /// is live.
    pub unsafe fn next(&mut self) -> *mut N {
        while !self.cur.is_null() {
            let cur = self.cur;
            let left = (*cur).left();
            if left.is_null() {
                self.cur = (*cur).right();
                return cur;
            }
            // Rightmost node of the left subtree; an existing thread back to
            // `cur` is the collision that ends the scan.
            let mut pred = left;
            while !(*pred).right().is_null() && (*pred).right() != cur {
                pred = (*pred).right();
            }
            if (*pred).right().is_null() {
                (*pred).set_right(cur);
                self.cur = left;
            } else {
                (*pred).set_right(ptr::null_mut());
                self.cur = (*cur).right();
                return cur;
            }
        }
        ptr::null_mut()
    }

    /// Run the walk to exhaustion.
    ///
    /// A caller that stops consuming early must drain, or threaded right
    /// links stay behind in the tree.
    ///
    /// # Safety
    /// As for [`InorderCursor::next`].
    pub unsafe fn drain(&mut self) {
        while !self.next().is_null() {}
    }
}

/// Clone a tree's payload sequence into a fresh right-spine tree, sharing
/// payload references and allocating one node per element.
///
/// # Safety
/// `root` must be the root of a valid tree (or null), not otherwise mutated
/// during the call.
pub unsafe fn clone_as_right_spine<'a, T>(root: *mut Node<'a, T>) -> *mut Node<'a, T> {
    let mut cursor = InorderCursor::new(root);
    let mut head: *mut Node<'a, T> = ptr::null_mut();
    let mut tail: *mut Node<'a, T> = ptr::null_mut();
    loop {
        let node = cursor.next();
        if node.is_null() {
            break;
        }
        let fresh = Node::alloc((*node).item_ref());
        if tail.is_null() {
            head = fresh;
        } else {
            (*tail).right = fresh;
        }
        tail = fresh;
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::dispose_tree;

    // 4(2(1,3),6(5,7)) built by hand; returns (root, nodes).
    fn sample_tree(keys: &[u32; 7]) -> Vec<*mut Node<'_, u32>> {
        let mut nodes: Vec<*mut Node<'_, u32>> = keys.iter().map(Node::alloc).collect();
        unsafe {
            (*nodes[0]).left = nodes[1];
            (*nodes[0]).right = nodes[2];
            (*nodes[1]).left = nodes[3];
            (*nodes[1]).right = nodes[4];
            (*nodes[2]).left = nodes[5];
            (*nodes[2]).right = nodes[6];
        }
        nodes
    }

    #[test]
    fn visits_in_ascending_order_and_restores_links() {
        let keys = [4u32, 2, 6, 1, 3, 5, 7];
        let nodes = sample_tree(&keys);
        unsafe {
            let mut cursor = InorderCursor::new(nodes[0]);
            let mut seen = Vec::new();
            loop {
                let n = cursor.next();
                if n.is_null() {
                    break;
                }
                seen.push(*(*n).item_ref());
            }
            assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);

            // Topology must be pristine after exhaustion.
            assert_eq!((*nodes[0]).left, nodes[1]);
            assert_eq!((*nodes[0]).right, nodes[2]);
            assert_eq!((*nodes[1]).left, nodes[3]);
            assert_eq!((*nodes[1]).right, nodes[4]);
            assert!((*nodes[3]).right.is_null(), "thread must be undone");
            assert!((*nodes[4]).right.is_null(), "thread must be undone");

            dispose_tree(nodes[0], None);
        }
    }

    #[test]
    fn drain_unthreads_after_partial_walk() {
        let keys = [4u32, 2, 6, 1, 3, 5, 7];
        let nodes = sample_tree(&keys);
        unsafe {
            let mut cursor = InorderCursor::new(nodes[0]);
            // Stop mid-walk, while 1 -> 2 and 3 -> 4 threading is in play.
            cursor.next();
            cursor.next();
            cursor.drain();
            assert!((*nodes[3]).right.is_null());
            assert!((*nodes[4]).right.is_null());
            dispose_tree(nodes[0], None);
        }
    }

    #[test]
    fn degenerate_shapes_walk_in_order() {
        let keys = [1u32, 2, 3, 4, 5];
        unsafe {
            // Right spine.
            let mut spine: *mut Node<'_, u32> = ptr::null_mut();
            for key in keys.iter().rev() {
                let node = Node::alloc(key);
                (*node).right = spine;
                spine = node;
            }
            let mut cursor = InorderCursor::new(spine);
            let mut seen = Vec::new();
            loop {
                let n = cursor.next();
                if n.is_null() {
                    break;
                }
                seen.push(*(*n).item_ref());
            }
            assert_eq!(seen, vec![1, 2, 3, 4, 5]);
            dispose_tree(spine, None);

            // Left spine.
            let mut spine: *mut Node<'_, u32> = ptr::null_mut();
            for key in &keys {
                let node = Node::alloc(key);
                (*node).left = spine;
                spine = node;
            }
            let mut cursor = InorderCursor::new(spine);
            let mut seen = Vec::new();
            loop {
                let n = cursor.next();
                if n.is_null() {
                    break;
                }
                seen.push(*(*n).item_ref());
            }
            assert_eq!(seen, vec![1, 2, 3, 4, 5]);
            dispose_tree(spine, None);
        }
    }

    #[test]
    fn empty_cursor_is_exhausted() {
        unsafe {
            let mut cursor = InorderCursor::<Node<'_, u32>>::new(ptr::null_mut());
            assert!(cursor.next().is_null());
            cursor.drain();
            assert!(clone_as_right_spine::<u32>(ptr::null_mut()).is_null());
        }
    }

    #[test]
    fn spine_clone_shares_payloads() {
        let keys = [4u32, 2, 6, 1, 3, 5, 7];
        let nodes = sample_tree(&keys);
        unsafe {
            let clone = clone_as_right_spine(nodes[0]);
            let mut n = clone;
            let mut seen = Vec::new();
            while !n.is_null() {
                assert!((*n).left.is_null(), "clone must be a right spine");
                seen.push(*(*n).item_ref());
                n = (*n).right;
            }
            assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
            // Shared payloads: the clone's first item is the original 1.
            assert!(ptr::eq((*clone).item_ref(), (*nodes[3]).item_ref()));
            dispose_tree(clone, None);
            dispose_tree(nodes[0], None);
        }
    }
}
