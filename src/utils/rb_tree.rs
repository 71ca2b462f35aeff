use alloc::{boxed::Box, vec, vec::Vec};
use core::cmp::Ordering;

use num_traits::float::FloatCore;
use ordered_float::OrderedFloat;

/// Red-Black node colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

/// A tree node. Equal values share one node and bump `count`.
#[derive(Debug, Clone, Copy)]
struct Node<T> {
    /// Key, totally ordered (NaN sorts last)
    value: OrderedFloat<T>,
    /// Multiplicity of `value`
    count: usize,
    parent: usize,
    left: usize,
    right: usize,
    color: Color,
    /// Number of stored values in this subtree, duplicates included
    size: usize,
}

/// Order-statistics Red-Black multiset over a fixed node pool.
///
/// Every node carries the size of its subtree, which turns rank-by-value and
/// value-by-rank into single root-to-leaf walks. Nodes live in a slice
/// allocated once at construction and are recycled through a free list; the
/// last slot is the black sentinel `nil` that stands in for every missing
/// child and for the parent of the root.
///
/// Insertion, removal, rank and k-th queries are all O(log n).
#[derive(Debug, Clone)]
pub struct RbTree<T> {
    /// Node pool, `capacity + 1` slots with the sentinel last
    nodes: Box<[Node<T>]>,
    /// Stack of unused pool slots
    free: Vec<usize>,
    /// Root slot, `nil` when empty
    root: usize,
    /// Sentinel slot
    nil: usize,
    /// Number of distinct values
    distinct: usize,
    /// Number of values, duplicates included
    total: usize,
}

impl<T: FloatCore> RbTree<T> {
    /// Creates a tree able to hold `capacity` distinct values
    ///
    /// # Panics
    ///
    /// If `capacity` is zero or too large to index
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than zero");
        assert!(
            capacity < usize::MAX / 2,
            "capacity too large - risk of index overflow"
        );

        let nil = capacity;
        let vacant = Node {
            value: OrderedFloat(T::zero()),
            count: 0,
            parent: nil,
            left: nil,
            right: nil,
            color: Color::Black,
            size: 0,
        };

        Self {
            nodes: vec![vacant; capacity + 1].into_boxed_slice(),
            free: (0..capacity).rev().collect(),
            root: nil,
            nil,
            distinct: 0,
            total: 0,
        }
    }

    /// Number of distinct values
    #[inline]
    pub const fn len(&self) -> usize {
        self.distinct
    }

    /// Number of values, duplicates included
    #[inline]
    pub const fn total_count(&self) -> usize {
        self.total
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.nil
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Empties the tree, keeping the node pool
    pub fn reset(&mut self) {
        let nil = self.nil;
        self.nodes[nil].parent = nil;
        self.free.clear();
        self.free.extend((0..nil).rev());
        self.root = nil;
        self.distinct = 0;
        self.total = 0;
    }

    /// Inserts one occurrence of `value`
    ///
    /// # Returns
    ///
    /// * `Option<usize>` - The slot now holding `value`, or `None` if a new
    ///   distinct value does not fit in the pool
    pub fn insert(&mut self, value: T) -> Option<usize> {
        let key = OrderedFloat(value);
        let mut parent = self.nil;
        let mut current = self.root;

        while current != self.nil {
            parent = current;
            let node = self.nodes[current];
            current = match key.cmp(&node.value) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => {
                    self.nodes[current].count += 1;
                    self.total += 1;
                    self.adjust_sizes_to_root(current, true);
                    self.debug_verify();
                    return Some(current);
                }
            };
        }

        let slot = self.free.pop()?;
        self.nodes[slot] = Node {
            value: key,
            count: 1,
            parent,
            left: self.nil,
            right: self.nil,
            color: Color::Red,
            size: 1,
        };

        if parent == self.nil {
            self.root = slot;
        } else if key < self.nodes[parent].value {
            self.nodes[parent].left = slot;
        } else {
            self.nodes[parent].right = slot;
        }

        self.distinct += 1;
        self.total += 1;
        self.adjust_sizes_to_root(parent, true);
        self.fix_after_insert(slot);
        self.debug_verify();

        Some(slot)
    }

    /// Removes one occurrence of `value`
    ///
    /// # Returns
    ///
    /// * `bool` - True if `value` was present
    pub fn remove(&mut self, value: T) -> bool {
        let Some(slot) = self.find(value) else {
            return false;
        };

        if self.nodes[slot].count > 1 {
            self.nodes[slot].count -= 1;
            self.total -= 1;
            self.adjust_sizes_to_root(slot, false);
        } else {
            self.delete_node(slot);
            self.free.push(slot);
            self.distinct -= 1;
            self.total -= 1;
        }

        self.debug_verify();
        true
    }

    /// Number of stored values `<= value`
    pub fn count_le(&self, value: T) -> usize {
        let key = OrderedFloat(value);
        let mut rank = 0;
        let mut current = self.root;
        while current != self.nil {
            let node = self.nodes[current];
            if key < node.value {
                current = node.left;
            } else {
                rank += self.nodes[node.left].size + node.count;
                current = node.right;
            }
        }
        rank
    }

    /// Number of stored values `< value`
    pub fn count_lt(&self, value: T) -> usize {
        let key = OrderedFloat(value);
        let mut rank = 0;
        let mut current = self.root;
        while current != self.nil {
            let node = self.nodes[current];
            if key <= node.value {
                current = node.left;
            } else {
                rank += self.nodes[node.left].size + node.count;
                current = node.right;
            }
        }
        rank
    }

    /// Zero-based `k`-th smallest value, duplicates counted individually
    pub fn kth(&self, k: usize) -> Option<T> {
        if k >= self.total {
            return None;
        }

        let mut remaining = k;
        let mut current = self.root;
        while current != self.nil {
            let node = self.nodes[current];
            let left = self.nodes[node.left].size;
            if remaining < left {
                current = node.left;
            } else if remaining < left + node.count {
                return Some(node.value.into_inner());
            } else {
                remaining -= left + node.count;
                current = node.right;
            }
        }
        None
    }

    pub fn min(&self) -> Option<T> {
        (self.root != self.nil).then(|| self.nodes[self.minimum(self.root)].value.into_inner())
    }

    pub fn max(&self) -> Option<T> {
        (self.root != self.nil).then(|| self.nodes[self.maximum(self.root)].value.into_inner())
    }

    fn find(&self, value: T) -> Option<usize> {
        let key = OrderedFloat(value);
        let mut current = self.root;
        while current != self.nil {
            let node = self.nodes[current];
            current = match key.cmp(&node.value) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(current),
            };
        }
        None
    }

    fn minimum(&self, mut node: usize) -> usize {
        while self.nodes[node].left != self.nil {
            node = self.nodes[node].left;
        }
        node
    }

    fn maximum(&self, mut node: usize) -> usize {
        while self.nodes[node].right != self.nil {
            node = self.nodes[node].right;
        }
        node
    }

    /// Adds or subtracts one from every subtree size on the path to the root
    fn adjust_sizes_to_root(&mut self, mut node: usize, grow: bool) {
        while node != self.nil {
            let n = &mut self.nodes[node];
            if grow {
                n.size += 1;
            } else {
                n.size -= 1;
            }
            node = n.parent;
        }
    }

    /// Recomputes subtree sizes from children on the path to the root
    fn recount_to_root(&mut self, mut node: usize) {
        while node != self.nil {
            self.recount(node);
            node = self.nodes[node].parent;
        }
    }

    #[inline]
    fn recount(&mut self, node: usize) {
        let n = self.nodes[node];
        self.nodes[node].size = self.nodes[n.left].size + self.nodes[n.right].size + n.count;
    }

    #[inline]
    fn color(&self, node: usize) -> Color {
        self.nodes[node].color
    }

    #[inline]
    fn set_color(&mut self, node: usize, color: Color) {
        if node != self.nil {
            self.nodes[node].color = color;
        }
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right;
        let y_left = self.nodes[y].left;

        self.nodes[x].right = y_left;
        if y_left != self.nil {
            self.nodes[y_left].parent = x;
        }

        let x_parent = self.nodes[x].parent;
        self.nodes[y].parent = x_parent;
        if x_parent == self.nil {
            self.root = y;
        } else if x == self.nodes[x_parent].left {
            self.nodes[x_parent].left = y;
        } else {
            self.nodes[x_parent].right = y;
        }

        self.nodes[y].left = x;
        self.nodes[x].parent = y;

        self.nodes[y].size = self.nodes[x].size;
        self.recount(x);
    }

    fn rotate_right(&mut self, y: usize) {
        let x = self.nodes[y].left;
        let x_right = self.nodes[x].right;

        self.nodes[y].left = x_right;
        if x_right != self.nil {
            self.nodes[x_right].parent = y;
        }

        let y_parent = self.nodes[y].parent;
        self.nodes[x].parent = y_parent;
        if y_parent == self.nil {
            self.root = x;
        } else if y == self.nodes[y_parent].left {
            self.nodes[y_parent].left = x;
        } else {
            self.nodes[y_parent].right = x;
        }

        self.nodes[x].right = y;
        self.nodes[y].parent = x;

        self.nodes[x].size = self.nodes[y].size;
        self.recount(y);
    }

    fn fix_after_insert(&mut self, mut node: usize) {
        while self.color(self.nodes[node].parent) == Color::Red {
            let parent = self.nodes[node].parent;
            let grandparent = self.nodes[parent].parent;

            if parent == self.nodes[grandparent].left {
                let uncle = self.nodes[grandparent].right;
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.nodes[parent].right {
                        node = parent;
                        self.rotate_left(node);
                    }
                    let parent = self.nodes[node].parent;
                    let grandparent = self.nodes[parent].parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.nodes[grandparent].left;
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.nodes[parent].left {
                        node = parent;
                        self.rotate_right(node);
                    }
                    let parent = self.nodes[node].parent;
                    let grandparent = self.nodes[parent].parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }
        self.set_color(self.root, Color::Black);
    }

    /// Replaces the subtree rooted at `old` with the one rooted at `new`.
    /// The sentinel's parent is written too, the delete fixup relies on it.
    fn transplant(&mut self, old: usize, new: usize) {
        let parent = self.nodes[old].parent;
        if parent == self.nil {
            self.root = new;
        } else if old == self.nodes[parent].left {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
        self.nodes[new].parent = parent;
    }

    fn delete_node(&mut self, z: usize) {
        let z_left = self.nodes[z].left;
        let z_right = self.nodes[z].right;
        let mut removed_color = self.color(z);
        let x;

        if z_left == self.nil {
            x = z_right;
            self.transplant(z, z_right);
        } else if z_right == self.nil {
            x = z_left;
            self.transplant(z, z_left);
        } else {
            let y = self.minimum(z_right);
            removed_color = self.color(y);
            x = self.nodes[y].right;

            if self.nodes[y].parent == z {
                self.nodes[x].parent = y;
            } else {
                self.transplant(y, x);
                self.nodes[y].right = z_right;
                self.nodes[z_right].parent = y;
            }

            self.transplant(z, y);
            self.nodes[y].left = z_left;
            self.nodes[z_left].parent = y;
            self.nodes[y].color = self.nodes[z].color;
        }

        // Everything whose subtree changed sits on the path from x's parent up.
        self.recount_to_root(self.nodes[x].parent);

        if removed_color == Color::Black {
            self.fix_after_delete(x);
        }
    }

    fn fix_after_delete(&mut self, mut x: usize) {
        while x != self.root && self.color(x) == Color::Black {
            let parent = self.nodes[x].parent;

            if x == self.nodes[parent].left {
                let mut sibling = self.nodes[parent].right;
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.nodes[self.nodes[x].parent].right;
                }

                let s_left = self.nodes[sibling].left;
                let s_right = self.nodes[sibling].right;
                if self.color(s_left) == Color::Black && self.color(s_right) == Color::Black {
                    self.set_color(sibling, Color::Red);
                    x = self.nodes[x].parent;
                } else {
                    if self.color(s_right) == Color::Black {
                        self.set_color(s_left, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.nodes[self.nodes[x].parent].right;
                    }
                    let parent = self.nodes[x].parent;
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(self.nodes[sibling].right, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut sibling = self.nodes[parent].left;
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.nodes[self.nodes[x].parent].left;
                }

                let s_left = self.nodes[sibling].left;
                let s_right = self.nodes[sibling].right;
                if self.color(s_left) == Color::Black && self.color(s_right) == Color::Black {
                    self.set_color(sibling, Color::Red);
                    x = self.nodes[x].parent;
                } else {
                    if self.color(s_left) == Color::Black {
                        self.set_color(s_right, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.nodes[self.nodes[x].parent].left;
                    }
                    let parent = self.nodes[x].parent;
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(self.nodes[sibling].left, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    #[inline]
    fn debug_verify(&self) {
        #[cfg(debug_assertions)]
        debug_assert!(
            self.verify_invariants(),
            "red-black tree invariants violated"
        );
    }

    /// Root is black, no red node has a red child, every path has the same
    /// black height and every cached subtree size is exact.
    #[cfg(debug_assertions)]
    fn verify_invariants(&self) -> bool {
        if self.root == self.nil {
            return self.total == 0 && self.distinct == 0;
        }
        self.color(self.root) == Color::Black
            && self.nodes[self.root].parent == self.nil
            && self.verify_subtree(self.root).is_some_and(|(_, size, distinct)| {
                size == self.total && distinct == self.distinct
            })
    }

    /// Returns (black height, size, distinct) of a valid subtree
    #[cfg(debug_assertions)]
    fn verify_subtree(&self, node: usize) -> Option<(usize, usize, usize)> {
        if node == self.nil {
            return Some((1, 0, 0));
        }

        let n = self.nodes[node];
        if n.color == Color::Red
            && (self.color(n.left) == Color::Red || self.color(n.right) == Color::Red)
        {
            return None;
        }
        if n.left != self.nil
            && (self.nodes[n.left].parent != node || self.nodes[n.left].value >= n.value)
        {
            return None;
        }
        if n.right != self.nil
            && (self.nodes[n.right].parent != node || self.nodes[n.right].value <= n.value)
        {
            return None;
        }

        let (left_height, left_size, left_distinct) = self.verify_subtree(n.left)?;
        let (right_height, right_size, right_distinct) = self.verify_subtree(n.right)?;
        let size = left_size + right_size + n.count;
        if left_height != right_height || n.count == 0 || n.size != size {
            return None;
        }

        let height = left_height + usize::from(n.color == Color::Black);
        Some((height, size, left_distinct + right_distinct + 1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random stream
    fn lcg(seed: &mut u64) -> u64 {
        *seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *seed >> 33
    }

    #[test]
    fn test_creation() {
        let tree = RbTree::<f64>::new(10);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.total_count(), 0);
        assert_eq!(tree.capacity(), 10);
        assert!(tree.is_empty());
        assert!(tree.min().is_none());
        assert!(tree.max().is_none());
        assert!(tree.kth(0).is_none());
        assert_eq!(tree.count_le(1.0), 0);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than zero")]
    fn test_zero_capacity() {
        RbTree::<f64>::new(0);
    }

    #[test]
    fn test_large_capacity_rejected() {
        assert!(std::panic::catch_unwind(|| RbTree::<f64>::new(usize::MAX)).is_err());
    }

    #[test]
    fn test_basic_insert_remove() {
        let mut tree = RbTree::<f64>::new(5);
        for v in [5.0, 3.0, 7.0, 1.0, 9.0] {
            assert!(tree.insert(v).is_some());
        }
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.min(), Some(1.0));
        assert_eq!(tree.max(), Some(9.0));

        assert!(tree.remove(3.0));
        assert!(tree.remove(1.0));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.min(), Some(5.0));
        assert!(!tree.remove(100.0));
        assert_eq!(tree.total_count(), 3);
    }

    #[test]
    fn test_duplicates_share_node() {
        let mut tree = RbTree::<f64>::new(1);
        assert!(tree.insert(42.0).is_some());
        assert!(tree.insert(42.0).is_some());
        assert!(tree.insert(43.0).is_none());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.total_count(), 2);
        assert_eq!(tree.count_le(42.0), 2);
        assert_eq!(tree.count_lt(42.0), 0);

        assert!(tree.remove(42.0));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.total_count(), 1);
        assert!(tree.remove(42.0));
        assert!(tree.is_empty());
        assert!(tree.insert(43.0).is_some());
    }

    #[test]
    fn test_kth_and_ranks() {
        let mut tree = RbTree::<f64>::new(10);
        for v in [1.0, 2.0, 2.0, 2.0, 5.0] {
            tree.insert(v).unwrap();
        }
        let sorted: Vec<_> = (0..5).map(|k| tree.kth(k).unwrap()).collect();
        assert_eq!(sorted, vec![1.0, 2.0, 2.0, 2.0, 5.0]);
        assert!(tree.kth(5).is_none());

        assert_eq!(tree.count_le(0.0), 0);
        assert_eq!(tree.count_le(1.0), 1);
        assert_eq!(tree.count_le(2.0), 4);
        assert_eq!(tree.count_le(4.9), 4);
        assert_eq!(tree.count_le(5.0), 5);
        assert_eq!(tree.count_lt(2.0), 1);
        assert_eq!(tree.count_lt(5.0), 4);
        assert_eq!(tree.count_lt(6.0), 5);
    }

    #[test]
    fn test_pool_is_recycled() {
        let mut tree = RbTree::<f64>::new(3);
        for round in 0..10 {
            let base = (round * 3) as f64;
            for i in 0..3 {
                tree.insert(base + i as f64).unwrap();
            }
            assert!(tree.insert(base + 10.0).is_none());
            for i in 0..3 {
                assert!(tree.remove(base + i as f64));
            }
            assert!(tree.is_empty());
        }
    }

    #[test]
    fn test_reset() {
        let mut tree = RbTree::<f64>::new(10);
        for i in 1..=10 {
            tree.insert(i as f64).unwrap();
        }
        tree.reset();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.min().is_none());
        for i in 1..=10 {
            tree.insert(-(i as f64)).unwrap();
        }
        assert_eq!(tree.min(), Some(-10.0));
        assert_eq!(tree.kth(4), Some(-6.0));
    }

    #[test]
    fn test_sequential_and_reverse_insertions() {
        let mut tree = RbTree::<f64>::new(64);
        for i in 0..64 {
            tree.insert(i as f64).unwrap();
        }
        for i in 0..32 {
            assert!(tree.remove(i as f64));
        }
        assert_eq!(tree.min(), Some(32.0));
        assert_eq!(tree.max(), Some(63.0));

        tree.reset();
        for i in (0..64).rev() {
            tree.insert(i as f64).unwrap();
        }
        for i in (0..64).step_by(2) {
            assert!(tree.remove(i as f64));
        }
        assert_eq!(tree.total_count(), 32);
        assert_eq!(tree.kth(0), Some(1.0));
        assert_eq!(tree.kth(31), Some(63.0));
    }

    #[test]
    fn test_special_values() {
        let mut tree = RbTree::<f64>::new(10);
        tree.insert(1.0).unwrap();
        tree.insert(f64::INFINITY).unwrap();
        tree.insert(f64::NEG_INFINITY).unwrap();
        tree.insert(f64::NAN).unwrap();
        tree.insert(f64::NAN).unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.min(), Some(f64::NEG_INFINITY));
        assert!(tree.max().unwrap().is_nan());
        assert_eq!(tree.count_le(f64::INFINITY), 3);
        assert!(tree.remove(f64::NAN));
        assert_eq!(tree.total_count(), 4);
    }

    #[test]
    fn test_random_workload_matches_sorted_vec() {
        let mut seed = 7;
        let mut tree = RbTree::<f64>::new(40);
        let mut reference: Vec<f64> = Vec::new();

        for _ in 0..4000 {
            let value = (lcg(&mut seed) % 25) as f64;
            let delete = lcg(&mut seed) % 3 == 0 && !reference.is_empty();
            if delete {
                let victim = reference[(lcg(&mut seed) as usize) % reference.len()];
                assert!(tree.remove(victim));
                let at = reference.iter().position(|&v| v == victim).unwrap();
                reference.remove(at);
            } else if reference.len() < 40 {
                tree.insert(value).unwrap();
                reference.push(value);
            }

            reference.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(tree.total_count(), reference.len());
            let query = (lcg(&mut seed) % 27) as f64 - 1.0;
            let expected = reference.iter().filter(|&&v| v <= query).count();
            assert_eq!(tree.count_le(query), expected);
            if !reference.is_empty() {
                let k = (lcg(&mut seed) as usize) % reference.len();
                assert_eq!(tree.kth(k), Some(reference[k]));
            }
        }
    }
}
