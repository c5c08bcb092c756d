use core::fmt;

use tracing::{debug, trace};

use super::arena::Arena;
use super::handle::Handle;
use super::node::{InternalNode, Node};
use crate::order::Order;

/// The core B+Tree implementation backing `BPlusTree`.
///
/// Every node lives in `nodes`; the tree owns the arena and therefore every
/// node. Child handles are the owning edges, while `parent`, `prev` and
/// `next` handles are plain back/side references.
pub(crate) struct RawBPlusTree<K> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K>>,
    /// Node capacity shared by every node.
    order: Order,
    /// Handle to the root node. An empty tree has an empty leaf root.
    root: Handle,
    /// Total number of keys stored in the leaves.
    len: usize,
    /// Number of levels, 1 while the root is a leaf.
    height: usize,
    /// Number of nodes on the leaf chain.
    leaf_count: usize,
    /// Handle to the first (leftmost) leaf, for forward iteration.
    first_leaf: Handle,
    /// Handle to the last (rightmost) leaf, for backward iteration.
    last_leaf: Handle,
}

/// A node split on its way up the tree.
pub(crate) struct Split<K> {
    /// Separator to insert into the parent, left of `sibling`.
    separator: K,
    /// Handle to the new right-hand node.
    sibling: Handle,
}

impl<K> RawBPlusTree<K> {
    /// Creates a tree holding a single empty leaf.
    pub(crate) fn new(order: Order) -> Self {
        Self::with_nodes(order, Arena::new())
    }

    /// Creates a tree with arena room for every node `capacity` keys can
    /// need, assuming each node is left at its post-split minimum.
    pub(crate) fn with_capacity(order: Order, capacity: usize) -> Self {
        let mid = order.split_point();
        let leaves = capacity.div_ceil(mid).max(1);
        let min_children = (order.get() - mid + 1).min(mid + 1);
        let internals = (leaves - 1).div_ceil(min_children - 1);
        Self::with_nodes(order, Arena::with_capacity(leaves + internals))
    }

    fn with_nodes(order: Order, mut nodes: Arena<Node<K>>) -> Self {
        let root = nodes.alloc(Node::new_leaf());
        Self {
            nodes,
            order,
            root,
            len: 0,
            height: 1,
            leaf_count: 1,
            first_leaf: root,
            last_leaf: root,
        }
    }

    /// Returns the node capacity.
    pub(crate) const fn order(&self) -> Order {
        self.order
    }

    /// Returns the number of keys in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of levels from the root down to the leaves.
    pub(crate) const fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of allocated nodes, internal and leaf.
    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of leaves on the leaf chain.
    pub(crate) const fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Returns the arena capacity in nodes.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Returns the root handle.
    pub(crate) fn root(&self) -> Handle {
        self.root
    }

    /// Returns the first (leftmost) leaf.
    pub(crate) fn first_leaf(&self) -> Handle {
        self.first_leaf
    }

    /// Returns the last (rightmost) leaf.
    pub(crate) fn last_leaf(&self) -> Handle {
        self.last_leaf
    }

    /// Returns a reference to a node by handle.
    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    /// Drops every node and starts over from a single empty leaf.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        let root = self.nodes.alloc(Node::new_leaf());
        self.root = root;
        self.len = 0;
        self.height = 1;
        self.leaf_count = 1;
        self.first_leaf = root;
        self.last_leaf = root;
    }

    /// Writes a depth-first, pre-order dump of the tree: one line per node,
    /// indented two spaces per level, keys separated by spaces.
    pub(crate) fn write_tree<W>(&self, out: &mut W) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
        K: fmt::Display,
    {
        self.write_node(self.root, 0, out)
    }

    fn write_node<W>(&self, handle: Handle, depth: usize, out: &mut W) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
        K: fmt::Display,
    {
        let node = self.nodes.get(handle);
        write!(out, "{:indent$}", "", indent = depth * 2)?;
        for (i, key) in node.keys().iter().enumerate() {
            if i > 0 {
                out.write_char(' ')?;
            }
            write!(out, "{key}")?;
        }
        out.write_char('\n')?;

        if let Node::Internal(internal) = node {
            for &child in internal.children() {
                self.write_node(child, depth + 1, out)?;
            }
        }
        Ok(())
    }
}

impl<K: Clone + Ord> RawBPlusTree<K> {
    /// Inserts a key. Equal keys are kept, after the ones already present.
    pub(crate) fn insert(&mut self, key: K) {
        let root = self.root;
        if let Some(split) = self.insert_into(root, key) {
            self.grow_root(split);
        }
        self.len += 1;
    }

    /// Inserts `key` into the subtree rooted at `handle`.
    ///
    /// Returns the split of `handle` itself when the insertion left it with
    /// more than `order` keys. At most one node is allocated per level.
    fn insert_into(&mut self, handle: Handle, key: K) -> Option<Split<K>> {
        let (index, child) = match self.nodes.get_mut(handle) {
            Node::Leaf(leaf) => {
                leaf.insert(key);
                if leaf.key_count() <= self.order.get() {
                    return None;
                }
                return Some(self.split_leaf(handle));
            }
            Node::Internal(internal) => {
                let index = internal.search_child(&key);
                (index, internal.child(index))
            }
        };

        let Split { separator, sibling } = self.insert_into(child, key)?;

        self.nodes.get_mut(sibling).set_parent(Some(handle));
        let internal = self.nodes.get_mut(handle).as_internal_mut();
        internal.insert_child(index, separator, sibling);
        if internal.key_count() <= self.order.get() {
            return None;
        }
        Some(self.split_internal(handle))
    }

    /// Splits an overfull leaf and links the new leaf in after it.
    fn split_leaf(&mut self, handle: Handle) -> Split<K> {
        let leaf = self.nodes.get_mut(handle).as_leaf_mut();
        let (separator, mut right) = leaf.split(self.order);
        let left_len = leaf.key_count();
        let old_next = leaf.next();

        right.set_prev(Some(handle));
        right.set_next(old_next);
        let right_len = right.key_count();
        let sibling = self.nodes.alloc(Node::Leaf(right));

        self.nodes.get_mut(handle).as_leaf_mut().set_next(Some(sibling));
        match old_next {
            Some(next) => self.nodes.get_mut(next).as_leaf_mut().set_prev(Some(sibling)),
            None => self.last_leaf = sibling,
        }
        self.leaf_count += 1;

        trace!(leaf = ?handle, ?sibling, left_len, right_len, "split leaf");
        Split { separator, sibling }
    }

    /// Splits an overfull internal node and reparents the moved children.
    fn split_internal(&mut self, handle: Handle) -> Split<K> {
        let internal = self.nodes.get_mut(handle).as_internal_mut();
        let (separator, right) = internal.split(self.order);
        let left_len = internal.key_count();
        let right_len = right.key_count();
        let moved = right.child_count();
        let sibling = self.nodes.alloc(Node::Internal(right));

        for i in 0..moved {
            let child = self.nodes.get(sibling).as_internal().child(i);
            self.nodes.get_mut(child).set_parent(Some(sibling));
        }

        trace!(node = ?handle, ?sibling, left_len, right_len, "split internal node");
        Split { separator, sibling }
    }

    /// Puts a new root above the old root and the sibling split off it.
    fn grow_root(&mut self, split: Split<K>) {
        let Split { separator, sibling } = split;
        let old_root = self.root;
        let new_root = self
            .nodes
            .alloc(Node::Internal(InternalNode::with_children(old_root, separator, sibling)));

        self.nodes.get_mut(old_root).set_parent(Some(new_root));
        self.nodes.get_mut(sibling).set_parent(Some(new_root));
        self.root = new_root;
        self.height += 1;

        debug!(root = ?new_root, height = self.height, "grew new root");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::manual_assert, clippy::uninlined_format_args, clippy::stable_sort_primitive)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cmp::Ordering;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    impl<K: Ord + Clone + fmt::Debug> RawBPlusTree<K> {
        /// Validates all B+Tree invariants. Panics with a descriptive message if any are violated.
        /// This is intended for use in tests to catch tree corruption.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();

            if self.nodes.get(self.root).parent().is_some() {
                errors.push("root has a parent".into());
            }

            // 1. Validate tree structure and collect all leaves
            let mut all_leaves: Vec<Handle> = Vec::new();
            let mut leaf_depth: Option<usize> = None;
            let mut visited = 0usize;
            self.validate_node(self.root, 1, &mut leaf_depth, &mut all_leaves, &mut visited, &mut errors);

            if leaf_depth != Some(self.height) {
                errors.push(alloc::format!("height mismatch: self.height={}, leaf depth={:?}", self.height, leaf_depth));
            }
            if visited != self.nodes.len() {
                errors.push(alloc::format!("unreachable nodes: visited {}, allocated {}", visited, self.nodes.len()));
            }
            if all_leaves.len() != self.leaf_count {
                errors.push(alloc::format!("leaf_count mismatch: stored={}, actual={}", self.leaf_count, all_leaves.len()));
            }

            // 2. Validate leaf chain matches collected leaves
            self.validate_leaf_chain(&all_leaves, &mut errors);

            // 3. Validate len matches actual count
            let actual_count: usize = all_leaves.iter().map(|&h| self.nodes.get(h).key_count()).sum();
            if self.len != actual_count {
                errors.push(alloc::format!("len mismatch: self.len={}, actual count={}", self.len, actual_count));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        /// Returns the (min, max) key of the subtree, `None` for an empty leaf.
        fn validate_node(
            &self,
            handle: Handle,
            depth: usize,
            leaf_depth: &mut Option<usize>,
            all_leaves: &mut Vec<Handle>,
            visited: &mut usize,
            errors: &mut Vec<String>,
        ) -> Option<(K, K)> {
            *visited += 1;
            let node = self.nodes.get(handle);
            let keys = node.keys();

            if keys.len() > self.order.get() {
                errors.push(alloc::format!("{:?} holds {} keys, order is {}", handle, keys.len(), self.order));
            }
            if keys.is_empty() && !(handle == self.root && self.len == 0) {
                errors.push(alloc::format!("{:?} is empty", handle));
            }
            if keys.windows(2).any(|pair| pair[0] > pair[1]) {
                errors.push(alloc::format!("{:?} keys not sorted: {:?}", handle, keys));
            }

            match node {
                Node::Leaf(_) => {
                    match *leaf_depth {
                        None => *leaf_depth = Some(depth),
                        Some(expected) if expected != depth => {
                            errors.push(alloc::format!(
                                "Leaf depth mismatch: expected {}, got {} at handle {:?}",
                                expected,
                                depth,
                                handle
                            ));
                        }
                        Some(_) => {}
                    }
                    all_leaves.push(handle);
                    Some((keys.first()?.clone(), keys.last()?.clone()))
                }
                Node::Internal(internal) => {
                    if internal.child_count() != internal.key_count() + 1 {
                        errors.push(alloc::format!(
                            "{:?} has {} children for {} keys",
                            handle,
                            internal.child_count(),
                            internal.key_count()
                        ));
                    }

                    let mut bounds: Vec<Option<(K, K)>> = Vec::new();
                    for &child in internal.children() {
                        if self.nodes.get(child).parent() != Some(handle) {
                            errors.push(alloc::format!(
                                "{:?} parent is {:?}, expected {:?}",
                                child,
                                self.nodes.get(child).parent(),
                                handle
                            ));
                        }
                        bounds.push(self.validate_node(child, depth + 1, leaf_depth, all_leaves, visited, errors));
                    }

                    // children[i] <= keys[i] == min(children[i + 1])
                    for (i, separator) in internal.keys().iter().enumerate() {
                        if let Some(Some((_, left_max))) = bounds.get(i)
                            && left_max > separator
                        {
                            errors.push(alloc::format!(
                                "{:?} separator {} = {:?} below left max {:?}",
                                handle,
                                i,
                                separator,
                                left_max
                            ));
                        }
                        if let Some(Some((right_min, _))) = bounds.get(i + 1)
                            && right_min != separator
                        {
                            errors.push(alloc::format!(
                                "{:?} separator {} = {:?} differs from right min {:?}",
                                handle,
                                i,
                                separator,
                                right_min
                            ));
                        }
                    }

                    let min = bounds.first().cloned().flatten()?.0;
                    let max = bounds.last().cloned().flatten()?.1;
                    Some((min, max))
                }
            }
        }

        fn validate_leaf_chain(&self, all_leaves: &[Handle], errors: &mut Vec<String>) {
            if all_leaves.first() != Some(&self.first_leaf) {
                errors.push(alloc::format!("first_leaf mismatch: expected {:?}, got {:?}", all_leaves.first(), self.first_leaf));
            }
            if all_leaves.last() != Some(&self.last_leaf) {
                errors.push(alloc::format!("last_leaf mismatch: expected {:?}, got {:?}", all_leaves.last(), self.last_leaf));
            }

            for (i, &handle) in all_leaves.iter().enumerate() {
                let leaf = self.nodes.get(handle).as_leaf();
                let expected_next = all_leaves.get(i + 1).copied();
                let expected_prev = i.checked_sub(1).map(|p| all_leaves[p]);
                if leaf.next() != expected_next {
                    errors.push(alloc::format!(
                        "Leaf chain next mismatch at index {}: expected {:?}, got {:?}",
                        i,
                        expected_next,
                        leaf.next()
                    ));
                }
                if leaf.prev() != expected_prev {
                    errors.push(alloc::format!(
                        "Leaf chain prev mismatch at index {}: expected {:?}, got {:?}",
                        i,
                        expected_prev,
                        leaf.prev()
                    ));
                }
            }
        }

        /// Keys in leaf chain order.
        fn chain_keys(&self) -> Vec<K> {
            let mut keys = Vec::with_capacity(self.len);
            let mut current = Some(self.first_leaf);
            while let Some(handle) = current {
                let leaf = self.nodes.get(handle).as_leaf();
                keys.extend(leaf.keys().iter().cloned());
                current = leaf.next();
            }
            keys
        }

        /// Key slices of each leaf, in chain order.
        fn leaf_keys(&self) -> Vec<Vec<K>> {
            let mut leaves = Vec::new();
            let mut current = Some(self.first_leaf);
            while let Some(handle) = current {
                let leaf = self.nodes.get(handle).as_leaf();
                leaves.push(leaf.keys().to_vec());
                current = leaf.next();
            }
            leaves
        }
    }

    fn tree(order: usize) -> RawBPlusTree<i32> {
        RawBPlusTree::new(Order::new(order).unwrap())
    }

    fn dump(tree: &RawBPlusTree<i32>) -> String {
        let mut out = String::new();
        tree.write_tree(&mut out).unwrap();
        out
    }

    #[test]
    fn new_tree_is_a_single_empty_leaf() {
        let tree = tree(4);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.first_leaf(), tree.root());
        assert_eq!(tree.last_leaf(), tree.root());
        tree.validate_invariants();
    }

    #[test]
    fn order_two_first_split_on_third_insert() {
        let mut tree = tree(2);
        tree.insert(5);
        tree.insert(3);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.leaf_keys(), [[3, 5]]);

        tree.insert(8);
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.leaf_keys(), [alloc::vec![3], alloc::vec![5, 8]]);
        assert_eq!(tree.node(tree.root()).keys(), &[5]);

        tree.insert(1);
        tree.validate_invariants();
        assert_eq!(tree.leaf_keys(), [alloc::vec![1, 3], alloc::vec![5, 8]]);

        let first = tree.first_leaf();
        let last = tree.last_leaf();
        assert_ne!(first, last);
        assert_eq!(tree.node(first).as_leaf().next(), Some(last));
        assert_eq!(tree.node(last).as_leaf().prev(), Some(first));
        assert_eq!(tree.node(first).as_leaf().prev(), None);
        assert_eq!(tree.node(last).as_leaf().next(), None);
    }

    #[test]
    fn order_five_ascending_one_to_twenty_one() {
        let mut tree = tree(5);
        for key in 1..=21 {
            tree.insert(key);
            tree.validate_invariants();
        }
        assert_eq!(tree.chain_keys(), (1..=21).collect::<Vec<_>>());
        assert!(tree.height() > 1);
        assert!(matches!(tree.node(tree.root()), Node::Internal(_)));
    }

    #[test]
    fn order_five_ascending_dump() {
        let mut tree = tree(5);
        for key in 1..=21 {
            tree.insert(key);
        }
        // Ascending input leaves every left half at three keys.
        let expected = "\
13
  4 7 10
    1 2 3
    4 5 6
    7 8 9
    10 11 12
  16 19
    13 14 15
    16 17 18
    19 20 21
";
        assert_eq!(dump(&tree), expected);
    }

    #[test]
    fn middle_split_fixes_successor_back_link() {
        let mut tree = tree(2);
        for key in [10, 20, 30, 40] {
            tree.insert(key);
        }
        // Lands in the first leaf and splits it while a successor exists.
        tree.insert(11);
        tree.insert(12);
        tree.validate_invariants();
        assert_eq!(tree.chain_keys(), [10, 11, 12, 20, 30, 40]);
    }

    #[test]
    fn root_split_cascades_through_every_level() {
        let mut tree = tree(2);
        let mut heights = Vec::new();
        for key in 0..64 {
            let before = tree.height();
            tree.insert(key);
            assert!(tree.height() - before <= 1);
            heights.push(tree.height());
        }
        tree.validate_invariants();
        assert!(heights.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(tree.height() >= 4);
    }

    #[test]
    fn duplicates_are_kept_in_arrival_order() {
        #[derive(Clone, Debug)]
        struct Tagged {
            key: i32,
            seq: usize,
        }
        impl PartialEq for Tagged {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key
            }
        }
        impl Eq for Tagged {}
        impl PartialOrd for Tagged {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Tagged {
            fn cmp(&self, other: &Self) -> Ordering {
                self.key.cmp(&other.key)
            }
        }

        let mut tree = RawBPlusTree::new(Order::new(3).unwrap());
        for seq in 0..200 {
            let key = [7, 3, 7, 9, 7, 1][seq % 6];
            tree.insert(Tagged { key, seq });
        }
        tree.validate_invariants();

        let chain = tree.chain_keys();
        assert_eq!(chain.len(), 200);
        for pair in chain.windows(2) {
            assert!(pair[0].key <= pair[1].key);
            if pair[0].key == pair[1].key {
                assert!(pair[0].seq < pair[1].seq, "{:?} before {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn write_tree_is_read_only() {
        let mut tree = tree(3);
        for key in [9, 4, 1, 7, 3, 8, 2] {
            tree.insert(key);
        }
        let first = dump(&tree);
        let second = dump(&tree);
        assert_eq!(first, second);
        tree.validate_invariants();
    }

    #[test]
    fn clear_resets_to_empty_leaf() {
        let mut tree = tree(2);
        for key in 0..20 {
            tree.insert(key);
        }
        tree.clear();
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
        tree.validate_invariants();

        tree.insert(1);
        assert_eq!(tree.chain_keys(), [1]);
    }

    #[test]
    fn with_capacity_presizes_arena() {
        let tree: RawBPlusTree<i32> = RawBPlusTree::with_capacity(Order::new(4).unwrap(), 100);
        assert!(tree.capacity() >= 50);
        tree.validate_invariants();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn tree_invariants_maintained_after_inserts(
            order in 2usize..8,
            keys in prop::collection::vec(0i32..100, 0..400),
        ) {
            let mut tree = tree(order);
            for &key in &keys {
                let before = tree.height();
                tree.insert(key);
                prop_assert!(tree.height() == before || tree.height() == before + 1);
                tree.validate_invariants();
            }

            let mut expected = keys.clone();
            expected.sort();
            prop_assert_eq!(tree.chain_keys(), expected);
        }

        #[test]
        fn distinct_keys_give_strict_separators(
            order in 2usize..6,
            keys in prop::collection::btree_set(-1000i32..1000, 0..300),
        ) {
            let mut tree = tree(order);
            // Insert in a scrambled but deterministic order.
            let mut keys: Vec<i32> = keys.into_iter().collect();
            keys.sort_by_key(|k| (k.wrapping_mul(7919)) % 101);
            for &key in &keys {
                tree.insert(key);
            }
            tree.validate_invariants();

            let mut stack = alloc::vec![tree.root()];
            while let Some(handle) = stack.pop() {
                let node = tree.node(handle);
                prop_assert!(node.keys().windows(2).all(|pair| pair[0] < pair[1]));
                if let Node::Internal(internal) = node {
                    stack.extend_from_slice(internal.children());
                }
            }
        }
    }
}
