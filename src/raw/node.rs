use smallvec::SmallVec;

use super::handle::Handle;
use crate::order::Order;

// Keys kept inline before a node spills to the heap. Orders up to this size
// never allocate per node.
pub(crate) const INLINE_KEYS: usize = 8;

pub(crate) type Keys<K> = SmallVec<[K; INLINE_KEYS + 1]>;
pub(crate) type Children = SmallVec<[Handle; INLINE_KEYS + 2]>;

#[allow(private_interfaces)]
pub(crate) enum Node<K> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K>),
}

// B+Tree: Internal nodes store separator keys and child handles.
pub(crate) struct InternalNode<K> {
    parent: Option<Handle>,
    // Every key in children[i] <= keys[i] <= every key in children[i + 1].
    keys: Keys<K>,
    children: Children,
}

// B+Tree: Leaf nodes store the data keys and the leaf chain links.
pub(crate) struct LeafNode<K> {
    parent: Option<Handle>,
    prev: Option<Handle>,
    next: Option<Handle>,
    keys: Keys<K>,
}

impl<K> Node<K> {
    /// Creates a new empty leaf node.
    pub(crate) fn new_leaf() -> Self {
        Node::Leaf(LeafNode::new())
    }

    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode<K> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the internal node, panicking if this is not internal.
    pub(crate) fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    /// Returns the internal node mutably, panicking if this is not internal.
    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    /// Returns the keys of this node, separators for internal nodes.
    pub(crate) fn keys(&self) -> &[K] {
        match self {
            Node::Internal(internal) => internal.keys(),
            Node::Leaf(leaf) => leaf.keys(),
        }
    }

    /// Returns the number of keys in this node.
    pub(crate) fn key_count(&self) -> usize {
        self.keys().len()
    }

    /// Returns the enclosing internal node, `None` for the root.
    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Internal(internal) => internal.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Internal(internal) => internal.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }
}

impl<K> InternalNode<K> {
    /// Creates an internal node with a single separator between two children.
    pub(crate) fn with_children(left: Handle, separator: K, right: Handle) -> Self {
        let mut keys = Keys::new();
        keys.push(separator);
        let mut children = Children::new();
        children.push(left);
        children.push(right);
        Self {
            parent: None,
            keys,
            children,
        }
    }

    /// Returns the number of keys in this node.
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns the number of children in this node.
    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns all keys.
    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Returns the child handle at the given index.
    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    /// Returns all children.
    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Returns the index of the child whose range holds `key`.
    ///
    /// A key equal to a separator belongs to the right-hand child, which is
    /// where a leaf split leaves the separator's own copy.
    #[inline]
    pub(crate) fn search_child(&self, key: &K) -> usize
    where
        K: Ord,
    {
        self.keys.partition_point(|separator| separator <= key)
    }

    /// Records a split of `children[index]`: `separator` goes to `keys[index]`
    /// and the new sibling directly after the split child.
    pub(crate) fn insert_child(&mut self, index: usize, separator: K, child: Handle) {
        self.keys.insert(index, separator);
        self.children.insert(index + 1, child);
    }

    /// Splits an overfull node. Returns (`separator`, `new_node`).
    ///
    /// The key at the split point is moved up to the parent rather than
    /// copied, so both halves keep `children == keys + 1`. The caller owns
    /// reparenting the children that moved to `new_node`.
    pub(crate) fn split(&mut self, order: Order) -> (K, InternalNode<K>) {
        debug_assert_eq!(self.keys.len(), order.get() + 1, "split of a node that is not overfull");
        let mid = order.split_point();

        let keys: Keys<K> = self.keys.drain(mid + 1..).collect();
        let children: Children = self.children.drain(mid + 1..).collect();
        let separator = self.keys.pop().expect("overfull node has a key at the split point");

        let right = InternalNode {
            parent: self.parent,
            keys,
            children,
        };
        (separator, right)
    }
}

impl<K> LeafNode<K> {
    /// Creates a new empty leaf node.
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            prev: None,
            next: None,
            keys: Keys::new(),
        }
    }

    /// Returns the number of keys in this node.
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns the previous leaf handle.
    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    /// Sets the previous leaf handle.
    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    /// Returns the next leaf handle.
    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    /// Sets the next leaf handle.
    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    /// Returns the key at the given index.
    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    /// Returns all keys.
    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Inserts `key` after every key that is not greater than it, so equal
    /// keys keep their insertion order. Returns the position used.
    pub(crate) fn insert(&mut self, key: K) -> usize
    where
        K: Ord,
    {
        let index = self.keys.partition_point(|existing| existing <= &key);
        self.keys.insert(index, key);
        index
    }

    /// Splits an overfull leaf. Returns (`separator`, `new_node`).
    ///
    /// The new node takes the upper half and the separator is a copy of its
    /// first key. Chain links are left to the caller, which knows the handles.
    pub(crate) fn split(&mut self, order: Order) -> (K, LeafNode<K>)
    where
        K: Clone,
    {
        debug_assert_eq!(self.keys.len(), order.get() + 1, "split of a leaf that is not overfull");
        let mid = order.split_point();

        let mut right = LeafNode::new();
        right.parent = self.parent;
        right.keys = self.keys.drain(mid..).collect();

        let separator = right.keys[0].clone();
        (separator, right)
    }
}
