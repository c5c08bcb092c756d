use core::fmt;

use tracing::info;

use crate::error::Result;
use crate::order::Order;
use crate::raw::RawBPlusTree;

mod capacity;
mod iter;

pub use iter::{Iter, Leaves};

/// An in-memory B+ tree index over ordered keys.
///
/// Keys live only in the leaves, which are doubly linked in ascending order
/// so the whole index can be scanned in either direction without walking
/// back through the internal nodes. Internal nodes hold separator keys that
/// route an insertion to the leaf covering its range.
///
/// Every node holds at most [`order`](BPlusTree::order) keys. An insertion
/// that overfills a leaf splits it, and the split propagates upward as far as
/// it needs to; when the root itself splits a new root is placed above it, so
/// all leaves always stay at the same depth.
///
/// Equal keys are all kept, in the order they were inserted.
///
/// Lookup and removal are not provided: the tree only grows.
///
/// # Examples
///
/// ```
/// use bplus_tree::BPlusTree;
///
/// let mut tree = BPlusTree::new(5).unwrap();
/// for key in 1..=21 {
///     tree.insert(key);
/// }
///
/// assert_eq!(tree.len(), 21);
/// assert!(tree.height() > 1);
/// assert!(tree.iter().copied().eq(1..=21));
/// ```
pub struct BPlusTree<K> {
    raw: RawBPlusTree<K>,
}

impl<K> BPlusTree<K> {
    /// Creates an empty tree whose nodes hold at most `order` keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`](crate::Error::InvalidOrder) if `order`
    /// is below [`Order::MIN`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::{BPlusTree, Error};
    ///
    /// let tree: BPlusTree<i32> = BPlusTree::new(4).unwrap();
    /// assert!(tree.is_empty());
    ///
    /// assert_eq!(
    ///     BPlusTree::<i32>::new(1).err(),
    ///     Some(Error::InvalidOrder { order: 1, min: 2 })
    /// );
    /// ```
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self::with_order(Order::new(order)?))
    }

    /// Creates an empty tree from an already validated [`Order`].
    #[must_use]
    pub fn with_order(order: Order) -> Self {
        BPlusTree {
            raw: RawBPlusTree::new(order),
        }
    }

    /// Returns the maximum number of keys a node holds.
    #[must_use]
    pub fn order(&self) -> Order {
        self.raw.order()
    }

    /// Returns the number of keys in the tree, duplicates included.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3).unwrap();
    /// tree.insert(1);
    /// tree.insert(1);
    /// assert_eq!(tree.len(), 2);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the number of levels, counting the root and the leaves.
    ///
    /// A tree whose root is still a leaf has height 1. The height only grows,
    /// and by at most one level per insertion.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the number of nodes in the tree, internal and leaf.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.raw.node_count()
    }

    /// Returns the number of leaves on the leaf chain.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.raw.leaf_count()
    }

    /// Removes every key, leaving a single empty leaf. The order is kept.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the smallest key, the first one inserted among equals.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(2).unwrap();
    /// assert_eq!(tree.first(), None);
    /// tree.extend([5, 3, 8, 1]);
    /// assert_eq!(tree.first(), Some(&1));
    /// assert_eq!(tree.last(), Some(&8));
    /// ```
    #[must_use]
    pub fn first(&self) -> Option<&K> {
        self.raw.node(self.raw.first_leaf()).keys().first()
    }

    /// Returns the largest key, the last one inserted among equals.
    #[must_use]
    pub fn last(&self) -> Option<&K> {
        self.raw.node(self.raw.last_leaf()).keys().last()
    }

    /// Gets an iterator over the keys in ascending order.
    ///
    /// The iterator follows the leaf chain and can be driven from both ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(2).unwrap();
    /// tree.extend([3, 1, 2]);
    ///
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next_back(), Some(&3));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(&self.raw)
    }

    /// Gets an iterator over the key slice of every leaf, in chain order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(2).unwrap();
    /// tree.extend([5, 3, 8, 1]);
    ///
    /// let leaves: Vec<&[i32]> = tree.leaves().collect();
    /// assert_eq!(leaves, [&[1, 3][..], &[5, 8][..]]);
    /// ```
    pub fn leaves(&self) -> Leaves<'_, K> {
        Leaves::new(&self.raw)
    }

    /// Writes a depth-first, pre-order dump of the tree.
    ///
    /// Each node is one line holding its keys separated by spaces, indented
    /// two spaces per level below the root. The format is meant for people,
    /// not for parsing. [`Display`](fmt::Display) produces the same text.
    ///
    /// # Errors
    ///
    /// Returns any error reported by `out`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(2).unwrap();
    /// tree.extend([5, 3, 8]);
    ///
    /// let mut dump = String::new();
    /// tree.write_tree(&mut dump).unwrap();
    /// assert_eq!(dump, "5\n  3\n  5 8\n");
    /// ```
    pub fn write_tree<W>(&self, out: &mut W) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
        K: fmt::Display,
    {
        self.raw.write_tree(out)
    }

    /// Emits the tree dump as an `INFO` event on the `bplus_tree` target.
    ///
    /// Nothing is printed unless a `tracing` subscriber is installed.
    pub fn print(&self)
    where
        K: fmt::Display,
    {
        info!(
            target: "bplus_tree",
            order = self.raw.order().get(),
            len = self.raw.len(),
            height = self.raw.height(),
            "tree dump:\n{}",
            self
        );
    }
}

impl<K: Clone + Ord> BPlusTree<K> {
    /// Inserts a key.
    ///
    /// A key equal to keys already present is placed after them. Insertion
    /// never fails; it allocates at most one node per level of the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(2).unwrap();
    /// tree.insert(5);
    /// tree.insert(3);
    /// assert_eq!(tree.height(), 1);
    ///
    /// // Third key overfills the order-2 root leaf.
    /// tree.insert(8);
    /// assert_eq!(tree.height(), 2);
    /// assert_eq!(tree.leaf_count(), 2);
    /// ```
    pub fn insert(&mut self, key: K) {
        self.raw.insert(key);
    }
}

impl<K> Default for BPlusTree<K> {
    /// Creates an empty tree with the [default order](Order::default).
    fn default() -> Self {
        BPlusTree::with_order(Order::default())
    }
}

impl<K: Clone + Ord> Extend<K> for BPlusTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K: Copy + Ord + 'a> Extend<&'a K> for BPlusTree<K> {
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        for &key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K> IntoIterator for &'a BPlusTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K: fmt::Debug> fmt::Debug for BPlusTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display> fmt::Display for BPlusTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f)
    }
}
