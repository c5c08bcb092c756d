use super::BPlusTree;
use crate::error::Result;
use crate::order::Order;
use crate::raw::RawBPlusTree;

impl<K> BPlusTree<K> {
    /// Creates an empty tree with node room for at least `capacity` keys.
    ///
    /// The estimate assumes every leaf ends up half full, which is the worst
    /// case after splits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`](crate::Error::InvalidOrder) if `order`
    /// is below [`Order::MIN`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_tree::BPlusTree;
    ///
    /// let tree: BPlusTree<u64> = BPlusTree::with_capacity(8, 1_000).unwrap();
    /// assert!(tree.is_empty());
    /// assert!(tree.capacity() >= 1_000 / 4);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    pub fn with_capacity(order: usize, capacity: usize) -> Result<Self> {
        let order = Order::new(order)?;
        Ok(BPlusTree {
            raw: RawBPlusTree::with_capacity(order, capacity),
        })
    }

    /// Returns the number of nodes the tree can hold without reallocating.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
