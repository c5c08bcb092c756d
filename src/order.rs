use core::fmt;

use crate::error::{Error, Result};

/// The maximum number of keys a node may hold before it splits.
///
/// The order is fixed when a [`BPlusTree`](crate::BPlusTree) is built and is
/// shared by every node of that tree. A node that reaches `order + 1` keys is
/// split before the insertion that overfilled it returns.
///
/// # Examples
///
/// ```
/// use bplus_tree::Order;
///
/// let order = Order::new(5).unwrap();
/// assert_eq!(order.get(), 5);
///
/// assert!(Order::new(1).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Order(usize);

impl Order {
    /// The smallest supported order.
    ///
    /// With fewer than two keys per node an internal split would leave one
    /// half without a separator.
    pub const MIN: usize = 2;

    /// Validates `order` as a node capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order` is below [`Order::MIN`].
    pub const fn new(order: usize) -> Result<Self> {
        if order < Self::MIN {
            return Err(Error::InvalidOrder { order, min: Self::MIN });
        }
        Ok(Self(order))
    }

    /// Returns the order as a key count.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Index at which an overfull node (`order + 1` keys) is cut in two.
    ///
    /// The left half keeps `[0, mid)`, so it is never larger than the right.
    pub(crate) const fn split_point(self) -> usize {
        (self.0 + 1) / 2
    }
}

impl Default for Order {
    /// An order of 5.
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<usize> for Order {
    type Error = Error;

    fn try_from(order: usize) -> Result<Self> {
        Self::new(order)
    }
}

impl From<Order> for usize {
    fn from(order: Order) -> Self {
        order.0
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
