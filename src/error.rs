use thiserror::Error;

/// Errors reported while configuring a [`BPlusTree`](crate::BPlusTree).
///
/// Insertion itself never fails; the only recoverable failure is an invalid
/// node capacity at construction time.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// The requested order cannot hold a split node.
    #[error("invalid order {order}: a node must hold at least {min} keys")]
    InvalidOrder {
        /// The rejected order.
        order: usize,
        /// The smallest accepted order.
        min: usize,
    },
}

/// Convenient alias for results returned by this crate.
pub type Result<T> = core::result::Result<T, Error>;
