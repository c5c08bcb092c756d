use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{Handle, RawBPlusTree};

/// An iterator over the keys of a `BPlusTree` in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`BPlusTree`].
/// See its documentation for more.
///
/// [`iter`]: super::BPlusTree::iter
/// [`BPlusTree`]: super::BPlusTree
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K> {
    tree: &'a RawBPlusTree<K>,
    front_leaf: Option<Handle>,
    front_index: usize,
    back_leaf: Option<Handle>,
    back_index: usize,
    remaining: usize,
}

impl<'a, K> Iter<'a, K> {
    pub(super) fn new(tree: &'a RawBPlusTree<K>) -> Self {
        let back_leaf = tree.last_leaf();
        Iter {
            tree,
            front_leaf: Some(tree.first_leaf()),
            front_index: 0,
            back_leaf: Some(back_leaf),
            back_index: tree.node(back_leaf).key_count().saturating_sub(1),
            remaining: tree.len(),
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        if self.remaining == 0 {
            return None;
        }

        let leaf = self.tree.node(self.front_leaf?).as_leaf();
        let key = leaf.key(self.front_index);

        self.remaining -= 1;
        self.front_index += 1;

        // Move to next leaf if needed
        if self.front_index >= leaf.key_count() {
            self.front_leaf = leaf.next();
            self.front_index = 0;
        }

        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K> DoubleEndedIterator for Iter<'a, K> {
    fn next_back(&mut self) -> Option<&'a K> {
        if self.remaining == 0 {
            return None;
        }

        let leaf = self.tree.node(self.back_leaf?).as_leaf();
        let key = leaf.key(self.back_index);

        self.remaining -= 1;

        // Move to previous element/leaf
        if self.back_index == 0 {
            self.back_leaf = leaf.prev();
            if let Some(prev) = self.back_leaf {
                self.back_index = self.tree.node(prev).key_count().saturating_sub(1);
            }
        } else {
            self.back_index -= 1;
        }

        Some(key)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K> FusedIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front_leaf: self.front_leaf,
            front_index: self.front_index,
            back_leaf: self.back_leaf,
            back_index: self.back_index,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Iter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the key slices of the leaves of a `BPlusTree`.
///
/// This `struct` is created by the [`leaves`] method on [`BPlusTree`].
///
/// [`leaves`]: super::BPlusTree::leaves
/// [`BPlusTree`]: super::BPlusTree
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Leaves<'a, K> {
    tree: &'a RawBPlusTree<K>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<'a, K> Leaves<'a, K> {
    pub(super) fn new(tree: &'a RawBPlusTree<K>) -> Self {
        Leaves {
            tree,
            front: Some(tree.first_leaf()),
            back: Some(tree.last_leaf()),
            remaining: tree.leaf_count(),
        }
    }
}

impl<'a, K> Iterator for Leaves<'a, K> {
    type Item = &'a [K];

    fn next(&mut self) -> Option<&'a [K]> {
        if self.remaining == 0 {
            return None;
        }
        let leaf = self.tree.node(self.front?).as_leaf();
        self.remaining -= 1;
        self.front = leaf.next();
        Some(leaf.keys())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K> DoubleEndedIterator for Leaves<'a, K> {
    fn next_back(&mut self) -> Option<&'a [K]> {
        if self.remaining == 0 {
            return None;
        }
        let leaf = self.tree.node(self.back?).as_leaf();
        self.remaining -= 1;
        self.back = leaf.prev();
        Some(leaf.keys())
    }
}

impl<K> ExactSizeIterator for Leaves<'_, K> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K> FusedIterator for Leaves<'_, K> {}

impl<K> Clone for Leaves<'_, K> {
    fn clone(&self) -> Self {
        Leaves {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Leaves<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
