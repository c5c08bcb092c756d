//! An in-memory B+ tree index for Rust.
//!
//! This crate provides [`BPlusTree`], an ordered multi-way search tree that
//! keeps every inserted key in its leaves and links the leaves into a doubly
//! linked chain, so the whole index can be scanned in order from either end
//! without revisiting internal nodes.
//!
//! # Example
//!
//! ```
//! use bplus_tree::BPlusTree;
//!
//! // Nodes hold at most five keys before they split.
//! let mut tree = BPlusTree::new(5).unwrap();
//! for key in [42, 7, 19, 7, 3] {
//!     tree.insert(key);
//! }
//!
//! // Duplicates are kept; the leaf chain is always sorted.
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [3, 7, 7, 19, 42]);
//!
//! // The sixth key overfills the root leaf, which splits under a new root.
//! tree.insert(1);
//! assert_eq!(tree.height(), 2);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Balanced by construction** - Splits only ever propagate upward, so all leaves share one depth
//! - **Linked leaves** - Forward and backward scans walk the leaf chain directly
//! - **Arena storage** - All nodes live in one arena owned by the tree; parent and sibling links are plain handles
//!
//! # Implementation
//!
//! Insertion descends to the leaf covering the key, inserts it there, and on
//! overflow splits the node in two. The new right-hand node and its separator
//! travel back up the recursion; each parent absorbs them and may split in
//! turn. When the root splits, a new root is created above both halves, which
//! is the only way the tree grows taller.
//!
//! Splits are reported as `tracing` events (`TRACE` for node splits, `DEBUG`
//! for root growth) and never print on their own.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order;
mod raw;

pub mod bplus_tree;

pub use bplus_tree::BPlusTree;
pub use error::{Error, Result};
pub use order::Order;
