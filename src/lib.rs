//! Package implement an in-memory ordered index using a classic
//! red-black tree, with guaranteed O(log n) insert, lookup and erase.
//!
//! ```
//! use rbtree_index::RbTree;
//!
//! let mut tree: RbTree<i64> = RbTree::new("example");
//! for key in [5, 4, 6, 3, 2, 1, 0].iter() {
//!     tree.insert(*key).unwrap();
//! }
//! let handle = tree.find(&3).unwrap();
//! assert_eq!(tree.erase(handle), Ok(3));
//! assert_eq!(tree.to_vec(), vec![0, 1, 2, 4, 5, 6]);
//! ```

mod depth;
mod error;
mod iter;
mod rbtree;

pub use crate::depth::Depth;
pub use crate::error::Error;
pub use crate::iter::{Iter, Range};
pub use crate::rbtree::{Color, Handle, RbTree, Stats};

#[cfg(test)]
mod rbtree_test;
