use std::{error, fmt};

/// Error enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, PartialEq)]
pub enum Error<K>
where
    K: Clone + Ord,
{
    /// Returned by minimum() and maximum() APIs on an empty tree.
    EmptyTree,
    /// Handle is stale, or was minted by another tree instance.
    InvalidHandle,
    /// Arena could not grow to hold a new node. Tree is left unchanged.
    AllocFailed,
    /// Fatal case, root node is colored red.
    RedRoot,
    /// Fatal case, a red node has a red child.
    ConsecutiveReds,
    /// Fatal case, black-height differs between left and right subtrees.
    /// The String component of this variant can be used for debugging.
    UnbalancedBlacks(String),
    /// Fatal case, index entries are not in sort-order.
    SortError(K, K),
    /// Fatal case, parent link of a node does not point back to the node
    /// holding it as a child.
    BrokenLink(String),
    /// Fatal case, (counted, expected) number of live nodes disagree.
    CountMismatch(usize, usize),
}

impl<K> fmt::Display for Error<K>
where
    K: Clone + Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyTree => write!(f, "empty tree"),
            Error::InvalidHandle => write!(f, "invalid node handle"),
            Error::AllocFailed => write!(f, "node allocation failed"),
            Error::RedRoot => write!(f, "root node is red"),
            Error::ConsecutiveReds => write!(f, "consecutive red nodes"),
            Error::UnbalancedBlacks(msg) => write!(f, "unbalanced blacks {}", msg),
            Error::SortError(a, b) => write!(f, "sort error {:?} {:?}", a, b),
            Error::BrokenLink(msg) => write!(f, "broken link {}", msg),
            Error::CountMismatch(n, m) => write!(f, "count mismatch {} != {}", n, m),
        }
    }
}

impl<K> error::Error for Error<K> where K: Clone + Ord + fmt::Debug {}
