//! Immutable two-dimensional range index.
//!
//! A nested range tree: the outer tree splits the distinct longitudes at
//! their median, recursively, and every outer node carries an inner tree
//! over the latitudes of exactly the items it covers. Box queries answer in
//! `O(log²N + k)`; building is a one-time `O(N log N)` sort-and-split, and
//! the tree is rebuilt wholesale whenever the underlying item set changes.

#[doc(hidden)]
pub mod tree;
#[cfg(test)]
mod test;

#[doc(inline)]
pub use tree::RangeTree;
