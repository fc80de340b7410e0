//! # balanced-map
//!
//! Ordered key-value maps backed by height-balanced search trees.
//!
//! ## Overview
//!
//! Two representations of the same abstract 2-3 tree are provided. Both
//! guarantee O(log N) lookup and insertion and share one invariant set:
//!
//! - **[`RedBlackMap`](tree::RedBlackMap)**: a left-leaning red-black tree, the
//!   binary encoding of a 2-3 tree where a 3-node is two binary nodes joined by
//!   a red edge that always leans left.
//! - **[`TwoThreeMap`](tree::TwoThreeMap)**: a direct 2-3 tree whose nodes hold
//!   one or two entries.
//!
//! Both implement the [`BalancedMap`](tree::BalancedMap) contract.
//!
//! ## Feature Flags
//!
//! - `red-black`: the left-leaning red-black tree (default)
//! - `two-three`: the 2-3 tree (default)
//! - `tracing`: emit `trace`-level events on tree growth
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use balanced_map::prelude::*;
//!
//! let mut map = TwoThreeMap::new();
//! map.insert(2, "two");
//! map.insert(1, "one");
//!
//! assert_eq!(map.get(&1), Some(&"one"));
//! assert!(map.is_balanced());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use balanced_map::prelude::*;
/// ```
pub mod prelude {
    pub use crate::tree::*;
}

pub mod tree;
