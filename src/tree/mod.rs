//! Balanced ordered maps.
//!
//! This module provides two ordered maps that encode the same 2-3 tree
//! in different ways:
//!
//! - [`RedBlackMap`]: Left-leaning red-black tree (binary encoding)
//! - [`TwoThreeMap`]: 2-3 tree with 2-nodes and 3-nodes stored directly
//!
//! # Balancing
//!
//! Both maps rebalance locally on the way back up from an insertion. The
//! red-black tree rotates and flips colors; the 2-3 tree merges the new entry
//! into a leaf and splits any node that overflows into a 4-node. In both cases
//! the tree only grows at the root, so every leaf stays at the same depth
//! (black depth for the red-black tree).
//!
//! # Examples
//!
//! ## `RedBlackMap`
//!
//! ```rust
//! use balanced_map::tree::RedBlackMap;
//!
//! let mut map = RedBlackMap::new();
//! for key in ["S", "E", "A", "R", "C", "H", "X", "M", "P", "L"] {
//!     map.insert(key, 1);
//! }
//! assert_eq!(map.len(), 10);
//! assert!(map.is_balanced());
//! ```
//!
//! ## `TwoThreeMap`
//!
//! ```rust
//! use balanced_map::tree::TwoThreeMap;
//!
//! let map: TwoThreeMap<i32, i32> = (1..=100).map(|key| (key, key * 10)).collect();
//! assert_eq!(map.get(&42), Some(&420));
//! assert_eq!(map.get(&101), None);
//! assert!(map.is_balanced());
//! ```
//!
//! ## Re-insertion
//!
//! Inserting an existing key replaces its value and returns the old one.
//! The size of the map does not change.
//!
//! ```rust
//! use balanced_map::tree::TwoThreeMap;
//!
//! let mut map = TwoThreeMap::new();
//! assert_eq!(map.insert(24, 24), None);
//! assert_eq!(map.insert(24, 1), Some(24));
//! assert_eq!(map.get(&24), Some(&1));
//! assert_eq!(map.len(), 1);
//! ```

use std::borrow::Borrow;

mod error;
#[cfg(feature = "red-black")]
mod red_black;
#[cfg(feature = "two-three")]
mod two_three;

pub use error::InvariantViolation;
#[cfg(feature = "red-black")]
pub use red_black::RedBlackMap;
#[cfg(feature = "two-three")]
pub use two_three::TwoThreeMap;

// =============================================================================
// BalancedMap Contract
// =============================================================================

/// The contract shared by every balanced map in this crate.
///
/// Implementations are exclusively owned by one caller at a time: `insert`
/// takes `&mut self` and all reads take `&self`. Sharing a map across threads
/// requires an external lock.
///
/// # Examples
///
/// ```rust
/// use balanced_map::tree::{BalancedMap, RedBlackMap, TwoThreeMap};
///
/// fn fill<M: BalancedMap<u32, u32>>(map: &mut M) {
///     for key in 0..64 {
///         map.insert(key, key * 2);
///     }
/// }
///
/// let mut red_black = RedBlackMap::new();
/// let mut two_three = TwoThreeMap::new();
/// fill(&mut red_black);
/// fill(&mut two_three);
///
/// assert_eq!(red_black.get(&7), two_three.get(&7));
/// assert!(red_black.is_balanced() && two_three.is_balanced());
/// ```
pub trait BalancedMap<K: Ord, V> {
    /// Inserts a key-value pair.
    ///
    /// Returns the previous value if the key was already present; in that
    /// case only the value is replaced and the length is unchanged.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Returns a reference to the value corresponding to the key.
    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized;

    /// Returns the number of distinct keys in the map.
    fn len(&self) -> usize;

    /// Returns the number of node levels on the longest root-to-leaf path.
    fn height(&self) -> usize;

    /// Checks every structural invariant of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    fn validate(&self) -> Result<(), InvariantViolation>;

    /// Returns `true` if the map contains a value for the specified key.
    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns `true` if the map contains no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the tree is balanced.
    fn is_balanced(&self) -> bool;
}

// =============================================================================
// Tests
// =============================================================================
