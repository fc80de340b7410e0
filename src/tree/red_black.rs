//! Ordered map based on a left-leaning red-black tree.
//!
//! This module provides [`RedBlackMap`], a mutable ordered map stored as the
//! binary encoding of a 2-3 tree.
//!
//! # Overview
//!
//! Every node records the color of the edge from its parent. A red edge glues
//! a node to its parent into one 3-node of the underlying 2-3 tree, and red
//! edges always lean left.
//!
//! - O(log N) get
//! - O(log N) insert
//! - O(1) len and `is_empty`
//!
//! # Examples
//!
//! ```rust
//! use balanced_map::tree::RedBlackMap;
//!
//! let mut map = RedBlackMap::new();
//! map.insert(3, "three");
//! map.insert(1, "one");
//! map.insert(2, "two");
//!
//! assert_eq!(map.get(&2), Some(&"two"));
//! assert_eq!(format!("{map}"), "{1: one, 2: two, 3: three}");
//! ```
//!
//! # Internal Structure
//!
//! The tree maintains the following invariants:
//! 1. Red edges lean left
//! 2. No path has two red edges in a row
//! 3. Every path from the root to a null link crosses the same number of
//!    black nodes
//! 4. The root is black
//!
//! Together they bound the height by 2 log2(N + 1).

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

use super::{BalancedMap, InvariantViolation};

// =============================================================================
// Color Definition
// =============================================================================

/// The color of the edge leading into a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

// =============================================================================
// Node Definition
// =============================================================================

type Link<K, V> = Option<Box<Node<K, V>>>;

/// Internal node structure for the red-black tree.
#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Creates a new red node with no children.
    const fn new_red(key: K, value: V) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
        }
    }

    fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    /// Promotes the right child into this node's position.
    ///
    /// The promoted child takes over this node's color and this node hangs
    /// below it as a red left child.
    fn rotate_left(mut self: Box<Self>) -> Box<Self> {
        debug_assert!(is_red(&self.right));
        let Some(mut right) = self.right.take() else {
            return self;
        };
        self.right = right.left.take();
        right.color = self.color;
        self.color = Color::Red;
        right.left = Some(self);
        right
    }

    /// Mirror of [`rotate_left`](Self::rotate_left).
    fn rotate_right(mut self: Box<Self>) -> Box<Self> {
        debug_assert!(is_red(&self.left));
        let Some(mut left) = self.left.take() else {
            return self;
        };
        self.left = left.right.take();
        left.color = self.color;
        self.color = Color::Red;
        left.right = Some(self);
        left
    }

    /// Splits a temporary 4-node by passing the red edge up to the parent.
    fn flip_colors(&mut self) {
        self.color = Color::Red;
        if let Some(left) = self.left.as_mut() {
            left.color = Color::Black;
        }
        if let Some(right) = self.right.as_mut() {
            right.color = Color::Black;
        }
    }

    /// Restores the local invariants after an insertion below this node.
    fn balance(mut self: Box<Self>) -> Box<Self> {
        if !is_red(&self.left) && is_red(&self.right) {
            self = self.rotate_left();
        }

        if is_red(&self.left) && self.left.as_ref().is_some_and(|left| is_red(&left.left)) {
            self = self.rotate_right();
        }

        if is_red(&self.left) && is_red(&self.right) {
            self.flip_colors();
        }

        self
    }
}

/// Helper function to check if an optional node is red.
fn is_red<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|node| node.is_red())
}

// =============================================================================
// RedBlackMap Definition
// =============================================================================

/// An ordered map based on a left-leaning red-black tree.
///
/// Keys must implement `Ord`. Inserting a key that is already present
/// replaces its value and returns the previous one.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `new`          | O(1)       |
/// | `get`          | O(log N)   |
/// | `insert`       | O(log N)   |
/// | `contains_key` | O(log N)   |
/// | `len`          | O(1)       |
/// | `validate`     | O(N)       |
///
/// # Examples
///
/// ```rust
/// use balanced_map::tree::RedBlackMap;
///
/// let mut map = RedBlackMap::new();
/// for key in 0..1024 {
///     map.insert(key, key * 2);
/// }
///
/// assert_eq!(map.get(&512), Some(&1024));
/// assert!(map.height() <= 20);
/// assert!(map.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct RedBlackMap<K, V> {
    /// Root node of the tree
    root: Link<K, V>,
    /// Number of entries
    length: usize,
}

static_assertions::assert_impl_all!(RedBlackMap<i32, String>: Send, Sync, Clone, Default);

impl<K, V> RedBlackMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<i32, String> = RedBlackMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<i32, i32> = (1..=7).map(|key| (key, key)).collect();
    /// assert_eq!(map.height(), 3);
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        Self::height_of(self.root.as_deref())
    }

    fn height_of(node: Option<&Node<K, V>>) -> usize {
        node.map_or(0, |node_ref| {
            1 + Self::height_of(node_ref.left.as_deref())
                .max(Self::height_of(node_ref.right.as_deref()))
        })
    }

    /// Returns the number of black nodes on the leftmost root-to-leaf path.
    ///
    /// In a valid tree every root-to-leaf path has this many black nodes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<i32, i32> = (1..=3).map(|key| (key, key)).collect();
    /// assert_eq!(map.black_height(), 2);
    /// ```
    #[must_use]
    pub fn black_height(&self) -> usize {
        let mut black_height = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            if !node.is_red() {
                black_height += 1;
            }
            current = node.left.as_deref();
        }
        black_height
    }

    /// Collects all entries in sorted order (in-order traversal).
    fn collect_entries_in_order<'a>(
        node: Option<&'a Node<K, V>>,
        entries: &mut Vec<(&'a K, &'a V)>,
    ) {
        if let Some(node_ref) = node {
            Self::collect_entries_in_order(node_ref.left.as_deref(), entries);
            entries.push((&node_ref.key, &node_ref.value));
            Self::collect_entries_in_order(node_ref.right.as_deref(), entries);
        }
    }

    fn entries(&self) -> Vec<(&K, &V)> {
        let mut entries = Vec::with_capacity(self.length);
        Self::collect_entries_in_order(self.root.as_deref(), &mut entries);
        entries
    }
}

impl<K: Ord, V> RedBlackMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form must match the ordering on the key type.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert("hello".to_string(), 42);
    ///
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::get_from_node(self.root.as_deref(), key)
    }

    fn get_from_node<'a, Q>(node: Option<&'a Node<K, V>>, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| match key.cmp(node_ref.key.borrow()) {
            Ordering::Less => Self::get_from_node(node_ref.left.as_deref(), key),
            Ordering::Greater => Self::get_from_node(node_ref.right.as_deref(), key),
            Ordering::Equal => Some(&node_ref.value),
        })
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains the key, the value is replaced and the
    /// old value is returned. The tree shape and the length are unchanged
    /// in that case.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// assert_eq!(map.insert(1, "one"), None);
    /// assert_eq!(map.insert(1, "ONE"), Some("one"));
    /// assert_eq!(map.get(&1), Some(&"ONE"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (mut root, replaced) = Self::insert_into_node(self.root.take(), key, value);

        if root.is_red() {
            root.color = Color::Black;
            self.root = Some(root);
            #[cfg(feature = "tracing")]
            tracing::trace!(
                black_height = self.black_height(),
                length = self.length + 1,
                "red-black tree black height grew"
            );
        } else {
            self.root = Some(root);
        }

        if replaced.is_none() {
            self.length += 1;
        }

        debug_assert!(!is_red(&self.root));
        replaced
    }

    /// Recursive helper for insert.
    /// Returns the rebalanced subtree and the replaced value, if any.
    fn insert_into_node(node: Link<K, V>, key: K, value: V) -> (Box<Node<K, V>>, Option<V>) {
        let Some(mut node) = node else {
            return (Box::new(Node::new_red(key, value)), None);
        };

        let replaced = match key.cmp(&node.key) {
            Ordering::Less => {
                let (new_left, replaced) = Self::insert_into_node(node.left.take(), key, value);
                node.left = Some(new_left);
                replaced
            }
            Ordering::Greater => {
                let (new_right, replaced) = Self::insert_into_node(node.right.take(), key, value);
                node.right = Some(new_right);
                replaced
            }
            Ordering::Equal => Some(mem::replace(&mut node.value, value)),
        };

        (node.balance(), replaced)
    }

    /// Checks every red-black invariant and the recorded length.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found in a depth-first,
    /// left-to-right walk.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<char, i32> = "SEARCHXMPL".chars().map(|key| (key, 1)).collect();
    /// assert_eq!(map.validate(), Ok(()));
    /// ```
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if is_red(&self.root) {
            return Err(InvariantViolation::RedRoot);
        }

        let mut walk = ValidationWalk {
            black_height: None,
            counted: 0,
        };
        walk.visit(self.root.as_deref(), 1, 0, None, None)?;

        if walk.counted == self.length {
            Ok(())
        } else {
            Err(InvariantViolation::LengthMismatch {
                recorded: self.length,
                counted: walk.counted,
            })
        }
    }

    /// Returns `true` if every red-black invariant holds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<i32, i32> = (0..100).rev().map(|key| (key, key)).collect();
    /// assert!(map.is_balanced());
    /// ```
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.validate().is_ok()
    }
}

/// State carried through [`RedBlackMap::validate`].
struct ValidationWalk {
    black_height: Option<usize>,
    counted: usize,
}

impl ValidationWalk {
    fn visit<K: Ord, V>(
        &mut self,
        node: Option<&Node<K, V>>,
        depth: usize,
        blacks_above: usize,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> Result<(), InvariantViolation> {
        let Some(node) = node else {
            return match self.black_height {
                None => {
                    self.black_height = Some(blacks_above);
                    Ok(())
                }
                Some(expected) if expected == blacks_above => Ok(()),
                Some(expected) => Err(InvariantViolation::BlackHeightMismatch {
                    expected,
                    found: blacks_above,
                }),
            };
        };

        if lower.is_some_and(|lower| node.key <= *lower)
            || upper.is_some_and(|upper| node.key >= *upper)
        {
            return Err(InvariantViolation::KeyOrder { depth });
        }
        if is_red(&node.right) {
            return Err(InvariantViolation::RightLeaningRed { depth });
        }
        if node.is_red() && is_red(&node.left) {
            return Err(InvariantViolation::ConsecutiveRed { depth });
        }

        self.counted += 1;
        let blacks = blacks_above + usize::from(!node.is_red());
        self.visit(node.left.as_deref(), depth + 1, blacks, lower, Some(&node.key))?;
        self.visit(node.right.as_deref(), depth + 1, blacks, Some(&node.key), upper)
    }
}

// =============================================================================
// BalancedMap Implementation
// =============================================================================

impl<K: Ord, V> BalancedMap<K, V> for RedBlackMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        Self::insert(self, key, value)
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::get(self, key)
    }

    fn len(&self) -> usize {
        self.length
    }

    fn height(&self) -> usize {
        Self::height(self)
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        Self::validate(self)
    }

    fn is_balanced(&self) -> bool {
        Self::is_balanced(self)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for RedBlackMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RedBlackMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for RedBlackMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RedBlackMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.entries()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for RedBlackMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self.entries() {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn black(key: i32, left: Link<i32, ()>, right: Link<i32, ()>) -> Link<i32, ()> {
        Some(Box::new(Node {
            key,
            value: (),
            color: Color::Black,
            left,
            right,
        }))
    }

    fn red(key: i32, left: Link<i32, ()>, right: Link<i32, ()>) -> Link<i32, ()> {
        Some(Box::new(Node {
            key,
            value: (),
            color: Color::Red,
            left,
            right,
        }))
    }

    fn shape(link: &Link<i32, ()>) -> String {
        link.as_ref().map_or_else(
            || ".".to_string(),
            |node| {
                let marker = if node.is_red() { "*" } else { "" };
                format!("({} {}{} {})", shape(&node.left), node.key, marker, shape(&node.right))
            },
        )
    }

    fn map_from(keys: &[char]) -> RedBlackMap<char, usize> {
        keys.iter().enumerate().map(|(index, &key)| (key, index)).collect()
    }

    // =========================================================================
    // Rotation and Color Flip Tests
    // =========================================================================

    #[rstest]
    fn test_rotate_left_promotes_right_child() {
        let node = black(1, black(0, None, None), red(3, black(2, None, None), black(4, None, None)));
        let rotated = node.map(Node::rotate_left);
        assert_eq!(shape(&rotated), "(((. 0 .) 1* (. 2 .)) 3 (. 4 .))");
    }

    #[rstest]
    fn test_rotate_right_promotes_left_child() {
        let node = black(3, red(1, black(0, None, None), black(2, None, None)), black(4, None, None));
        let rotated = node.map(Node::rotate_right);
        assert_eq!(shape(&rotated), "((. 0 .) 1 ((. 2 .) 3* (. 4 .)))");
    }

    #[rstest]
    fn test_rotation_keeps_red_parent_color() {
        let node = red(1, None, red(2, None, None));
        let rotated = node.map(Node::rotate_left);
        assert_eq!(shape(&rotated), "((. 1* .) 2* .)");
    }

    #[rstest]
    fn test_flip_colors_passes_red_upward() {
        let mut node = black(2, red(1, None, None), red(3, None, None));
        if let Some(node) = node.as_mut() {
            node.flip_colors();
        }
        assert_eq!(shape(&node), "((. 1 .) 2* (. 3 .))");
    }

    #[rstest]
    #[case::right_leaning(black(1, None, red(2, None, None)), "((. 1* .) 2 .)")]
    #[case::left_left_chain(black(3, red(2, red(1, None, None), None), None), "((. 1 .) 2* (. 3 .))")]
    #[case::already_balanced(black(2, red(1, None, None), None), "((. 1* .) 2 .)")]
    fn test_balance_single_step(#[case] node: Link<i32, ()>, #[case] expected: &str) {
        let balanced = node.map(Node::balance);
        assert_eq!(shape(&balanced), expected);
    }

    // =========================================================================
    // Insert Tests
    // =========================================================================

    #[rstest]
    fn test_insert_searchxmpl_shape() {
        let map = map_from(&['S', 'E', 'A', 'R', 'C', 'H', 'X', 'M', 'P', 'L']);

        assert_eq!(map.len(), 10);
        assert_eq!(map.height(), 4);
        assert_eq!(map.black_height(), 3);
        assert_eq!(map.root.as_ref().map(|root| root.key), Some('M'));
        assert_eq!(map.validate(), Ok(()));
    }

    #[rstest]
    #[case(&[1, 2], 2, 1)]
    #[case(&[2, 1], 2, 1)]
    #[case(&[1, 2, 3], 2, 2)]
    #[case(&[3, 2, 1], 2, 2)]
    fn test_small_insertions_root(
        #[case] keys: &[i32],
        #[case] root_key: i32,
        #[case] black_height: usize,
    ) {
        let map: RedBlackMap<i32, i32> = keys.iter().map(|&key| (key, key)).collect();
        assert_eq!(map.root.as_ref().map(|root| root.key), Some(root_key));
        assert_eq!(map.black_height(), black_height);
        assert!(!is_red(&map.root));
    }

    #[rstest]
    fn test_two_keys_form_left_leaning_three_node() {
        let map: RedBlackMap<i32, ()> = [(1, ()), (2, ())].into_iter().collect();
        assert_eq!(shape(&map.root), "((. 1* .) 2 .)");
    }

    #[rstest]
    fn test_root_is_black_after_every_insert() {
        let mut map = RedBlackMap::new();
        for key in 0..200 {
            map.insert(key, ());
            assert!(!is_red(&map.root), "root red after inserting {key}");
        }
    }

    #[rstest]
    fn test_reinsert_keeps_shape() {
        let mut map = map_from(&['S', 'E', 'A', 'R', 'C', 'H', 'X', 'M', 'P', 'L']);
        let before = map.clone();

        assert_eq!(map.insert('H', 99), Some(5));
        assert_eq!(map.get(&'H'), Some(&99));
        assert_eq!(map.len(), before.len());
        assert_eq!(map.height(), before.height());
        assert_eq!(format!("{:?}", map.root.as_ref().map(|root| root.key)), "Some('M')");
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[rstest]
    fn test_validate_detects_red_root() {
        let map = RedBlackMap {
            root: red(1, None, None),
            length: 1,
        };
        assert_eq!(map.validate(), Err(InvariantViolation::RedRoot));
    }

    #[rstest]
    fn test_validate_detects_right_leaning_red() {
        let map = RedBlackMap {
            root: black(1, None, red(2, None, None)),
            length: 2,
        };
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::RightLeaningRed { depth: 1 })
        );
    }

    #[rstest]
    fn test_validate_detects_consecutive_red() {
        let map = RedBlackMap {
            root: black(3, red(2, red(1, None, None), None), None),
            length: 3,
        };
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::ConsecutiveRed { depth: 2 })
        );
    }

    #[rstest]
    fn test_validate_detects_black_height_mismatch() {
        let map = RedBlackMap {
            root: black(2, black(1, None, None), None),
            length: 2,
        };
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::BlackHeightMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[rstest]
    fn test_validate_detects_key_order() {
        let map = RedBlackMap {
            root: black(1, black(2, None, None), black(3, None, None)),
            length: 3,
        };
        assert_eq!(map.validate(), Err(InvariantViolation::KeyOrder { depth: 2 }));
    }

    #[rstest]
    fn test_validate_detects_length_mismatch() {
        let map = RedBlackMap {
            root: black(1, None, None),
            length: 2,
        };
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::LengthMismatch {
                recorded: 2,
                counted: 1
            })
        );
    }

    // =========================================================================
    // Display Tests
    // =========================================================================

    #[rstest]
    fn test_display_empty() {
        let map: RedBlackMap<i32, String> = RedBlackMap::new();
        assert_eq!(format!("{map}"), "{}");
    }

    #[rstest]
    fn test_debug_sorted() {
        let map: RedBlackMap<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
        assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
    }
}
