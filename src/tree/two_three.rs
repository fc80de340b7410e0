//! Ordered map based on a 2-3 tree.
//!
//! This module provides [`TwoThreeMap`], a mutable ordered map whose nodes
//! hold one entry (2-node) or two entries (3-node) directly.
//!
//! # Overview
//!
//! - O(log N) get
//! - O(log N) insert
//! - O(1) len and `is_empty`
//!
//! New entries are merged into a leaf. A leaf that already holds two entries
//! overflows into a 4-node, which is split into a promoted entry over two
//! 2-nodes and handed to the parent. The parent absorbs the promoted entry and
//! may overflow in turn. Only the root can grow the tree, by becoming a new
//! 2-node above the two halves of its own split, so every leaf always sits at
//! the same depth.
//!
//! A 4-node is a separate type (`FourNode`) that only ever exists as the
//! return value of one insertion step; it cannot be stored in the tree.
//!
//! # Examples
//!
//! ```rust
//! use balanced_map::tree::TwoThreeMap;
//!
//! let mut map = TwoThreeMap::new();
//! for key in [18, 20, 10, 15, 6, 7, 8, 25, 40, 28, 66, 32, 51, 17, 23, 13] {
//!     map.insert(key, key);
//! }
//! map.insert(24, 1);
//!
//! assert_eq!(map.len(), 17);
//! assert_eq!(map.get(&24), Some(&1));
//! assert!(map.is_balanced());
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

use super::{BalancedMap, InvariantViolation};

// =============================================================================
// Node Definition
// =============================================================================

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// A persistent node: one entry over two children or two entries over three.
///
/// Children are either all present (internal node) or all absent (leaf).
#[derive(Clone)]
enum Node<K, V> {
    Two {
        entry: Entry<K, V>,
        left: Link<K, V>,
        right: Link<K, V>,
    },
    Three {
        left_entry: Entry<K, V>,
        right_entry: Entry<K, V>,
        left: Link<K, V>,
        middle: Link<K, V>,
        right: Link<K, V>,
    },
}

/// Which child link a key descends into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ChildPosition {
    Left,
    Middle,
    Right,
}

/// Which entry of a node holds a key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Slot {
    Left,
    Right,
}

/// Result of comparing a key against the entries of one node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Search {
    Found(Slot),
    Descend(ChildPosition),
}

impl<K, V> Node<K, V> {
    const fn leaf(key: K, value: V) -> Self {
        Self::Two {
            entry: Entry { key, value },
            left: None,
            right: None,
        }
    }

    fn is_leaf(&self) -> bool {
        match self {
            Self::Two { left, right, .. } => left.is_none() && right.is_none(),
            Self::Three {
                left,
                middle,
                right,
                ..
            } => left.is_none() && middle.is_none() && right.is_none(),
        }
    }

    fn keys(&self) -> Vec<&K> {
        match self {
            Self::Two { entry, .. } => vec![&entry.key],
            Self::Three {
                left_entry,
                right_entry,
                ..
            } => vec![&left_entry.key, &right_entry.key],
        }
    }

    fn children(&self) -> Vec<&Link<K, V>> {
        match self {
            Self::Two { left, right, .. } => vec![left, right],
            Self::Three {
                left,
                middle,
                right,
                ..
            } => vec![left, middle, right],
        }
    }

    /// Compares a key with this node's entries using three-way comparison.
    fn search<Q>(&self, key: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Self::Two { entry, .. } => match key.cmp(entry.key.borrow()) {
                Ordering::Less => Search::Descend(ChildPosition::Left),
                Ordering::Equal => Search::Found(Slot::Left),
                Ordering::Greater => Search::Descend(ChildPosition::Right),
            },
            Self::Three {
                left_entry,
                right_entry,
                ..
            } => match key.cmp(left_entry.key.borrow()) {
                Ordering::Less => Search::Descend(ChildPosition::Left),
                Ordering::Equal => Search::Found(Slot::Left),
                Ordering::Greater => match key.cmp(right_entry.key.borrow()) {
                    Ordering::Less => Search::Descend(ChildPosition::Middle),
                    Ordering::Equal => Search::Found(Slot::Right),
                    Ordering::Greater => Search::Descend(ChildPosition::Right),
                },
            },
        }
    }

    fn entry(&self, slot: Slot) -> &Entry<K, V> {
        match (self, slot) {
            (Self::Two { entry, .. }, _) | (Self::Three { left_entry: entry, .. }, Slot::Left) => {
                entry
            }
            (Self::Three { right_entry, .. }, Slot::Right) => right_entry,
        }
    }

    fn entry_mut(&mut self, slot: Slot) -> &mut Entry<K, V> {
        match (self, slot) {
            (Self::Two { entry, .. }, _) | (Self::Three { left_entry: entry, .. }, Slot::Left) => {
                entry
            }
            (Self::Three { right_entry, .. }, Slot::Right) => right_entry,
        }
    }

    /// Returns the child link at `position`. A 2-node has no middle child and
    /// maps `Middle` to its right link.
    fn child_link(&self, position: ChildPosition) -> &Link<K, V> {
        match (self, position) {
            (Self::Two { left, .. } | Self::Three { left, .. }, ChildPosition::Left)
            | (Self::Three { middle: left, .. }, ChildPosition::Middle) => left,
            (Self::Two { right, .. }, _) | (Self::Three { right, .. }, ChildPosition::Right) => {
                right
            }
        }
    }

    fn child_link_mut(&mut self, position: ChildPosition) -> &mut Link<K, V> {
        match (self, position) {
            (Self::Two { left, .. } | Self::Three { left, .. }, ChildPosition::Left)
            | (Self::Three { middle: left, .. }, ChildPosition::Middle) => left,
            (Self::Two { right, .. }, _) | (Self::Three { right, .. }, ChildPosition::Right) => {
                right
            }
        }
    }

    /// Absorbs `promoted` with its two flanking subtrees in place of the child
    /// at `position`.
    ///
    /// In a leaf the subtrees are absent and this is a plain merge of a new
    /// entry. A 2-node becomes a 3-node; a 3-node overflows into a 4-node that
    /// the caller must resolve.
    fn absorb(
        self: Box<Self>,
        position: ChildPosition,
        promoted: Entry<K, V>,
        lower: Link<K, V>,
        upper: Link<K, V>,
    ) -> Insertion<K, V> {
        debug_assert!(self.child_link(position).is_none());
        match *self {
            Self::Two { entry, left, right } => {
                let three = match position {
                    ChildPosition::Left => Self::Three {
                        left_entry: promoted,
                        right_entry: entry,
                        left: lower,
                        middle: upper,
                        right,
                    },
                    ChildPosition::Middle | ChildPosition::Right => Self::Three {
                        left_entry: entry,
                        right_entry: promoted,
                        left,
                        middle: lower,
                        right: upper,
                    },
                };
                Insertion::Fit(Box::new(three))
            }
            Self::Three {
                left_entry,
                right_entry,
                left,
                middle,
                right,
            } => {
                let four = match position {
                    ChildPosition::Left => FourNode {
                        left_entry: promoted,
                        middle_entry: left_entry,
                        right_entry,
                        left: lower,
                        middle_left: upper,
                        middle_right: middle,
                        right,
                    },
                    ChildPosition::Middle => FourNode {
                        left_entry,
                        middle_entry: promoted,
                        right_entry,
                        left,
                        middle_left: lower,
                        middle_right: upper,
                        right,
                    },
                    ChildPosition::Right => FourNode {
                        left_entry,
                        middle_entry: right_entry,
                        right_entry: promoted,
                        left,
                        middle_left: middle,
                        middle_right: lower,
                        right: upper,
                    },
                };
                Insertion::Overflow(four)
            }
        }
    }
}

// =============================================================================
// Transient 4-node
// =============================================================================

/// Three ordered entries over four children, produced when a 3-node
/// overflows. Never stored in the tree.
struct FourNode<K, V> {
    left_entry: Entry<K, V>,
    middle_entry: Entry<K, V>,
    right_entry: Entry<K, V>,
    left: Link<K, V>,
    middle_left: Link<K, V>,
    middle_right: Link<K, V>,
    right: Link<K, V>,
}

/// A split 4-node: the median entry over two 2-nodes.
struct Split<K, V> {
    promoted: Entry<K, V>,
    left: Box<Node<K, V>>,
    right: Box<Node<K, V>>,
}

/// Outcome of inserting into a subtree.
enum Insertion<K, V> {
    /// The subtree root is a 2-node or 3-node and can be reattached as is.
    Fit(Box<Node<K, V>>),
    /// The subtree root overflowed and must be split by the caller.
    Overflow(FourNode<K, V>),
}

impl<K: Ord, V> FourNode<K, V> {
    /// Promotes the median entry. The left entry keeps the first two
    /// children and the right entry keeps the last two.
    fn split(self) -> Split<K, V> {
        debug_assert!(self.left_entry.key < self.middle_entry.key);
        debug_assert!(self.middle_entry.key < self.right_entry.key);
        Split {
            promoted: self.middle_entry,
            left: Box::new(Node::Two {
                entry: self.left_entry,
                left: self.left,
                right: self.middle_left,
            }),
            right: Box::new(Node::Two {
                entry: self.right_entry,
                left: self.middle_right,
                right: self.right,
            }),
        }
    }
}

// =============================================================================
// TwoThreeMap Definition
// =============================================================================

/// An ordered map based on a 2-3 tree.
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
/// | `is_balanced`  | O(N)       |
/// | `validate`     | O(N)       |
///
/// # Examples
///
/// ```rust
/// use balanced_map::tree::TwoThreeMap;
///
/// let map: TwoThreeMap<i32, i32> = (1..=7).map(|key| (key, key * key)).collect();
///
/// assert_eq!(map.get(&5), Some(&25));
/// assert_eq!(map.height(), 3);
/// ```
#[derive(Clone)]
pub struct TwoThreeMap<K, V> {
    /// Root node of the tree
    root: Link<K, V>,
    /// Number of entries
    length: usize,
}

static_assertions::assert_impl_all!(TwoThreeMap<i32, String>: Send, Sync, Clone, Default);

impl<K, V> TwoThreeMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::TwoThreeMap;
    ///
    /// let map: TwoThreeMap<i32, String> = TwoThreeMap::new();
    /// assert!(map.is_empty());
    /// assert!(map.is_balanced());
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

    /// Returns the number of node levels on the longest root-to-leaf path.
    #[must_use]
    pub fn height(&self) -> usize {
        Self::height_of(self.root.as_deref())
    }

    fn height_of(node: Option<&Node<K, V>>) -> usize {
        node.map_or(0, |node_ref| {
            1 + node_ref
                .children()
                .into_iter()
                .map(|child| Self::height_of(child.as_deref()))
                .max()
                .unwrap_or(0)
        })
    }

    /// Returns `true` if every leaf is at the same depth.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::TwoThreeMap;
    ///
    /// let map: TwoThreeMap<i32, ()> = (0..1000).map(|key| (key, ())).collect();
    /// assert!(map.is_balanced());
    /// ```
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.root
            .as_deref()
            .is_none_or(|root| Self::leaf_depth(root, 1).is_some())
    }

    /// Returns the common depth of all leaves below `node`, or `None` if they
    /// differ.
    fn leaf_depth(node: &Node<K, V>, depth: usize) -> Option<usize> {
        if node.is_leaf() {
            return Some(depth);
        }
        let mut common = None;
        for child in node.children() {
            let child_depth = Self::leaf_depth(child.as_deref()?, depth + 1)?;
            if common.is_some_and(|common| common != child_depth) {
                return None;
            }
            common = Some(child_depth);
        }
        common
    }

    /// Collects all entries in sorted order (in-order traversal).
    fn collect_entries_in_order<'a>(
        node: Option<&'a Node<K, V>>,
        entries: &mut Vec<(&'a K, &'a V)>,
    ) {
        match node {
            None => {}
            Some(Node::Two { entry, left, right }) => {
                Self::collect_entries_in_order(left.as_deref(), entries);
                entries.push((&entry.key, &entry.value));
                Self::collect_entries_in_order(right.as_deref(), entries);
            }
            Some(Node::Three {
                left_entry,
                right_entry,
                left,
                middle,
                right,
            }) => {
                Self::collect_entries_in_order(left.as_deref(), entries);
                entries.push((&left_entry.key, &left_entry.value));
                Self::collect_entries_in_order(middle.as_deref(), entries);
                entries.push((&right_entry.key, &right_entry.value));
                Self::collect_entries_in_order(right.as_deref(), entries);
            }
        }
    }

    fn entries(&self) -> Vec<(&K, &V)> {
        let mut entries = Vec::with_capacity(self.length);
        Self::collect_entries_in_order(self.root.as_deref(), &mut entries);
        entries
    }
}

impl<K: Ord, V> TwoThreeMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// A miss, including on an empty map, returns `None`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::TwoThreeMap;
    ///
    /// let mut map = TwoThreeMap::new();
    /// assert_eq!(map.get("key"), None);
    ///
    /// map.insert("key".to_string(), 42);
    /// assert_eq!(map.get("key"), Some(&42));
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match node.search(key) {
                Search::Found(slot) => return Some(&node.entry(slot).value),
                Search::Descend(position) => current = node.child_link(position).as_deref(),
            }
        }
        None
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
    /// old value is returned; the tree shape and length are unchanged.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::TwoThreeMap;
    ///
    /// let mut map = TwoThreeMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    /// assert_eq!(map.height(), 1); // a single 3-node
    ///
    /// map.insert(3, "three");
    /// assert_eq!(map.height(), 2); // the root split
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (insertion, replaced) = Self::insert_into_link(self.root.take(), key, value);

        self.root = Some(match insertion {
            Insertion::Fit(root) => root,
            Insertion::Overflow(four) => {
                let Split {
                    promoted,
                    left,
                    right,
                } = four.split();
                #[cfg(feature = "tracing")]
                tracing::trace!(length = self.length + 1, "two-three tree root split");
                Box::new(Node::Two {
                    entry: promoted,
                    left: Some(left),
                    right: Some(right),
                })
            }
        });

        if replaced.is_none() {
            self.length += 1;
        }

        replaced
    }

    fn insert_into_link(link: Link<K, V>, key: K, value: V) -> (Insertion<K, V>, Option<V>) {
        match link {
            None => (Insertion::Fit(Box::new(Node::leaf(key, value))), None),
            Some(node) => Self::insert_into_node(node, key, value),
        }
    }

    /// Recursive helper for insert.
    /// Returns the subtree after insertion and the replaced value, if any.
    fn insert_into_node(
        mut node: Box<Node<K, V>>,
        key: K,
        value: V,
    ) -> (Insertion<K, V>, Option<V>) {
        match node.search(&key) {
            Search::Found(slot) => {
                let replaced = mem::replace(&mut node.entry_mut(slot).value, value);
                (Insertion::Fit(node), Some(replaced))
            }
            Search::Descend(position) if node.is_leaf() => {
                let insertion = node.absorb(position, Entry { key, value }, None, None);
                (insertion, None)
            }
            Search::Descend(position) => {
                let child = node.child_link_mut(position).take();
                let (outcome, replaced) = Self::insert_into_link(child, key, value);
                let insertion = match outcome {
                    Insertion::Fit(child) => {
                        *node.child_link_mut(position) = Some(child);
                        Insertion::Fit(node)
                    }
                    Insertion::Overflow(four) => {
                        let Split {
                            promoted,
                            left,
                            right,
                        } = four.split();
                        node.absorb(position, promoted, Some(left), Some(right))
                    }
                };
                (insertion, replaced)
            }
        }
    }
}

impl<K: Ord, V> TwoThreeMap<K, V> {
    /// Checks every 2-3 tree invariant and the recorded length.
    ///
    /// Unlike [`is_balanced`](Self::is_balanced), this also checks key order
    /// within and across nodes and that no node mixes present and absent
    /// children.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found in a depth-first,
    /// left-to-right walk.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use balanced_map::tree::TwoThreeMap;
    ///
    /// let map: TwoThreeMap<i32, i32> = (0..500).rev().map(|key| (key, key)).collect();
    /// assert_eq!(map.validate(), Ok(()));
    /// ```
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let mut walk = ValidationWalk {
            leaf_depth: None,
            counted: 0,
        };
        if let Some(root) = self.root.as_deref() {
            walk.visit(root, 1, None, None)?;
        }

        if walk.counted == self.length {
            Ok(())
        } else {
            Err(InvariantViolation::LengthMismatch {
                recorded: self.length,
                counted: walk.counted,
            })
        }
    }
}

/// State carried through [`TwoThreeMap::validate`].
struct ValidationWalk {
    leaf_depth: Option<usize>,
    counted: usize,
}

impl ValidationWalk {
    fn visit<'a, K: Ord, V>(
        &mut self,
        node: &'a Node<K, V>,
        depth: usize,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
    ) -> Result<(), InvariantViolation> {
        let keys = node.keys();
        let bounded: Vec<&K> = lower
            .into_iter()
            .chain(keys.iter().copied())
            .chain(upper)
            .collect();
        if !bounded.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(InvariantViolation::KeyOrder { depth });
        }
        self.counted += keys.len();

        let children = node.children();
        if children.iter().all(|child| child.is_none()) {
            return match self.leaf_depth {
                None => {
                    self.leaf_depth = Some(depth);
                    Ok(())
                }
                Some(expected) if expected == depth => Ok(()),
                Some(expected) => Err(InvariantViolation::UnevenLeafDepth {
                    expected,
                    found: depth,
                }),
            };
        }

        for (index, child) in children.into_iter().enumerate() {
            let Some(child) = child.as_deref() else {
                return Err(InvariantViolation::MixedChildren { depth });
            };
            let child_lower = if index == 0 { lower } else { Some(keys[index - 1]) };
            let child_upper = keys.get(index).copied().or(upper);
            self.visit(child, depth + 1, child_lower, child_upper)?;
        }
        Ok(())
    }
}

// =============================================================================
// BalancedMap Implementation
// =============================================================================

impl<K: Ord, V> BalancedMap<K, V> for TwoThreeMap<K, V> {
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

impl<K, V> Default for TwoThreeMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TwoThreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for TwoThreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TwoThreeMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.entries()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for TwoThreeMap<K, V> {
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
