//! Invariant violations reported by tree validation.
//!
//! Balancing never fails at runtime: insertion and lookup are total on a
//! well-formed tree, and a lookup miss is `None`. [`InvariantViolation`] is
//! the diagnostic returned by `validate` when a tree is found in a state its
//! insertion algorithm can never produce.

use std::fmt;

/// A broken structural invariant, as reported by `validate`.
///
/// Depths count node levels from the root, which is at depth 1.
///
/// # Examples
///
/// ```rust
/// use balanced_map::tree::InvariantViolation;
///
/// let violation = InvariantViolation::UnevenLeafDepth {
///     expected: 3,
///     found: 4,
/// };
/// assert_eq!(
///     format!("{violation}"),
///     "leaf depth mismatch: expected 3, found 4"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root of a red-black tree is red.
    RedRoot,
    /// A red edge leans right.
    RightLeaningRed {
        /// Depth of the parent of the red edge.
        depth: usize,
    },
    /// Two red edges follow each other on one path.
    ConsecutiveRed {
        /// Depth of the upper red node.
        depth: usize,
    },
    /// Two root-to-leaf paths cross a different number of black nodes.
    BlackHeightMismatch {
        /// Black height of the first path examined.
        expected: usize,
        /// Black height of the offending path.
        found: usize,
    },
    /// Two leaves of a 2-3 tree sit at different depths.
    UnevenLeafDepth {
        /// Depth of the first leaf examined.
        expected: usize,
        /// Depth of the offending leaf.
        found: usize,
    },
    /// A 2-3 tree node has some children present and some absent.
    MixedChildren {
        /// Depth of the offending node.
        depth: usize,
    },
    /// Keys are not strictly increasing in order.
    KeyOrder {
        /// Depth of the node holding the out-of-order key.
        depth: usize,
    },
    /// The recorded length differs from the number of stored entries.
    LengthMismatch {
        /// Length recorded by the map.
        recorded: usize,
        /// Entries actually reachable from the root.
        counted: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedRoot => write!(formatter, "root is red"),
            Self::RightLeaningRed { depth } => {
                write!(formatter, "right-leaning red edge below depth {depth}")
            }
            Self::ConsecutiveRed { depth } => {
                write!(formatter, "consecutive red edges below depth {depth}")
            }
            Self::BlackHeightMismatch { expected, found } => write!(
                formatter,
                "black height mismatch: expected {expected}, found {found}"
            ),
            Self::UnevenLeafDepth { expected, found } => write!(
                formatter,
                "leaf depth mismatch: expected {expected}, found {found}"
            ),
            Self::MixedChildren { depth } => {
                write!(formatter, "node at depth {depth} mixes present and absent children")
            }
            Self::KeyOrder { depth } => {
                write!(formatter, "keys out of order at depth {depth}")
            }
            Self::LengthMismatch { recorded, counted } => write!(
                formatter,
                "length mismatch: recorded {recorded}, counted {counted}"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}
