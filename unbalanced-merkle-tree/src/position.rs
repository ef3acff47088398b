//! Positional arithmetic for the sparse unbalanced tree.
//!
//! Level 0 is the leaf row and levels grow towards the root. A tree built
//! from `n` leaves has depth `ceil(log2(n))`, so its root lives at
//! `(depth, 0)`:
//!
//! ```text
//! level 2:            (2,0)
//!                   /       \
//! level 1:      (1,0)       (1,1)
//!               /   \       /
//! level 0:  (0,0) (0,1) (0,2)
//! ```

use std::fmt;

use bincode::{Decode, Encode};

/// A `(level, index)` coordinate in the tree.
///
/// Ordering is by level first, then by index, so a `BTreeMap` keyed by
/// positions iterates the tree bottom-up, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct TreePosition {
    /// Distance from the leaf row.
    pub level: u8,
    /// Index within the level, counted from the left.
    pub index: u64,
}

impl TreePosition {
    /// Create a position at the given level and index.
    pub const fn new(level: u8, index: u64) -> Self {
        TreePosition { level, index }
    }

    /// The position of leaf `index` before any relocation.
    pub const fn leaf(index: u64) -> Self {
        TreePosition { level: 0, index }
    }

    /// The other member of this position's sibling pair.
    pub const fn sibling(&self) -> Self {
        TreePosition {
            level: self.level,
            index: self.index ^ 1,
        }
    }

    /// `(level + 1, index / 2)`.
    pub const fn parent(&self) -> Self {
        TreePosition {
            level: self.level + 1,
            index: self.index >> 1,
        }
    }

    /// `(level - 1, 2 * index)` and `(level - 1, 2 * index + 1)`, or `None`
    /// for the leaf row.
    pub const fn children(&self) -> Option<[Self; 2]> {
        if self.level == 0 {
            return None;
        }
        let left = TreePosition {
            level: self.level - 1,
            index: self.index << 1,
        };
        let right = TreePosition {
            level: left.level,
            index: left.index | 1,
        };
        Some([left, right])
    }

    /// Whether this position is the left (even) member of its pair.
    pub const fn is_left(&self) -> bool {
        self.index & 1 == 0
    }
}

impl fmt::Display for TreePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.level, self.index)
    }
}

/// `ceil(log2(leaf_count))`, and 0 for zero or one leaf.
pub fn depth_for_leaf_count(leaf_count: u64) -> u8 {
    if leaf_count <= 1 {
        return 0;
    }
    (u64::BITS - (leaf_count - 1).leading_zeros()) as u8
}

/// Number of addressable positions at `level` in a tree of the given depth:
/// `2^(depth - level)`, saturating at `u64::MAX`.
///
/// Shifted subtrees can land past `ceil(leaf_count / 2^level)`.
pub fn level_capacity(depth: u8, level: u8) -> u64 {
    if level > depth {
        return 0;
    }
    1u64.checked_shl(u32::from(depth - level)).unwrap_or(u64::MAX)
}
