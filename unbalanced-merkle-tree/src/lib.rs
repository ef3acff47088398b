//! Unbalanced Merkle tree root and sibling path calculator.
//!
//! Builds a binary hash tree over any non-zero number of leaves by pairing
//! siblings level by level and moving unpaired nodes up unhashed:
//!
//! ```text
//!            root = H(H(A, B), C)
//!           /                \
//!       H(A, B)               C      <- C had no sibling, shifted up
//!       /     \
//!      A       B
//! ```
//!
//! Leaves equal to a configurable *compressed* value are left out entirely:
//! their sibling is promoted in their place and they have no sibling path.
//! If every leaf is compressed, the root is all zero bytes.
//!
//! # Core types
//!
//! - [`UnbalancedMerkleTreeCalculator`] — builds the tree, answers root and
//!   sibling path queries.
//! - [`UnbalancedTreeStore`] — sparse `(level, index)` keyed node storage.
//! - [`SiblingPath`] / [`LeafProof`] — authentication paths and their
//!   verification.
//! - [`PairHasher`] — the injected pairing hash ([`Sha256TruncHasher`] by
//!   default, [`Blake3PairHasher`], or any closure via [`FnPairHasher`]).

#![warn(missing_docs)]

mod calculator;
mod error;
mod hasher;
mod path;
mod position;
mod store;
mod verify;

#[cfg(test)]
mod tests;

pub use calculator::{CalculatorOptions, UnbalancedMerkleTreeCalculator};
pub use error::{Result, UnbalancedTreeError};
pub use hasher::{Blake3PairHasher, FnPairHasher, PairHasher, Sha256TruncHasher};
pub use path::{LeafProof, SiblingPath};
pub use position::{TreePosition, depth_for_leaf_count, level_capacity};
pub use store::{TreeNode, UnbalancedTreeStore};
