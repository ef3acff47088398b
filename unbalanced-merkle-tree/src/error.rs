use thiserror::Error;

/// Alias for `core::result::Result<T, UnbalancedTreeError>`.
pub type Result<T> = core::result::Result<T, UnbalancedTreeError>;

/// Errors from unbalanced Merkle tree construction and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnbalancedTreeError {
    /// A tree needs at least one leaf.
    #[error("cannot create an unbalanced merkle tree with 0 leaves")]
    EmptyLeaves,
    /// No leaf holds the requested value (hex encoded).
    #[error("cannot find leaf with value {0}")]
    LeafNotFound(String),
    /// The leaf index lies outside `[0, leaf_count)`.
    #[error("leaf index {index} is out of bounds (leaf count {leaf_count})")]
    LeafIndexOutOfBounds {
        /// Requested leaf index.
        index: u64,
        /// Number of leaves the tree was built from.
        leaf_count: u64,
    },
    /// The leaf equals the compressed value and was never hashed into the
    /// tree, so it has no sibling path.
    #[error("leaf at index {0} has been compressed")]
    LeafCompressed(u64),
    /// A position outside the addressable area of the store.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    /// The node store does not hold a node the tree shape requires.
    #[error("inconsistent tree: {0}")]
    InconsistentTree(String),
    /// A sibling path failed to verify or decode.
    #[error("invalid sibling path: {0}")]
    InvalidPath(String),
}
