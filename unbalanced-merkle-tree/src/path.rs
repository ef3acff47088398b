//! Sibling paths and leaf inclusion proofs.
//!
//! A [`SiblingPath`] lists the sibling values met while walking from a
//! leaf's resting position to the root, leaf-adjacent sibling first. Because
//! compressed leaves shift survivors upward, a leaf may rest above level 0
//! and its path may be shorter than the tree depth.

use bincode::{Decode, Encode};

use crate::{Result, UnbalancedTreeError, position::TreePosition};

/// Maximum number of siblings a path may hold (one per level of a tree
/// addressed by `u64` indices).
pub(crate) const MAX_PATH_LEN: usize = 64;

/// Decode limit for serialized paths and proofs.
const MAX_DECODE_BYTES: usize = 16 * 1024 * 1024;

/// Sibling values from a leaf's resting position up to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct SiblingPath {
    pub(crate) nodes: Vec<Vec<u8>>,
}

impl SiblingPath {
    /// Wrap an ordered list of siblings, leaf-adjacent first.
    pub fn new(nodes: Vec<Vec<u8>>) -> Self {
        SiblingPath { nodes }
    }

    /// Number of siblings in the path.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` for the path of a leaf that is itself the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The siblings, leaf-adjacent first.
    pub fn nodes(&self) -> &[Vec<u8>] {
        &self.nodes
    }

    /// Consume the path and return its siblings.
    pub fn into_nodes(self) -> Vec<Vec<u8>> {
        self.nodes
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from bytes using bincode.
    ///
    /// Rejects paths longer than a `u64`-indexed tree can be deep.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let path: Self = decode(bytes)?;
        path.check_len()?;
        Ok(path)
    }

    pub(crate) fn check_len(&self) -> Result<()> {
        if self.nodes.len() > MAX_PATH_LEN {
            return Err(UnbalancedTreeError::InvalidPath(format!(
                "path has {} siblings, at most {} are possible",
                self.nodes.len(),
                MAX_PATH_LEN
            )));
        }
        Ok(())
    }
}

impl From<Vec<Vec<u8>>> for SiblingPath {
    fn from(nodes: Vec<Vec<u8>>) -> Self {
        SiblingPath::new(nodes)
    }
}

/// Everything needed to check one leaf against a root.
///
/// The resting position matters: at each step the bit of `position.index`
/// decides whether the running value is the left or right operand.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct LeafProof {
    /// Index of the leaf in the input order.
    pub leaf_index: u64,
    /// The leaf value.
    pub leaf: Vec<u8>,
    /// Where the leaf rests after compression shifted it upward.
    pub position: TreePosition,
    /// Siblings from `position` up to the root.
    pub path: SiblingPath,
}

impl LeafProof {
    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from bytes using bincode.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let proof: Self = decode(bytes)?;
        proof.path.check_len()?;
        Ok(proof)
    }
}

fn encode<T: Encode>(value: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_no_limit();
    bincode::encode_to_vec(value, config)
        .map_err(|e| UnbalancedTreeError::InvalidPath(format!("encode error: {}", e)))
}

fn decode<T: Decode<()>>(bytes: &[u8]) -> Result<T> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_limit::<MAX_DECODE_BYTES>();
    let (value, read) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| UnbalancedTreeError::InvalidPath(format!("decode error: {}", e)))?;
    if read != bytes.len() {
        return Err(UnbalancedTreeError::InvalidPath(format!(
            "{} trailing bytes after decoded value",
            bytes.len() - read
        )));
    }
    Ok(value)
}
