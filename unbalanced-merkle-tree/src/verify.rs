//! Sibling path verification.
//!
//! Pure functions: no tree or store is needed. The root is recomputed by
//! hashing upward from the leaf with the same left/right rule used during
//! construction (even index = left operand).

use crate::{
    Result, UnbalancedTreeError,
    hasher::PairHasher,
    path::{LeafProof, SiblingPath},
};

impl SiblingPath {
    /// Recompute the root from `leaf` resting at index `position_index` of
    /// its level.
    ///
    /// Fails if the index does not reach 0 after one halving per sibling,
    /// which means the position cannot lie under the root this path leads
    /// to.
    pub fn compute_root<H: PairHasher>(
        &self,
        leaf: &[u8],
        position_index: u64,
        hasher: &H,
    ) -> Result<Vec<u8>> {
        self.check_len()?;
        let remaining = position_index.checked_shr(self.nodes.len() as u32).unwrap_or(0);
        if remaining != 0 {
            return Err(UnbalancedTreeError::InvalidPath(format!(
                "position index {} is too large for a path of {} siblings",
                position_index,
                self.nodes.len()
            )));
        }

        let mut current = leaf.to_vec();
        let mut index = position_index;
        for sibling in &self.nodes {
            current = if index & 1 == 0 {
                hasher.hash_pair(&current, sibling)
            } else {
                hasher.hash_pair(sibling, &current)
            };
            index >>= 1;
        }
        Ok(current)
    }

    /// Check that `leaf` at `position_index` hashes up to `expected_root`.
    pub fn verify<H: PairHasher>(
        &self,
        leaf: &[u8],
        position_index: u64,
        expected_root: &[u8],
        hasher: &H,
    ) -> Result<()> {
        let computed = self.compute_root(leaf, position_index, hasher)?;
        if computed != expected_root {
            return Err(UnbalancedTreeError::InvalidPath(format!(
                "root mismatch: expected {}, got {}",
                hex::encode(expected_root),
                hex::encode(&computed)
            )));
        }
        Ok(())
    }
}

impl LeafProof {
    /// Recompute the root this proof commits to.
    pub fn compute_root<H: PairHasher>(&self, hasher: &H) -> Result<Vec<u8>> {
        self.path
            .compute_root(&self.leaf, self.position.index, hasher)
    }

    /// Check the proof against `expected_root`.
    pub fn verify<H: PairHasher>(&self, expected_root: &[u8], hasher: &H) -> Result<()> {
        self.path
            .verify(&self.leaf, self.position.index, expected_root, hasher)
    }
}
