use std::collections::BTreeMap;

use crate::{
    Result, UnbalancedTreeError,
    position::{TreePosition, depth_for_leaf_count, level_capacity},
};

/// A value stored at a tree position.
///
/// Leaf nodes remember which input leaf they came from; nodes produced by
/// hashing two children do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    value: Vec<u8>,
    leaf_index: Option<u64>,
}

impl TreeNode {
    /// A leaf node for input leaf `leaf_index`.
    pub fn leaf(value: Vec<u8>, leaf_index: u64) -> Self {
        TreeNode {
            value,
            leaf_index: Some(leaf_index),
        }
    }

    /// A node produced by hashing two children.
    pub fn internal(value: Vec<u8>) -> Self {
        TreeNode {
            value,
            leaf_index: None,
        }
    }

    /// The node's bytes.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The input leaf this node represents, `None` for hashed nodes.
    pub fn leaf_index(&self) -> Option<u64> {
        self.leaf_index
    }

    /// Whether the node is an input leaf (possibly relocated).
    pub fn is_leaf(&self) -> bool {
        self.leaf_index.is_some()
    }
}

/// Sparse node storage for an unbalanced tree.
///
/// Positions are populated only by explicit writes; reads of unwritten
/// positions return `None` rather than a placeholder. The addressable area is
/// `depth + 1` levels where level `l` holds `2^(depth - l)` positions.
#[derive(Debug, Clone, Default)]
pub struct UnbalancedTreeStore {
    leaf_count: u64,
    depth: u8,
    nodes: BTreeMap<TreePosition, TreeNode>,
}

impl UnbalancedTreeStore {
    /// Create an empty store sized for `leaf_count` leaves.
    pub fn new(leaf_count: u64) -> Self {
        UnbalancedTreeStore {
            leaf_count,
            depth: depth_for_leaf_count(leaf_count),
            nodes: BTreeMap::new(),
        }
    }

    /// Number of leaves the store was sized for.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Level of the root position.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// `(depth, 0)`.
    pub fn root_location(&self) -> TreePosition {
        TreePosition::new(self.depth, 0)
    }

    /// Number of populated positions.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Write a leaf node at `(0, index)` and return that position.
    pub fn set_leaf(&mut self, index: u64, node: TreeNode) -> Result<TreePosition> {
        if index >= self.leaf_count {
            return Err(UnbalancedTreeError::InvalidPosition(format!(
                "leaf index {} exceeds leaf count {}",
                index, self.leaf_count
            )));
        }
        let position = TreePosition::leaf(index);
        self.set_node(position, node)?;
        Ok(position)
    }

    /// Write `node` at `position`, replacing whatever was there.
    pub fn set_node(&mut self, position: TreePosition, node: TreeNode) -> Result<()> {
        self.check_position(position)?;
        self.nodes.insert(position, node);
        Ok(())
    }

    /// The node at `position`, or `None` if the position was never written.
    pub fn get_node(&self, position: TreePosition) -> Option<&TreeNode> {
        self.nodes.get(&position)
    }

    /// The node at the sibling of `position`, or `None` if never written.
    pub fn get_sibling(&self, position: TreePosition) -> Option<&TreeNode> {
        self.nodes.get(&position.sibling())
    }

    /// `(level + 1, index / 2)`.
    pub fn get_parent_location(&self, position: TreePosition) -> TreePosition {
        position.parent()
    }

    /// The two positions directly below `position`; `None` on the leaf row.
    pub fn get_child_locations(&self, position: TreePosition) -> Option<[TreePosition; 2]> {
        position.children()
    }

    fn check_position(&self, position: TreePosition) -> Result<()> {
        if position.level > self.depth {
            return Err(UnbalancedTreeError::InvalidPosition(format!(
                "level {} exceeds tree depth {}",
                position.level, self.depth
            )));
        }
        let width = level_capacity(self.depth, position.level);
        if position.index >= width {
            return Err(UnbalancedTreeError::InvalidPosition(format!(
                "index {} at level {} exceeds level width {}",
                position.index, position.level, width
            )));
        }
        Ok(())
    }
}
