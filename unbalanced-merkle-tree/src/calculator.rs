use tracing::{debug, trace};

use crate::{
    Result, UnbalancedTreeError,
    hasher::{PairHasher, Sha256TruncHasher},
    path::{LeafProof, SiblingPath},
    position::TreePosition,
    store::{TreeNode, UnbalancedTreeStore},
};

/// Construction options for [`UnbalancedMerkleTreeCalculator`].
///
/// Defaults to an empty compressed value and [`Sha256TruncHasher`].
#[derive(Debug, Clone)]
pub struct CalculatorOptions<H = Sha256TruncHasher> {
    value_to_compress: Vec<u8>,
    hasher: H,
}

impl Default for CalculatorOptions {
    fn default() -> Self {
        CalculatorOptions {
            value_to_compress: Vec::new(),
            hasher: Sha256TruncHasher,
        }
    }
}

impl<H> CalculatorOptions<H> {
    /// Options with an explicit compressed value and hasher.
    pub fn new(value_to_compress: impl Into<Vec<u8>>, hasher: H) -> Self {
        CalculatorOptions {
            value_to_compress: value_to_compress.into(),
            hasher,
        }
    }

    /// Leaves equal to `value` are left out of the tree and their siblings
    /// are promoted unhashed.
    pub fn with_value_to_compress(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value_to_compress = value.into();
        self
    }

    /// Replace the pairing hash.
    pub fn with_hasher<H2>(self, hasher: H2) -> CalculatorOptions<H2> {
        CalculatorOptions {
            value_to_compress: self.value_to_compress,
            hasher,
        }
    }

    /// The compressed value.
    pub fn value_to_compress(&self) -> &[u8] {
        &self.value_to_compress
    }

    /// The pairing hash.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

/// Root and sibling path calculator for an unbalanced Merkle tree.
///
/// The tree is built eagerly from a non-empty, ordered list of leaves by
/// pairing siblings level by level. A node without a sibling, or whose
/// sibling is a compressed leaf, is moved up to its parent position without
/// hashing; an internal node moves together with its whole subtree so that
/// every node keeps its children directly below it.
///
/// Once built the calculator is immutable. Build a new one for a different
/// leaf set.
#[derive(Debug, Clone)]
pub struct UnbalancedMerkleTreeCalculator<H = Sha256TruncHasher> {
    leaves: Vec<Vec<u8>>,
    value_to_compress: Vec<u8>,
    hasher: H,
    store: UnbalancedTreeStore,
    leaf_locations: Vec<TreePosition>,
    root_location: TreePosition,
    root: Vec<u8>,
    hash_calls: u32,
}

impl UnbalancedMerkleTreeCalculator<Sha256TruncHasher> {
    /// Build a tree with the default options.
    pub fn new<I, V>(leaves: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        Self::with_options(leaves, CalculatorOptions::default())
    }
}

impl<H: PairHasher> UnbalancedMerkleTreeCalculator<H> {
    /// Build a tree from `leaves` with the given compressed value and hasher.
    ///
    /// Returns [`UnbalancedTreeError::EmptyLeaves`] if `leaves` is empty.
    pub fn with_options<I, V>(leaves: I, options: CalculatorOptions<H>) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        let leaves: Vec<Vec<u8>> = leaves.into_iter().map(Into::into).collect();
        if leaves.is_empty() {
            return Err(UnbalancedTreeError::EmptyLeaves);
        }
        let store = UnbalancedTreeStore::new(leaves.len() as u64);
        let root_location = store.root_location();
        let mut calculator = UnbalancedMerkleTreeCalculator {
            leaf_locations: Vec::with_capacity(leaves.len()),
            leaves,
            value_to_compress: options.value_to_compress,
            hasher: options.hasher,
            store,
            root_location,
            root: Vec::new(),
            hash_calls: 0,
        };
        calculator.build()?;
        Ok(calculator)
    }

    /// Build a tree and return only its root.
    pub fn compute_root<I, V>(leaves: I, options: CalculatorOptions<H>) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        Ok(Self::with_options(leaves, options)?.root)
    }

    fn build(&mut self) -> Result<()> {
        for (i, leaf) in self.leaves.iter().enumerate() {
            let location = self
                .store
                .set_leaf(i as u64, TreeNode::leaf(leaf.clone(), i as u64))?;
            self.leaf_locations.push(location);
        }

        let mut to_process: Vec<TreePosition> = self
            .leaf_locations
            .iter()
            .zip(&self.leaves)
            .filter(|(_, leaf)| !self.is_compressed(leaf))
            .map(|(location, _)| *location)
            .collect();

        if to_process.is_empty() {
            let root = vec![0u8; self.hasher.output_len()];
            self.store
                .set_node(self.root_location, TreeNode::internal(root.clone()))?;
            self.root = root;
            debug!(
                target: "unbalanced_merkle_tree",
                leaf_count = self.leaves.len(),
                depth = self.depth(),
                "all leaves compressed, root is zero"
            );
            return Ok(());
        }
        let compressed = self.leaves.len() - to_process.len();

        for level in 0..self.depth() {
            let mut parents = Vec::with_capacity(to_process.len().div_ceil(2));
            for location in to_process {
                let parent = self.store.get_parent_location(location);
                if self.store.get_node(parent).is_some() {
                    // the sibling already resolved this pair
                    continue;
                }
                match self.merge_with_sibling(location)? {
                    Some(hash) => {
                        trace!(
                            target: "unbalanced_merkle_tree",
                            level,
                            %parent,
                            "hashed sibling pair"
                        );
                        self.store.set_node(parent, TreeNode::internal(hash))?;
                        self.hash_calls += 1;
                    }
                    None => self.shift_node_up(location, parent)?,
                }
                parents.push(parent);
            }
            to_process = parents;
        }

        let root_location = to_process.first().copied().ok_or_else(|| {
            UnbalancedTreeError::InconsistentTree("no node reached the root level".to_string())
        })?;
        if root_location != self.root_location {
            return Err(UnbalancedTreeError::InconsistentTree(format!(
                "tree collapsed to {} instead of {}",
                root_location, self.root_location
            )));
        }
        self.root = self.node_at(root_location)?.value().to_vec();

        debug!(
            target: "unbalanced_merkle_tree",
            leaf_count = self.leaves.len(),
            compressed,
            depth = self.depth(),
            hash_calls = self.hash_calls,
            root = %hex::encode(&self.root),
            "built unbalanced merkle tree"
        );
        Ok(())
    }

    /// Hash the node at `location` with its sibling, or return `None` if the
    /// sibling is absent or compressed.
    fn merge_with_sibling(&self, location: TreePosition) -> Result<Option<Vec<u8>>> {
        let sibling = match self.store.get_sibling(location) {
            Some(sibling) if !self.is_compressed(sibling.value()) => sibling,
            _ => return Ok(None),
        };
        let node = self.node_at(location)?;
        let (left, right) = if location.is_left() {
            (node.value(), sibling.value())
        } else {
            (sibling.value(), node.value())
        };
        Ok(Some(self.hasher.hash_pair(left, right)))
    }

    /// Move the node at `from` (and, for hashed nodes, everything below it)
    /// to `to`, one level up.
    ///
    /// The subtree is read in full before anything is written because the
    /// destination area overlaps the source.
    fn shift_node_up(&mut self, from: TreePosition, to: TreePosition) -> Result<()> {
        let mut moved = Vec::new();
        self.collect_subtree(from, to, &mut moved)?;
        trace!(
            target: "unbalanced_merkle_tree",
            %from,
            %to,
            nodes = moved.len(),
            "shifted node up"
        );
        for (location, node) in moved {
            if let Some(leaf_index) = node.leaf_index() {
                self.leaf_locations[leaf_index as usize] = location;
            }
            self.store.set_node(location, node)?;
        }
        Ok(())
    }

    fn collect_subtree(
        &self,
        from: TreePosition,
        to: TreePosition,
        moved: &mut Vec<(TreePosition, TreeNode)>,
    ) -> Result<()> {
        let node = self.node_at(from)?.clone();
        let is_leaf = node.is_leaf();
        moved.push((to, node));
        if is_leaf {
            return Ok(());
        }
        let (Some(from_children), Some(to_children)) = (
            self.store.get_child_locations(from),
            self.store.get_child_locations(to),
        ) else {
            return Err(UnbalancedTreeError::InconsistentTree(format!(
                "hashed node at {} has no child positions",
                from
            )));
        };
        for (from_child, to_child) in from_children.into_iter().zip(to_children) {
            self.collect_subtree(from_child, to_child, moved)?;
        }
        Ok(())
    }

    fn node_at(&self, location: TreePosition) -> Result<&TreeNode> {
        self.store.get_node(location).ok_or_else(|| {
            UnbalancedTreeError::InconsistentTree(format!("expected a node at {}", location))
        })
    }

    fn is_compressed(&self, value: &[u8]) -> bool {
        value == self.value_to_compress.as_slice()
    }

    /// The root value.
    ///
    /// For a single leaf this is the leaf itself; if every leaf is
    /// compressed it is `output_len` zero bytes.
    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// Sibling path of the first leaf equal to `value`.
    pub fn sibling_path(&self, value: &[u8]) -> Result<SiblingPath> {
        let leaf_index = self.find_leaf_index(value)?;
        self.sibling_path_by_leaf_index(leaf_index)
    }

    /// Sibling path of leaf `leaf_index`, leaf-adjacent sibling first.
    ///
    /// Fails with [`UnbalancedTreeError::LeafIndexOutOfBounds`] for an index
    /// past the last leaf and [`UnbalancedTreeError::LeafCompressed`] for a
    /// leaf equal to the compressed value.
    pub fn sibling_path_by_leaf_index(&self, leaf_index: u64) -> Result<SiblingPath> {
        let location = self.resting_location(leaf_index)?;
        let depth = self.depth();
        let mut nodes = Vec::with_capacity((depth - location.level) as usize);
        let mut current = location;
        while current.level < depth {
            let sibling = self.store.get_sibling(current).ok_or_else(|| {
                UnbalancedTreeError::InconsistentTree(format!(
                    "missing sibling of {} on the path of leaf {}",
                    current, leaf_index
                ))
            })?;
            nodes.push(sibling.value().to_vec());
            current = self.store.get_parent_location(current);
        }
        Ok(SiblingPath::new(nodes))
    }

    /// Leaf value, resting position and sibling path of leaf `leaf_index`.
    pub fn leaf_proof(&self, leaf_index: u64) -> Result<LeafProof> {
        let position = self.resting_location(leaf_index)?;
        let path = self.sibling_path_by_leaf_index(leaf_index)?;
        Ok(LeafProof {
            leaf_index,
            leaf: self.leaves[leaf_index as usize].clone(),
            position,
            path,
        })
    }

    /// Proof for the first leaf equal to `value`.
    pub fn leaf_proof_for_value(&self, value: &[u8]) -> Result<LeafProof> {
        let leaf_index = self.find_leaf_index(value)?;
        self.leaf_proof(leaf_index)
    }

    fn find_leaf_index(&self, value: &[u8]) -> Result<u64> {
        self.leaves
            .iter()
            .position(|leaf| leaf.as_slice() == value)
            .map(|i| i as u64)
            .ok_or_else(|| UnbalancedTreeError::LeafNotFound(hex::encode(value)))
    }

    fn resting_location(&self, leaf_index: u64) -> Result<TreePosition> {
        let out_of_bounds = || UnbalancedTreeError::LeafIndexOutOfBounds {
            index: leaf_index,
            leaf_count: self.leaf_count(),
        };
        let i = usize::try_from(leaf_index).map_err(|_| out_of_bounds())?;
        let leaf = self.leaves.get(i).ok_or_else(out_of_bounds)?;
        if self.is_compressed(leaf) {
            return Err(UnbalancedTreeError::LeafCompressed(leaf_index));
        }
        self.leaf_locations.get(i).copied().ok_or_else(out_of_bounds)
    }
}

impl<H> UnbalancedMerkleTreeCalculator<H> {
    /// Where leaf `leaf_index` rests after compression moved it upward.
    ///
    /// `None` for an out of range index or a compressed leaf.
    pub fn leaf_location(&self, leaf_index: u64) -> Option<TreePosition> {
        let i = usize::try_from(leaf_index).ok()?;
        let leaf = self.leaves.get(i)?;
        if *leaf == self.value_to_compress {
            return None;
        }
        self.leaf_locations.get(i).copied()
    }

    /// Number of input leaves, compressed ones included.
    pub fn leaf_count(&self) -> u64 {
        self.leaves.len() as u64
    }

    /// Level of the root: `ceil(log2(leaf_count))`.
    pub fn depth(&self) -> u8 {
        self.store.depth()
    }

    /// The input leaves in order.
    pub fn leaves(&self) -> &[Vec<u8>] {
        &self.leaves
    }

    /// The compressed value this tree was built with.
    pub fn value_to_compress(&self) -> &[u8] {
        &self.value_to_compress
    }

    /// The pairing hash this tree was built with.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Number of pairing hashes computed while building.
    pub fn hash_calls(&self) -> u32 {
        self.hash_calls
    }

    /// The populated node store.
    pub fn store(&self) -> &UnbalancedTreeStore {
        &self.store
    }
}
