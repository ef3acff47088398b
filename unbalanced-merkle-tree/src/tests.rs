use super::*;

/// Hasher that renders the tree shape as text: `(left,right)`.
fn shape_hasher() -> FnPairHasher<impl Fn(&[u8], &[u8]) -> Vec<u8>> {
    FnPairHasher::new(
        |left: &[u8], right: &[u8]| {
            let parts: [&[u8]; 5] = [b"(", left, b",", right, b")"];
            parts.concat()
        },
        4,
    )
}

fn shape_options() -> CalculatorOptions<FnPairHasher<impl Fn(&[u8], &[u8]) -> Vec<u8>>> {
    CalculatorOptions::default()
        .with_value_to_compress(b"_".to_vec())
        .with_hasher(shape_hasher())
}

/// Leaves `A`, `B`, ... with `_` marking compressed ones.
fn shape_leaves(layout: &str) -> Vec<Vec<u8>> {
    layout.bytes().map(|b| vec![b]).collect()
}

fn shape_root(layout: &str) -> String {
    let calculator =
        UnbalancedMerkleTreeCalculator::with_options(shape_leaves(layout), shape_options())
            .expect("build shape tree");
    String::from_utf8(calculator.root().to_vec()).expect("utf8 shape")
}

fn hash_leaf(i: u32) -> Vec<u8> {
    Sha256TruncHasher.hash_pair(b"leaf", &i.to_be_bytes())
}

fn h(left: &[u8], right: &[u8]) -> Vec<u8> {
    Sha256TruncHasher.hash_pair(left, right)
}

// ── Construction ─────────────────────────────────────────────────────

#[test]
fn test_empty_leaves_rejected() {
    let result = UnbalancedMerkleTreeCalculator::new(Vec::<Vec<u8>>::new());
    assert_eq!(result.unwrap_err(), UnbalancedTreeError::EmptyLeaves);
}

#[test]
fn test_single_leaf_is_root() {
    let leaf = hash_leaf(7);
    let calculator = UnbalancedMerkleTreeCalculator::new([leaf.clone()]).expect("build");
    assert_eq!(calculator.root(), leaf.as_slice());
    assert_eq!(calculator.depth(), 0);
    assert_eq!(calculator.hash_calls(), 0);

    let path = calculator
        .sibling_path_by_leaf_index(0)
        .expect("path of single leaf");
    assert!(path.is_empty());
    assert_eq!(path.len(), 0);
}

#[test]
fn test_three_leaves_shift_last_leaf() {
    let (a, b, c) = (hash_leaf(0), hash_leaf(1), hash_leaf(2));
    let calculator =
        UnbalancedMerkleTreeCalculator::new([a.clone(), b.clone(), c.clone()]).expect("build");
    assert_eq!(calculator.root(), h(&h(&a, &b), &c).as_slice());
    assert_eq!(calculator.hash_calls(), 2);
    assert_eq!(calculator.leaf_location(2), Some(TreePosition::new(1, 1)));

    let path_a = calculator.sibling_path_by_leaf_index(0).expect("path a");
    assert_eq!(path_a.nodes(), &[b.clone(), c.clone()]);
    let path_c = calculator.sibling_path_by_leaf_index(2).expect("path c");
    assert_eq!(path_c.nodes(), &[h(&a, &b)]);
}

#[test]
fn test_compressed_left_leaf_promotes_sibling_to_root() {
    let b = hash_leaf(1);
    let calculator = UnbalancedMerkleTreeCalculator::new([Vec::new(), b.clone()]).expect("build");
    assert_eq!(calculator.root(), b.as_slice());
    assert_eq!(calculator.hash_calls(), 0);
    assert_eq!(calculator.leaf_location(1), Some(TreePosition::new(1, 0)));
    assert!(
        calculator
            .sibling_path(&b)
            .expect("path of promoted leaf")
            .is_empty()
    );
}

#[test]
fn test_all_compressed_root_is_zero_hash_width() {
    let calculator =
        UnbalancedMerkleTreeCalculator::new(vec![Vec::<u8>::new(); 5]).expect("build");
    assert_eq!(calculator.root(), [0u8; 32].as_slice());
    assert_eq!(calculator.hash_calls(), 0);

    let options = CalculatorOptions::default()
        .with_value_to_compress([9u8; 4])
        .with_hasher(FnPairHasher::new(|l: &[u8], r: &[u8]| [l, r].concat(), 8));
    let calculator =
        UnbalancedMerkleTreeCalculator::with_options([[9u8; 4]; 3], options).expect("build");
    assert_eq!(calculator.root(), [0u8; 8].as_slice());

    let single = UnbalancedMerkleTreeCalculator::new([Vec::<u8>::new()]).expect("build");
    assert_eq!(single.root(), [0u8; 32].as_slice());
}

#[test]
fn test_power_of_two_is_balanced() {
    let leaves: Vec<Vec<u8>> = (0..8).map(hash_leaf).collect();
    let calculator = UnbalancedMerkleTreeCalculator::new(leaves.clone()).expect("build");

    let level1: Vec<Vec<u8>> = leaves.chunks(2).map(|p| h(&p[0], &p[1])).collect();
    let level2: Vec<Vec<u8>> = level1.chunks(2).map(|p| h(&p[0], &p[1])).collect();
    let root = h(&level2[0], &level2[1]);
    assert_eq!(calculator.root(), root.as_slice());
    assert_eq!(calculator.depth(), 3);
    assert_eq!(calculator.hash_calls(), 7);
}

#[test]
fn test_uncompressed_shapes() {
    assert_eq!(shape_root("AB"), "(A,B)");
    assert_eq!(shape_root("ABC"), "((A,B),C)");
    assert_eq!(shape_root("ABCDE"), "(((A,B),(C,D)),E)");
    assert_eq!(shape_root("ABCDEF"), "(((A,B),(C,D)),(E,F))");
    assert_eq!(shape_root("ABCDEFG"), "(((A,B),(C,D)),((E,F),G))");
    assert_eq!(shape_root("ABCDEFGHI"), "((((A,B),(C,D)),((E,F),(G,H))),I)");
}

#[test]
fn test_compressed_shapes() {
    assert_eq!(shape_root("_B"), "B");
    assert_eq!(shape_root("A_"), "A");
    assert_eq!(shape_root("A_CD"), "(A,(C,D))");
    assert_eq!(shape_root("AB__"), "(A,B)");
    assert_eq!(shape_root("__CD"), "(C,D)");
    assert_eq!(shape_root("ABCD__GH"), "(((A,B),(C,D)),(G,H))");
    assert_eq!(shape_root("____EF"), "(E,F)");
    assert_eq!(shape_root("_B_D_F_H"), "((B,D),(F,H))");
    assert_eq!(shape_root("A__D"), "(A,D)");
    assert_eq!(shape_root("__C"), "C");
}

#[test]
fn test_even_index_is_left_operand() {
    // D rests at (1, 1) after its compressed sibling drops out, so the
    // hashed pair at level 1 still puts (A,B) on the left.
    assert_eq!(shape_root("AB_D"), "((A,B),D)");
    assert_eq!(shape_root("_BCD"), "(B,(C,D))");
}

#[test]
fn test_root_is_deterministic() {
    let leaves: Vec<Vec<u8>> = (0..13)
        .map(|i| if i % 4 == 1 { Vec::new() } else { hash_leaf(i) })
        .collect();
    let first = UnbalancedMerkleTreeCalculator::new(leaves.clone()).expect("build 1");
    let second = UnbalancedMerkleTreeCalculator::new(leaves.clone()).expect("build 2");
    assert_eq!(first.root(), second.root());
    assert_eq!(
        UnbalancedMerkleTreeCalculator::compute_root(leaves, CalculatorOptions::default())
            .expect("compute root"),
        first.root()
    );
}

#[test]
fn test_hash_calls_count_pairs() {
    let leaves: Vec<Vec<u8>> = (0..11).map(hash_leaf).collect();
    let calculator = UnbalancedMerkleTreeCalculator::new(leaves).expect("build");
    assert_eq!(calculator.hash_calls(), 10);

    let calculator = UnbalancedMerkleTreeCalculator::with_options(
        shape_leaves("AB__E_GH"),
        shape_options(),
    )
    .expect("build");
    assert_eq!(calculator.root(), b"((A,B),(E,(G,H)))");
    assert_eq!(calculator.hash_calls(), 4);
}

// ── Relocation ───────────────────────────────────────────────────────

#[test]
fn test_shifted_subtree_keeps_children_below_it() {
    let calculator = UnbalancedMerkleTreeCalculator::with_options(
        shape_leaves("____EF"),
        shape_options(),
    )
    .expect("build");
    assert_eq!(calculator.root(), b"(E,F)");
    assert_eq!(calculator.leaf_location(4), Some(TreePosition::new(2, 0)));
    assert_eq!(calculator.leaf_location(5), Some(TreePosition::new(2, 1)));
    assert_eq!(
        calculator
            .sibling_path_by_leaf_index(4)
            .expect("path e")
            .nodes(),
        &[b"F".to_vec()]
    );

    let store = calculator.store();
    assert_eq!(
        store.get_node(TreePosition::new(2, 0)).map(TreeNode::leaf_index),
        Some(Some(4))
    );
    assert_eq!(
        store.get_node(TreePosition::new(3, 0)).map(TreeNode::value),
        Some(&b"(E,F)"[..])
    );
}

#[test]
fn test_odd_subtree_shift_lands_under_parent() {
    let calculator = UnbalancedMerkleTreeCalculator::with_options(
        shape_leaves("ABCD__GH"),
        shape_options(),
    )
    .expect("build");
    assert_eq!(calculator.leaf_location(6), Some(TreePosition::new(1, 2)));
    assert_eq!(calculator.leaf_location(7), Some(TreePosition::new(1, 3)));
    assert_eq!(
        calculator
            .sibling_path_by_leaf_index(6)
            .expect("path g")
            .nodes(),
        &[b"H".to_vec(), b"((A,B),(C,D))".to_vec()]
    );
    assert_eq!(
        calculator
            .sibling_path_by_leaf_index(0)
            .expect("path a")
            .nodes(),
        &[b"B".to_vec(), b"(C,D)".to_vec(), b"(G,H)".to_vec()]
    );
}

#[test]
fn test_unrelocated_leaves_stay_on_leaf_row() {
    let calculator = UnbalancedMerkleTreeCalculator::with_options(
        shape_leaves("ABCDE"),
        shape_options(),
    )
    .expect("build");
    for i in 0..4 {
        assert_eq!(calculator.leaf_location(i), Some(TreePosition::leaf(i)));
    }
    assert_eq!(calculator.leaf_location(4), Some(TreePosition::new(2, 1)));
    assert_eq!(calculator.leaf_location(5), None);
}

// ── Sibling paths ────────────────────────────────────────────────────

#[test]
fn test_paths_verify_against_root() {
    let leaves: Vec<Vec<u8>> = (0..13)
        .map(|i| if i % 5 == 3 { Vec::new() } else { hash_leaf(i) })
        .collect();
    let calculator = UnbalancedMerkleTreeCalculator::new(leaves.clone()).expect("build");
    for (i, leaf) in leaves.iter().enumerate() {
        if leaf.is_empty() {
            continue;
        }
        let proof = calculator.leaf_proof(i as u64).expect("leaf proof");
        proof
            .verify(calculator.root(), &Sha256TruncHasher)
            .expect("proof verifies");
        assert_eq!(&proof.leaf, leaf);
        assert_eq!(
            proof.path.len(),
            (calculator.depth() - proof.position.level) as usize
        );
    }
}

#[test]
fn test_path_by_value_matches_path_by_index() {
    let leaves: Vec<Vec<u8>> = (0..6).map(hash_leaf).collect();
    let calculator = UnbalancedMerkleTreeCalculator::new(leaves.clone()).expect("build");
    for (i, leaf) in leaves.iter().enumerate() {
        assert_eq!(
            calculator.sibling_path(leaf).expect("by value"),
            calculator
                .sibling_path_by_leaf_index(i as u64)
                .expect("by index")
        );
    }
    assert_eq!(
        calculator.leaf_proof_for_value(&leaves[3]).expect("proof"),
        calculator.leaf_proof(3).expect("proof")
    );
}

#[test]
fn test_path_by_value_uses_first_match() {
    let calculator = UnbalancedMerkleTreeCalculator::with_options(
        shape_leaves("ABAC"),
        shape_options(),
    )
    .expect("build");
    assert_eq!(
        calculator.sibling_path(b"A").expect("first A"),
        calculator.sibling_path_by_leaf_index(0).expect("index 0")
    );
}

#[test]
fn test_path_errors() {
    let calculator = UnbalancedMerkleTreeCalculator::with_options(
        shape_leaves("A_C"),
        shape_options(),
    )
    .expect("build");

    assert_eq!(
        calculator.sibling_path(b"Z").unwrap_err(),
        UnbalancedTreeError::LeafNotFound(hex::encode(b"Z"))
    );
    assert_eq!(
        calculator.sibling_path_by_leaf_index(3).unwrap_err(),
        UnbalancedTreeError::LeafIndexOutOfBounds {
            index: 3,
            leaf_count: 3
        }
    );
    assert_eq!(
        calculator.sibling_path_by_leaf_index(u64::MAX).unwrap_err(),
        UnbalancedTreeError::LeafIndexOutOfBounds {
            index: u64::MAX,
            leaf_count: 3
        }
    );
    assert_eq!(
        calculator.sibling_path_by_leaf_index(1).unwrap_err(),
        UnbalancedTreeError::LeafCompressed(1)
    );
    assert_eq!(
        calculator.sibling_path(b"_").unwrap_err(),
        UnbalancedTreeError::LeafCompressed(1)
    );
    assert_eq!(calculator.leaf_location(1), None);
}

#[test]
fn test_custom_compressed_value_with_blake3() {
    let zero = [0u8; 32];
    let leaves = vec![
        hash_leaf(0),
        zero.to_vec(),
        hash_leaf(2),
        hash_leaf(3),
        zero.to_vec(),
    ];
    let options = CalculatorOptions::new(zero, Blake3PairHasher);
    let calculator =
        UnbalancedMerkleTreeCalculator::with_options(leaves.clone(), options).expect("build");

    let b3 = |l: &[u8], r: &[u8]| Blake3PairHasher.hash_pair(l, r);
    let expected = b3(&leaves[0], &b3(&leaves[2], &leaves[3]));
    assert_eq!(calculator.root(), expected.as_slice());

    let proof = calculator.leaf_proof(2).expect("proof");
    proof
        .verify(calculator.root(), &Blake3PairHasher)
        .expect("verifies with blake3");
    assert!(proof.verify(calculator.root(), &Sha256TruncHasher).is_err());
}

// ── Path encoding and verification ───────────────────────────────────

#[test]
fn test_sibling_path_encoding() {
    let leaves: Vec<Vec<u8>> = (0..5).map(hash_leaf).collect();
    let calculator = UnbalancedMerkleTreeCalculator::new(leaves).expect("build");
    let path = calculator.sibling_path_by_leaf_index(1).expect("path");

    let bytes = path.encode_to_vec().expect("encode");
    let decoded = SiblingPath::decode_from_slice(&bytes).expect("decode");
    assert_eq!(decoded, path);

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert!(matches!(
        SiblingPath::decode_from_slice(&trailing),
        Err(UnbalancedTreeError::InvalidPath(_))
    ));
    assert!(SiblingPath::decode_from_slice(&bytes[..bytes.len() - 1]).is_err());
}

#[test]
fn test_leaf_proof_encoding_verifies_after_decode() {
    let leaves: Vec<Vec<u8>> = (0..7)
        .map(|i| if i == 4 { Vec::new() } else { hash_leaf(i) })
        .collect();
    let calculator = UnbalancedMerkleTreeCalculator::new(leaves).expect("build");
    let proof = calculator.leaf_proof(5).expect("proof");
    let decoded =
        LeafProof::decode_from_slice(&proof.encode_to_vec().expect("encode")).expect("decode");
    assert_eq!(decoded, proof);
    decoded
        .verify(calculator.root(), &Sha256TruncHasher)
        .expect("decoded proof verifies");
}

#[test]
fn test_overlong_path_rejected() {
    let path = SiblingPath::new(vec![vec![0u8]; 65]);
    let bytes = path.encode_to_vec().expect("encode");
    assert!(matches!(
        SiblingPath::decode_from_slice(&bytes),
        Err(UnbalancedTreeError::InvalidPath(_))
    ));
    assert!(path.compute_root(b"x", 0, &Sha256TruncHasher).is_err());
}

#[test]
fn test_verify_rejects_tampering() {
    let leaves: Vec<Vec<u8>> = (0..6).map(hash_leaf).collect();
    let calculator = UnbalancedMerkleTreeCalculator::new(leaves.clone()).expect("build");
    let proof = calculator.leaf_proof(2).expect("proof");

    let hasher = Sha256TruncHasher;
    let root = calculator.root();
    let index = proof.position.index;

    let wrong_leaf = hash_leaf(99);
    assert!(proof.path.verify(&wrong_leaf, index, root, &hasher).is_err());
    // Flipping the orientation of the first step changes the root.
    assert!(proof.path.verify(&proof.leaf, index ^ 1, root, &hasher).is_err());
    let too_far = 1u64 << proof.path.len();
    assert!(matches!(
        proof.path.compute_root(&proof.leaf, too_far, &hasher),
        Err(UnbalancedTreeError::InvalidPath(_))
    ));
}
