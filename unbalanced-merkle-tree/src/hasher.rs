//! Pairing hashes used to merge two sibling nodes into their parent.
//!
//! - [`Sha256TruncHasher`] (default): `0x00 || sha256(left || right)[..31]`,
//!   a 32-byte value that always fits a 254-bit field element.
//! - [`Blake3PairHasher`]: `blake3(0x01 || left || right)`, the internal-node
//!   merge with a domain tag.
//! - [`FnPairHasher`]: any closure, for protocols with their own hash.

use sha2::{Digest, Sha256};

/// Domain tag prepended to internal merge inputs by [`Blake3PairHasher`].
const INTERNAL_TAG: u8 = 0x01;

/// Merges a left and a right sibling into their parent value.
///
/// The left operand is always the node with the even index within its pair.
pub trait PairHasher {
    /// Hash `left || right` into the parent value.
    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8>;

    /// Width in bytes of every value returned by [`hash_pair`].
    ///
    /// Also the width of the zero root of a fully compressed tree.
    ///
    /// [`hash_pair`]: PairHasher::hash_pair
    fn output_len(&self) -> usize;
}

impl<H: PairHasher + ?Sized> PairHasher for &H {
    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        (**self).hash_pair(left, right)
    }

    fn output_len(&self) -> usize {
        (**self).output_len()
    }
}

/// SHA-256 truncated to 31 bytes and left-padded with a zero byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256TruncHasher;

impl PairHasher for Sha256TruncHasher {
    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(left);
        hasher.update(right);
        let digest = hasher.finalize();
        let mut out = vec![0u8; 32];
        out[1..].copy_from_slice(&digest[..31]);
        out
    }

    fn output_len(&self) -> usize {
        32
    }
}

/// `blake3(0x01 || left || right)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3PairHasher;

impl PairHasher for Blake3PairHasher {
    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[INTERNAL_TAG]);
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().as_bytes().to_vec()
    }

    fn output_len(&self) -> usize {
        blake3::OUT_LEN
    }
}

/// Wraps a closure as a [`PairHasher`].
///
/// The closure must always return `output_len` bytes.
#[derive(Clone, Copy)]
pub struct FnPairHasher<F> {
    hash: F,
    output_len: usize,
}

impl<F> FnPairHasher<F>
where
    F: Fn(&[u8], &[u8]) -> Vec<u8>,
{
    /// Wrap `hash`, whose outputs are `output_len` bytes wide.
    pub fn new(hash: F, output_len: usize) -> Self {
        FnPairHasher { hash, output_len }
    }
}

impl<F> PairHasher for FnPairHasher<F>
where
    F: Fn(&[u8], &[u8]) -> Vec<u8>,
{
    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        (self.hash)(left, right)
    }

    fn output_len(&self) -> usize {
        self.output_len
    }
}

impl<F> std::fmt::Debug for FnPairHasher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPairHasher")
            .field("output_len", &self.output_len)
            .finish_non_exhaustive()
    }
}
