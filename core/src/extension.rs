// Extension section
// Ordered key-value fields committed by a header, with Merkle inclusion proofs

use crate::id::BlockId;
use crate::serialize::SerializeError;

/// Extension key length in bytes
pub const KEY_LENGTH: usize = 2;

/// Maximum length of a single field value
pub const MAX_FIELD_VALUE_LENGTH: usize = 64;

/// Side of a sibling digest on a Merkle path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Merkle inclusion proof for a single extension field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    /// Digest of the proven leaf
    pub leaf: BlockId,
    /// Sibling digests from the leaf up to the root
    pub path: Vec<(BlockId, Side)>,
}

impl MerkleProof {
    /// Check the proof against an expected root digest
    pub fn valid(&self, root: &BlockId) -> bool {
        let mut acc = self.leaf;
        for (sibling, side) in &self.path {
            acc = match side {
                Side::Left => combine(sibling, &acc),
                Side::Right => combine(&acc, sibling),
            };
        }
        acc == *root
    }
}

/// Extension section of a block before it is committed by a header
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionCandidate {
    fields: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ExtensionCandidate {
    /// Build a candidate, validating the shape of every field
    pub fn new(fields: Vec<(Vec<u8>, Vec<u8>)>) -> Result<Self, SerializeError> {
        for (key, value) in &fields {
            if key.len() != KEY_LENGTH {
                return Err(SerializeError::InvalidValue(format!(
                    "extension key of {} bytes, expected {}",
                    key.len(),
                    KEY_LENGTH
                )));
            }
            if value.len() > MAX_FIELD_VALUE_LENGTH {
                return Err(SerializeError::InvalidValue(format!(
                    "extension value of {} bytes exceeds {}",
                    value.len(),
                    MAX_FIELD_VALUE_LENGTH
                )));
            }
        }
        Ok(ExtensionCandidate { fields })
    }

    pub fn fields(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.fields
    }

    /// Merkle root digest over the ordered fields
    pub fn digest(&self) -> BlockId {
        merkle_root(&self.leaves())
    }

    /// Inclusion proof for the first field with the given key
    pub fn proof_for(&self, key: &[u8]) -> Option<MerkleProof> {
        let index = self.fields.iter().position(|(k, _)| k.as_slice() == key)?;
        Some(merkle_proof(&self.leaves(), index))
    }

    fn leaves(&self) -> Vec<BlockId> {
        self.fields.iter().map(|(k, v)| field_leaf(k, v)).collect()
    }
}

fn field_leaf(key: &[u8], value: &[u8]) -> BlockId {
    let mut data = Vec::with_capacity(2 + key.len() + value.len());
    data.push(key.len() as u8);
    data.extend_from_slice(key);
    data.push(value.len() as u8);
    data.extend_from_slice(value);
    BlockId::of(&data)
}

fn combine(left: &BlockId, right: &BlockId) -> BlockId {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(left.as_bytes());
    data.extend_from_slice(right.as_bytes());
    BlockId::of(&data)
}

fn merkle_root(leaves: &[BlockId]) -> BlockId {
    if leaves.is_empty() {
        return BlockId::ZERO;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for chunk in level.chunks(2) {
            if chunk.len() == 2 {
                next.push(combine(&chunk[0], &chunk[1]));
            } else {
                // Odd node is promoted unchanged
                next.push(chunk[0]);
            }
        }
        level = next;
    }
    level[0]
}

fn merkle_proof(leaves: &[BlockId], index: usize) -> MerkleProof {
    let leaf = leaves[index];
    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    let mut idx = index;
    while level.len() > 1 {
        if idx % 2 == 0 {
            if idx + 1 < level.len() {
                path.push((level[idx + 1], Side::Right));
            }
        } else {
            path.push((level[idx - 1], Side::Left));
        }
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for chunk in level.chunks(2) {
            if chunk.len() == 2 {
                next.push(combine(&chunk[0], &chunk[1]));
            } else {
                next.push(chunk[0]);
            }
        }
        level = next;
        idx /= 2;
    }
    MerkleProof { leaf, path }
}
