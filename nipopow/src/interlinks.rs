// Interlink vector codec
// Packs per-header superchain pointers into extension fields and back

use crate::error::NipopowError;
use aurum_core::{BlockId, ExtensionCandidate, MerkleProof};

/// Reserved extension key prefix for interlink fields
pub const INTERLINK_VECTOR_PREFIX: u8 = 0x01;

/// Packed field value length: one count byte plus a 32-byte id
const PACKED_VALUE_LENGTH: usize = 33;

/// Pack an interlink vector into extension key-value fields
///
/// Consecutive duplicate ids are run-length compressed: each run becomes one
/// field keyed by its group index, with the run length in the first value
/// byte. Runs longer than 255 spill into further groups.
pub fn pack_interlinks(links: &[BlockId]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut fields = Vec::new();
    let mut pos = 0;
    while pos < links.len() {
        let id = links[pos];
        let mut count = 1usize;
        while pos + count < links.len() && links[pos + count] == id && count < u8::MAX as usize {
            count += 1;
        }
        let key = vec![INTERLINK_VECTOR_PREFIX, fields.len() as u8];
        let mut value = Vec::with_capacity(PACKED_VALUE_LENGTH);
        value.push(count as u8);
        value.extend_from_slice(id.as_bytes());
        fields.push((key, value));
        pos += count;
    }
    fields
}

/// Expand packed interlink fields back into the vector
///
/// Fields under other key prefixes are ignored. Any interlink field whose
/// value is not exactly 33 bytes fails the whole unpacking.
pub fn unpack_interlinks(fields: &[(Vec<u8>, Vec<u8>)]) -> Result<Vec<BlockId>, NipopowError> {
    let mut links = Vec::new();
    for (key, value) in fields {
        if key.first() != Some(&INTERLINK_VECTOR_PREFIX) {
            continue;
        }
        if value.len() != PACKED_VALUE_LENGTH {
            return Err(NipopowError::MalformedInterlinks(format!(
                "field value of {} bytes, expected {PACKED_VALUE_LENGTH}",
                value.len()
            )));
        }
        let count = value[0] as usize;
        let id = BlockId::from_slice(&value[1..]).ok_or_else(|| {
            NipopowError::MalformedInterlinks("field id is not 32 bytes".into())
        })?;
        links.extend(std::iter::repeat(id).take(count));
    }
    Ok(links)
}

/// Wrap a packed interlink vector into an extension candidate
pub fn interlinks_to_extension(links: &[BlockId]) -> Result<ExtensionCandidate, NipopowError> {
    ExtensionCandidate::new(pack_interlinks(links))
        .map_err(|e| NipopowError::MalformedInterlinks(e.to_string()))
}

/// Merkle inclusion proof for the interlink field carrying `block_id`
pub fn proof_for_interlink(
    ext: &ExtensionCandidate,
    block_id: &BlockId,
) -> Option<MerkleProof> {
    ext.fields()
        .iter()
        .find(|(key, value)| {
            key.first() == Some(&INTERLINK_VECTOR_PREFIX)
                && value.len() == PACKED_VALUE_LENGTH
                && value[1..] == block_id.as_bytes()[..]
        })
        .and_then(|(key, _)| ext.proof_for(key))
}
