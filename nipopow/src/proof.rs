// Succinct chain proofs
// Validity checking, comparison against competing proofs, and the wire codec

use crate::algos::NipopowAlgos;
use crate::popow_header::{PoPowHeader, PoPowHeaderSerializer};
use aurum_core::{ByteReader, ByteWriter, Header, HeaderSerializer, SerializeError};
use serde::{Deserialize, Serialize};

/// Network modifier type id of a full proof
pub const NIPOPOW_PROOF_TYPE_ID: u8 = 105;

/// Succinct proof that a chain suffix is anchored in a long history
///
/// The sparse prefix spans the chain from genesis up to the suffix with
/// enough superblocks per level to witness the accumulated work; the last
/// `k` headers are carried in full so recent reorgs stay visible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NipopowProof {
    pub m: u32,
    pub k: u32,
    pub prefix: Vec<PoPowHeader>,
    pub suffix_head: PoPowHeader,
    pub suffix_tail: Vec<Header>,
}

impl NipopowProof {
    /// All headers of the proof, prefix then suffix, ascending by height
    pub fn headers_chain(&self) -> Vec<Header> {
        self.prefix_headers()
            .into_iter()
            .chain(self.suffix_headers())
            .collect()
    }

    pub fn prefix_headers(&self) -> Vec<Header> {
        self.prefix.iter().map(|h| h.header.clone()).collect()
    }

    pub fn suffix_headers(&self) -> Vec<Header> {
        std::iter::once(self.suffix_head.header.clone())
            .chain(self.suffix_tail.iter().cloned())
            .collect()
    }

    /// Prefix headers of superblock level at least `level`
    pub fn chain_of_level<'a>(
        &'a self,
        algos: &NipopowAlgos,
        level: i32,
    ) -> Vec<&'a PoPowHeader> {
        self.prefix
            .iter()
            .filter(|h| algos.max_level_of(&h.header) >= level)
            .collect()
    }

    /// Whether this proof should replace `that` as the adopted one
    ///
    /// A valid proof beats an invalid one. Two valid proofs compare by the
    /// best score of their chains past the common ancestor, or of the whole
    /// chains when the anchors differ. Ties keep the incumbent.
    pub fn is_better_than(&self, that: &NipopowProof, algos: &NipopowAlgos) -> bool {
        if !(self.is_valid() && that.is_valid()) {
            return self.is_valid();
        }
        let own_chain = self.headers_chain();
        let other_chain = that.headers_chain();
        let (own_score, other_score) =
            match NipopowAlgos::lowest_common_ancestor(&own_chain, &other_chain) {
                Some(lca) => {
                    let own: Vec<Header> = own_chain
                        .iter()
                        .filter(|h| h.height > lca.height)
                        .cloned()
                        .collect();
                    let other: Vec<Header> = other_chain
                        .iter()
                        .filter(|h| h.height > lca.height)
                        .cloned()
                        .collect();
                    (algos.best_arg(&own, self.m), algos.best_arg(&other, self.m))
                }
                None => (
                    algos.best_arg(&own_chain, self.m),
                    algos.best_arg(&other_chain, self.m),
                ),
            };
        own_score > other_score
    }

    /// Structural validity: strictly increasing heights and connected links
    ///
    /// Invalidity is silent; peers sending bad proofs are handled upstream.
    pub fn is_valid(&self) -> bool {
        self.has_valid_heights() && self.has_valid_connections()
    }

    fn has_valid_heights(&self) -> bool {
        let chain = self.headers_chain();
        chain.windows(2).all(|w| w[0].height < w[1].height)
    }

    // Adjacent prefix blocks must be linked via interlink or parent id; the
    // suffix is a contiguous run of parent links.
    fn has_valid_connections(&self) -> bool {
        let prefix_connected = self.prefix.windows(2).all(|w| connected(&w[0], &w[1]));
        let head_connected = match self.prefix.last() {
            Some(last) => connected(last, &self.suffix_head),
            None => true,
        };
        let suffix = self.suffix_headers();
        let suffix_connected = suffix.windows(2).all(|w| w[1].parent_id == w[0].id());
        prefix_connected && head_connected && suffix_connected
    }
}

fn connected(prev: &PoPowHeader, next: &PoPowHeader) -> bool {
    let prev_id = prev.id();
    next.interlinks.contains(&prev_id) || next.header.parent_id == prev_id
}

/// Wire codec for full proofs
pub struct NipopowProofSerializer;

impl NipopowProofSerializer {
    pub fn serialize(proof: &NipopowProof) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_uint(proof.m as u64);
        w.put_uint(proof.k as u64);
        w.put_uint(proof.prefix.len() as u64);
        for popow_header in &proof.prefix {
            let bytes = PoPowHeaderSerializer::to_bytes(popow_header);
            w.put_uint(bytes.len() as u64);
            w.put_bytes(&bytes);
        }
        let head_bytes = PoPowHeaderSerializer::to_bytes(&proof.suffix_head);
        w.put_uint(head_bytes.len() as u64);
        w.put_bytes(&head_bytes);
        w.put_uint(proof.suffix_tail.len() as u64);
        for header in &proof.suffix_tail {
            let bytes = header.bytes();
            w.put_uint(bytes.len() as u64);
            w.put_bytes(&bytes);
        }
        w.into_bytes()
    }

    pub fn parse(bytes: &[u8]) -> Result<NipopowProof, SerializeError> {
        let mut r = ByteReader::new(bytes);
        let m = r.get_uint32()?;
        let k = r.get_uint32()?;
        let prefix_count = r.get_count(1)?;
        let mut prefix = Vec::with_capacity(prefix_count);
        for _ in 0..prefix_count {
            let len = r.get_length()?;
            prefix.push(PoPowHeaderSerializer::parse_bytes(r.get_bytes(len)?)?);
        }
        let head_len = r.get_length()?;
        let suffix_head = PoPowHeaderSerializer::parse_bytes(r.get_bytes(head_len)?)?;
        let tail_count = r.get_count(1)?;
        let mut suffix_tail = Vec::with_capacity(tail_count);
        for _ in 0..tail_count {
            let len = r.get_length()?;
            suffix_tail.push(HeaderSerializer::parse_bytes(r.get_bytes(len)?)?);
        }
        r.expect_empty()?;
        Ok(NipopowProof {
            m,
            k,
            prefix,
            suffix_head,
            suffix_tail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PoPowParams;
    use crate::test_utils::{extend_chain, make_chain, MockPow};
    use sha2::{Digest, Sha256};
    use std::sync::Arc;

    fn proven_chain() -> (NipopowAlgos, NipopowProof) {
        let pow = MockPow::with_levels(&[(6, 1)]);
        let algos = NipopowAlgos::new(Arc::new(pow));
        let chain = make_chain(13, &algos);
        let proof = algos.prove(&chain, &PoPowParams::new(6, 6)).unwrap();
        (algos, proof)
    }

    #[test]
    fn test_honest_proof_is_valid() {
        let (_, proof) = proven_chain();
        assert!(proof.is_valid());
        assert_eq!(proof.suffix_tail.len(), 5);
    }

    #[test]
    fn test_height_regression_invalidates() {
        let (_, mut proof) = proven_chain();
        proof.prefix.swap(0, 1);
        assert!(!proof.is_valid());
    }

    #[test]
    fn test_broken_suffix_link_invalidates() {
        let (_, mut proof) = proven_chain();
        proof.suffix_tail[2].parent_id = aurum_core::BlockId::from_bytes([0xaa; 32]);
        assert!(!proof.is_valid());
    }

    #[test]
    fn test_serializer_round_trip() {
        let (_, proof) = proven_chain();
        let bytes = NipopowProofSerializer::serialize(&proof);
        let parsed = NipopowProofSerializer::parse(&bytes).unwrap();
        assert_eq!(parsed, proof);
        assert!(parsed.is_valid());
    }

    #[test]
    fn test_serializer_rejects_truncation_and_garbage() {
        let (_, proof) = proven_chain();
        let bytes = NipopowProofSerializer::serialize(&proof);
        for cut in [1, bytes.len() / 2, bytes.len() - 1] {
            assert!(NipopowProofSerializer::parse(&bytes[..cut]).is_err());
        }
        let mut trailing = bytes.clone();
        trailing.push(0);
        assert_eq!(
            NipopowProofSerializer::parse(&trailing),
            Err(SerializeError::TrailingBytes)
        );
    }

    #[test]
    fn test_serialization_is_bit_stable() {
        // Two proofs built from independently materialized chains must agree
        // byte for byte, pinned through a digest of the stream
        let (_, first) = proven_chain();
        let (_, second) = proven_chain();
        let first_bytes = NipopowProofSerializer::serialize(&first);
        let second_bytes = NipopowProofSerializer::serialize(&second);
        assert_eq!(first_bytes, second_bytes);
        assert_eq!(
            Sha256::digest(&first_bytes),
            Sha256::digest(&second_bytes)
        );
        assert_eq!(NipopowProofSerializer::parse(&first_bytes).unwrap(), first);
    }

    #[test]
    fn test_json_round_trip() {
        let (_, proof) = proven_chain();
        let json = serde_json::to_string(&proof).unwrap();
        let back: NipopowProof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn test_chain_of_level() {
        let (algos, proof) = proven_chain();
        let level0 = proof.chain_of_level(&algos, 0);
        assert_eq!(level0.len(), proof.prefix.len());
        let level1 = proof.chain_of_level(&algos, 1);
        let level1_heights: Vec<u32> = level1.iter().map(|h| h.height()).collect();
        assert_eq!(level1_heights, vec![1, 6]);
    }

    // Forked histories sharing a trunk; fork A carries three level-2
    // superblocks, fork B only two.
    fn competing_proofs() -> (NipopowAlgos, NipopowProof, NipopowProof) {
        let pow = MockPow::with_levels(&[
            ((1 << 32) | 9, 2),
            ((1 << 32) | 10, 2),
            ((1 << 32) | 11, 2),
            ((2 << 32) | 9, 2),
            ((2 << 32) | 10, 2),
        ]);
        let algos = NipopowAlgos::new(Arc::new(pow));
        let trunk = make_chain(8, &algos);
        let chain_a = extend_chain(&trunk, 1, 8, &algos);
        let chain_b = extend_chain(&trunk, 2, 8, &algos);
        let params = PoPowParams::new(2, 2);
        let proof_a = algos.prove(&chain_a, &params).unwrap();
        let proof_b = algos.prove(&chain_b, &params).unwrap();
        (algos, proof_a, proof_b)
    }

    #[test]
    fn test_comparator_prefers_more_superblocks() {
        let (algos, proof_a, proof_b) = competing_proofs();
        assert!(proof_a.is_valid() && proof_b.is_valid());
        assert!(proof_a.is_better_than(&proof_b, &algos));
        assert!(!proof_b.is_better_than(&proof_a, &algos));
    }

    #[test]
    fn test_comparator_is_antisymmetric() {
        let (algos, proof_a, proof_b) = competing_proofs();
        assert!(
            !(proof_a.is_better_than(&proof_b, &algos)
                && proof_b.is_better_than(&proof_a, &algos))
        );
        // A proof never beats itself
        assert!(!proof_a.is_better_than(&proof_a.clone(), &algos));
    }

    #[test]
    fn test_invalid_proof_always_loses() {
        let (algos, proof_a, proof_b) = competing_proofs();
        let mut broken = proof_b.clone();
        broken.prefix.swap(0, 1);
        assert!(!broken.is_valid());
        assert!(proof_a.is_better_than(&broken, &algos));
        assert!(!broken.is_better_than(&proof_a, &algos));

        let mut also_broken = proof_a.clone();
        also_broken.suffix_head.header.parent_id = aurum_core::BlockId::from_bytes([1; 32]);
        also_broken.suffix_head.interlinks.clear();
        assert!(!also_broken.is_valid());
        // Two invalid proofs never replace each other
        assert!(!also_broken.is_better_than(&broken, &algos));
        assert!(!broken.is_better_than(&also_broken, &algos));
    }
}
