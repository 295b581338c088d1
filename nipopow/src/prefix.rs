// Detachable proof prefix
// Propagated separately from the short suffix during bootstrapping

use crate::algos::NipopowAlgos;
use crate::popow_header::{PoPowHeader, PoPowHeaderSerializer};
use aurum_core::{BlockId, ByteReader, ByteWriter, Header, SerializeError};
use serde::{Deserialize, Serialize};

/// Network modifier type id of a detached proof prefix
pub const NIPOPOW_PREFIX_TYPE_ID: u8 = 111;

/// Prefix-only proof variant referencing its suffix by id
///
/// Used when the large prefix and the short suffix travel as separate
/// network messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NipopowProofPrefix {
    pub m: u32,
    pub chain: Vec<PoPowHeader>,
    pub suffix_id: BlockId,
}

impl NipopowProofPrefix {
    pub fn headers_chain(&self) -> Vec<Header> {
        self.chain.iter().map(|h| h.header.clone()).collect()
    }

    /// Structural validity of the detached chain
    pub fn is_valid(&self) -> bool {
        let heights_ok = self
            .chain
            .windows(2)
            .all(|w| w[0].height() < w[1].height());
        let links_ok = self.chain.windows(2).all(|w| {
            let prev_id = w[0].id();
            w[1].interlinks.contains(&prev_id) || w[1].header.parent_id == prev_id
        });
        heights_ok && links_ok
    }

    /// Compare two detached prefixes by the score of their diverging chains
    pub fn is_better_than(&self, that: &NipopowProofPrefix, algos: &NipopowAlgos) -> bool {
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
}

/// Wire codec for detached prefixes
pub struct NipopowProofPrefixSerializer;

impl NipopowProofPrefixSerializer {
    pub fn serialize(prefix: &NipopowProofPrefix) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_uint(prefix.m as u64);
        w.put_block_id(&prefix.suffix_id);
        w.put_uint(prefix.chain.len() as u64);
        for popow_header in &prefix.chain {
            let bytes = PoPowHeaderSerializer::to_bytes(popow_header);
            w.put_uint(bytes.len() as u64);
            w.put_bytes(&bytes);
        }
        w.into_bytes()
    }

    pub fn parse(bytes: &[u8]) -> Result<NipopowProofPrefix, SerializeError> {
        let mut r = ByteReader::new(bytes);
        let m = r.get_uint32()?;
        let suffix_id = r.get_block_id()?;
        let chain_count = r.get_count(1)?;
        let mut chain = Vec::with_capacity(chain_count);
        for _ in 0..chain_count {
            let len = r.get_length()?;
            chain.push(PoPowHeaderSerializer::parse_bytes(r.get_bytes(len)?)?);
        }
        r.expect_empty()?;
        Ok(NipopowProofPrefix {
            m,
            chain,
            suffix_id,
        })
    }
}
