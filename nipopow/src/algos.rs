// Proof construction algorithms
// Superblock level calculus, interlink maintenance, and the two prover paths

use crate::error::NipopowError;
use crate::history::HistoryReader;
use crate::params::PoPowParams;
use crate::popow_header::PoPowHeader;
use crate::proof::NipopowProof;
use aurum_core::{
    decode_compact_bits, pow_modulus, BlockId, Header, PowScheme, GENESIS_HEIGHT,
};
use num_traits::{ToPrimitive, Zero};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

// Levels above this cannot change a saturated u64 score
const MAX_SCORED_LEVEL: u32 = 64;

/// Proof construction and scoring, parameterized by the PoW scheme
pub struct NipopowAlgos {
    pow: Arc<dyn PowScheme>,
}

impl NipopowAlgos {
    pub fn new(pow: Arc<dyn PowScheme>) -> Self {
        NipopowAlgos { pow }
    }

    /// Superblock level of a header
    ///
    /// Genesis belongs to every superchain. For any other header the level
    /// is the number of bits by which its hit beat the required target.
    pub fn max_level_of(&self, header: &Header) -> i32 {
        if header.is_genesis() {
            return i32::MAX;
        }
        let difficulty = decode_compact_bits(header.n_bits);
        if difficulty.is_zero() {
            return 0;
        }
        let target = pow_modulus() / &difficulty;
        let hit = self.pow.pow_hit(header);
        if hit.is_zero() {
            return i32::MAX;
        }
        let target_log = target.to_f64().unwrap_or(f64::INFINITY).log2();
        let hit_log = hit.to_f64().unwrap_or(f64::INFINITY).log2();
        (target_log - hit_log).floor() as i32
    }

    /// Interlink vector of the block following `prev_header`
    ///
    /// The vector keeps the genesis id at position 0; a parent of level `n`
    /// replaces the last `n` tail entries with its own id.
    pub fn update_interlinks(
        &self,
        prev_header: &Header,
        prev_interlinks: &[BlockId],
    ) -> Result<Vec<BlockId>, NipopowError> {
        if prev_header.is_genesis() {
            return Ok(vec![prev_header.id()]);
        }
        if prev_interlinks.is_empty() {
            return Err(NipopowError::MalformedInterlinks(
                "non-genesis parent with empty interlink vector".into(),
            ));
        }
        let genesis = prev_interlinks[0];
        let tail = &prev_interlinks[1..];
        let level = self.max_level_of(prev_header);
        if level <= 0 {
            return Ok(prev_interlinks.to_vec());
        }
        let level = level as usize;
        let kept = tail.len().saturating_sub(level);
        let mut links = Vec::with_capacity(1 + kept + level);
        links.push(genesis);
        links.extend_from_slice(&tail[..kept]);
        links.extend(std::iter::repeat(prev_header.id()).take(level));
        Ok(links)
    }

    /// Best scoring argument of a chain: `max` over admissible levels of
    /// `2^level * count`
    ///
    /// Level 0 counts the whole chain and is always admissible; a higher
    /// level is admitted while it still holds at least `m` headers. The
    /// score saturates at `u64::MAX` instead of wrapping.
    pub fn best_arg(&self, chain: &[Header], m: u32) -> u64 {
        let mut best = chain.len() as u128;
        for level in 1..=MAX_SCORED_LEVEL {
            let count = chain
                .iter()
                .filter(|h| self.max_level_of(h) >= level as i32)
                .count();
            if count < m as usize {
                break;
            }
            best = best.max((1u128 << level) * count as u128);
        }
        u64::try_from(best).unwrap_or(u64::MAX)
    }

    /// Last header two chains share, provided they share their first header
    ///
    /// Chains with different anchors have no common ancestor here even if
    /// they intersect later.
    pub fn lowest_common_ancestor(left: &[Header], right: &[Header]) -> Option<Header> {
        let left_head = left.first()?;
        let right_head = right.first()?;
        if left_head.id() != right_head.id() {
            return None;
        }
        let right_ids: HashSet<BlockId> = right.iter().map(|h| h.id()).collect();
        left.iter()
            .filter(|h| right_ids.contains(&h.id()))
            .last()
            .cloned()
    }

    /// Build a proof from a fully materialized chain in ascending height order
    pub fn prove(
        &self,
        chain: &[PoPowHeader],
        params: &PoPowParams,
    ) -> Result<NipopowProof, NipopowError> {
        params.validate()?;
        let k = params.k as usize;
        let m = params.m as usize;
        if chain.len() < k + m {
            return Err(NipopowError::InsufficientChain {
                got: chain.len(),
                need: k + m,
            });
        }
        if !chain[0].header.is_genesis() {
            return Err(NipopowError::NotAnchored);
        }

        let suffix = &chain[chain.len() - k..];
        let suffix_head = suffix[0].clone();
        let suffix_tail: Vec<Header> = suffix[1..].iter().map(|h| h.header.clone()).collect();

        let body = &chain[..chain.len() - k];
        let max_level = body[body.len() - 1].interlinks.len().saturating_sub(1) as i32;

        let mut collected: HashMap<BlockId, PoPowHeader> = HashMap::new();
        let mut anchor_height = chain[0].height();
        let mut level = max_level;
        while level >= 0 {
            let sub: Vec<&PoPowHeader> = body
                .iter()
                .filter(|h| {
                    self.max_level_of(&h.header) >= level && h.height() >= anchor_height
                })
                .collect();
            if sub.len() > m {
                anchor_height = sub[sub.len() - m].height();
            }
            for h in sub {
                collected.insert(h.id(), h.clone());
            }
            level -= 1;
        }

        let mut prefix: Vec<PoPowHeader> = collected.into_values().collect();
        prefix.sort_by_key(|h| h.height());
        debug!(prefix_len = prefix.len(), k, m, "built proof from materialized chain");

        Ok(NipopowProof {
            m: params.m,
            k: params.k,
            prefix,
            suffix_head,
            suffix_tail,
        })
    }

    /// Build a proof from a history reader
    ///
    /// With `header_id` set, the proof's suffix starts at that header;
    /// otherwise the suffix is the top of the best chain.
    pub fn prove_with_reader(
        &self,
        reader: &dyn HistoryReader,
        header_id: Option<BlockId>,
        params: &PoPowParams,
    ) -> Result<NipopowProof, NipopowError> {
        params.validate()?;
        let k = params.k;
        let m = params.m as usize;
        let height = reader.headers_height();
        if (height as u64) < k as u64 + params.m as u64 {
            return Err(NipopowError::InsufficientChain {
                got: height as usize,
                need: (k + params.m) as usize,
            });
        }

        let (suffix_head, suffix_tail) = match header_id {
            Some(id) => {
                let head = reader
                    .popow_header(&id)
                    .ok_or(NipopowError::MissingHeader(id))?;
                let tail = reader.best_headers_after(&head.header, k - 1);
                (head, tail)
            }
            None => {
                let last = reader.last_headers(k);
                let first = last.first().ok_or(NipopowError::EmptyChain)?;
                let first_id = first.id();
                let head = reader
                    .popow_header(&first_id)
                    .ok_or(NipopowError::MissingHeader(first_id))?;
                (head, last[1..].to_vec())
            }
        };

        let mut collected: HashMap<BlockId, PoPowHeader> = HashMap::new();
        let mut anchoring_height = GENESIS_HEIGHT;
        // The interlink tail is stored highest level first; reversing it puts
        // the pointer for level `i + 1` at position `i`.
        let tail_links: Vec<BlockId> =
            suffix_head.interlinks.iter().skip(1).rev().copied().collect();
        for (level_idx, prev_id) in tail_links.iter().enumerate().rev() {
            let level_headers =
                self.collect_level(reader, prev_id, level_idx, anchoring_height)?;
            if level_headers.len() > m {
                anchoring_height = level_headers[level_headers.len() - m].height();
            }
            for h in level_headers {
                collected.insert(h.id(), h);
            }
        }

        let genesis = reader
            .popow_header_at(GENESIS_HEIGHT)
            .ok_or(NipopowError::EmptyChain)?;
        collected.insert(genesis.id(), genesis);

        let mut prefix: Vec<PoPowHeader> = collected.into_values().collect();
        prefix.sort_by_key(|h| h.height());
        debug!(prefix_len = prefix.len(), k, m, "built proof from history reader");

        Ok(NipopowProof {
            m: params.m,
            k,
            prefix,
            suffix_head,
            suffix_tail,
        })
    }

    // Walk backwards through the superchain at `level_idx`, following each
    // header's interlink at that tail position, until the anchoring height.
    // Returned headers are ascending by height.
    fn collect_level(
        &self,
        reader: &dyn HistoryReader,
        prev_id: &BlockId,
        level_idx: usize,
        anchoring_height: u32,
    ) -> Result<Vec<PoPowHeader>, NipopowError> {
        let mut acc: Vec<PoPowHeader> = Vec::new();
        let mut current_id = *prev_id;
        let mut last_height = u32::MAX;
        loop {
            let header = reader
                .popow_header(&current_id)
                .ok_or(NipopowError::MissingHeader(current_id))?;
            if header.height() >= last_height {
                return Err(NipopowError::MalformedInterlinks(format!(
                    "interlink walk does not descend at height {}",
                    header.height()
                )));
            }
            last_height = header.height();
            if header.height() < anchoring_height {
                break;
            }
            let next = interlink_at_level(&header, level_idx);
            acc.push(header);
            match next {
                Some(id) => current_id = id,
                None => break,
            }
        }
        acc.reverse();
        Ok(acc)
    }
}

// Pointer to the most recent ancestor of level `level_idx + 1`, read from the
// highest-level-first interlink tail.
fn interlink_at_level(header: &PoPowHeader, level_idx: usize) -> Option<BlockId> {
    let tail_len = header.interlinks.len().saturating_sub(1);
    if level_idx < tail_len {
        Some(header.interlinks[header.interlinks.len() - 1 - level_idx])
    } else {
        None
    }
}
