// Test fixtures
// Deterministic mock PoW, chain builders, and an in-memory history

use crate::algos::NipopowAlgos;
use crate::history::HistoryReader;
use crate::interlinks::{interlinks_to_extension, pack_interlinks};
use crate::popow_header::PoPowHeader;
use aurum_core::{decode_compact_bits, pow_modulus, BlockId, Header, PowScheme, GENESIS_HEIGHT};
use num_bigint::BigUint;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Difficulty encoding used by all test chains; leaves a ~2^32 target
pub const TEST_N_BITS: u32 = 0x1d00_ffff;

/// PoW scheme assigning a fixed superblock level per header nonce
///
/// The returned hit sits three quarters of the way to the scaled target, so
/// the level computation is safely away from float rounding boundaries.
pub struct MockPow {
    levels: HashMap<u64, u32>,
    calls: AtomicUsize,
}

impl MockPow {
    pub fn with_levels(levels: &[(u64, u32)]) -> Self {
        MockPow {
            levels: levels.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every header at level 0
    pub fn uniform() -> Self {
        Self::with_levels(&[])
    }

    /// Number of hit evaluations performed so far
    pub fn hit_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PowScheme for MockPow {
    fn pow_hit(&self, header: &Header) -> BigUint {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let level = self.levels.get(&header.nonce).copied().unwrap_or(0) as usize;
        let target = pow_modulus() / decode_compact_bits(header.n_bits);
        let scaled = &target >> level;
        &scaled - (&scaled >> 2usize)
    }
}

/// Deterministic header; `salt` distinguishes forks at equal heights
pub fn make_header(parent_id: BlockId, height: u32, salt: u64) -> Header {
    let mut seed = Vec::with_capacity(12);
    seed.extend_from_slice(&salt.to_be_bytes());
    seed.extend_from_slice(&height.to_be_bytes());
    Header {
        version: 1,
        parent_id,
        transactions_root: BlockId::of(&seed),
        extension_root: BlockId::ZERO,
        height,
        n_bits: TEST_N_BITS,
        timestamp: 1_600_000_000_000 + height as u64 * 120_000,
        nonce: (salt << 32) | height as u64,
    }
}

fn next_popow_header(prev: &PoPowHeader, salt: u64, algos: &NipopowAlgos) -> PoPowHeader {
    let interlinks = algos
        .update_interlinks(&prev.header, &prev.interlinks)
        .expect("well-formed parent interlinks");
    let mut header = make_header(prev.header.id(), prev.header.height + 1, salt);
    header.extension_root = interlinks_to_extension(&interlinks)
        .expect("packable interlinks")
        .digest();
    PoPowHeader { header, interlinks }
}

/// Chain of `len` headers anchored at genesis, interlinks maintained honestly
pub fn make_chain(len: usize, algos: &NipopowAlgos) -> Vec<PoPowHeader> {
    let mut chain = Vec::with_capacity(len);
    let genesis = make_header(BlockId::ZERO, GENESIS_HEIGHT, 0);
    chain.push(PoPowHeader {
        header: genesis,
        interlinks: Vec::new(),
    });
    while chain.len() < len {
        let next = next_popow_header(chain.last().expect("non-empty chain"), 0, algos);
        chain.push(next);
    }
    chain
}

/// `base` plus `count` fork headers built under `salt`
pub fn extend_chain(
    base: &[PoPowHeader],
    salt: u64,
    count: usize,
    algos: &NipopowAlgos,
) -> Vec<PoPowHeader> {
    let mut chain = base.to_vec();
    for _ in 0..count {
        let next = next_popow_header(chain.last().expect("non-empty base"), salt, algos);
        chain.push(next);
    }
    chain
}

/// History reader over a fully materialized best chain
pub struct InMemoryHistory {
    chain: Vec<PoPowHeader>,
    by_id: HashMap<BlockId, usize>,
    reads: AtomicUsize,
}

impl InMemoryHistory {
    pub fn new(chain: Vec<PoPowHeader>) -> Self {
        let by_id = chain.iter().enumerate().map(|(i, h)| (h.id(), i)).collect();
        InMemoryHistory {
            chain,
            by_id,
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of header lookups served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Extend the best chain by one honest block
    pub fn grow(&mut self, algos: &NipopowAlgos) {
        let next = next_popow_header(self.chain.last().expect("non-empty history"), 0, algos);
        self.by_id.insert(next.id(), self.chain.len());
        self.chain.push(next);
    }

    fn index_of_height(&self, height: u32) -> Option<usize> {
        height
            .checked_sub(GENESIS_HEIGHT)
            .map(|i| i as usize)
            .filter(|&i| i < self.chain.len())
    }
}

impl HistoryReader for InMemoryHistory {
    fn headers_height(&self) -> u32 {
        self.chain.last().map(|h| h.height()).unwrap_or(0)
    }

    fn best_header(&self) -> Option<Header> {
        self.chain.last().map(|h| h.header.clone())
    }

    fn best_header_id_at_height(&self, height: u32) -> Option<BlockId> {
        self.index_of_height(height).map(|i| self.chain[i].id())
    }

    fn popow_header(&self, id: &BlockId) -> Option<PoPowHeader> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.by_id.get(id).map(|&i| self.chain[i].clone())
    }

    fn popow_header_at(&self, height: u32) -> Option<PoPowHeader> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.index_of_height(height).map(|i| self.chain[i].clone())
    }

    fn last_headers(&self, count: u32) -> Vec<Header> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let skip = self.chain.len().saturating_sub(count as usize);
        self.chain[skip..].iter().map(|h| h.header.clone()).collect()
    }

    fn best_headers_after(&self, header: &Header, count: u32) -> Vec<Header> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.by_id.get(&header.id()) {
            Some(&i) => self.chain[i + 1..]
                .iter()
                .take(count as usize)
                .map(|h| h.header.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    fn extension_fields(&self, extension_id: &BlockId) -> Option<Vec<(Vec<u8>, Vec<u8>)>> {
        self.chain
            .iter()
            .find(|h| h.header.extension_root == *extension_id)
            .map(|h| pack_interlinks(&h.interlinks))
    }
}
