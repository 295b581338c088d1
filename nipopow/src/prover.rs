// Cached proof generation
// Single-slot cache keyed by the best header id at generation time

use crate::algos::NipopowAlgos;
use crate::error::NipopowError;
use crate::history::HistoryReader;
use crate::params::PoPowParams;
use crate::proof::NipopowProof;
use aurum_core::BlockId;
use std::sync::Mutex;
use tracing::debug;

struct CachedProof {
    tip_id: BlockId,
    proof: NipopowProof,
}

/// Proof generator with a tip-keyed single-slot cache
///
/// The slot is replaced atomically under the lock; readers observe either
/// the previous complete entry or the new one.
pub struct NipopowProver {
    algos: NipopowAlgos,
    cache: Mutex<Option<CachedProof>>,
}

impl NipopowProver {
    pub fn new(algos: NipopowAlgos) -> Self {
        NipopowProver {
            algos,
            cache: Mutex::new(None),
        }
    }

    pub fn algos(&self) -> &NipopowAlgos {
        &self.algos
    }

    /// Proof for the current best chain suffix
    ///
    /// Served from the cache while the best header is unchanged, without
    /// touching the history or the level calculus. The slot is not written
    /// when generation fails.
    pub fn prove_suffix(
        &self,
        reader: &dyn HistoryReader,
        params: &PoPowParams,
    ) -> Result<NipopowProof, NipopowError> {
        let tip = reader.best_header().ok_or(NipopowError::EmptyChain)?;
        let tip_id = tip.id();
        {
            let slot = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = slot.as_ref() {
                if cached.tip_id == tip_id {
                    debug!(%tip_id, "serving cached proof");
                    return Ok(cached.proof.clone());
                }
            }
        }
        let proof = self.algos.prove_with_reader(reader, None, params)?;
        let mut slot = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(CachedProof {
            tip_id,
            proof: proof.clone(),
        });
        debug!(%tip_id, "regenerated proof for new tip");
        Ok(proof)
    }

    /// Proof whose suffix starts at the given header; never cached
    pub fn prove_infix(
        &self,
        reader: &dyn HistoryReader,
        header_id: BlockId,
        params: &PoPowParams,
    ) -> Result<NipopowProof, NipopowError> {
        self.algos.prove_with_reader(reader, Some(header_id), params)
    }
}
