// Non-interactive proofs of proof-of-work
// Interlink tracking, proof construction, comparison, validation, and wire codecs

pub mod algos;
pub mod error;
pub mod history;
pub mod interlinks;
pub mod params;
pub mod popow_header;
pub mod prefix;
pub mod proof;
pub mod prover;

#[cfg(test)]
pub(crate) mod test_utils;

pub use algos::NipopowAlgos;
pub use error::NipopowError;
pub use history::HistoryReader;
pub use interlinks::{
    interlinks_to_extension, pack_interlinks, proof_for_interlink, unpack_interlinks,
    INTERLINK_VECTOR_PREFIX,
};
pub use params::PoPowParams;
pub use popow_header::{PoPowHeader, PoPowHeaderSerializer};
pub use prefix::{NipopowProofPrefix, NipopowProofPrefixSerializer, NIPOPOW_PREFIX_TYPE_ID};
pub use proof::{NipopowProof, NipopowProofSerializer, NIPOPOW_PROOF_TYPE_ID};
pub use prover::NipopowProver;
