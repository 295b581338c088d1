// Error kinds of the proof core

use aurum_core::{BlockId, SerializeError};
use thiserror::Error;

/// Errors produced by proof construction and parsing
///
/// Proof comparison and validity checks never allocate errors; they return
/// plain booleans.
#[derive(Error, Debug)]
pub enum NipopowError {
    /// History has no best header yet
    #[error("history is empty, no proof can be generated")]
    EmptyChain,
    /// Input chain is shorter than `k + m`
    #[error("chain of length {got} is shorter than required {need}")]
    InsufficientChain { got: usize, need: usize },
    /// Input chain does not start with the genesis header
    #[error("first header of the input chain is not genesis")]
    NotAnchored,
    /// Security parameters out of range
    #[error("invalid proof parameters: {0}")]
    InvalidParams(String),
    /// Interlink packing or unpacking violated the field format
    #[error("malformed interlinks: {0}")]
    MalformedInterlinks(String),
    /// Received proof bytes failed to parse
    #[error("malformed proof: {0}")]
    MalformedProof(#[from] SerializeError),
    /// History reader had no header for an id the level walk required
    #[error("header {0} not found in history")]
    MissingHeader(BlockId),
}
