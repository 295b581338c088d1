// Proof security parameters

use crate::error::NipopowError;
use serde::{Deserialize, Serialize};

/// Security parameters of proof construction
///
/// `m` is the minimum number of superblocks required of every admitted
/// level, `k` the length of the suffix carried in full.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoPowParams {
    pub m: u32,
    pub k: u32,
}

impl PoPowParams {
    pub fn new(m: u32, k: u32) -> Self {
        PoPowParams { m, k }
    }

    /// Both parameters must be at least 1
    pub fn validate(&self) -> Result<(), NipopowError> {
        if self.m < 1 {
            return Err(NipopowError::InvalidParams(format!("m = {} < 1", self.m)));
        }
        if self.k < 1 {
            return Err(NipopowError::InvalidParams(format!("k = {} < 1", self.k)));
        }
        Ok(())
    }
}
