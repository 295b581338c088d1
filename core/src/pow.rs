// Proof-of-work seam
// Hit evaluation lives outside this crate; only the capability is defined here

use crate::header::Header;
use num_bigint::BigUint;

/// Capability evaluating the PoW hit of a header as a big integer
///
/// A valid header satisfies `hit < q / d`, where `d` is its decoded compact
/// difficulty and `q` the PoW modulus.
pub trait PowScheme: Send + Sync {
    /// PoW hit of the header
    fn pow_hit(&self, header: &Header) -> BigUint;
}
