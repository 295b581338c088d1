// Compact difficulty encoding
// Bitcoin-style nBits decoding and the fixed PoW modulus

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::sync::OnceLock;

// secp256k1 group order
const POW_MODULUS_HEX: &[u8] = b"fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

/// The PoW modulus `q`, numerator of the target computation `T = q / d`
pub fn pow_modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| {
        BigUint::parse_bytes(POW_MODULUS_HEX, 16).expect("static hex constant")
    })
}

/// Decode a compact-encoded difficulty into a big integer
///
/// The high byte is a base-256 exponent, the low 23 bits the mantissa. The
/// 0x00800000 sign bit has no meaning for a difficulty and decodes to zero.
pub fn decode_compact_bits(n_bits: u32) -> BigUint {
    let size = (n_bits >> 24) as usize;
    let word = n_bits & 0x007f_ffff;
    if word == 0 || n_bits & 0x0080_0000 != 0 {
        return BigUint::zero();
    }
    if size <= 3 {
        BigUint::from(word >> (8 * (3 - size)))
    } else {
        BigUint::from(word) << (8 * (size - 3))
    }
}

/// Inverse of [`decode_compact_bits`]
pub fn encode_compact_bits(value: &BigUint) -> u32 {
    if value.is_zero() {
        return 0;
    }
    let mut size = ((value.bits() + 7) / 8) as usize;
    let mut compact: u64 = if size <= 3 {
        let word = value.to_u64().unwrap_or(0);
        word << (8 * (3 - size))
    } else {
        (value >> (8 * (size - 3))).to_u64().unwrap_or(0)
    };
    // A mantissa with the sign bit set shifts one more byte into the exponent
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    (compact as u32) | ((size as u32) << 24)
}
