// Aurum core primitives
// Block identifiers, headers, difficulty encoding, and the byte-level codec

pub mod difficulty;
pub mod extension;
pub mod header;
pub mod id;
pub mod pow;
pub mod serialize;

pub use difficulty::{decode_compact_bits, encode_compact_bits, pow_modulus};
pub use extension::{ExtensionCandidate, MerkleProof, Side};
pub use header::{Header, HeaderSerializer, GENESIS_HEIGHT};
pub use id::BlockId;
pub use pow::PowScheme;
pub use serialize::{ByteReader, ByteWriter, SerializeError};

/// Height of a block in the chain
pub type BlockHeight = u32;
