// Block headers
// Deterministic header encoding and identifier derivation

use crate::id::BlockId;
use crate::serialize::{ByteReader, ByteWriter, SerializeError};
use crate::BlockHeight;
use serde::{Deserialize, Serialize};

/// Height of the first block of the chain
pub const GENESIS_HEIGHT: BlockHeight = 1;

/// Block header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Protocol version
    pub version: u8,
    /// Id of the parent header
    pub parent_id: BlockId,
    /// Merkle root of the block transactions
    pub transactions_root: BlockId,
    /// Digest of the extension section
    pub extension_root: BlockId,
    /// Height in the chain
    pub height: BlockHeight,
    /// Compact-encoded difficulty
    pub n_bits: u32,
    /// Timestamp (Unix epoch, milliseconds)
    pub timestamp: u64,
    /// Nonce found by the miner
    pub nonce: u64,
}

impl Header {
    /// Header id, the BLAKE3 digest of the serialized header
    pub fn id(&self) -> BlockId {
        BlockId::of(&self.bytes())
    }

    /// Id of the extension section committed by this header
    pub fn extension_id(&self) -> BlockId {
        self.extension_root
    }

    /// Whether this is the first header of the chain
    pub fn is_genesis(&self) -> bool {
        self.height == GENESIS_HEIGHT
    }

    /// Deterministic byte encoding
    pub fn bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(128);
        HeaderSerializer::serialize(self, &mut w);
        w.into_bytes()
    }
}

/// Wire codec for headers
pub struct HeaderSerializer;

impl HeaderSerializer {
    pub fn serialize(header: &Header, w: &mut ByteWriter) {
        w.put_u8(header.version);
        w.put_block_id(&header.parent_id);
        w.put_block_id(&header.transactions_root);
        w.put_block_id(&header.extension_root);
        w.put_uint(header.timestamp);
        w.put_u32_fixed(header.n_bits);
        w.put_uint(header.height as u64);
        w.put_u64_fixed(header.nonce);
    }

    pub fn parse(r: &mut ByteReader<'_>) -> Result<Header, SerializeError> {
        let version = r.get_u8()?;
        let parent_id = r.get_block_id()?;
        let transactions_root = r.get_block_id()?;
        let extension_root = r.get_block_id()?;
        let timestamp = r.get_uint()?;
        let n_bits = r.get_u32_fixed()?;
        let height = r.get_uint32()?;
        let nonce = r.get_u64_fixed()?;
        Ok(Header {
            version,
            parent_id,
            transactions_root,
            extension_root,
            height,
            n_bits,
            timestamp,
            nonce,
        })
    }

    /// Parse a header occupying the whole buffer
    pub fn parse_bytes(bytes: &[u8]) -> Result<Header, SerializeError> {
        let mut r = ByteReader::new(bytes);
        let header = Self::parse(&mut r)?;
        r.expect_empty()?;
        Ok(header)
    }
}
