// Headers with unpacked interlinks

use crate::error::NipopowError;
use crate::interlinks::unpack_interlinks;
use aurum_core::{BlockId, ByteReader, ByteWriter, Header, HeaderSerializer, SerializeError};
use serde::{Deserialize, Serialize};

/// A header together with its unpacked interlink vector
///
/// Entry 0 of the vector is the genesis id; the remaining entries point to
/// the most recent ancestor at each superblock level, highest level first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoPowHeader {
    pub header: Header,
    pub interlinks: Vec<BlockId>,
}

impl PoPowHeader {
    /// Rebuild from a header and the raw fields of its extension section
    pub fn from_fields(
        header: Header,
        fields: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<Self, NipopowError> {
        let interlinks = unpack_interlinks(fields)?;
        Ok(PoPowHeader { header, interlinks })
    }

    pub fn id(&self) -> BlockId {
        self.header.id()
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }
}

/// Wire codec for [`PoPowHeader`]
pub struct PoPowHeaderSerializer;

impl PoPowHeaderSerializer {
    pub fn serialize(popow_header: &PoPowHeader, w: &mut ByteWriter) {
        let header_bytes = popow_header.header.bytes();
        w.put_uint(header_bytes.len() as u64);
        w.put_bytes(&header_bytes);
        w.put_uint(popow_header.interlinks.len() as u64);
        for id in &popow_header.interlinks {
            w.put_block_id(id);
        }
    }

    pub fn to_bytes(popow_header: &PoPowHeader) -> Vec<u8> {
        let mut w = ByteWriter::new();
        Self::serialize(popow_header, &mut w);
        w.into_bytes()
    }

    pub fn parse(r: &mut ByteReader<'_>) -> Result<PoPowHeader, SerializeError> {
        let header_len = r.get_length()?;
        let header = HeaderSerializer::parse_bytes(r.get_bytes(header_len)?)?;
        let links_count = r.get_count(32)?;
        let mut interlinks = Vec::with_capacity(links_count);
        for _ in 0..links_count {
            interlinks.push(r.get_block_id()?);
        }
        Ok(PoPowHeader { header, interlinks })
    }

    /// Parse a popow header occupying the whole buffer
    pub fn parse_bytes(bytes: &[u8]) -> Result<PoPowHeader, SerializeError> {
        let mut r = ByteReader::new(bytes);
        let parsed = Self::parse(&mut r)?;
        r.expect_empty()?;
        Ok(parsed)
    }
}
