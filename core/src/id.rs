// Block identifiers
// 32-byte content ids with hex display and serde support

use std::fmt;

/// 32-byte identifier of a header, extension section, or other chain object
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId([u8; 32]);

impl BlockId {
    pub const ZERO: BlockId = BlockId([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        BlockId(bytes)
    }

    /// Content id of a byte encoding (BLAKE3-256)
    pub fn of(bytes: &[u8]) -> Self {
        BlockId(*blake3::hash(bytes).as_bytes())
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(BlockId)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", hex::encode(self.0))
    }
}

// Ids cross the API boundary as hex strings
impl serde::Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> serde::Deserialize<'de> for BlockId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        BlockId::from_slice(&bytes)
            .ok_or_else(|| serde::de::Error::custom("expected 32 bytes of hex"))
    }
}
