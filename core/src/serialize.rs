// Byte-level codec
// VLQ integers and fixed-width fields shared by every wire format

use crate::id::BlockId;
use thiserror::Error;

/// Errors raised while encoding or decoding wire bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    #[error("unexpected end of buffer")]
    UnexpectedEof,
    #[error("VLQ value overflows u64")]
    VlqOverflow,
    #[error("length field {requested} exceeds remaining buffer {remaining}")]
    LengthExceedsBuffer { requested: usize, remaining: usize },
    #[error("trailing bytes after parsing")]
    TrailingBytes,
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Writer producing the deterministic network encoding
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u32_fixed(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u64_fixed(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Unsigned VLQ: 7-bit groups, least significant first, high bit marks continuation
    pub fn put_uint(&mut self, mut value: u64) {
        loop {
            let group = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(group);
                return;
            }
            self.buf.push(group | 0x80);
        }
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_block_id(&mut self, id: &BlockId) {
        self.buf.extend_from_slice(id.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reader over a received byte buffer
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn get_u8(&mut self) -> Result<u8, SerializeError> {
        let byte = *self.buf.get(self.pos).ok_or(SerializeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn get_u32_fixed(&mut self) -> Result<u32, SerializeError> {
        let bytes: [u8; 4] = self
            .get_bytes(4)?
            .try_into()
            .map_err(|_| SerializeError::UnexpectedEof)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn get_u64_fixed(&mut self) -> Result<u64, SerializeError> {
        let bytes: [u8; 8] = self
            .get_bytes(8)?
            .try_into()
            .map_err(|_| SerializeError::UnexpectedEof)?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Unsigned VLQ, at most ten groups
    pub fn get_uint(&mut self) -> Result<u64, SerializeError> {
        let mut result: u64 = 0;
        for i in 0..10 {
            let byte = self.get_u8()?;
            let group = (byte & 0x7f) as u64;
            let shift = 7 * i;
            if shift == 63 && group > 1 {
                return Err(SerializeError::VlqOverflow);
            }
            result |= group << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(SerializeError::VlqOverflow)
    }

    /// VLQ value narrowed to u32
    pub fn get_uint32(&mut self) -> Result<u32, SerializeError> {
        let value = self.get_uint()?;
        u32::try_from(value)
            .map_err(|_| SerializeError::InvalidValue(format!("{value} exceeds u32")))
    }

    /// VLQ byte length checked against the remaining buffer
    pub fn get_length(&mut self) -> Result<usize, SerializeError> {
        self.get_count(1)
    }

    /// VLQ element count checked so that `count * min_item_size` fits the rest
    pub fn get_count(&mut self, min_item_size: usize) -> Result<usize, SerializeError> {
        let value = self.get_uint()?;
        let count = usize::try_from(value).map_err(|_| SerializeError::VlqOverflow)?;
        let need = count
            .checked_mul(min_item_size)
            .ok_or(SerializeError::VlqOverflow)?;
        if need > self.remaining() {
            return Err(SerializeError::LengthExceedsBuffer {
                requested: need,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    pub fn get_bytes(&mut self, count: usize) -> Result<&'a [u8], SerializeError> {
        if count > self.remaining() {
            return Err(SerializeError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn get_block_id(&mut self) -> Result<BlockId, SerializeError> {
        let bytes = self.get_bytes(32)?;
        BlockId::from_slice(bytes).ok_or(SerializeError::UnexpectedEof)
    }

    /// Reject buffers with bytes left over after the top-level parse
    pub fn expect_empty(&self) -> Result<(), SerializeError> {
        if self.remaining() != 0 {
            return Err(SerializeError::TrailingBytes);
        }
        Ok(())
    }
}
