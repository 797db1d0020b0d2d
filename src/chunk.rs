//! Chunk framing: length-prefixed, typed, checksummed blocks.
//!
//! A chunk on the wire is `length (4, BE) | type (4) | data | CRC-32 (4, BE)`,
//! with the checksum computed over type and data. Reading or writing a chunk
//! moves exactly `8 + length + 4` bytes. This layer knows nothing about what
//! the data means; checksum verification is left to callers.

use std::io::{ErrorKind, Read, Write};

use crate::error::{CodecError, Result};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const IHDR: [u8; 4] = *b"IHDR";

pub const TEXT: [u8; 4] = *b"tEXt";

pub const IDAT: [u8; 4] = *b"IDAT";

pub const IEND: [u8; 4] = *b"IEND";

/// Marks containers produced by this codec, stored in the metadata chunk.
pub const PAYLOAD_MARKER: [u8; 4] = *b"N3RD";

/// Chunk lengths are stored in four bytes but must stay below 2^31.
pub const MAX_CHUNK_DATA: usize = 0x7FFF_FFFF;

#[inline]
pub fn chunk_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

pub fn type_name(chunk_type: &[u8; 4]) -> String {
    String::from_utf8_lossy(chunk_type).into_owned()
}

/// One framed chunk as read off the wire. The stored checksum is surfaced
/// raw so callers that know the expected semantics decide when to verify.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub chunk_type: [u8; 4],
    pub data: Vec<u8>,
    pub stored_crc: u32,
}

impl RawChunk {
    pub fn verify_crc(&self) -> Result<()> {
        let computed = chunk_crc(&self.chunk_type, &self.data);
        if computed != self.stored_crc {
            return Err(CodecError::ChecksumMismatch {
                chunk: type_name(&self.chunk_type),
                stored: self.stored_crc,
                computed,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn total_size(&self) -> u64 {
        4 + 4 + self.data.len() as u64 + 4
    }
}

/// Reads one chunk, consuming exactly `8 + length + 4` bytes. A stream that
/// ends before the declared length is satisfied fails as truncated, with
/// `context` naming what was being read.
pub fn read_chunk<R: Read>(reader: &mut R, context: &'static str) -> Result<RawChunk> {
    let mut length_bytes = [0u8; 4];
    read_exact(reader, &mut length_bytes, context)?;
    let length = u32::from_be_bytes(length_bytes);

    if length as usize > MAX_CHUNK_DATA {
        return Err(CodecError::Format(format!(
            "chunk length {length} exceeds the maximum of {MAX_CHUNK_DATA}"
        )));
    }

    let mut chunk_type = [0u8; 4];
    read_exact(reader, &mut chunk_type, context)?;

    let mut data = vec![0u8; length as usize];
    read_exact(reader, &mut data, context)?;

    let mut crc_bytes = [0u8; 4];
    read_exact(reader, &mut crc_bytes, context)?;

    Ok(RawChunk {
        chunk_type,
        data,
        stored_crc: u32::from_be_bytes(crc_bytes),
    })
}

/// Writes one chunk: big-endian length, type, data, then the type+data CRC.
pub fn write_chunk<W: Write>(writer: &mut W, chunk_type: &[u8; 4], data: &[u8]) -> Result<()> {
    writer.write_all(&(data.len() as u32).to_be_bytes())?;
    writer.write_all(chunk_type)?;
    writer.write_all(data)?;
    writer.write_all(&chunk_crc(chunk_type, data).to_be_bytes())?;
    Ok(())
}

pub(crate) fn read_exact<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    context: &'static str,
) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => CodecError::Truncated(context),
        _ => CodecError::Io(e),
    })
}

/// Incremental type+data checksum for a chunk assembled piecewise. The
/// streaming encoder feeds compressed bytes as they arrive, so a chunk flush
/// never re-hashes the buffered data.
pub struct ChunkAccumulator {
    chunk_type: [u8; 4],
    hasher: crc32fast::Hasher,
}

impl ChunkAccumulator {
    pub fn new(chunk_type: [u8; 4]) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&chunk_type);
        Self { chunk_type, hasher }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of the bytes seen so far and re-arms the
    /// accumulator for the next chunk of the same type.
    pub fn finish_and_reset(&mut self) -> u32 {
        let mut fresh = crc32fast::Hasher::new();
        fresh.update(&self.chunk_type);
        std::mem::replace(&mut self.hasher, fresh).finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(crc32fast::hash(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_iend_crc_constant() {
        // The IEND chunk has no data and a well-known checksum.
        assert_eq!(chunk_crc(&IEND, &[]), 0xAE42_6082);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut buf = Vec::new();
        write_chunk(&mut buf, &IDAT, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(buf.len(), 8 + 5 + 4);

        let chunk = read_chunk(&mut &buf[..], "test chunk").unwrap();
        assert_eq!(chunk.chunk_type, IDAT);
        assert_eq!(chunk.data, vec![1, 2, 3, 4, 5]);
        assert_eq!(chunk.total_size(), buf.len() as u64);
        chunk.verify_crc().unwrap();
    }

    #[test]
    fn test_corrupted_data_fails_verification() {
        let mut buf = Vec::new();
        write_chunk(&mut buf, &IDAT, &[1, 2, 3, 4, 5]).unwrap();
        buf[9] ^= 0xFF;

        let chunk = read_chunk(&mut &buf[..], "test chunk").unwrap();
        assert!(matches!(
            chunk.verify_crc(),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_read() {
        let mut buf = Vec::new();
        write_chunk(&mut buf, &IDAT, &[0u8; 32]).unwrap();
        buf.truncate(20);

        let err = read_chunk(&mut &buf[..], "test chunk").unwrap_err();
        assert!(matches!(err, CodecError::Truncated("test chunk")));
    }

    #[test]
    fn test_accumulator_matches_one_shot() {
        let data = b"split across several updates";
        let mut acc = ChunkAccumulator::new(IDAT);
        acc.update(&data[..5]);
        acc.update(&data[5..20]);
        acc.update(&data[20..]);
        assert_eq!(acc.finish_and_reset(), chunk_crc(&IDAT, data));

        // After a reset the accumulator starts a fresh chunk of the same type.
        acc.update(b"next");
        assert_eq!(acc.finish_and_reset(), chunk_crc(&IDAT, b"next"));
    }
}
