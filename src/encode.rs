//! Encoder pipeline.
//!
//! Writes signature, header and metadata chunks, then compresses the payload
//! as filter-framed pixel rows into one or more size-bounded data chunks,
//! and closes the container with the terminator. The compressed stream is
//! buffered at most `max_data_chunk_size` bytes at a time, so encoder memory
//! stays bounded no matter how large the payload is.

use std::io::{self, Read, Write};

use tracing::{debug, trace};

use crate::chunk::{self, ChunkAccumulator, IDAT, IEND, IHDR, MAX_CHUNK_DATA, PNG_SIGNATURE, TEXT};
use crate::compress;
use crate::error::{CodecError, Result};
use crate::geometry::{self, FILTER_NONE, Geometry};

/// Default flush threshold for data chunks, 512 KiB.
pub const DEFAULT_MAX_DATA_CHUNK_SIZE: usize = 512 * 1024;

/// Encoder tunables. The chunk threshold is a streaming knob, never payload
/// semantics: containers produced with different thresholds differ byte for
/// byte but decode to the identical payload.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Compressed bytes buffered before a data chunk is flushed.
    pub max_data_chunk_size: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_data_chunk_size: DEFAULT_MAX_DATA_CHUNK_SIZE,
        }
    }
}

impl EncodeOptions {
    pub fn with_max_data_chunk_size(max_data_chunk_size: usize) -> Self {
        Self {
            max_data_chunk_size,
        }
    }
}

/// Encodes a payload into a complete in-memory container.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
    encode_with(payload, &EncodeOptions::default())
}

pub fn encode_with(payload: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut container = Vec::new();
    encode_stream_with(
        &mut &payload[..],
        payload.len() as u64,
        &mut container,
        options,
    )?;
    Ok(container)
}

/// Encodes `length` bytes from `source` into a container written to `sink`.
pub fn encode_stream<R: Read, W: Write>(source: &mut R, length: u64, sink: &mut W) -> Result<()> {
    encode_stream_with(source, length, sink, &EncodeOptions::default())
}

pub fn encode_stream_with<R: Read, W: Write>(
    source: &mut R,
    length: u64,
    sink: &mut W,
    options: &EncodeOptions,
) -> Result<()> {
    let geometry = Geometry::for_payload(length)?;
    debug!(
        length,
        width = geometry.width,
        height = geometry.height,
        "encoding payload"
    );

    sink.write_all(&PNG_SIGNATURE)?;
    chunk::write_chunk(sink, &IHDR, &geometry::header_data(&geometry))?;
    chunk::write_chunk(sink, &TEXT, &geometry::metadata_data(length as u32))?;

    let max_chunk = options.max_data_chunk_size.min(MAX_CHUNK_DATA);
    let mut deflater = compress::compressor(DataChunkWriter::new(sink, max_chunk));

    let stride = geometry.row_stride();
    let mut row = vec![0u8; stride];
    let mut remaining = length;
    for _ in 0..geometry.height {
        let want = stride.min(remaining as usize);
        read_row(source, &mut row[..want], length, remaining)?;
        if want < stride {
            // Final row runs short of the grid width; zero-pad it.
            row[want..].fill(0);
        }
        deflater.write_all(&[FILTER_NONE])?;
        deflater.write_all(&row)?;
        remaining -= want as u64;
    }

    let chunk_writer = deflater.finish()?;
    chunk_writer.finish()?;

    chunk::write_chunk(sink, &IEND, &[])?;
    Ok(())
}

fn read_row<R: Read>(source: &mut R, buf: &mut [u8], declared: u64, remaining: u64) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(CodecError::InputExhausted {
                declared,
                got: declared - remaining + filled as u64,
            });
        }
        filled += n;
    }
    Ok(())
}

/// Splits one logical compressed stream across size-bounded data chunks.
/// The checksum is accumulated as bytes arrive, so flushing a chunk never
/// re-hashes the buffer. `finish` writes whatever remains, which may be an
/// empty chunk; decoders treat that as a no-op.
struct DataChunkWriter<'a, W: Write> {
    sink: &'a mut W,
    buffer: Vec<u8>,
    crc: ChunkAccumulator,
    max_chunk_size: usize,
}

impl<'a, W: Write> DataChunkWriter<'a, W> {
    fn new(sink: &'a mut W, max_chunk_size: usize) -> Self {
        Self {
            sink,
            buffer: Vec::new(),
            crc: ChunkAccumulator::new(IDAT),
            max_chunk_size,
        }
    }

    fn flush_chunk(&mut self) -> io::Result<()> {
        trace!(bytes = self.buffer.len(), "flushing data chunk");
        self.sink
            .write_all(&(self.buffer.len() as u32).to_be_bytes())?;
        self.sink.write_all(&IDAT)?;
        self.sink.write_all(&self.buffer)?;
        self.sink
            .write_all(&self.crc.finish_and_reset().to_be_bytes())?;
        self.buffer.clear();
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        self.flush_chunk()?;
        Ok(())
    }
}

impl<W: Write> io::Write for DataChunkWriter<'_, W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.crc.update(data);
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > self.max_chunk_size {
            self.flush_chunk()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::read_chunk;

    fn chunk_types(container: &[u8]) -> Vec<[u8; 4]> {
        let mut reader = &container[8..];
        let mut types = Vec::new();
        while !reader.is_empty() {
            let c = read_chunk(&mut reader, "test").unwrap();
            c.verify_crc().unwrap();
            types.push(c.chunk_type);
        }
        types
    }

    #[test]
    fn test_container_layout() {
        let container = encode(b"layout probe").unwrap();
        assert_eq!(&container[..8], &PNG_SIGNATURE);
        assert_eq!(chunk_types(&container), vec![IHDR, TEXT, IDAT, IEND]);
    }

    #[test]
    fn test_small_threshold_produces_multiple_data_chunks() {
        let payload: Vec<u8> = (0..4096u32).map(|i| (i % 256) as u8).collect();
        let options = EncodeOptions::with_max_data_chunk_size(64);
        let container = encode_with(&payload, &options).unwrap();

        let idat_count = chunk_types(&container)
            .iter()
            .filter(|t| **t == IDAT)
            .count();
        assert!(idat_count > 1, "expected multiple data chunks");
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(matches!(encode(&[]), Err(CodecError::EmptyPayload)));
    }

    #[test]
    fn test_short_source_is_input_exhausted() {
        let payload = [0xABu8; 10];
        let mut container = Vec::new();
        // Declare more bytes than the source can supply.
        let err = encode_stream(&mut &payload[..], 100, &mut container).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InputExhausted {
                declared: 100,
                got: 10
            }
        ));
    }

    #[test]
    fn test_metadata_declares_exact_length() {
        let container = encode(&[0u8; 1000]).unwrap();
        let mut reader = &container[8..];
        let header = read_chunk(&mut reader, "test").unwrap();
        assert_eq!(header.chunk_type, IHDR);
        let metadata = read_chunk(&mut reader, "test").unwrap();
        assert_eq!(metadata.chunk_type, TEXT);
        assert_eq!(&metadata.data[0..4], b"N3RD");
        assert_eq!(&metadata.data[4..8], &1000u32.to_be_bytes());
    }
}
