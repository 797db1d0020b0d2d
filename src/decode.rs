//! Decoder pipeline.
//!
//! Strict single-pass reader for containers produced by this crate: signature,
//! header, metadata, sequential data chunks, terminator, in that order and
//! nothing else. Every chunk checksum is verified and the first structural
//! violation aborts the decode; no payload bytes are ever returned on error.
//!
//! The full compressed stream is accumulated before decompression, so decoder
//! memory is the compressed size plus one row buffer.

use std::io::{Read, Write};

use tracing::debug;

use crate::chunk::{
    self, IDAT, IEND, IHDR, PAYLOAD_MARKER, PNG_SIGNATURE, RawChunk, TEXT, type_name,
};
use crate::compress::Inflater;
use crate::error::{CodecError, Result};
use crate::geometry::{BIT_DEPTH, COLOR_TYPE, Geometry};

/// Decodes a complete in-memory container back to the original payload.
pub fn decode(container: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    decode_stream(&mut &container[..], &mut payload)?;
    Ok(payload)
}

/// Decodes a container read from `source`, writing the payload to `sink`.
pub fn decode_stream<R: Read, W: Write>(source: &mut R, sink: &mut W) -> Result<()> {
    let mut signature = [0u8; 8];
    chunk::read_exact(source, &mut signature, "signature")?;
    if signature != PNG_SIGNATURE {
        return Err(CodecError::Format("missing PNG signature".into()));
    }

    let header = expect_chunk(source, IHDR, "header chunk")?;
    let geometry = parse_header(&header.data)?;

    let metadata = expect_chunk(source, TEXT, "metadata chunk")?;
    let payload_len = parse_metadata(&metadata.data)?;

    // The raster must be exactly the one the encoder derives from the
    // declared length; anything else is not a container this codec made.
    let expected = Geometry::for_payload(payload_len)?;
    if geometry != expected {
        return Err(CodecError::Format(format!(
            "raster {}x{} does not match the declared payload length {payload_len}",
            geometry.width, geometry.height
        )));
    }

    // Sequential data chunks, stopped by the first chunk of another type.
    let mut compressed = Vec::new();
    let trailer = loop {
        let c = chunk::read_chunk(source, "data chunk")?;
        if c.chunk_type != IDAT {
            break c;
        }
        c.verify_crc()?;
        compressed.extend_from_slice(&c.data);
    };

    if trailer.chunk_type != IEND {
        return Err(CodecError::Format(format!(
            "unexpected {} chunk where the terminator belongs",
            type_name(&trailer.chunk_type)
        )));
    }
    trailer.verify_crc()?;
    if !trailer.data.is_empty() {
        return Err(CodecError::Format("terminator chunk carries data".into()));
    }

    debug!(
        payload_len,
        width = geometry.width,
        compressed = compressed.len(),
        "decoding container"
    );

    // Inflate row by row, dropping the filter byte and the final row's
    // zero padding; output stops exactly at the declared length.
    let mut inflater = Inflater::new(&compressed);
    let stride = geometry.row_stride();
    let mut row = vec![0u8; 1 + stride];
    let mut remaining = payload_len;
    while remaining > 0 {
        inflater.read_exact(&mut row)?;
        let take = stride.min(remaining as usize);
        sink.write_all(&row[1..1 + take])?;
        remaining -= take as u64;
    }

    Ok(())
}

fn expect_chunk<R: Read>(
    source: &mut R,
    expected: [u8; 4],
    context: &'static str,
) -> Result<RawChunk> {
    let chunk = chunk::read_chunk(source, context)?;
    if chunk.chunk_type != expected {
        return Err(CodecError::Format(format!(
            "expected {} chunk, found {}",
            type_name(&expected),
            type_name(&chunk.chunk_type)
        )));
    }
    chunk.verify_crc()?;
    Ok(chunk)
}

/// Validates the header chunk and returns the declared raster geometry.
fn parse_header(data: &[u8]) -> Result<Geometry> {
    if data.len() != 13 {
        return Err(CodecError::Format(format!(
            "header chunk has {} bytes, expected 13",
            data.len()
        )));
    }

    let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

    if width == 0 || height == 0 {
        return Err(CodecError::Format("zero raster dimension".into()));
    }
    if data[8] != BIT_DEPTH || data[9] != COLOR_TYPE {
        return Err(CodecError::Format(format!(
            "unsupported bit depth {} / color type {}",
            data[8], data[9]
        )));
    }
    if data[10] != 0 || data[11] != 0 || data[12] != 0 {
        return Err(CodecError::Format(
            "unsupported compression, filter or interlace method".into(),
        ));
    }

    Ok(Geometry { width, height })
}

fn parse_metadata(data: &[u8]) -> Result<u64> {
    if data.len() != 8 {
        return Err(CodecError::Format(format!(
            "metadata chunk has {} bytes, expected 8",
            data.len()
        )));
    }
    if data[0..4] != PAYLOAD_MARKER {
        return Err(CodecError::Format(
            "payload marker missing; container was not produced by this codec".into(),
        ));
    }

    let payload_len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as u64;
    if payload_len == 0 {
        return Err(CodecError::Format("declared payload length is zero".into()));
    }
    Ok(payload_len)
}
