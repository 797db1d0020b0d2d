//! Deflate adapter for the pixel stream.
//!
//! The container format mandates a zlib-wrapped deflate stream for pixel
//! data. The payload is arbitrary bytes rather than image data, so level 1
//! trades ratio for speed. The adapter treats the compressed bytes as one
//! logical run; how they are split across data chunks is not its concern.

use std::io::{ErrorKind, Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{CodecError, Result};

const LEVEL: u32 = 1;

/// Wraps `sink` in a zlib compressor. Callers write filter-framed rows and
/// finish the stream to flush the trailing compressed block into the sink.
pub fn compressor<W: Write>(sink: W) -> ZlibEncoder<W> {
    ZlibEncoder::new(sink, Compression::new(LEVEL))
}

/// Streaming inflater over a fully-accumulated compressed byte run.
pub struct Inflater<'a> {
    inner: ZlibDecoder<&'a [u8]>,
}

impl<'a> Inflater<'a> {
    pub fn new(compressed: &'a [u8]) -> Self {
        Self {
            inner: ZlibDecoder::new(compressed),
        }
    }

    /// Reads exactly one buffer's worth of decompressed bytes. The stream
    /// running dry means the container promised more rows than it carries.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => CodecError::Format(
                "decompressed row stream ends before the declared payload length".into(),
            ),
            ErrorKind::InvalidInput | ErrorKind::InvalidData => {
                CodecError::Compression(e.to_string())
            }
            _ => CodecError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_inflate_roundtrip() {
        let input: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();

        let mut encoder = compressor(Vec::new());
        encoder.write_all(&input).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut inflater = Inflater::new(&compressed);
        let mut output = vec![0u8; input.len()];
        inflater.read_exact(&mut output).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_garbage_stream_fails() {
        let mut inflater = Inflater::new(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        let mut output = [0u8; 16];
        assert!(inflater.read_exact(&mut output).is_err());
    }

    #[test]
    fn test_short_stream_reports_format_error() {
        let mut encoder = compressor(Vec::new());
        encoder.write_all(&[7u8; 10]).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut inflater = Inflater::new(&compressed);
        let mut output = [0u8; 64];
        assert!(matches!(
            inflater.read_exact(&mut output),
            Err(CodecError::Format(_))
        ));
    }
}
