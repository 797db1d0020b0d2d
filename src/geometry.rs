//! Raster geometry and header/metadata chunk construction.
//!
//! The pixel grid exists only to satisfy the container format: three bytes of
//! payload per truecolor pixel, sized so the grid holds the whole payload with
//! minimal slack. Decoders other than this crate will render the grid, but the
//! pixel values carry no meaning.

use crate::chunk::PAYLOAD_MARKER;
use crate::error::{CodecError, Result};

pub const BYTES_PER_PIXEL: u64 = 3;

/// The metadata chunk stores the payload length in four bytes.
pub const MAX_PAYLOAD_LEN: u64 = u32::MAX as u64;

pub const BIT_DEPTH: u8 = 8;

/// Truecolor RGB.
pub const COLOR_TYPE: u8 = 2;

/// Row filter byte prefixed to every pixel row: no filtering.
pub const FILTER_NONE: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    /// Derives the raster for a payload of `len` bytes.
    ///
    /// Width is ceil(sqrt(len/3)), computed exactly as the smallest `w` with
    /// `3*w*w >= len`; height is ceil(len / (3*w)). Together these guarantee
    /// `3*w*h >= len` while `3*w*(h-1) < len`, so removing the last row would
    /// lose payload bytes.
    pub fn for_payload(len: u64) -> Result<Self> {
        if len == 0 {
            return Err(CodecError::EmptyPayload);
        }
        if len > MAX_PAYLOAD_LEN {
            return Err(CodecError::Oversize {
                length: len,
                max: MAX_PAYLOAD_LEN,
            });
        }

        // Float sqrt as an estimate, then correct to the exact bound.
        let mut width = ((len as f64) / BYTES_PER_PIXEL as f64).sqrt().ceil() as u64;
        width = width.max(1);
        while width > 1 && BYTES_PER_PIXEL * (width - 1) * (width - 1) >= len {
            width -= 1;
        }
        while BYTES_PER_PIXEL * width * width < len {
            width += 1;
        }

        let height = len.div_ceil(BYTES_PER_PIXEL * width);

        Ok(Self {
            width: width as u32,
            height: height as u32,
        })
    }

    /// Bytes per pixel row, excluding the leading filter byte.
    #[inline]
    pub const fn row_stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL as usize
    }

    /// Payload bytes the raster can hold.
    #[inline]
    pub const fn capacity(&self) -> u64 {
        self.width as u64 * self.height as u64 * BYTES_PER_PIXEL
    }
}

/// Header chunk data: width, height, then the fixed depth and method bytes.
/// Compression, filter and interlace methods are all zero.
pub fn header_data(geometry: &Geometry) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&geometry.width.to_be_bytes());
    data[4..8].copy_from_slice(&geometry.height.to_be_bytes());
    data[8] = BIT_DEPTH;
    data[9] = COLOR_TYPE;
    data
}

/// Metadata chunk data: the payload marker plus the exact payload length.
pub fn metadata_data(payload_len: u32) -> [u8; 8] {
    let mut data = [0u8; 8];
    data[0..4].copy_from_slice(&PAYLOAD_MARKER);
    data[4..8].copy_from_slice(&payload_len.to_be_bytes());
    data
}
