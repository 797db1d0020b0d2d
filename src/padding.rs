//! Minimum-size padding accommodation.
//!
//! Some storage backends reject images below a minimum pixel size; the
//! original network target sometimes refused anything smaller than 17x17.
//! The accommodation prepends a fixed run of zero bytes before encoding and
//! strips the same run after decoding. It is optional and not part of the
//! container format: the stored payload length covers the padding, and the
//! two helpers are exact inverses.

use crate::error::{CodecError, Result};

/// Padding that guarantees at least a 17x17 raster.
pub const MIN_IMAGE_PAD: usize = 17 * 17 * 3;

pub fn pad_prefix(payload: &[u8], pad_len: usize) -> Vec<u8> {
    let mut padded = vec![0u8; pad_len + payload.len()];
    padded[pad_len..].copy_from_slice(payload);
    padded
}

pub fn strip_prefix(padded: &[u8], pad_len: usize) -> Result<Vec<u8>> {
    if padded.len() < pad_len {
        return Err(CodecError::Format(format!(
            "decoded payload of {} bytes is shorter than the {pad_len} byte padding prefix",
            padded.len()
        )));
    }
    Ok(padded[pad_len..].to_vec())
}
