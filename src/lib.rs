//! Packs arbitrary byte payloads into structurally valid PNG containers and
//! recovers them losslessly.
//!
//! The container is a real PNG: signature, a truecolor header sized from the
//! payload length, a metadata chunk carrying a magic marker and the exact
//! payload length, one or more size-bounded compressed data chunks, and the
//! terminator. Any PNG viewer renders the pixel grid; only this crate reads
//! the payload back out. The codec only decodes containers it produced, and
//! the checksums guard against accidental corruption, nothing more.
//!
//! ```
//! let payload = b"any bytes at all";
//!
//! let container = pictor::encode(payload)?;
//! let restored = pictor::decode(&container)?;
//! assert_eq!(restored, payload);
//! # Ok::<(), pictor::CodecError>(())
//! ```
//!
//! Large payloads can be streamed with [`encode_stream`] and
//! [`decode_stream`]; encoder memory stays bounded by the configured data
//! chunk size regardless of payload size.

pub mod chunk;
mod compress;
pub mod decode;
pub mod encode;
mod error;
pub mod geometry;
pub mod padding;
pub mod store;

pub use decode::{decode, decode_stream};
pub use encode::{EncodeOptions, encode, encode_stream, encode_stream_with, encode_with};
pub use error::{CodecError, Result};
pub use geometry::Geometry;
pub use store::{BlobStore, DirStore, MemoryStore, PngStore, StoreOptions};
