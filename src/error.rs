use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid container: {0}")]
    Format(String),

    #[error("{chunk} chunk checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        chunk: String,
        stored: u32,
        computed: u32,
    },

    #[error("truncated container: end of input while reading {0}")]
    Truncated(&'static str),

    #[error("payload source exhausted: declared {declared} bytes, only {got} available")]
    InputExhausted { declared: u64, got: u64 },

    #[error("cannot encode an empty payload")]
    EmptyPayload,

    #[error("payload of {length} bytes exceeds the maximum of {max} bytes")]
    Oversize { length: u64, max: u64 },

    #[error("compression stream error: {0}")]
    Compression(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
