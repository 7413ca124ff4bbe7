//! Error types for codec and negotiation operations

use thiserror::Error;

/// Errors that can occur while compressing or decompressing a stream
#[derive(Error, Debug)]
pub enum CompressionError {
    /// Compression operation failed
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Decompression operation failed
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// A codec parameter was out of the range its implementation accepts.
    ///
    /// Per spec this is a programmer error: the config was built with an
    /// invalid value and must not be silently clamped.
    #[error("invalid codec parameter {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: i64,
        expected: &'static str,
    },

    /// `init` was called a second time on the same codec instance
    #[error("codec already initialized")]
    AlreadyInitialized,

    /// A byte-producing call was made on a codec past its terminal `Finish`
    #[error("codec already finished")]
    AlreadyFinished,

    /// `compress`/`decompress` was called before `init`
    #[error("codec not initialized")]
    NotInitialized,

    /// IO error surfaced from an underlying codec implementation
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for compression operations
pub type Result<T> = std::result::Result<T, CompressionError>;
