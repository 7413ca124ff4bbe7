//! Streaming codec contract (spec §4.B).
//!
//! Concrete codecs (see [`crate::codecs`]) wrap a native compression or
//! decompression library as an object conforming to one of these traits.
//! The filter state machines in [`crate::compressor`] and
//! [`crate::decompressor`] drive these traits without knowing which
//! concrete library backs them, per spec §9's "capability set expressed
//! as a trait/interface".

use crate::buffer::StreamBuffer;
use crate::Result;

/// Default size of a codec's internal working chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Mode passed to [`Compressor::compress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecMode {
    /// Produce a self-contained compressed block but keep codec state
    /// alive for further input.
    Flush,
    /// Emit the terminal block. The codec is unusable after this call.
    Finish,
}

/// A streaming compressor: consumes plaintext bytes from a buffer and
/// appends compressed bytes to the same buffer.
///
/// `init` must be called exactly once before the first `compress` call.
/// After a `compress` call with [`CodecMode::Finish`], no further calls
/// are valid; implementations return [`crate::CompressionError::AlreadyFinished`].
pub trait Compressor: Send {
    /// Initialize the underlying native encoder. Fails if already
    /// initialized.
    fn init(&mut self) -> Result<()>;

    /// Drain the bytes currently in `buf`, compress them, and append the
    /// compressed output back onto `buf`.
    ///
    /// With `mode == Finish` the terminal block is emitted and the codec
    /// becomes unusable for any further `compress` call.
    fn compress(&mut self, buf: &mut StreamBuffer, mode: CodecMode) -> Result<()>;

    /// The content-encoding token this compressor produces (e.g. `"gzip"`).
    fn content_encoding(&self) -> &'static str;
}

/// A streaming decompressor: consumes compressed bytes from an input
/// buffer and appends decompressed bytes to an output buffer.
///
/// May need to be driven repeatedly (e.g. once per input slice, and again
/// to drain internal buffers) until the native decoder reports it has
/// consumed all available input and produced all available output.
pub trait Decompressor: Send {
    /// Initialize the underlying native decoder. Fails if already
    /// initialized.
    fn init(&mut self) -> Result<()>;

    /// Decompress the bytes in `input`, appending decompressed bytes to
    /// `output`. `input` is a read-only scratch view; bytes are not
    /// removed from it by this call, matching spec §4.B's decompressor
    /// contract (the caller drains/discards the original compressed
    /// bytes once the whole chunk has been processed).
    fn decompress(&mut self, input: &StreamBuffer, output: &mut StreamBuffer) -> Result<()>;
}
