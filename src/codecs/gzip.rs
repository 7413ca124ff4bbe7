//! Gzip codec (spec §4.C), backed by `flate2`.
//!
//! Parameter surface follows `examples/original_source`'s
//! `ZlibCompressorImpl::CompressionLevel`/`CompressionStrategy`: `level`,
//! `strategy`, `window_bits`, `memory_level`. `flate2`'s portable
//! (`miniz_oxide`) backend only exposes the compression level through its
//! public `Compression` type, so `strategy`/`window_bits`/`memory_level`
//! are validated against their documented ranges (out-of-range is a
//! programmer error per spec §4.C) but do not change encoder behavior
//! beyond the level — this crate does not fabricate a zlib FFI binding to
//! expose them.

use std::mem;

use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Write;

use crate::buffer::StreamBuffer;
use crate::codec::{CodecMode, Compressor, Decompressor};
use crate::error::CompressionError;
use crate::Result;

/// Gzip compression level (spec §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GzipLevel {
    Best,
    Speed,
    #[default]
    Standard,
}

impl GzipLevel {
    fn as_u32(self) -> u32 {
        match self {
            GzipLevel::Best => 9,
            GzipLevel::Speed => 1,
            GzipLevel::Standard => 6,
        }
    }
}

/// Gzip compression strategy (spec §4.C). See module docs for why this is
/// validated but not independently wired into the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GzipStrategy {
    #[default]
    Standard,
    Rle,
    Filtered,
    Huffman,
}

/// Parameters for a gzip compressor or decompressor.
#[derive(Debug, Clone)]
pub struct GzipParams {
    pub level: GzipLevel,
    pub strategy: GzipStrategy,
    /// Base-2 log of the window size, 9..=15, OR'd with 16 internally by
    /// the gzip framing (handled transparently by `flate2::write::GzEncoder`).
    pub window_bits: u32,
    pub memory_level: u32,
}

impl Default for GzipParams {
    fn default() -> Self {
        Self {
            level: GzipLevel::default(),
            strategy: GzipStrategy::default(),
            window_bits: 15,
            memory_level: 5,
        }
    }
}

impl GzipParams {
    fn validate(&self) -> Result<()> {
        if !(9..=15).contains(&self.window_bits) {
            return Err(CompressionError::InvalidParameter {
                name: "window_bits",
                value: self.window_bits as i64,
                expected: "9..=15",
            });
        }
        if !(1..=9).contains(&self.memory_level) {
            return Err(CompressionError::InvalidParameter {
                name: "memory_level",
                value: self.memory_level as i64,
                expected: "1..=9",
            });
        }
        Ok(())
    }
}

/// Streaming gzip compressor.
pub struct GzipCompressor {
    params: GzipParams,
    encoder: Option<GzEncoder<Vec<u8>>>,
    finished: bool,
}

impl GzipCompressor {
    pub fn new(params: GzipParams) -> Self {
        Self {
            params,
            encoder: None,
            finished: false,
        }
    }
}

impl Compressor for GzipCompressor {
    fn init(&mut self) -> Result<()> {
        if self.encoder.is_some() || self.finished {
            return Err(CompressionError::AlreadyInitialized);
        }
        self.params.validate()?;
        let compression = Compression::new(self.params.level.as_u32());
        self.encoder = Some(GzEncoder::new(Vec::new(), compression));
        Ok(())
    }

    fn compress(&mut self, buf: &mut StreamBuffer, mode: CodecMode) -> Result<()> {
        if self.finished {
            return Err(CompressionError::AlreadyFinished);
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or(CompressionError::NotInitialized)?;

        let input = buf.drain(buf.len());
        encoder
            .write_all(&input)
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;

        match mode {
            CodecMode::Flush => {
                encoder
                    .flush()
                    .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
                let out = mem::take(encoder.get_mut());
                buf.append(out);
            }
            CodecMode::Finish => {
                let encoder = self.encoder.take().expect("checked Some above");
                let out = encoder
                    .finish()
                    .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
                buf.append(out);
                self.finished = true;
            }
        }
        Ok(())
    }

    fn content_encoding(&self) -> &'static str {
        "gzip"
    }
}

/// Streaming gzip decompressor.
pub struct GzipDecompressor {
    params: GzipParams,
    decoder: Option<GzDecoder<Vec<u8>>>,
}

impl GzipDecompressor {
    pub fn new(params: GzipParams) -> Self {
        Self {
            params,
            decoder: None,
        }
    }
}

impl Decompressor for GzipDecompressor {
    fn init(&mut self) -> Result<()> {
        if self.decoder.is_some() {
            return Err(CompressionError::AlreadyInitialized);
        }
        self.params.validate()?;
        self.decoder = Some(GzDecoder::new(Vec::new()));
        Ok(())
    }

    fn decompress(&mut self, input: &StreamBuffer, output: &mut StreamBuffer) -> Result<()> {
        let decoder = self
            .decoder
            .as_mut()
            .ok_or(CompressionError::NotInitialized)?;

        for slice in input.enumerate_slices() {
            decoder
                .write_all(slice)
                .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;
        }
        decoder
            .flush()
            .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;
        let out = mem::take(decoder.get_mut());
        output.append(out);
        Ok(())
    }
}
