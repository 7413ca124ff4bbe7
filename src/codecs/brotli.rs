//! Brotli codec (spec §4.C), backed by the `brotli` crate.
//!
//! Grounded on `armature-compression/src/streaming.rs`'s
//! `brotli::CompressorWriter` usage for the compress side, and on the
//! writer-based decompressor pattern (`brotli::DecompressorWriter`) used
//! for push-model streaming decompression elsewhere in the corpus.

use std::mem;

use brotli::{CompressorWriter, DecompressorWriter};
use std::io::Write;

use crate::buffer::StreamBuffer;
use crate::codec::{CodecMode, Compressor, Decompressor};
use crate::error::CompressionError;
use crate::Result;

/// Brotli encoder mode (spec §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrotliMode {
    #[default]
    Generic,
    Text,
    Font,
    Default,
}

impl BrotliMode {
    fn as_brotli_mode(self) -> brotli::enc::BrotliEncoderMode {
        use brotli::enc::BrotliEncoderMode;
        match self {
            BrotliMode::Generic => BrotliEncoderMode::BROTLI_MODE_GENERIC,
            BrotliMode::Text => BrotliEncoderMode::BROTLI_MODE_TEXT,
            BrotliMode::Font => BrotliEncoderMode::BROTLI_MODE_FONT,
            BrotliMode::Default => BrotliEncoderMode::BROTLI_MODE_GENERIC,
        }
    }
}

/// Parameters for a brotli compressor.
#[derive(Debug, Clone)]
pub struct BrotliCompressParams {
    pub quality: u32,
    pub window_bits: u32,
    pub input_block_bits: u32,
    pub disable_literal_context_modeling: bool,
    pub mode: BrotliMode,
}

impl Default for BrotliCompressParams {
    fn default() -> Self {
        Self {
            quality: 4,
            window_bits: 22,
            input_block_bits: 24,
            disable_literal_context_modeling: false,
            mode: BrotliMode::default(),
        }
    }
}

impl BrotliCompressParams {
    fn validate(&self) -> Result<()> {
        if !(0..=11).contains(&self.quality) {
            return Err(CompressionError::InvalidParameter {
                name: "quality",
                value: self.quality as i64,
                expected: "0..=11",
            });
        }
        if !(10..=24).contains(&self.window_bits) {
            return Err(CompressionError::InvalidParameter {
                name: "window_bits",
                value: self.window_bits as i64,
                expected: "10..=24",
            });
        }
        if !(16..=24).contains(&self.input_block_bits) {
            return Err(CompressionError::InvalidParameter {
                name: "input_block_bits",
                value: self.input_block_bits as i64,
                expected: "16..=24",
            });
        }
        Ok(())
    }

    fn encoder_params(&self) -> brotli::enc::BrotliEncoderParams {
        brotli::enc::BrotliEncoderParams {
            quality: self.quality as i32,
            lgwin: self.window_bits as i32,
            lgblock: self.input_block_bits as i32,
            mode: self.mode.as_brotli_mode(),
            disable_literal_context_modeling: self.disable_literal_context_modeling,
            ..Default::default()
        }
    }
}

/// Parameters for a brotli decompressor.
#[derive(Debug, Clone, Default)]
pub struct BrotliDecompressParams {
    pub disable_ring_buffer_reallocation: bool,
}

const BROTLI_BUFFER_SIZE: usize = 4096;

/// Streaming brotli compressor.
pub struct BrotliCompressor {
    params: BrotliCompressParams,
    encoder: Option<CompressorWriter<Vec<u8>>>,
    finished: bool,
}

impl BrotliCompressor {
    pub fn new(params: BrotliCompressParams) -> Self {
        Self {
            params,
            encoder: None,
            finished: false,
        }
    }
}

impl Compressor for BrotliCompressor {
    fn init(&mut self) -> Result<()> {
        if self.encoder.is_some() || self.finished {
            return Err(CompressionError::AlreadyInitialized);
        }
        self.params.validate()?;
        let encoder_params = self.params.encoder_params();
        self.encoder = Some(CompressorWriter::with_params(
            Vec::new(),
            BROTLI_BUFFER_SIZE,
            &encoder_params,
        ));
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
                // `CompressorWriter` finalizes the brotli stream when consumed
                // via `into_inner`, not merely on `flush` — taking the buffer
                // contents with `get_mut`/`mem::take` before that point drops
                // the terminal block into an already-emptied writer.
                let encoder = self.encoder.take().expect("checked Some above");
                let out = encoder.into_inner();
                buf.append(out);
                self.finished = true;
            }
        }
        Ok(())
    }

    fn content_encoding(&self) -> &'static str {
        "br"
    }
}

/// Streaming brotli decompressor.
pub struct BrotliDecompressor {
    #[allow(dead_code)]
    params: BrotliDecompressParams,
    decoder: Option<DecompressorWriter<Vec<u8>>>,
}

impl BrotliDecompressor {
    pub fn new(params: BrotliDecompressParams) -> Self {
        Self {
            params,
            decoder: None,
        }
    }
}

impl Decompressor for BrotliDecompressor {
    fn init(&mut self) -> Result<()> {
        if self.decoder.is_some() {
            return Err(CompressionError::AlreadyInitialized);
        }
        self.decoder = Some(DecompressorWriter::new(Vec::new(), BROTLI_BUFFER_SIZE));
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

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(chunks: &[&[u8]]) {
        let mut compressor = BrotliCompressor::new(BrotliCompressParams::default());
        compressor.init().unwrap();

        let mut compressed = StreamBuffer::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let mut buf = StreamBuffer::from_bytes(chunk.to_vec());
            let mode = if i == chunks.len() - 1 {
                CodecMode::Finish
            } else {
                CodecMode::Flush
            };
            compressor.compress(&mut buf, mode).unwrap();
            compressed.move_from(&mut buf);
        }

        let mut decompressor = BrotliDecompressor::new(BrotliDecompressParams::default());
        decompressor.init().unwrap();
        let mut output = StreamBuffer::new();
        decompressor.decompress(&compressed, &mut output).unwrap();

        let expected: Vec<u8> = chunks.iter().flat_map(|c| c.to_vec()).collect();
        assert_eq!(output.to_contiguous(), expected);
    }

    #[test]
    fn roundtrip_single_chunk() {
        roundtrip(&[b"the quick brown fox jumps over the lazy dog"]);
    }

    #[test]
    fn roundtrip_multiple_chunks() {
        roundtrip(&[b"chunk one ", b"chunk two ", b"chunk three"]);
    }

    #[test]
    fn invalid_quality_rejected() {
        let mut params = BrotliCompressParams::default();
        params.quality = 99;
        let mut compressor = BrotliCompressor::new(params);
        assert!(matches!(
            compressor.init(),
            Err(CompressionError::InvalidParameter { name: "quality", .. })
        ));
    }

    #[test]
    fn compress_after_finish_errors() {
        let mut compressor = BrotliCompressor::new(BrotliCompressParams::default());
        compressor.init().unwrap();
        let mut buf = StreamBuffer::from_bytes(b"data".to_vec());
        compressor.compress(&mut buf, CodecMode::Finish).unwrap();

        let mut more = StreamBuffer::from_bytes(b"more".to_vec());
        assert!(matches!(
            compressor.compress(&mut more, CodecMode::Flush),
            Err(CompressionError::AlreadyFinished)
        ));
    }
}
