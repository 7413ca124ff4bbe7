//! Zstd codec (spec §4.C), backed by the `zstd` crate.
//!
//! Fills the architectural slot spec §4.C assigns to `qatzip` hardware
//! offload — see `DESIGN.md` for why this crate substitutes `zstd` there
//! (the teacher, `armature-compression`, already ships it as its third
//! optional algorithm alongside gzip/brotli).

use std::mem;

use std::io::Write;
use zstd::stream::write::{Decoder as ZstdDecoder, Encoder as ZstdEncoder};

use crate::buffer::StreamBuffer;
use crate::codec::{CodecMode, Compressor, Decompressor};
use crate::error::CompressionError;
use crate::Result;

/// Parameters for a zstd compressor, named after the hardware-offload
/// knobs spec §4.C lists for its third codec (buffer sizing + threshold).
#[derive(Debug, Clone)]
pub struct ZstdParams {
    pub compression_level: i32,
    pub stream_buffer_size: usize,
    pub input_size_threshold: usize,
}

impl Default for ZstdParams {
    fn default() -> Self {
        Self {
            compression_level: 3,
            stream_buffer_size: 4096,
            input_size_threshold: 0,
        }
    }
}

impl ZstdParams {
    fn validate(&self) -> Result<()> {
        if !(1..=22).contains(&self.compression_level) {
            return Err(CompressionError::InvalidParameter {
                name: "compression_level",
                value: self.compression_level as i64,
                expected: "1..=22",
            });
        }
        Ok(())
    }
}

/// Streaming zstd compressor.
pub struct ZstdCompressor {
    params: ZstdParams,
    encoder: Option<ZstdEncoder<'static, Vec<u8>>>,
    finished: bool,
}

impl ZstdCompressor {
    pub fn new(params: ZstdParams) -> Self {
        Self {
            params,
            encoder: None,
            finished: false,
        }
    }
}

impl Compressor for ZstdCompressor {
    fn init(&mut self) -> Result<()> {
        if self.encoder.is_some() || self.finished {
            return Err(CompressionError::AlreadyInitialized);
        }
        self.params.validate()?;
        let encoder = ZstdEncoder::new(Vec::new(), self.params.compression_level)
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
        self.encoder = Some(encoder);
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
        "zstd"
    }
}

/// Streaming zstd decompressor.
pub struct ZstdDecompressor {
    decoder: Option<ZstdDecoder<'static, Vec<u8>>>,
}

impl ZstdDecompressor {
    pub fn new() -> Self {
        Self { decoder: None }
    }
}

impl Default for ZstdDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for ZstdDecompressor {
    fn init(&mut self) -> Result<()> {
        if self.decoder.is_some() {
            return Err(CompressionError::AlreadyInitialized);
        }
        let decoder = ZstdDecoder::new(Vec::new())
            .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;
        self.decoder = Some(decoder);
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
        let mut compressor = ZstdCompressor::new(ZstdParams::default());
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

        let mut decompressor = ZstdDecompressor::new();
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
    fn invalid_level_rejected() {
        let mut params = ZstdParams::default();
        params.compression_level = 0;
        let mut compressor = ZstdCompressor::new(params);
        assert!(matches!(
            compressor.init(),
            Err(CompressionError::InvalidParameter {
                name: "compression_level",
                ..
            })
        ));
    }
}
