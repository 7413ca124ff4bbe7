//! Per-filter counters (spec §4.D "Stats sink"), grounded on
//! `armature-compression/src/streaming.rs`'s `CompressionStats`
//! (`AtomicU64` fields shareable across threads without interior
//! mutability on the hot path).

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters a [`crate::compressor::CompressorFilter`] updates over its
/// lifetime.
#[derive(Debug, Default)]
pub struct CompressorStats {
    pub compressed: AtomicU64,
    pub not_compressed: AtomicU64,
    pub no_accept_header: AtomicU64,
    pub header_identity: AtomicU64,
    pub header_wildcard: AtomicU64,
    pub header_not_valid: AtomicU64,
    pub header_compressor_used: AtomicU64,
    pub header_compressor_overshadowed: AtomicU64,
    pub header_gzip: AtomicU64,
    pub total_uncompressed_bytes: AtomicU64,
    pub total_compressed_bytes: AtomicU64,
    pub content_length_too_small: AtomicU64,
    pub not_compressed_etag: AtomicU64,
}

impl CompressorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_compressed(&self) {
        self.compressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_not_compressed(&self) {
        self.not_compressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_no_accept_header(&self) {
        self.no_accept_header.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_header_identity(&self) {
        self.header_identity.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_header_wildcard(&self) {
        self.header_wildcard.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_header_not_valid(&self) {
        self.header_not_valid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_header_compressor_used(&self) {
        self.header_compressor_used.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_header_compressor_overshadowed(&self) {
        self.header_compressor_overshadowed
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Tracks specifically gzip wins, mirroring the named counter spec
    /// §4.D calls out for the most common negotiated encoding.
    pub fn inc_header_gzip(&self) {
        self.header_gzip.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_uncompressed_bytes(&self, n: u64) {
        self.total_uncompressed_bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_compressed_bytes(&self, n: u64) {
        self.total_compressed_bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_content_length_too_small(&self) {
        self.content_length_too_small.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_not_compressed_etag(&self) {
        self.not_compressed_etag.fetch_add(1, Ordering::Relaxed);
    }
}

/// Counters a [`crate::decompressor::DecompressorFilter`] updates over its
/// lifetime.
#[derive(Debug, Default)]
pub struct DecompressorStats {
    pub decompressed: AtomicU64,
    pub not_decompressed: AtomicU64,
}

impl DecompressorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_decompressed(&self) {
        self.decompressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_not_decompressed(&self) {
        self.not_decompressed.fetch_add(1, Ordering::Relaxed);
    }
}
