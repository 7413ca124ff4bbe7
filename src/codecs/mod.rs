//! Concrete codec implementations (spec §4.C).
//!
//! Each submodule wraps a native compression library as a
//! [`crate::codec::Compressor`]/[`crate::codec::Decompressor`]. Gated
//! behind the crate features of the same name so a consumer only pulls in
//! the native dependencies it needs.

#[cfg(feature = "gzip")]
pub mod gzip;

#[cfg(feature = "brotli")]
pub mod brotli;

#[cfg(feature = "zstd")]
pub mod zstd;
