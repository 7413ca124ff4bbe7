//! Streaming HTTP content-encoding negotiation, compression and
//! decompression filters.
//!
//! This crate provides the core of an HTTP proxy filter pair: a
//! [`compressor::CompressorFilter`] that negotiates and applies response
//! compression, and a [`decompressor::DecompressorFilter`] that reverses
//! it on the request and/or response side. A [`negotiate`] engine shares
//! one cached decision across every compressor filter chained on the same
//! stream, via a [`registry::StreamState`].
//!
//! # Features
//!
//! - `gzip` - gzip codec support (enabled by default)
//! - `brotli` - brotli codec support (enabled by default)
//! - `zstd` - zstd codec support
//! - `full` - all codecs
//!
//! # Example
//!
//! ```rust,no_run
//! use compressor_filters::compressor::CompressorFilter;
//! use compressor_filters::config::CompressorConfig;
//! use compressor_filters::codecs::gzip::{GzipCompressor, GzipParams};
//! use compressor_filters::gate::AlwaysOn;
//! use compressor_filters::headers::{HeaderAccess, HeaderMap};
//! use compressor_filters::registry::StreamState;
//! use compressor_filters::stats::CompressorStats;
//!
//! let config = CompressorConfig::builder("gzip")
//!     .codec_factory(|| Box::new(GzipCompressor::new(GzipParams::default())))
//!     .build();
//! let stats = CompressorStats::new();
//! let mut filter = CompressorFilter::new(config, &stats);
//! let state = StreamState::new();
//!
//! let mut req = HeaderMap::new();
//! req.set_header("accept-encoding", "gzip");
//! filter.decode_headers(&mut req, &state, &AlwaysOn);
//! ```

pub mod buffer;
pub mod codec;
pub mod codecs;
pub mod compressor;
pub mod config;
pub mod decompressor;
pub mod error;
pub mod gate;
pub mod headers;
pub mod negotiate;
pub mod registry;
pub mod stats;

pub use error::{CompressionError, Result};
