//! Filter configuration (spec §3 "Filter config", §4.D).
//!
//! Grounded on `armature-compression/src/config.rs`'s
//! `CompressionConfig`/`CompressionConfigBuilder` shape, extended with the
//! fields spec §3 names that the teacher's whole-body middleware didn't
//! need: `disable_on_etag`, `remove_accept_encoding`, `feature_gate_key`,
//! `content_encoding`, and a codec factory closure in place of a fixed
//! algorithm enum.

use std::collections::HashSet;
use std::sync::Arc;

use crate::codec::{Compressor, Decompressor};

/// Minimum response size in bytes to compress, spec §3 default.
pub const DEFAULT_MIN_CONTENT_LENGTH: u32 = 30;

/// The canonical content-type set from the spec's GLOSSARY (Open Question
/// 1 resolution — see `DESIGN.md`).
pub fn default_content_types() -> HashSet<String> {
    [
        "text/html",
        "text/plain",
        "text/css",
        "application/javascript",
        "application/x-javascript",
        "text/javascript",
        "text/x-javascript",
        "text/ecmascript",
        "text/js",
        "text/jscript",
        "text/x-js",
        "application/ecmascript",
        "application/x-json",
        "application/xml",
        "application/json",
        "image/svg+xml",
        "text/xml",
        "application/xhtml+xml",
    ]
    .into_iter()
    .map(str::to_lowercase)
    .collect()
}

/// Immutable-after-build policy for a compressor filter (spec §3).
#[derive(Clone)]
pub struct CompressorConfig {
    pub min_content_length: u32,
    pub content_types: HashSet<String>,
    pub disable_on_etag: bool,
    pub remove_accept_encoding: bool,
    pub feature_gate_key: String,
    pub content_encoding: String,
    codec_factory: Arc<dyn Fn() -> Box<dyn Compressor> + Send + Sync>,
}

impl CompressorConfig {
    pub fn builder(content_encoding: impl Into<String>) -> CompressorConfigBuilder {
        CompressorConfigBuilder::new(content_encoding)
    }

    /// Instantiate a fresh codec for one response, spec §3's "fresh
    /// instance per response".
    pub fn new_codec(&self) -> Box<dyn Compressor> {
        (self.codec_factory)()
    }

    /// True if `content_type` (already trimmed at `;`) is eligible, per
    /// spec §4.F step 1: "content_types is non-empty AND the response's
    /// content-type is not in that set ⇒ skip".
    pub fn content_type_allowed(&self, content_type: Option<&str>) -> bool {
        match content_type {
            Some(ct) if !self.content_types.is_empty() => {
                self.content_types.contains(&ct.to_lowercase())
            }
            _ => true,
        }
    }
}

/// Builder for [`CompressorConfig`].
pub struct CompressorConfigBuilder {
    min_content_length: u32,
    content_types: HashSet<String>,
    disable_on_etag: bool,
    remove_accept_encoding: bool,
    feature_gate_key: String,
    content_encoding: String,
    codec_factory: Option<Arc<dyn Fn() -> Box<dyn Compressor> + Send + Sync>>,
}

impl CompressorConfigBuilder {
    pub fn new(content_encoding: impl Into<String>) -> Self {
        Self {
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            content_types: default_content_types(),
            disable_on_etag: false,
            remove_accept_encoding: false,
            feature_gate_key: String::new(),
            content_encoding: content_encoding.into(),
            codec_factory: None,
        }
    }

    pub fn min_content_length(mut self, n: u32) -> Self {
        self.min_content_length = n;
        self
    }

    pub fn content_types(mut self, types: HashSet<String>) -> Self {
        self.content_types = types.into_iter().map(|s| s.to_lowercase()).collect();
        self
    }

    pub fn disable_on_etag(mut self, disable: bool) -> Self {
        self.disable_on_etag = disable;
        self
    }

    pub fn remove_accept_encoding(mut self, remove: bool) -> Self {
        self.remove_accept_encoding = remove;
        self
    }

    pub fn feature_gate_key(mut self, key: impl Into<String>) -> Self {
        self.feature_gate_key = key.into();
        self
    }

    pub fn codec_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Compressor> + Send + Sync + 'static,
    {
        self.codec_factory = Some(Arc::new(factory));
        self
    }

    /// Build the config. Panics at build time, not at request time, if no
    /// codec factory was supplied — a missing factory is a configuration
    /// bug.
    pub fn build(self) -> CompressorConfig {
        CompressorConfig {
            min_content_length: self.min_content_length,
            content_types: self.content_types,
            disable_on_etag: self.disable_on_etag,
            remove_accept_encoding: self.remove_accept_encoding,
            feature_gate_key: self.feature_gate_key,
            content_encoding: self.content_encoding,
            codec_factory: self
                .codec_factory
                .expect("CompressorConfigBuilder::build called without a codec_factory"),
        }
    }
}

/// Direction a decompressor filter operates on (spec §4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressionDirection {
    Request,
    Response,
    ResponseAndRequest,
}

impl DecompressionDirection {
    pub fn decompresses_request(self) -> bool {
        matches!(self, Self::Request | Self::ResponseAndRequest)
    }

    pub fn decompresses_response(self) -> bool {
        matches!(self, Self::Response | Self::ResponseAndRequest)
    }
}

/// Immutable-after-build policy for a decompressor filter (spec §4.H).
#[derive(Clone)]
pub struct DecompressorConfig {
    pub direction: DecompressionDirection,
    pub content_encoding: String,
    pub feature_gate_key: String,
    codec_factory: Arc<dyn Fn() -> Box<dyn Decompressor> + Send + Sync>,
}

impl DecompressorConfig {
    pub fn builder(
        direction: DecompressionDirection,
        content_encoding: impl Into<String>,
    ) -> DecompressorConfigBuilder {
        DecompressorConfigBuilder::new(direction, content_encoding)
    }

    pub fn new_codec(&self) -> Box<dyn Decompressor> {
        (self.codec_factory)()
    }
}

/// Builder for [`DecompressorConfig`].
pub struct DecompressorConfigBuilder {
    direction: DecompressionDirection,
    content_encoding: String,
    feature_gate_key: String,
    codec_factory: Option<Arc<dyn Fn() -> Box<dyn Decompressor> + Send + Sync>>,
}

impl DecompressorConfigBuilder {
    pub fn new(direction: DecompressionDirection, content_encoding: impl Into<String>) -> Self {
        Self {
            direction,
            content_encoding: content_encoding.into(),
            feature_gate_key: String::new(),
            codec_factory: None,
        }
    }

    pub fn feature_gate_key(mut self, key: impl Into<String>) -> Self {
        self.feature_gate_key = key.into();
        self
    }

    pub fn codec_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Decompressor> + Send + Sync + 'static,
    {
        self.codec_factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> DecompressorConfig {
        DecompressorConfig {
            direction: self.direction,
            content_encoding: self.content_encoding,
            feature_gate_key: self.feature_gate_key,
            codec_factory: self
                .codec_factory
                .expect("DecompressorConfigBuilder::build called without a codec_factory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::gzip::{GzipCompressor, GzipParams};

    #[test]
    fn default_content_type_set_has_eighteen_entries() {
        assert_eq!(default_content_types().len(), 18);
        assert!(default_content_types().contains("text/html"));
        assert!(default_content_types().contains("application/json"));
    }

    #[test]
    fn builder_defaults() {
        let config = CompressorConfig::builder("gzip")
            .codec_factory(|| Box::new(GzipCompressor::new(GzipParams::default())))
            .build();
        assert_eq!(config.min_content_length, DEFAULT_MIN_CONTENT_LENGTH);
        assert_eq!(config.content_encoding, "gzip");
        assert!(!config.disable_on_etag);
    }

    #[test]
    fn content_type_allowed_empty_set_allows_everything() {
        let config = CompressorConfig::builder("gzip")
            .content_types(HashSet::new())
            .codec_factory(|| Box::new(GzipCompressor::new(GzipParams::default())))
            .build();
        assert!(config.content_type_allowed(Some("image/png")));
        assert!(config.content_type_allowed(None));
    }

    #[test]
    fn content_type_allowed_checks_case_insensitively() {
        let config = CompressorConfig::builder("gzip")
            .codec_factory(|| Box::new(GzipCompressor::new(GzipParams::default())))
            .build();
        assert!(config.content_type_allowed(Some("Text/HTML")));
        assert!(!config.content_type_allowed(Some("image/png")));
    }

    #[test]
    fn decompression_direction_flags() {
        assert!(DecompressionDirection::Request.decompresses_request());
        assert!(!DecompressionDirection::Request.decompresses_response());
        assert!(DecompressionDirection::ResponseAndRequest.decompresses_request());
        assert!(DecompressionDirection::ResponseAndRequest.decompresses_response());
    }
}
