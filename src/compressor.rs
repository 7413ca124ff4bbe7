//! Compressor filter state machine (spec §4.G).
//!
//! Header-sanitization gate logic grounded on
//! `examples/original_source`'s `compressor.cc` (`isMinimumContentLength`,
//! `isContentTypeAllowed`, `isEtagAllowed`, `isTransferEncodingAllowed`,
//! `sanitizeEtagHeader`, `insertVaryHeader`); chunked drive loop grounded
//! on `armature-compression/src/streaming.rs`'s `StreamingCompressor`.

use crate::codec::{CodecMode, Compressor};
use crate::config::CompressorConfig;
use crate::gate::FeatureGate;
use crate::headers::{contains_token, HeaderAccess};
use crate::negotiate::negotiate;
use crate::registry::{HeaderStat, StreamState};
use crate::stats::CompressorStats;

const KNOWN_COMPRESSION_TOKENS: [&str; 3] = ["gzip", "br", "deflate"];

/// Per-filter-per-response state (spec §3 "Per-filter-per-response
/// state").
enum Phase {
    Start,
    AcceptedForResponse,
    Committed,
    Skipped,
    Done,
}

/// One compressor filter instance attached to one HTTP stream (spec
/// §4.G).
pub struct CompressorFilter<'a> {
    config: CompressorConfig,
    stats: &'a CompressorStats,
    phase: Phase,
    accept_encoding_snapshot: Option<String>,
    codec: Option<Box<dyn Compressor>>,
    observed_end_stream_on_data: bool,
}

impl<'a> CompressorFilter<'a> {
    pub fn new(config: CompressorConfig, stats: &'a CompressorStats) -> Self {
        Self {
            config,
            stats,
            phase: Phase::Start,
            accept_encoding_snapshot: None,
            codec: None,
            observed_end_stream_on_data: false,
        }
    }

    /// Spec §4.G `decodeHeaders`.
    pub fn decode_headers(
        &mut self,
        req_headers: &mut impl HeaderAccess,
        state: &StreamState,
        gate: &dyn FeatureGate,
    ) {
        self.accept_encoding_snapshot = req_headers.header("accept-encoding").map(str::to_string);
        state.registry.borrow_mut().register(self.config.clone());

        if !gate.enabled(&self.config.feature_gate_key) {
            self.phase = Phase::Skipped;
            self.stats.inc_not_compressed();
            return;
        }
        self.phase = Phase::AcceptedForResponse;
        if self.config.remove_accept_encoding {
            req_headers.remove_header("accept-encoding");
        }
    }

    /// Spec §4.G `encodeHeaders`. Returns `true` if compression was
    /// committed, so the caller knows whether to drive `encodeData`
    /// through the codec.
    pub fn encode_headers(
        &mut self,
        resp_headers: &mut impl HeaderAccess,
        end_stream: bool,
        state: &StreamState,
    ) -> bool {
        if matches!(self.phase, Phase::Skipped | Phase::Done) || end_stream {
            return false;
        }

        let decision_stat = self.negotiation_stat(resp_headers, state);

        let negotiated = matches!(
            decision_stat,
            Some(HeaderStat::Used) | Some(HeaderStat::Wildcard)
        );

        let no_existing_encoding = resp_headers.header("content-encoding").is_none();
        let content_type = resp_headers
            .header("content-type")
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string());
        let content_type_eligible = self.config.content_type_allowed(content_type.as_deref());
        let no_transform = resp_headers
            .header("cache-control")
            .map(|cc| contains_token(cc, "no-transform"))
            .unwrap_or(false);
        let transfer_encoding_allowed = !resp_headers
            .header("transfer-encoding")
            .map(|te| {
                KNOWN_COMPRESSION_TOKENS
                    .iter()
                    .copied()
                    .chain(std::iter::once(self.config.content_encoding.as_str()))
                    .any(|token| contains_token(te, token))
            })
            .unwrap_or(false);
        let etag_allowed = if self.config.disable_on_etag {
            let has_etag = resp_headers.header("etag").is_some();
            if has_etag {
                self.stats.inc_not_compressed_etag();
            }
            !has_etag
        } else {
            true
        };
        let chunked = resp_headers
            .header("transfer-encoding")
            .map(|te| contains_token(te, "chunked"))
            .unwrap_or(false);
        let size_ok = match resp_headers.header("content-length").and_then(|cl| cl.parse::<u64>().ok()) {
            Some(len) => len >= self.config.min_content_length as u64,
            None => chunked,
        };
        if !size_ok && !chunked {
            self.stats.inc_content_length_too_small();
        }

        let has_accept_header = self.accept_encoding_snapshot.is_some();
        if !has_accept_header {
            self.stats.inc_no_accept_header();
        }

        let committed = has_accept_header
            && negotiated
            && no_existing_encoding
            && !no_transform
            && content_type_eligible
            && etag_allowed
            && transfer_encoding_allowed
            && (size_ok || chunked);

        if committed {
            self.commit(resp_headers);
            self.phase = Phase::Committed;
            return true;
        }

        self.phase = Phase::Skipped;
        self.stats.inc_not_compressed();

        // Open Question 2 resolution (see DESIGN.md): Vary is injected
        // for content-type-eligible responses even when refused for
        // other reasons, EXCEPT no-transform or content-type
        // ineligibility.
        if content_type_eligible && !no_transform {
            self.insert_vary(resp_headers);
        }
        false
    }

    /// Run negotiation (once per stream, cached in the registry) and
    /// record the stat this filter should attribute. Returns the stat
    /// *as observed by this filter* — `Used` only if this filter's own
    /// encoding won.
    fn negotiation_stat(
        &self,
        resp_headers: &impl HeaderAccess,
        state: &StreamState,
    ) -> Option<HeaderStat> {
        let mut registry = state.registry.borrow_mut();
        if registry.decision().is_none() {
            let content_type = resp_headers
                .header("content-type")
                .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string());
            let configs: Vec<CompressorConfig> = registry.configs().cloned().collect();
            let decision = negotiate(
                self.accept_encoding_snapshot.as_deref(),
                configs.iter(),
                content_type.as_deref(),
                &self.config.content_encoding,
            );
            registry.set_decision(decision);
        }
        let decision = registry.decision().expect("just set above").clone();

        let stat = if decision.chosen_encoding.eq_ignore_ascii_case(&self.config.content_encoding)
        {
            match decision.header_stat {
                HeaderStat::Used | HeaderStat::Wildcard => decision.header_stat,
                other => other,
            }
        } else {
            match decision.header_stat {
                HeaderStat::Used | HeaderStat::Wildcard => HeaderStat::Overshadowed,
                other => other,
            }
        };

        match stat {
            HeaderStat::Used => {
                self.stats.inc_header_compressor_used();
                if self.config.content_encoding.eq_ignore_ascii_case("gzip") {
                    self.stats.inc_header_gzip();
                }
            }
            HeaderStat::Wildcard => {
                self.stats.inc_header_wildcard();
                if self.config.content_encoding.eq_ignore_ascii_case("gzip") {
                    self.stats.inc_header_gzip();
                }
            }
            HeaderStat::Overshadowed => self.stats.inc_header_compressor_overshadowed(),
            HeaderStat::Identity => self.stats.inc_header_identity(),
            HeaderStat::NotValid => self.stats.inc_header_not_valid(),
        }

        Some(stat)
    }

    fn commit(&mut self, resp_headers: &mut impl HeaderAccess) {
        let is_weak_etag = resp_headers
            .header("etag")
            .map(|v| v.starts_with("W/") || v.starts_with("w/"))
            .unwrap_or(true);
        if !is_weak_etag {
            resp_headers.remove_header("etag");
        }

        self.insert_vary(resp_headers);
        resp_headers.remove_header("content-length");
        resp_headers.set_header("content-encoding", self.config.content_encoding.clone());

        let mut codec = self.config.new_codec();
        if let Err(e) = codec.init() {
            tracing::warn!("codec init failed for {}: {}", self.config.content_encoding, e);
            resp_headers.remove_header("content-encoding");
            self.phase = Phase::Skipped;
            self.stats.inc_not_compressed();
            return;
        }
        self.codec = Some(codec);
        self.stats.inc_compressed();
    }

    fn insert_vary(&self, resp_headers: &mut impl HeaderAccess) {
        match resp_headers.header("vary") {
            Some(existing) if contains_token(existing, "accept-encoding") => {}
            Some(existing) => {
                let updated = format!("{existing}, Accept-Encoding");
                resp_headers.set_header("vary", updated);
            }
            None => resp_headers.set_header("vary", "Accept-Encoding"),
        }
    }

    /// Spec §4.G `encodeData`.
    ///
    /// A codec error mid-stream is fatal for this response (spec §7): it
    /// is propagated to the caller rather than swallowed, so the runtime
    /// can close the connection instead of forwarding a truncated or
    /// corrupt body.
    pub fn encode_data(
        &mut self,
        data: &mut crate::buffer::StreamBuffer,
        end_stream: bool,
    ) -> crate::Result<()> {
        if !matches!(self.phase, Phase::Committed) {
            return Ok(());
        }
        let Some(codec) = self.codec.as_mut() else {
            return Ok(());
        };
        let uncompressed_len = data.len() as u64;
        self.stats.add_uncompressed_bytes(uncompressed_len);
        let mode = if end_stream {
            CodecMode::Finish
        } else {
            CodecMode::Flush
        };
        if let Err(e) = codec.compress(data, mode) {
            tracing::error!("codec failure mid-stream for {}: {}", self.config.content_encoding, e);
            self.phase = Phase::Done;
            return Err(e);
        }
        // `compress` drains its input and appends compressed output onto
        // the same buffer, so `data.len()` after the call is exactly the
        // compressed byte count for this chunk.
        self.stats.add_compressed_bytes(data.len() as u64);
        if end_stream {
            self.observed_end_stream_on_data = true;
            self.phase = Phase::Done;
        }
        Ok(())
    }

    /// Spec §4.G `encodeTrailers`.
    pub fn encode_trailers(&mut self) -> crate::Result<Option<crate::buffer::StreamBuffer>> {
        if !matches!(self.phase, Phase::Committed) || self.observed_end_stream_on_data {
            return Ok(None);
        }
        let Some(codec) = self.codec.as_mut() else {
            return Ok(None);
        };
        let mut scratch = crate::buffer::StreamBuffer::new();
        match codec.compress(&mut scratch, CodecMode::Finish) {
            Ok(()) => {
                self.stats.add_compressed_bytes(scratch.len() as u64);
                self.phase = Phase::Done;
                Ok(Some(scratch))
            }
            Err(e) => {
                tracing::error!(
                    "codec failure finalizing {}: {}",
                    self.config.content_encoding,
                    e
                );
                self.phase = Phase::Done;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::StreamBuffer;
    use crate::codecs::gzip::{GzipCompressor, GzipParams};
    use crate::gate::AlwaysOn;
    use crate::headers::HeaderMap;
    use std::sync::atomic::Ordering;

    fn gzip_config() -> CompressorConfig {
        CompressorConfig::builder("gzip")
            .codec_factory(|| Box::new(GzipCompressor::new(GzipParams::default())))
            .build()
    }

    #[test]
    fn s1_basic_gzip_commits_and_rewrites_headers() {
        let stats = CompressorStats::new();
        let mut filter = CompressorFilter::new(gzip_config(), &stats);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "deflate, gzip");
        filter.decode_headers(&mut req, &state, &AlwaysOn);

        let mut resp = HeaderMap::new();
        resp.set_header("content-length", "256");
        resp.set_header("content-type", "text/plain");
        let committed = filter.encode_headers(&mut resp, false, &state);

        assert!(committed);
        assert_eq!(resp.header("content-encoding"), Some("gzip"));
        assert_eq!(resp.header("vary"), Some("Accept-Encoding"));
        assert!(resp.header("content-length").is_none());

        let body: Vec<u8> = (0..256u32).map(|b| b as u8).collect();
        let mut data = StreamBuffer::from_bytes(body.clone());
        filter.encode_data(&mut data, true).unwrap();

        let mut decompressor = crate::codecs::gzip::GzipDecompressor::new(GzipParams::default());
        decompressor.init().unwrap();
        let mut out = StreamBuffer::new();
        decompressor.decompress(&data, &mut out).unwrap();
        assert_eq!(out.to_contiguous(), body);

        assert_eq!(stats.compressed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.total_uncompressed_bytes.load(Ordering::Relaxed), 256);
    }

    /// A codec stub whose `compress` always fails, for exercising the
    /// mid-stream error-propagation path without depending on a real
    /// codec's internal state machine.
    struct FailingCompressor;

    impl crate::codec::Compressor for FailingCompressor {
        fn init(&mut self) -> crate::Result<()> {
            Ok(())
        }

        fn compress(&mut self, _buf: &mut StreamBuffer, _mode: CodecMode) -> crate::Result<()> {
            Err(crate::error::CompressionError::CompressionFailed("boom".to_string()))
        }

        fn content_encoding(&self) -> &'static str {
            "gzip"
        }
    }

    #[test]
    fn codec_error_mid_stream_is_propagated() {
        let stats = CompressorStats::new();
        let config = CompressorConfig::builder("gzip")
            .codec_factory(|| Box::new(FailingCompressor))
            .build();
        let mut filter = CompressorFilter::new(config, &stats);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "gzip");
        filter.decode_headers(&mut req, &state, &AlwaysOn);

        let mut resp = HeaderMap::new();
        resp.set_header("content-length", "256");
        assert!(filter.encode_headers(&mut resp, false, &state));

        let mut data = StreamBuffer::from_bytes(b"chunk one".to_vec());
        let result = filter.encode_data(&mut data, false);
        assert!(result.is_err());

        // The filter must not keep driving a codec that already failed.
        let mut more = StreamBuffer::from_bytes(b"chunk two".to_vec());
        assert!(filter.encode_data(&mut more, false).is_ok());
        assert_eq!(stats.total_compressed_bytes.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn s5_no_transform_blocks_commit_and_suppresses_vary() {
        let stats = CompressorStats::new();
        let mut filter = CompressorFilter::new(gzip_config(), &stats);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "gzip");
        filter.decode_headers(&mut req, &state, &AlwaysOn);

        let mut resp = HeaderMap::new();
        resp.set_header("cache-control", "no-transform");
        resp.set_header("content-length", "256");
        let committed = filter.encode_headers(&mut resp, false, &state);

        assert!(!committed);
        assert!(resp.header("vary").is_none());
        assert!(resp.header("content-encoding").is_none());
        assert_eq!(stats.not_compressed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn s3_overshadowed_filter_does_not_commit_second_does() {
        let stats1 = CompressorStats::new();
        let stats2 = CompressorStats::new();
        let config1 = CompressorConfig::builder("test1")
            .codec_factory(|| Box::new(GzipCompressor::new(GzipParams::default())))
            .build();
        let config2 = CompressorConfig::builder("test2")
            .codec_factory(|| Box::new(GzipCompressor::new(GzipParams::default())))
            .build();
        let mut filter1 = CompressorFilter::new(config1, &stats1);
        let mut filter2 = CompressorFilter::new(config2, &stats2);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "test1;q=.5, test2;q=0.75");
        filter1.decode_headers(&mut req, &state, &AlwaysOn);
        filter2.decode_headers(&mut req, &state, &AlwaysOn);

        let mut resp1 = HeaderMap::new();
        resp1.set_header("content-length", "256");
        let committed1 = filter1.encode_headers(&mut resp1, false, &state);
        assert!(!committed1);
        assert_eq!(stats1.header_compressor_overshadowed.load(Ordering::Relaxed), 1);

        let mut resp2 = HeaderMap::new();
        resp2.set_header("content-length", "256");
        let committed2 = filter2.encode_headers(&mut resp2, false, &state);
        assert!(committed2);
        assert_eq!(resp2.header("content-encoding"), Some("test2"));
    }

    #[test]
    fn feature_gate_disabled_skips_without_negotiation() {
        use crate::gate::AlwaysOff;
        let stats = CompressorStats::new();
        let mut filter = CompressorFilter::new(gzip_config(), &stats);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "gzip");
        filter.decode_headers(&mut req, &state, &AlwaysOff);

        let mut resp = HeaderMap::new();
        resp.set_header("content-length", "256");
        let committed = filter.encode_headers(&mut resp, false, &state);
        assert!(!committed);
        assert_eq!(stats.not_compressed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn weak_etag_preserved_strong_etag_stripped() {
        let stats = CompressorStats::new();
        let mut filter = CompressorFilter::new(gzip_config(), &stats);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "gzip");
        filter.decode_headers(&mut req, &state, &AlwaysOn);

        let mut resp = HeaderMap::new();
        resp.set_header("content-length", "256");
        resp.set_header("etag", "W/\"abc\"");
        assert!(filter.encode_headers(&mut resp, false, &state));
        assert_eq!(resp.header("etag"), Some("W/\"abc\""));
    }

    #[test]
    fn content_length_too_small_without_chunked_does_not_commit() {
        let stats = CompressorStats::new();
        let mut filter = CompressorFilter::new(gzip_config(), &stats);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "gzip");
        filter.decode_headers(&mut req, &state, &AlwaysOn);

        let mut resp = HeaderMap::new();
        resp.set_header("content-length", "10");
        let committed = filter.encode_headers(&mut resp, false, &state);
        assert!(!committed);
        assert_eq!(stats.content_length_too_small.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn chunked_transfer_encoding_allows_unknown_size_commit() {
        let stats = CompressorStats::new();
        let mut filter = CompressorFilter::new(gzip_config(), &stats);
        let state = StreamState::new();

        let mut req = HeaderMap::new();
        req.set_header("accept-encoding", "gzip");
        filter.decode_headers(&mut req, &state, &AlwaysOn);

        let mut resp = HeaderMap::new();
        resp.set_header("transfer-encoding", "chunked");
        let committed = filter.encode_headers(&mut resp, false, &state);
        assert!(committed);
    }
}
