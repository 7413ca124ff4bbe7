//! Decompressor filter state machine (spec §4.H).
//!
//! Accept-Encoding injection and Content-Encoding token-stripping grounded
//! on `examples/original_source`'s `decompressor.cc`
//! (`insertAcceptEncoding`/content-encoding-token handling).

use crate::buffer::StreamBuffer;
use crate::codec::Decompressor;
use crate::config::{DecompressionDirection, DecompressorConfig};
use crate::gate::FeatureGate;
use crate::headers::HeaderAccess;
use crate::stats::DecompressorStats;

/// One decompressor filter instance attached to one HTTP stream (spec
/// §4.H).
pub struct DecompressorFilter<'a> {
    config: DecompressorConfig,
    stats: &'a DecompressorStats,
    request_codec: Option<Box<dyn Decompressor>>,
    response_codec: Option<Box<dyn Decompressor>>,
}

impl<'a> DecompressorFilter<'a> {
    pub fn new(config: DecompressorConfig, stats: &'a DecompressorStats) -> Self {
        Self {
            config,
            stats,
            request_codec: None,
            response_codec: None,
        }
    }

    /// Spec §4.H `decodeHeaders`.
    pub fn decode_headers(
        &mut self,
        req_headers: &mut impl HeaderAccess,
        gate: &dyn FeatureGate,
    ) {
        if self.config.direction.decompresses_response() {
            inject_accept_encoding(req_headers, &self.config.content_encoding);
        }

        if !self.config.direction.decompresses_request() {
            return;
        }
        if !gate.enabled(&self.config.feature_gate_key) {
            return;
        }
        let no_transform = req_headers
            .header("cache-control")
            .map(|cc| crate::headers::contains_token(cc, "no-transform"))
            .unwrap_or(false);
        if no_transform {
            return;
        }
        if strip_matching_token(req_headers, &self.config.content_encoding) {
            let mut codec = self.config.new_codec();
            if codec.init().is_ok() {
                self.request_codec = Some(codec);
                self.stats.inc_decompressed();
            } else {
                self.stats.inc_not_decompressed();
            }
        }
    }

    /// Spec §4.H `decodeData`.
    pub fn decode_data(&mut self, data: &mut StreamBuffer) {
        if let Some(codec) = self.request_codec.as_mut() {
            pipe_through(codec.as_mut(), data, self.stats);
        }
    }

    /// Spec §4.H `encodeHeaders` (response side, symmetric to
    /// `decode_headers`'s request-side branch).
    pub fn encode_headers(
        &mut self,
        resp_headers: &mut impl HeaderAccess,
        gate: &dyn FeatureGate,
    ) {
        if !matches!(
            self.config.direction,
            DecompressionDirection::Response | DecompressionDirection::ResponseAndRequest
        ) {
            return;
        }
        if !gate.enabled(&self.config.feature_gate_key) {
            return;
        }
        let no_transform = resp_headers
            .header("cache-control")
            .map(|cc| crate::headers::contains_token(cc, "no-transform"))
            .unwrap_or(false);
        if no_transform {
            return;
        }
        if strip_matching_token(resp_headers, &self.config.content_encoding) {
            let mut codec = self.config.new_codec();
            if codec.init().is_ok() {
                self.response_codec = Some(codec);
                self.stats.inc_decompressed();
            } else {
                self.stats.inc_not_decompressed();
            }
        }
    }

    /// Spec §4.H `encodeData`.
    pub fn encode_data(&mut self, data: &mut StreamBuffer) {
        if let Some(codec) = self.response_codec.as_mut() {
            pipe_through(codec.as_mut(), data, self.stats);
        }
    }
}

fn pipe_through(codec: &mut dyn Decompressor, data: &mut StreamBuffer, stats: &DecompressorStats) {
    let mut output = StreamBuffer::new();
    if let Err(e) = codec.decompress(data, &mut output) {
        tracing::warn!("decompression failed: {}", e);
        stats.inc_not_decompressed();
        return;
    }
    *data = output;
}

/// Prepend-or-reorder `encoding` to the front of `Accept-Encoding` (spec
/// §4.H: "prepends this encoding if absent, else reorders so it is
/// first, preserving other names and trimming each").
fn inject_accept_encoding(req_headers: &mut impl HeaderAccess, encoding: &str) {
    let existing = req_headers.header("accept-encoding").unwrap_or("").to_string();
    let mut names: Vec<String> = crate::headers::comma_tokens(&existing)
        .filter(|tok| !tok.eq_ignore_ascii_case(encoding))
        .map(str::to_string)
        .collect();
    names.insert(0, encoding.to_string());
    req_headers.set_header("accept-encoding", names.join(", "));
}

/// Strip the leading token matching `encoding` (case-insensitive) from
/// `Content-Encoding`, removing the header if nothing remains (spec
/// §4.H: "split once on `,`... else remove the header outright").
///
/// Returns `true` if a match was stripped.
fn strip_matching_token(headers: &mut impl HeaderAccess, encoding: &str) -> bool {
    let Some(value) = headers.header("content-encoding").map(str::to_string) else {
        return false;
    };
    let mut parts = value.splitn(2, ',');
    let first = parts.next().unwrap_or("").trim();
    if !first.eq_ignore_ascii_case(encoding) {
        return false;
    }
    match parts.next() {
        Some(rest) if !rest.trim().is_empty() => {
            headers.set_header("content-encoding", rest.trim().to_string());
        }
        _ => {
            headers.remove_header("content-encoding");
        }
    }
    true
}
