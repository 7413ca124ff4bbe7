//! Stream-scoped filter registry (spec §4.E, §3 "Per-stream filter
//! registry" / "Cached encoding decision").
//!
//! Per spec §5, all callbacks for one HTTP stream run on a single worker,
//! so this state needs no internal locking — a `RefCell` is enough,
//! matching `armature-compression/src/streaming.rs`'s non-`Sync` per-stream
//! encoder state.

use std::cell::RefCell;

use crate::config::CompressorConfig;

/// The four outcomes the negotiation engine (`crate::negotiate`) can
/// attribute a stat to, plus `Overshadowed` for "valid but lost to
/// another filter" (spec §3 "Cached encoding decision").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStat {
    NotValid,
    Identity,
    Wildcard,
    Overshadowed,
    Used,
}

/// Negotiation outcome for the whole stream, computed at most once and
/// shared by every compressor filter chained on it (spec §4.F).
#[derive(Debug, Clone)]
pub struct CachedDecision {
    pub chosen_encoding: String,
    pub header_stat: HeaderStat,
}

/// One filter's registration: its `content_encoding` plus the data the
/// negotiation engine needs (content-type allow-list).
struct RegisteredFilter {
    content_encoding: String,
    config: CompressorConfig,
}

/// Per-HTTP-stream registry of compressor filters plus the cached
/// negotiation decision (spec §4.E).
#[derive(Default)]
pub struct FilterRegistry {
    filters: Vec<RegisteredFilter>,
    decision: Option<CachedDecision>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            decision: None,
        }
    }

    /// Register `config` into the stream's chain, deduplicated
    /// case-insensitively by `content_encoding` (spec §4.E: "the later
    /// registration is ignored for negotiation purposes").
    pub fn register(&mut self, config: CompressorConfig) {
        let already_present = self
            .filters
            .iter()
            .any(|f| f.content_encoding.eq_ignore_ascii_case(&config.content_encoding));
        if !already_present {
            self.filters.push(RegisteredFilter {
                content_encoding: config.content_encoding.clone(),
                config,
            });
        }
    }

    /// Registered filter configs in registration order, as consumed by
    /// `crate::negotiate`.
    pub fn configs(&self) -> impl Iterator<Item = &CompressorConfig> {
        self.filters.iter().map(|f| &f.config)
    }

    pub fn decision(&self) -> Option<&CachedDecision> {
        self.decision.as_ref()
    }

    /// Store the negotiation verdict, computed by the first compressor
    /// filter to reach `encodeHeaders` on this stream (spec §4.F: "runs
    /// AT MOST ONCE per stream").
    pub fn set_decision(&mut self, decision: CachedDecision) {
        self.decision = Some(decision);
    }
}

/// Host-provided per-stream slot. A real runtime keys this into its own
/// filter-state bag under a fixed key (spec §6: "filter state... under
/// fixed keys `compressors`"); this type is the narrow collaborator this
/// crate needs from that bag.
#[derive(Default)]
pub struct StreamState {
    pub registry: RefCell<FilterRegistry>,
}

impl StreamState {
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(FilterRegistry::new()),
        }
    }
}
