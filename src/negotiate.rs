//! Multi-encoding negotiation engine (spec §4.F).
//!
//! Token-parsing shape grounded on `examples/original_source`'s
//! `compressor.cc` `isAcceptEncodingAllowed`, adapted from "one encoding
//! vs. one filter" to the registry-based "one encoding vs. N chained
//! filters" contract spec §3/§4.E add around it.

use std::collections::HashMap;

use crate::config::CompressorConfig;
use crate::registry::{CachedDecision, HeaderStat};

const IDENTITY: &str = "identity";
const WILDCARD: &str = "*";

/// One parsed `Accept-Encoding` element (spec §3 "Encoding preference").
struct Preference {
    name: String,
    q: f32,
}

/// Split `header_value` on `,` and parse each element into a
/// [`Preference`], per spec §4.F step 2.
///
/// A token whose `q` parameter fails to parse as a float is dropped
/// entirely. A token with `q=0` is kept (it is needed to blacklist a name
/// in step 3) even though it can never win in step 5.
fn parse_preferences(header_value: &str) -> Vec<Preference> {
    let mut prefs = Vec::new();
    for token in header_value.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let mut parts = token.split(';');
        let name = match parts.next() {
            Some(n) => n.trim(),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }

        let mut q = 1.0f32;
        let mut malformed = false;
        for param in parts {
            let param = param.trim();
            let Some(value) = param
                .strip_prefix("q=")
                .or_else(|| param.strip_prefix("Q="))
            else {
                continue;
            };
            match value.trim().parse::<f32>() {
                Ok(parsed) => q = parsed,
                Err(_) => malformed = true,
            }
        }
        if malformed {
            continue;
        }
        prefs.push(Preference {
            name: name.to_lowercase(),
            q,
        });
    }
    prefs
}

/// Build the allowed-encoding map for one negotiation run: registered
/// encodings whose owning config accepts `content_type`, keyed by
/// lowercase name to registration index (spec §4.F step 1).
fn build_allowed_map<'a>(
    configs: impl Iterator<Item = &'a CompressorConfig>,
    content_type: Option<&str>,
) -> HashMap<String, usize> {
    let mut allowed = HashMap::new();
    for (index, config) in configs.enumerate() {
        if !config.content_type_allowed(content_type) {
            continue;
        }
        let key = config.content_encoding.to_lowercase();
        allowed.entry(key).or_insert(index);
    }
    allowed
}

/// Run the negotiation algorithm for `this_encoding` (spec §4.F).
///
/// `configs` must be supplied in registration order; `content_type` is
/// the response's `Content-Type`, already trimmed at `;`, if present.
pub fn negotiate<'a>(
    accept_encoding: Option<&str>,
    configs: impl Iterator<Item = &'a CompressorConfig>,
    content_type: Option<&str>,
    this_encoding: &str,
) -> CachedDecision {
    let mut allowed = build_allowed_map(configs, content_type);

    let Some(header_value) = accept_encoding else {
        return CachedDecision {
            chosen_encoding: IDENTITY.to_string(),
            header_stat: HeaderStat::NotValid,
        };
    };

    let preferences = parse_preferences(header_value);

    // Step 3: explicit q=0 blacklists a name from the allowed map.
    for pref in &preferences {
        if pref.q == 0.0 {
            allowed.remove(&pref.name);
        }
    }

    // Step 4: empty effective preferences.
    if preferences.is_empty() {
        return CachedDecision {
            chosen_encoding: IDENTITY.to_string(),
            header_stat: HeaderStat::NotValid,
        };
    }

    // Step 5: highest-q winner, first-wins tie-break via linear scan
    // (Open Question 3 resolution — see DESIGN.md).
    let mut winner_name = IDENTITY.to_string();
    let mut winner_q = 0.0f32;
    for pref in &preferences {
        let acceptable =
            allowed.contains_key(&pref.name) || pref.name == IDENTITY || pref.name == WILDCARD;
        if pref.q > winner_q && acceptable {
            winner_name = pref.name.clone();
            winner_q = pref.q;
        }
    }

    // Step 6: interpret the winner.
    if winner_q == 0.0 {
        return CachedDecision {
            chosen_encoding: IDENTITY.to_string(),
            header_stat: HeaderStat::NotValid,
        };
    }
    if winner_name == IDENTITY {
        return CachedDecision {
            chosen_encoding: IDENTITY.to_string(),
            header_stat: HeaderStat::Identity,
        };
    }
    if winner_name == WILDCARD {
        if let Some((name, _)) = allowed.iter().min_by_key(|(_, index)| **index) {
            return CachedDecision {
                chosen_encoding: name.clone(),
                header_stat: HeaderStat::Wildcard,
            };
        }
        return CachedDecision {
            chosen_encoding: IDENTITY.to_string(),
            header_stat: HeaderStat::NotValid,
        };
    }
    if winner_name.eq_ignore_ascii_case(this_encoding) {
        return CachedDecision {
            chosen_encoding: winner_name,
            header_stat: HeaderStat::Used,
        };
    }
    if !allowed.is_empty() {
        return CachedDecision {
            chosen_encoding: winner_name,
            header_stat: HeaderStat::Overshadowed,
        };
    }
    CachedDecision {
        chosen_encoding: IDENTITY.to_string(),
        header_stat: HeaderStat::NotValid,
    }
}
