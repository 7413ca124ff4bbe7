//! Case-insensitive header access (spec §6 "Header map with operations:
//! get/set/remove per name, case-insensitive").
//!
//! `HeaderAccess` is the narrow collaborator interface the filters in this
//! crate consume; a host HTTP runtime implements it over its own header
//! type. [`HeaderMap`] is a small SmallVec-backed implementation for
//! tests and for hosts with no header type of their own, grounded on
//! `armature-core/src/headers.rs`'s inline-storage header map.

use smallvec::SmallVec;

/// Number of headers stored inline before spilling to the heap.
pub const INLINE_HEADERS: usize = 12;

/// Case-insensitive get/set/remove over an HTTP header collection.
///
/// All filter logic in this crate is written against this trait rather
/// than against a concrete header type, so it can run over any host
/// runtime's header map.
pub trait HeaderAccess {
    fn header(&self, name: &str) -> Option<&str>;
    fn set_header(&mut self, name: &str, value: impl Into<String>);
    fn remove_header(&mut self, name: &str) -> Option<String>;
}

#[derive(Clone, PartialEq, Eq, Debug)]
struct Header {
    name: String,
    value: String,
}

impl Header {
    fn name_eq(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A compact, case-insensitive header map.
#[derive(Clone, Default, Debug)]
pub struct HeaderMap {
    inner: SmallVec<[Header; INLINE_HEADERS]>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            inner: SmallVec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|h| h.name_eq(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|h| (h.name.as_str(), h.value.as_str()))
    }
}

impl HeaderAccess for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|h| h.name_eq(name))
            .map(|h| h.value.as_str())
    }

    fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        for h in &mut self.inner {
            if h.name_eq(name) {
                h.value = value;
                return;
            }
        }
        self.inner.push(Header {
            name: name.to_string(),
            value,
        });
    }

    fn remove_header(&mut self, name: &str) -> Option<String> {
        let pos = self.inner.iter().position(|h| h.name_eq(name))?;
        Some(self.inner.remove(pos).value)
    }
}

impl FromIterator<(String, String)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.set_header(&name, value);
        }
        map
    }
}

/// Split a comma-separated header value into trimmed, non-empty tokens.
///
/// Used throughout the filters for `Vary`, `Cache-Control`, and
/// `Transfer-Encoding` token matching (spec §4.G/§4.H).
pub fn comma_tokens(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// True if `value`'s comma-separated tokens contain `target`,
/// case-insensitively.
pub fn contains_token(value: &str, target: &str) -> bool {
    comma_tokens(value).any(|t| t.eq_ignore_ascii_case(target))
}
