//! Scatter-gather byte buffer (spec §4.A / §3 "Streaming byte buffer").
//!
//! `StreamBuffer` holds an ordered sequence of immutable [`Bytes`] slices.
//! Slices may be zero-copy views into upstream-owned memory; the buffer
//! only owns their lifetime, not necessarily the backing allocation.

use bytes::{Bytes, BytesMut};

/// An ordered sequence of byte slices, append/drain at the ends.
///
/// Mirrors the chunk currency `armature-compression`'s streaming encoder
/// uses (`bytes::Bytes`/`BytesMut`), generalized to hold more than one
/// chunk at a time so codec loops can enumerate slices without copying.
#[derive(Debug, Default, Clone)]
pub struct StreamBuffer {
    slices: Vec<Bytes>,
}

impl StreamBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { slices: Vec::new() }
    }

    /// Create a buffer pre-loaded with a single slice.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            Self::new()
        } else {
            Self {
                slices: vec![bytes],
            }
        }
    }

    /// Total length across all slices.
    pub fn len(&self) -> usize {
        self.slices.iter().map(Bytes::len).sum()
    }

    /// True if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.slices.iter().all(Bytes::is_empty)
    }

    /// Enumerate the slices currently held, in order.
    ///
    /// The returned slice views are valid only until the next mutating
    /// call (`append`/`drain`/`move_from`) on this buffer.
    pub fn enumerate_slices(&self) -> impl Iterator<Item = &[u8]> {
        self.slices.iter().map(|b| b.as_ref())
    }

    /// Append bytes to the end of the buffer.
    pub fn append(&mut self, bytes: impl Into<Bytes>) {
        let bytes = bytes.into();
        if !bytes.is_empty() {
            self.slices.push(bytes);
        }
    }

    /// Remove and return the first `n` bytes of the buffer.
    ///
    /// If `n` exceeds the buffer's length, the whole buffer is drained.
    pub fn drain(&mut self, n: usize) -> Bytes {
        let total = self.len();
        let take = n.min(total);
        if take == 0 {
            return Bytes::new();
        }
        if take == total {
            let mut out = BytesMut::with_capacity(total);
            for s in self.slices.drain(..) {
                out.extend_from_slice(&s);
            }
            return out.freeze();
        }

        let mut out = BytesMut::with_capacity(take);
        let mut remaining = take;
        let mut consumed_whole = 0;
        for slice in &self.slices {
            if remaining == 0 {
                break;
            }
            if slice.len() <= remaining {
                out.extend_from_slice(slice);
                remaining -= slice.len();
                consumed_whole += 1;
            } else {
                out.extend_from_slice(&slice[..remaining]);
                let rest = slice.slice(remaining..);
                let mut new_slices = Vec::with_capacity(self.slices.len() - consumed_whole);
                new_slices.push(rest);
                new_slices.extend(self.slices[consumed_whole + 1..].iter().cloned());
                self.slices = new_slices;
                return out.freeze();
            }
        }
        self.slices.drain(..consumed_whole);
        out.freeze()
    }

    /// Drain the entirety of `other` and append it to `self`, leaving
    /// `other` empty.
    pub fn move_from(&mut self, other: &mut StreamBuffer) {
        self.slices.append(&mut other.slices);
    }

    /// Copy the full contents into a single contiguous `Vec<u8>`.
    ///
    /// Intended for tests and small fixtures; production codec loops use
    /// [`StreamBuffer::enumerate_slices`] instead to avoid materializing
    /// the whole buffer.
    pub fn to_contiguous(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for s in &self.slices {
            out.extend_from_slice(s);
        }
        out
    }
}

impl From<Vec<u8>> for StreamBuffer {
    fn from(v: Vec<u8>) -> Self {
        Self::from_bytes(v)
    }
}

impl From<&[u8]> for StreamBuffer {
    fn from(v: &[u8]) -> Self {
        Self::from_bytes(v.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_len() {
        let mut buf = StreamBuffer::new();
        assert!(buf.is_empty());
        buf.append(b"hello".to_vec());
        buf.append(b" world".to_vec());
        assert_eq!(buf.len(), 11);
        assert_eq!(buf.to_contiguous(), b"hello world");
    }

    #[test]
    fn enumerate_slices_preserves_boundaries() {
        let mut buf = StreamBuffer::new();
        buf.append(b"abc".to_vec());
        buf.append(b"def".to_vec());
        let slices: Vec<&[u8]> = buf.enumerate_slices().collect();
        assert_eq!(slices, vec![b"abc".as_slice(), b"def".as_slice()]);
    }

    #[test]
    fn drain_prefix_within_one_slice() {
        let mut buf = StreamBuffer::new();
        buf.append(b"hello world".to_vec());
        let drained = buf.drain(5);
        assert_eq!(&drained[..], b"hello");
        assert_eq!(buf.to_contiguous(), b" world");
    }

    #[test]
    fn drain_prefix_spanning_slices() {
        let mut buf = StreamBuffer::new();
        buf.append(b"ab".to_vec());
        buf.append(b"cd".to_vec());
        buf.append(b"ef".to_vec());
        let drained = buf.drain(3);
        assert_eq!(&drained[..], b"abc");
        assert_eq!(buf.to_contiguous(), b"def");
    }

    #[test]
    fn drain_more_than_available_drains_all() {
        let mut buf = StreamBuffer::new();
        buf.append(b"abc".to_vec());
        let drained = buf.drain(100);
        assert_eq!(&drained[..], b"abc");
        assert!(buf.is_empty());
    }

    #[test]
    fn move_from_appends_and_empties_source() {
        let mut a = StreamBuffer::new();
        a.append(b"a".to_vec());
        let mut b = StreamBuffer::new();
        b.append(b"b".to_vec());
        a.move_from(&mut b);
        assert_eq!(a.to_contiguous(), b"ab");
        assert!(b.is_empty());
    }
}
