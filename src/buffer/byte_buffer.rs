//! Growable byte buffer with a movable read cursor
//!
//! Bytes are received into the trailing free space, committed, and later
//! consumed from the front. Every size argument is clipped rather than
//! trusted.

use bytes::Buf;

/// Contiguous byte store backing all receive-side I/O
#[derive(Debug)]
pub struct ByteBuffer {
    /// Backing storage, always fully initialised (`storage.len()` is the capacity)
    storage: Vec<u8>,

    /// Offset of the first live byte
    start: usize,

    /// Number of live bytes
    len: usize,
}

impl ByteBuffer {
    /// Create a buffer with at least `capacity` bytes (never fewer than one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity.max(1)],
            start: 0,
            len: 0,
        }
    }

    /// Total bytes of storage
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of live bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free bytes after the live data
    pub fn available(&self) -> usize {
        self.storage.len() - self.start - self.len
    }

    /// Offset of the live data within the storage
    pub fn start(&self) -> usize {
        self.start
    }

    /// The live data
    pub fn data(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len]
    }

    /// The free space after the live data, to be filled then `commit`ed
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let end = self.start + self.len;
        &mut self.storage[end..]
    }

    /// Guarantee `total` bytes of room measured from the start of the live data.
    ///
    /// Live data is shifted down to offset 0 first; the storage is only
    /// reallocated when the shift alone does not free enough room.
    pub fn reserve(&mut self, total: usize) {
        let total = total.max(1);
        if self.storage.len() - self.start >= total {
            return;
        }

        self.compact();

        if self.storage.len() < total {
            let new_capacity = total.max(self.storage.len().saturating_mul(2));
            tracing::trace!(
                from = self.storage.len(),
                to = new_capacity,
                "growing receive buffer"
            );
            self.storage.resize(new_capacity, 0);
        }
    }

    /// Guarantee `extra` free bytes after the live data
    pub fn reserve_extra(&mut self, extra: usize) {
        self.reserve(extra.saturating_add(self.len));
    }

    /// Mark `n` bytes written into `spare_mut` as live data (clipped to the free space)
    pub fn commit(&mut self, n: usize) {
        self.len += n.min(self.available());
    }

    /// Append `bytes` after the live data, growing as needed
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.reserve_extra(bytes.len());
        self.spare_mut()[..bytes.len()].copy_from_slice(bytes);
        self.commit(bytes.len());
    }

    /// Drop `n` bytes from the front of the live data (clipped to the length)
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.len -= n;
        if self.len == 0 {
            self.start = 0;
        } else {
            self.start += n;
        }
    }

    /// Drop all live data
    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }

    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.storage
            .copy_within(self.start..self.start + self.len, 0);
        self.start = 0;
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::with_capacity(128)
    }
}

impl Buf for ByteBuffer {
    fn remaining(&self) -> usize {
        self.len
    }

    fn chunk(&self) -> &[u8] {
        self.data()
    }

    fn advance(&mut self, cnt: usize) {
        self.consume(cnt);
    }
}
