//! A byte buffer that grows by doubling up to a fixed ceiling.

use parley_types::StreamError;
use std::ops::{Bound, RangeBounds};

/// Sizing for a [`GrowableBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Capacity allocated up front.
    pub initial_size: usize,

    /// Capacity the buffer may never exceed.
    pub max_size: usize,
}

impl BufferConfig {
    /// Create a config with the given sizes.
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        Self {
            initial_size,
            max_size,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_size: 1024,
            max_size: 64 * 1024,
        }
    }
}

/// Append-at-the-end, remove-from-the-front byte storage.
///
/// Capacity doubles on demand but never beyond `max_size`; growth that
/// would need more fails with [`StreamError::BufferOverflow`] and leaves
/// the buffer as it was. Bytes past `len()` are always zero.
#[derive(Debug)]
pub struct GrowableBuffer {
    storage: Vec<u8>,
    length: usize,
    max_size: usize,
}

impl GrowableBuffer {
    /// Allocate `initial_size` zeroed bytes. An initial size above the
    /// maximum is clamped to it.
    pub fn new(config: BufferConfig) -> Self {
        let initial = config.initial_size.min(config.max_size);
        Self {
            storage: vec![0; initial],
            length: 0,
            max_size: config.max_size,
        }
    }

    /// Append `chunk`, growing if needed.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        let required = self
            .length
            .checked_add(chunk.len())
            .ok_or(StreamError::BufferOverflow {
                required: usize::MAX,
                max: self.max_size,
            })?;

        if required > self.storage.len() {
            if required > self.max_size {
                return Err(StreamError::BufferOverflow {
                    required,
                    max: self.max_size,
                });
            }
            let grown = self
                .storage
                .len()
                .saturating_mul(2)
                .max(required)
                .min(self.max_size);
            tracing::trace!(from = self.storage.len(), to = grown, "growing buffer");
            self.storage.resize(grown, 0);
        }

        self.storage[self.length..required].copy_from_slice(chunk);
        self.length = required;
        Ok(())
    }

    /// Drop the first `count` bytes, shifting the rest to the front.
    ///
    /// Capacity is unchanged; the vacated tail is zeroed.
    pub fn remove_prefix(&mut self, count: usize) -> Result<(), StreamError> {
        if count > self.length {
            return Err(StreamError::InvalidRange {
                start: 0,
                end: count,
                length: self.length,
            });
        }
        let remaining = self.length - count;
        self.storage.copy_within(count..self.length, 0);
        self.storage[remaining..self.length].fill(0);
        self.length = remaining;
        Ok(())
    }

    /// Discard every live byte.
    pub fn clear(&mut self) {
        self.storage[..self.length].fill(0);
        self.length = 0;
    }

    /// The live bytes.
    pub fn view(&self) -> &[u8] {
        &self.storage[..self.length]
    }

    /// A sub-range of the live bytes, e.g. `view_range(..idx)`.
    pub fn view_range(&self, range: impl RangeBounds<usize>) -> Result<&[u8], StreamError> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.length,
        };
        if start > end || end > self.length {
            return Err(StreamError::InvalidRange {
                start,
                end,
                length: self.length,
            });
        }
        Ok(&self.storage[start..end])
    }

    /// Number of live bytes.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether there are no live bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes allocated.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Configured capacity ceiling.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for GrowableBuffer {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}
