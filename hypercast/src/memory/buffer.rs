//! Owned, segment-addressed buffer for hypercube collectives.
//!
//! A buffer is a `Vec<T>` viewed as consecutive segments of `segment_len`
//! elements. The broadcast grows it by merging whole peer buffers (one
//! doubling per round); the personalized exchange keeps the length fixed
//! and overwrites blocks of `2^round` segments in place. All accessors are
//! bounds-checked and report failures as errors instead of panicking.

use crate::error::{HypercastError, Result};
use crate::types::CubeId;

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeBuffer<T> {
    data: Vec<T>,
    segment_len: usize,
}

impl<T: Copy> ExchangeBuffer<T> {
    /// Buffer holding one segment: `own`.
    pub fn single(own: &[T]) -> Self {
        Self {
            data: own.to_vec(),
            segment_len: own.len(),
        }
    }

    /// Buffer holding `data`, split into segments of `segment_len` elements.
    pub fn with_segments(data: Vec<T>, segment_len: usize) -> Result<Self> {
        if segment_len == 0 || data.len() % segment_len != 0 {
            return Err(HypercastError::BufferSizeMismatch {
                expected: segment_len * data.len().div_ceil(segment_len.max(1)),
                actual: data.len(),
            });
        }
        Ok(Self { data, segment_len })
    }

    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// Number of segments currently held.
    pub fn segments(&self) -> usize {
        if self.segment_len == 0 {
            0
        } else {
            self.data.len() / self.segment_len
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Element count a doubling buffer holds at the start of `round`.
    pub fn len_at_round(&self, round: u32) -> usize {
        self.segment_len << round
    }

    /// Segment `index`.
    pub fn segment(&self, index: usize) -> Result<&[T]> {
        let range = self.segment_range(index, 1)?;
        Ok(&self.data[range])
    }

    /// Overwrite segment `index` with `src`.
    pub fn write_segment(&mut self, index: usize, src: &[T]) -> Result<()> {
        if src.len() != self.segment_len {
            return Err(HypercastError::BufferSizeMismatch {
                expected: self.segment_len,
                actual: src.len(),
            });
        }
        let range = self.segment_range(index, 1)?;
        self.data[range].copy_from_slice(src);
        Ok(())
    }

    /// Merge a partner's buffer of equal length into this one, doubling it.
    ///
    /// The buffer of the lower hypercube id always ends up first, so after
    /// round `i` both sides hold the same `2^(i+1)` segments in id order.
    pub fn merge(&mut self, own_id: CubeId, partner_id: CubeId, received: &[T]) -> Result<()> {
        if received.len() != self.data.len() {
            return Err(HypercastError::BufferSizeMismatch {
                expected: self.data.len(),
                actual: received.len(),
            });
        }
        if own_id < partner_id {
            self.data.extend_from_slice(received);
        } else {
            let mut merged = Vec::with_capacity(self.data.len() * 2);
            merged.extend_from_slice(received);
            merged.extend_from_slice(&self.data);
            self.data = merged;
        }
        Ok(())
    }

    /// Apply one round of the dimension-ordered personalized shuffle.
    ///
    /// With `block = 2^round` segments, the lower side of the pair fills
    /// every odd block from the even block before it in `received`; the
    /// upper side fills every even block from the odd block after it.
    pub fn shuffle_blocks(&mut self, round: u32, lower: bool, received: &[T]) -> Result<()> {
        if received.len() != self.data.len() {
            return Err(HypercastError::BufferSizeMismatch {
                expected: self.data.len(),
                actual: received.len(),
            });
        }
        let block = self.segment_len << round;
        let total = self.data.len();
        let mut start = if lower { block } else { 0 };
        while start < total {
            let end = (start + block).min(total);
            let src_start = if lower { start - block } else { start + block };
            let src_end = src_start + (end - start);
            let src = received.get(src_start..src_end).ok_or_else(|| {
                HypercastError::BufferSizeMismatch {
                    expected: src_end,
                    actual: received.len(),
                }
            })?;
            self.data[start..end].copy_from_slice(src);
            start += block * 2;
        }
        Ok(())
    }

    /// Keep the first `segments` segments and return them.
    pub fn into_prefix(mut self, segments: usize) -> Result<Vec<T>> {
        let keep = segments * self.segment_len;
        if keep > self.data.len() {
            return Err(HypercastError::BufferSizeMismatch {
                expected: keep,
                actual: self.data.len(),
            });
        }
        self.data.truncate(keep);
        Ok(self.data)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn segment_range(&self, index: usize, count: usize) -> Result<std::ops::Range<usize>> {
        let start = index * self.segment_len;
        let end = start + count * self.segment_len;
        if end > self.data.len() {
            return Err(HypercastError::BufferSizeMismatch {
                expected: end,
                actual: self.data.len(),
            });
        }
        Ok(start..end)
    }
}
