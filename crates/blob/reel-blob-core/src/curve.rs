//! Keyframe curves.
//!
//! A curve record stores a `u16` key count followed by packed keys of four `f32`s
//! (`in_tangent, time, value, out_tangent`). The first key's in-tangent is never read by the
//! evaluator, so it is not stored: key 0 starts with its time right after the count, and every
//! later key's in-tangent sits in the four bytes before its time.
//!
//! ```text
//! c+0   u16 count
//! c+2   k0.time  k0.value  k0.out
//! c+14  k1.in    k1.time   k1.value  k1.out
//! ...
//! ```

use serde::Serialize;

use crate::bytes::ByteView;
use crate::error::{DecodeError, DecodeResult};

const KEY_STRIDE: usize = 16;

/// One keyframe as stored in the blob.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Keyframe {
    pub in_tangent: f32,
    pub time: f32,
    pub value: f32,
    pub out_tangent: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            in_tangent,
            time,
            value,
            out_tangent,
        }
    }

    /// Key that holds its value until the next key.
    pub const fn stepped(time: f32, value: f32) -> Self {
        Self::new(time, value, 0.0, f32::INFINITY)
    }

    /// Whether the segment that starts at this key holds `value` instead of interpolating.
    ///
    /// `+inf` is the sentinel; `f32::MAX` is accepted as well because older content compilers
    /// wrote `FLT_MAX` for the same purpose.
    #[inline]
    pub fn is_stepped(&self) -> bool {
        self.out_tangent == f32::INFINITY || self.out_tangent == f32::MAX
    }
}

/// Byte length of a curve record with `count` keys.
#[inline]
pub const fn curve_record_len(count: usize) -> usize {
    if count == 0 {
        2
    } else {
        KEY_STRIDE * count - 2
    }
}

/// Zero-copy view over a curve record. Construction checks that every key lies inside the blob,
/// so key access afterwards only fails for indices past `len()`.
#[derive(Clone, Copy, Debug)]
pub struct CurveView<'a> {
    view: ByteView<'a>,
    offset: usize,
    count: usize,
}

impl<'a> CurveView<'a> {
    pub fn new(view: ByteView<'a>, offset: usize) -> DecodeResult<Self> {
        let count = view.u16_at(offset)? as usize;
        if count == 0 {
            return Err(DecodeError::EmptyCurve { offset });
        }
        view.ensure(offset, curve_record_len(count))?;
        Ok(Self {
            view,
            offset,
            count,
        })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Always false for a constructed view; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Read key `index`, or `None` past the end.
    pub fn key(&self, index: usize) -> Option<Keyframe> {
        if index >= self.count {
            return None;
        }
        let time_at = self.offset + 2 + KEY_STRIDE * index;
        let read = |off: usize| self.view.f32_at(off).ok();
        let in_tangent = if index == 0 { 0.0 } else { read(time_at - 4)? };
        Some(Keyframe {
            in_tangent,
            time: read(time_at)?,
            value: read(time_at + 4)?,
            out_tangent: read(time_at + 8)?,
        })
    }

    /// Time of key `index` without decoding the rest of the key.
    #[inline]
    pub fn time(&self, index: usize) -> Option<f32> {
        if index >= self.count {
            return None;
        }
        self.view.f32_at(self.offset + 2 + KEY_STRIDE * index).ok()
    }

    pub fn keys(&self) -> KeyIter<'a> {
        KeyIter {
            curve: *self,
            next: 0,
        }
    }

    /// Check that key times never decrease.
    pub fn check_order(&self) -> DecodeResult<()> {
        let mut previous = f32::NEG_INFINITY;
        for index in 0..self.count {
            let time = self.time(index).ok_or(DecodeError::IndexOutOfRange {
                table: "key",
                index,
                count: self.count,
            })?;
            if time < previous || time.is_nan() {
                return Err(DecodeError::UnorderedKeys {
                    offset: self.offset,
                    index,
                });
            }
            previous = time;
        }
        Ok(())
    }
}

/// Iterator over the keys of a [`CurveView`].
#[derive(Clone, Debug)]
pub struct KeyIter<'a> {
    curve: CurveView<'a>,
    next: usize,
}

impl Iterator for KeyIter<'_> {
    type Item = Keyframe;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.curve.key(self.next)?;
        self.next += 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.curve.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for KeyIter<'_> {}
