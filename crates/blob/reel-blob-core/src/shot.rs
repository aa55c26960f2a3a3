//! Shot records and their uniform animation tracks.
//!
//! Shots are stored back to back and are only reachable by walking: each record starts with its
//! own byte size.
//!
//! ```text
//! s+0          u16 size_of
//! s+2          u8  uniform_count (n)
//! s+3          u32 name_offset[n]
//! s+3+4n       u8  component_count[n]
//! s+3+5n       u32 curve_offset[sum(component_count)]
//! ```

use crate::bytes::ByteView;
use crate::curve::CurveView;
use crate::error::{DecodeError, DecodeResult};

pub const SHOT_HEADER_LEN: usize = 3;
pub const MAX_COMPONENTS: usize = 4;

/// View over one shot record.
#[derive(Clone, Copy, Debug)]
pub struct ShotView<'a> {
    view: ByteView<'a>,
    offset: usize,
    size_of: usize,
    uniform_count: usize,
}

impl<'a> ShotView<'a> {
    pub(crate) fn new(view: ByteView<'a>, offset: usize) -> DecodeResult<Self> {
        let size_of = view.u16_at(offset)? as usize;
        let uniform_count = view.u8_at(offset + 2)? as usize;
        view.ensure(offset, size_of)?;
        view.ensure(offset + SHOT_HEADER_LEN, uniform_count * 5)?;
        Ok(Self {
            view,
            offset,
            size_of,
            uniform_count,
        })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Declared record size in bytes.
    #[inline]
    pub fn size_of(&self) -> usize {
        self.size_of
    }

    /// Offset of the record that follows this one.
    #[inline]
    pub fn next_offset(&self) -> usize {
        self.offset + self.size_of
    }

    #[inline]
    pub fn uniform_count(&self) -> usize {
        self.uniform_count
    }

    fn check_uniform(&self, index: usize) -> DecodeResult<()> {
        if index >= self.uniform_count {
            return Err(DecodeError::IndexOutOfRange {
                table: "uniform",
                index,
                count: self.uniform_count,
            });
        }
        Ok(())
    }

    pub fn uniform_name(&self, index: usize) -> DecodeResult<&'a str> {
        self.check_uniform(index)?;
        let at = self.view.offset_at(self.offset + SHOT_HEADER_LEN + index * 4)?;
        self.view.cstr_at(at)
    }

    /// Raw component count as stored; not range checked.
    pub fn uniform_size(&self, index: usize) -> DecodeResult<u8> {
        self.check_uniform(index)?;
        self.view
            .u8_at(self.offset + SHOT_HEADER_LEN + self.uniform_count * 4 + index)
    }

    /// Total number of curves (sum of component counts).
    pub fn curve_count(&self) -> DecodeResult<usize> {
        (0..self.uniform_count).try_fold(0usize, |acc, i| {
            self.uniform_size(i).map(|size| acc + size as usize)
        })
    }

    /// Curve `index` in the flat curve table.
    pub fn curve(&self, index: usize) -> DecodeResult<CurveView<'a>> {
        let table = self.offset + SHOT_HEADER_LEN + self.uniform_count * 5;
        let at = self.view.offset_at(table + index * 4)?;
        CurveView::new(self.view, at)
    }

    /// Tracks in declaration order.
    pub fn tracks(&self) -> TrackIter<'a> {
        TrackIter {
            shot: *self,
            next: 0,
            first_curve: 0,
        }
    }

    /// Smallest size this record could have given its uniform table.
    pub fn required_size(&self) -> DecodeResult<usize> {
        Ok(SHOT_HEADER_LEN + self.uniform_count * 5 + self.curve_count()? * 4)
    }
}

/// One animated uniform inside a shot.
#[derive(Clone, Copy, Debug)]
pub struct UniformTrack<'a> {
    shot: ShotView<'a>,
    index: usize,
    name: &'a str,
    component_count: u8,
    first_curve: usize,
}

impl<'a> UniformTrack<'a> {
    /// Position of this uniform inside its shot.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[inline]
    pub fn component_count(&self) -> usize {
        self.component_count as usize
    }

    /// Curve driving component `component` (0 = x).
    pub fn curve(&self, component: usize) -> DecodeResult<CurveView<'a>> {
        if component >= self.component_count() {
            return Err(DecodeError::IndexOutOfRange {
                table: "component",
                index: component,
                count: self.component_count(),
            });
        }
        self.shot.curve(self.first_curve + component)
    }
}

/// Iterator over the [`UniformTrack`]s of a shot.
#[derive(Clone, Debug)]
pub struct TrackIter<'a> {
    shot: ShotView<'a>,
    next: usize,
    first_curve: usize,
}

impl<'a> Iterator for TrackIter<'a> {
    type Item = DecodeResult<UniformTrack<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.shot.uniform_count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let track = self.shot.uniform_name(index).and_then(|name| {
            let component_count = self.shot.uniform_size(index)?;
            Ok(UniformTrack {
                shot: self.shot,
                index,
                name,
                component_count,
                first_curve: self.first_curve,
            })
        });
        if let Ok(track) = &track {
            self.first_curve += track.component_count();
        }
        Some(track)
    }
}

/// Lazy walk over shot records following `size_of` links. Restart by asking the blob for a new
/// iterator; the walk stops after the declared shot count.
#[derive(Clone, Debug)]
pub struct ShotIter<'a> {
    view: ByteView<'a>,
    next_offset: usize,
    remaining: usize,
}

impl<'a> ShotIter<'a> {
    pub(crate) fn new(view: ByteView<'a>, first_offset: usize, count: usize) -> Self {
        Self {
            view,
            next_offset: first_offset,
            remaining: count,
        }
    }
}

impl<'a> Iterator for ShotIter<'a> {
    type Item = DecodeResult<ShotView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match ShotView::new(self.view, self.next_offset) {
            Ok(shot) => {
                self.next_offset = shot.next_offset();
                Some(Ok(shot))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
