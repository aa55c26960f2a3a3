//! Shader programs: an ordered list of source fragments ("stitches") that the render backend
//! concatenates before compiling.

use crate::bytes::ByteView;
use crate::error::{DecodeError, DecodeResult};

/// View over a program record: `u8 stitch_count` then `u32` offsets to NUL-terminated sources.
#[derive(Clone, Copy, Debug)]
pub struct ProgramView<'a> {
    view: ByteView<'a>,
    offset: usize,
    stitch_count: usize,
}

impl<'a> ProgramView<'a> {
    pub fn new(view: ByteView<'a>, offset: usize) -> DecodeResult<Self> {
        let stitch_count = view.u8_at(offset)? as usize;
        view.ensure(offset + 1, stitch_count * 4)?;
        Ok(Self {
            view,
            offset,
            stitch_count,
        })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn stitch_count(&self) -> usize {
        self.stitch_count
    }

    pub fn stitch(&self, index: usize) -> DecodeResult<&'a str> {
        if index >= self.stitch_count {
            return Err(DecodeError::IndexOutOfRange {
                table: "stitch",
                index,
                count: self.stitch_count,
            });
        }
        let source = self.view.offset_at(self.offset + 1 + index * 4)?;
        self.view.cstr_at(source)
    }

    /// Sources in compile order.
    pub fn stitches(&self) -> impl Iterator<Item = DecodeResult<&'a str>> + 'a {
        let this = *self;
        (0..this.stitch_count).map(move |i| this.stitch(i))
    }
}
