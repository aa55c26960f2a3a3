//! Scenes and their render passes.

use serde::Serialize;

use crate::bytes::ByteView;
use crate::error::{DecodeError, DecodeResult};
use crate::framebuffer::SCREEN_FBO_ID;

/// Where a pass draws to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PassTarget {
    /// The default framebuffer.
    Screen,
    /// Index into the framebuffer table.
    Framebuffer(u8),
}

impl PassTarget {
    #[inline]
    pub fn from_id(fbo_id: u8) -> Self {
        if fbo_id == SCREEN_FBO_ID {
            PassTarget::Screen
        } else {
            PassTarget::Framebuffer(fbo_id)
        }
    }
}

/// View over a scene record: `u8 pass_count` then `u32` offsets to pass records.
#[derive(Clone, Copy, Debug)]
pub struct SceneView<'a> {
    view: ByteView<'a>,
    offset: usize,
    pass_count: usize,
}

impl<'a> SceneView<'a> {
    pub fn new(view: ByteView<'a>, offset: usize) -> DecodeResult<Self> {
        let pass_count = view.u8_at(offset)? as usize;
        view.ensure(offset + 1, pass_count * 4)?;
        Ok(Self {
            view,
            offset,
            pass_count,
        })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.pass_count
    }

    pub fn pass(&self, index: usize) -> DecodeResult<PassView<'a>> {
        if index >= self.pass_count {
            return Err(DecodeError::IndexOutOfRange {
                table: "pass",
                index,
                count: self.pass_count,
            });
        }
        let at = self.view.offset_at(self.offset + 1 + index * 4)?;
        PassView::new(self.view, at)
    }

    pub fn passes(&self) -> impl Iterator<Item = DecodeResult<PassView<'a>>> + 'a {
        let this = *self;
        (0..this.pass_count).map(move |i| this.pass(i))
    }
}

/// View over a pass record: `u16 program, u8 fbo, u8 cbo_count, u8 cbo[cbo_count]`.
#[derive(Clone, Copy, Debug)]
pub struct PassView<'a> {
    offset: usize,
    program_id: u16,
    fbo_id: u8,
    color_buffers: &'a [u8],
}

impl<'a> PassView<'a> {
    pub fn new(view: ByteView<'a>, offset: usize) -> DecodeResult<Self> {
        let program_id = view.u16_at(offset)?;
        let fbo_id = view.u8_at(offset + 2)?;
        let cbo_count = view.u8_at(offset + 3)? as usize;
        let color_buffers = view.slice(offset + 4, cbo_count)?;
        Ok(Self {
            offset,
            program_id,
            fbo_id,
            color_buffers,
        })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn program_id(&self) -> usize {
        self.program_id as usize
    }

    #[inline]
    pub fn fbo_id(&self) -> u8 {
        self.fbo_id
    }

    #[inline]
    pub fn target(&self) -> PassTarget {
        PassTarget::from_id(self.fbo_id)
    }

    /// Color buffer ids read by this pass, in texture-unit order.
    #[inline]
    pub fn color_buffers(&self) -> &'a [u8] {
        self.color_buffers
    }

    pub fn color_buffer(&self, index: usize) -> DecodeResult<u8> {
        self.color_buffers
            .get(index)
            .copied()
            .ok_or(DecodeError::IndexOutOfRange {
                table: "color buffer",
                index,
                count: self.color_buffers.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_sentinel_is_not_a_framebuffer() {
        assert_eq!(PassTarget::from_id(0xFF), PassTarget::Screen);
        assert_eq!(PassTarget::from_id(0), PassTarget::Framebuffer(0));
        assert_eq!(PassTarget::from_id(254), PassTarget::Framebuffer(254));
    }

    #[test]
    fn pass_record_decodes_inputs() {
        // scene at 0 with one pass at 5
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(&[0xFF, 2, 4, 1]);
        let scene = SceneView::new(ByteView::new(&bytes), 0).unwrap();
        assert_eq!(scene.pass_count(), 1);
        let pass = scene.pass(0).unwrap();
        assert_eq!(pass.program_id(), 3);
        assert_eq!(pass.target(), PassTarget::Screen);
        assert_eq!(pass.color_buffers(), &[4, 1]);
        assert!(pass.color_buffer(2).is_err());
        assert!(scene.pass(1).is_err());
    }
}
