//! Fixed header at the start of every blob.
//!
//! Layout (little-endian, 32 bytes):
//!
//! | off | type | field |
//! |-----|------|-------|
//! | 0   | u32  | program offset table |
//! | 4   | u32  | framebuffer info array |
//! | 8   | u32  | shot end times (f32 per shot) |
//! | 12  | u32  | shot scene offsets (u32 per shot) |
//! | 16  | u32  | first shot record |
//! | 20  | u16  | program count |
//! | 22  | u8   | framebuffer count |
//! | 23  | u8   | reserved |
//! | 24  | u16  | shot count |
//! | 26  | u16  | max uniforms per shot |
//! | 28  | f32  | beats per second |

use serde::Serialize;

use crate::bytes::ByteView;
use crate::error::{DecodeError, DecodeResult};

pub const HEADER_LEN: usize = 32;

/// Decoded top-level index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlobIndex {
    pub programs_offset: usize,
    pub framebuffers_offset: usize,
    pub shot_end_times_offset: usize,
    pub shot_scenes_offset: usize,
    pub first_shot_offset: usize,
    pub program_count: usize,
    pub framebuffer_count: usize,
    pub shot_count: usize,
    pub max_uniforms: usize,
    pub beats_per_second: f32,
}

impl BlobIndex {
    pub fn read(view: ByteView<'_>) -> DecodeResult<Self> {
        if view.len() < HEADER_LEN {
            return Err(DecodeError::TruncatedHeader {
                len: view.len(),
                required: HEADER_LEN,
            });
        }
        let index = Self {
            programs_offset: view.offset_at(0)?,
            framebuffers_offset: view.offset_at(4)?,
            shot_end_times_offset: view.offset_at(8)?,
            shot_scenes_offset: view.offset_at(12)?,
            first_shot_offset: view.offset_at(16)?,
            program_count: view.u16_at(20)? as usize,
            framebuffer_count: view.u8_at(22)? as usize,
            shot_count: view.u16_at(24)? as usize,
            max_uniforms: view.u16_at(26)? as usize,
            beats_per_second: view.f32_at(28)?,
        };
        index.check_tables(view)?;
        Ok(index)
    }

    /// Every fixed-stride table must lie inside the blob.
    fn check_tables(&self, view: ByteView<'_>) -> DecodeResult<()> {
        if self.shot_count == 0 {
            return Err(DecodeError::EmptyTimeline);
        }
        if !(self.beats_per_second.is_finite() && self.beats_per_second > 0.0) {
            return Err(DecodeError::InvalidTempo {
                value: self.beats_per_second,
            });
        }
        view.ensure(self.programs_offset, self.program_count * 4)?;
        view.ensure(
            self.framebuffers_offset,
            self.framebuffer_count * crate::framebuffer::FRAMEBUFFER_INFO_LEN,
        )?;
        view.ensure(self.shot_end_times_offset, self.shot_count * 4)?;
        view.ensure(self.shot_scenes_offset, self.shot_count * 4)?;
        view.ensure(self.first_shot_offset, crate::shot::SHOT_HEADER_LEN)?;
        Ok(())
    }
}
