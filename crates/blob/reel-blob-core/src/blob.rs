//! Entry point of the reader: [`Blob::parse`] validates the whole record graph once, after which
//! the accessors only fail for out-of-range indices.

use tracing::debug;

use crate::bytes::ByteView;
use crate::error::{DecodeError, DecodeResult};
use crate::framebuffer::{FramebufferInfo, FRAMEBUFFER_INFO_LEN, SCREEN_FBO_ID};
use crate::index::BlobIndex;
use crate::program::ProgramView;
use crate::scene::{PassView, SceneView};
use crate::shot::{ShotIter, ShotView, MAX_COMPONENTS};

/// A validated blob borrowed from the caller's buffer.
#[derive(Clone, Copy, Debug)]
pub struct Blob<'a> {
    view: ByteView<'a>,
    index: BlobIndex,
    color_buffer_count: usize,
}

impl<'a> Blob<'a> {
    /// Decode the header and walk every record reachable from it.
    ///
    /// Fails fast on the first format violation.
    pub fn parse(bytes: &'a [u8]) -> DecodeResult<Self> {
        let view = ByteView::new(bytes);
        let index = BlobIndex::read(view)?;
        let mut blob = Self {
            view,
            index,
            color_buffer_count: 0,
        };
        blob.color_buffer_count = blob.check_framebuffers()?;
        blob.check_end_times()?;
        blob.check_programs()?;
        let curves = blob.check_shots()?;
        blob.check_scenes()?;
        debug!(
            bytes = bytes.len(),
            programs = index.program_count,
            framebuffers = index.framebuffer_count,
            color_buffers = blob.color_buffer_count,
            shots = index.shot_count,
            curves,
            "blob parsed"
        );
        Ok(blob)
    }

    fn check_framebuffers(&self) -> DecodeResult<usize> {
        let mut outputs = 0;
        for i in 0..self.index.framebuffer_count {
            let info = self.framebuffer(i)?;
            if info.factor == 0 && (info.width == 0 || info.height == 0) {
                return Err(DecodeError::ZeroFactor { index: i });
            }
            outputs += info.output_count();
        }
        Ok(outputs)
    }

    fn check_end_times(&self) -> DecodeResult<()> {
        let mut previous = f32::NEG_INFINITY;
        for i in 0..self.index.shot_count {
            let time = self.shot_end_time(i)?;
            if !(time > previous) || !time.is_finite() {
                return Err(DecodeError::NonMonotonicShotTimes {
                    index: i,
                    time,
                    previous,
                });
            }
            previous = time;
        }
        Ok(())
    }

    fn check_programs(&self) -> DecodeResult<()> {
        for i in 0..self.index.program_count {
            for stitch in self.program(i)?.stitches() {
                stitch?;
            }
        }
        Ok(())
    }

    /// Returns the number of curves seen.
    fn check_shots(&self) -> DecodeResult<usize> {
        let mut curves = 0;
        for (i, shot) in self.shots().enumerate() {
            let shot = shot?;
            let uniform_count = shot.uniform_count();
            if uniform_count > self.index.max_uniforms {
                return Err(DecodeError::TooManyUniforms {
                    shot: i,
                    count: uniform_count,
                    max: self.index.max_uniforms,
                });
            }
            for u in 0..uniform_count {
                let count = shot.uniform_size(u)?;
                if count == 0 || count as usize > MAX_COMPONENTS {
                    return Err(DecodeError::InvalidComponentCount {
                        shot: i,
                        uniform: u,
                        count,
                    });
                }
            }
            let required = shot.required_size()?;
            if shot.size_of() < required {
                return Err(DecodeError::ShotSizeMismatch {
                    shot: i,
                    declared: shot.size_of(),
                    required,
                });
            }
            for track in shot.tracks() {
                let track = track?;
                for c in 0..track.component_count() {
                    track.curve(c)?.check_order()?;
                    curves += 1;
                }
            }
        }
        Ok(curves)
    }

    fn check_scenes(&self) -> DecodeResult<()> {
        for i in 0..self.index.shot_count {
            for pass in self.scene_for_shot(i)?.passes() {
                self.check_pass(&pass?)?;
            }
        }
        Ok(())
    }

    fn check_pass(&self, pass: &PassView<'_>) -> DecodeResult<()> {
        if pass.program_id() >= self.index.program_count {
            return Err(DecodeError::IndexOutOfRange {
                table: "program",
                index: pass.program_id(),
                count: self.index.program_count,
            });
        }
        let fbo_id = pass.fbo_id();
        if fbo_id != SCREEN_FBO_ID && fbo_id as usize >= self.index.framebuffer_count {
            return Err(DecodeError::InvalidFramebuffer {
                offset: pass.offset(),
                fbo_id,
                count: self.index.framebuffer_count,
            });
        }
        if let Some(&cbo_id) = pass
            .color_buffers()
            .iter()
            .find(|id| **id as usize >= self.color_buffer_count)
        {
            return Err(DecodeError::InvalidColorBuffer {
                offset: pass.offset(),
                cbo_id,
                count: self.color_buffer_count,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.view.as_bytes()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.view.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    #[inline]
    pub fn index(&self) -> &BlobIndex {
        &self.index
    }

    #[inline]
    pub fn beats_per_second(&self) -> f32 {
        self.index.beats_per_second
    }

    #[inline]
    pub fn program_count(&self) -> usize {
        self.index.program_count
    }

    #[inline]
    pub fn framebuffer_count(&self) -> usize {
        self.index.framebuffer_count
    }

    #[inline]
    pub fn shot_count(&self) -> usize {
        self.index.shot_count
    }

    /// Largest uniform count of any shot.
    #[inline]
    pub fn max_uniforms(&self) -> usize {
        self.index.max_uniforms
    }

    /// Total number of framebuffer outputs; color buffer ids index this flat list.
    #[inline]
    pub fn color_buffer_count(&self) -> usize {
        self.color_buffer_count
    }

    pub fn program(&self, index: usize) -> DecodeResult<ProgramView<'a>> {
        check_index("program", index, self.index.program_count)?;
        let at = self.view.offset_at(self.index.programs_offset + index * 4)?;
        ProgramView::new(self.view, at)
    }

    pub fn framebuffer(&self, index: usize) -> DecodeResult<FramebufferInfo> {
        check_index("framebuffer", index, self.index.framebuffer_count)?;
        FramebufferInfo::read(
            self.view,
            self.index.framebuffers_offset + index * FRAMEBUFFER_INFO_LEN,
        )
    }

    pub fn framebuffers(&self) -> impl Iterator<Item = DecodeResult<FramebufferInfo>> + 'a {
        let this = *self;
        (0..this.index.framebuffer_count).map(move |i| this.framebuffer(i))
    }

    /// First color buffer id owned by framebuffer `index`.
    pub fn color_buffer_start(&self, index: usize) -> DecodeResult<usize> {
        check_index("framebuffer", index, self.index.framebuffer_count)?;
        self.framebuffers()
            .take(index)
            .try_fold(0, |acc, info| info.map(|info| acc + info.output_count()))
    }

    /// Beat at which shot `index` ends.
    pub fn shot_end_time(&self, index: usize) -> DecodeResult<f32> {
        check_index("shot", index, self.index.shot_count)?;
        self.view
            .f32_at(self.index.shot_end_times_offset + index * 4)
    }

    pub fn end_times(&self) -> impl Iterator<Item = f32> + 'a {
        let this = *self;
        (0..this.index.shot_count).filter_map(move |i| this.shot_end_time(i).ok())
    }

    /// End of the last shot: playback stops there.
    pub fn last_end_time(&self) -> DecodeResult<f32> {
        self.shot_end_time(self.index.shot_count - 1)
    }

    pub fn scene_for_shot(&self, index: usize) -> DecodeResult<SceneView<'a>> {
        check_index("shot", index, self.index.shot_count)?;
        let at = self.view.offset_at(self.index.shot_scenes_offset + index * 4)?;
        SceneView::new(self.view, at)
    }

    /// Walk the shot records from the first one.
    pub fn shots(&self) -> ShotIter<'a> {
        ShotIter::new(self.view, self.index.first_shot_offset, self.index.shot_count)
    }

    /// Shot `index`, found by walking from the first record.
    pub fn shot(&self, index: usize) -> DecodeResult<ShotView<'a>> {
        check_index("shot", index, self.index.shot_count)?;
        self.shots()
            .nth(index)
            .unwrap_or(Err(DecodeError::IndexOutOfRange {
                table: "shot",
                index,
                count: self.index.shot_count,
            }))
    }

    /// Shot that directly follows `shot` in the record chain.
    pub fn next_shot(&self, shot: &ShotView<'a>) -> DecodeResult<ShotView<'a>> {
        ShotView::new(self.view, shot.next_offset())
    }
}

fn check_index(table: &'static str, index: usize, count: usize) -> DecodeResult<()> {
    if index >= count {
        return Err(DecodeError::IndexOutOfRange {
            table,
            index,
            count,
        });
    }
    Ok(())
}
