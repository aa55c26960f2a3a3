//! Framebuffer descriptions: fixed 6-byte records stored back to back.

use serde::Serialize;

use crate::bytes::ByteView;
use crate::error::DecodeResult;

pub const FRAMEBUFFER_INFO_LEN: usize = 6;

/// Pass target id reserved for the default framebuffer (the screen).
pub const SCREEN_FBO_ID: u8 = 0xFF;

pub const FLAG_REALTIME: u8 = 1 << 7;
pub const FLAG_3D: u8 = 1 << 6;
pub const FLAG_TILE: u8 = 1 << 5;
pub const OUTPUT_COUNT_MASK: u8 = 0b0001_1111;

/// Decoded framebuffer record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FramebufferInfo {
    /// Explicit width, or 0 to derive from the screen.
    pub width: u16,
    /// Explicit height, or 0 to derive from the screen.
    pub height: u16,
    /// Screen divisor used when the size is implicit.
    pub factor: u8,
    pub flags: u8,
}

impl FramebufferInfo {
    pub(crate) fn read(view: ByteView<'_>, offset: usize) -> DecodeResult<Self> {
        Ok(Self {
            width: view.u16_at(offset)?,
            height: view.u16_at(offset + 2)?,
            factor: view.u8_at(offset + 4)?,
            flags: view.u8_at(offset + 5)?,
        })
    }

    /// Realtime framebuffers are redrawn every frame; the rest are drawn once while loading.
    #[inline]
    pub fn realtime(&self) -> bool {
        self.flags & FLAG_REALTIME != 0
    }

    /// Outputs are promoted to volume textures after the first draw.
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.flags & FLAG_3D != 0
    }

    /// Outputs repeat instead of clamping at the edges.
    #[inline]
    pub fn tile(&self) -> bool {
        self.flags & FLAG_TILE != 0
    }

    #[inline]
    pub fn output_count(&self) -> usize {
        (self.flags & OUTPUT_COUNT_MASK) as usize
    }

    /// Render size for a given screen size.
    ///
    /// An explicit width wins; otherwise the screen is divided by `factor`. A zero factor is
    /// rejected at load, so the division here cannot fault for validated blobs.
    pub fn resolve_size(&self, screen_width: u32, screen_height: u32) -> (u32, u32) {
        let factor = u32::from(self.factor.max(1));
        let w = if self.width != 0 {
            u32::from(self.width)
        } else {
            screen_width / factor
        };
        let h = if self.height != 0 {
            u32::from(self.height)
        } else {
            screen_height / factor
        };
        (w, h)
    }

    /// Pack flag bits the way the content compiler does.
    pub fn pack_flags(realtime: bool, is_3d: bool, tile: bool, outputs: u8) -> u8 {
        let mut flags = outputs & OUTPUT_COUNT_MASK;
        if realtime {
            flags |= FLAG_REALTIME;
        }
        if is_3d {
            flags |= FLAG_3D;
        }
        if tile {
            flags |= FLAG_TILE;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_unpack() {
        let info = FramebufferInfo {
            width: 0,
            height: 0,
            factor: 2,
            flags: FramebufferInfo::pack_flags(true, false, true, 3),
        };
        assert!(info.realtime());
        assert!(!info.is_3d());
        assert!(info.tile());
        assert_eq!(info.output_count(), 3);
    }

    #[test]
    fn implicit_size_divides_screen() {
        let info = FramebufferInfo {
            width: 0,
            height: 0,
            factor: 4,
            flags: 1,
        };
        assert_eq!(info.resolve_size(1920, 1080), (480, 270));
    }

    #[test]
    fn explicit_size_ignores_screen() {
        let info = FramebufferInfo {
            width: 4096,
            height: 64,
            factor: 1,
            flags: FramebufferInfo::pack_flags(false, true, false, 1),
        };
        assert_eq!(info.resolve_size(1280, 720), (4096, 64));
        assert!(info.is_3d());
        assert!(!info.realtime());
    }
}
