//! Bounds-checked little-endian reads over the raw blob bytes.

use crate::error::{DecodeError, DecodeResult};

/// Borrowed view over the whole blob. Every typed record view carries one of these plus the
/// absolute offset of its record, so reads never copy and never outlive the blob.
#[derive(Clone, Copy, Debug)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`.
    #[inline]
    pub fn slice(&self, offset: usize, len: usize) -> DecodeResult<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(DecodeError::OutOfBounds {
                offset,
                len,
                blob_len: self.bytes.len(),
            })
    }

    /// Fail unless `len` bytes at `offset` are inside the blob.
    #[inline]
    pub fn ensure(&self, offset: usize, len: usize) -> DecodeResult<()> {
        self.slice(offset, len).map(|_| ())
    }

    #[inline]
    fn array<const N: usize>(&self, offset: usize) -> DecodeResult<[u8; N]> {
        let raw = self.slice(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(raw);
        Ok(out)
    }

    #[inline]
    pub fn u8_at(&self, offset: usize) -> DecodeResult<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    #[inline]
    pub fn u16_at(&self, offset: usize) -> DecodeResult<u16> {
        self.array(offset).map(u16::from_le_bytes)
    }

    #[inline]
    pub fn u32_at(&self, offset: usize) -> DecodeResult<u32> {
        self.array(offset).map(u32::from_le_bytes)
    }

    #[inline]
    pub fn f32_at(&self, offset: usize) -> DecodeResult<f32> {
        self.array(offset).map(f32::from_le_bytes)
    }

    /// Read a u32 that holds an absolute blob offset.
    #[inline]
    pub fn offset_at(&self, offset: usize) -> DecodeResult<usize> {
        self.u32_at(offset).map(|v| v as usize)
    }

    /// Read a NUL-terminated UTF-8 string starting at `offset` (terminator excluded).
    pub fn cstr_at(&self, offset: usize) -> DecodeResult<&'a str> {
        let tail = self.bytes.get(offset..).ok_or(DecodeError::OutOfBounds {
            offset,
            len: 1,
            blob_len: self.bytes.len(),
        })?;
        let end = tail
            .iter()
            .position(|b| *b == 0)
            .ok_or(DecodeError::UnterminatedString { offset })?;
        std::str::from_utf8(&tail[..end]).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_little_endian_and_unaligned() {
        let bytes = [0xff, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let view = ByteView::new(&bytes);
        assert_eq!(view.u16_at(1).unwrap(), 0x1234);
        assert_eq!(view.u32_at(3).unwrap(), 0x1234_5678);
        assert_eq!(view.u8_at(0).unwrap(), 0xff);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let bytes = [0u8; 3];
        let view = ByteView::new(&bytes);
        assert_eq!(
            view.u32_at(0),
            Err(DecodeError::OutOfBounds {
                offset: 0,
                len: 4,
                blob_len: 3
            })
        );
        assert!(view.u8_at(usize::MAX).is_err());
        assert!(view.slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn cstr_requires_terminator() {
        let bytes = b"uTime\0uOpen";
        let view = ByteView::new(bytes);
        assert_eq!(view.cstr_at(0).unwrap(), "uTime");
        assert_eq!(
            view.cstr_at(6),
            Err(DecodeError::UnterminatedString { offset: 6 })
        );
    }

    #[test]
    fn f32_round_trips_bit_patterns() {
        let bytes = f32::INFINITY.to_le_bytes();
        let view = ByteView::new(&bytes);
        assert_eq!(view.f32_at(0).unwrap(), f32::INFINITY);
    }
}
