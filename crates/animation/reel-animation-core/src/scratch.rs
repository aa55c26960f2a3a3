//! Per-frame uniform value cache and frame lifecycle.
//!
//! Sized once for the largest shot and overwritten every frame, so evaluation never allocates
//! during playback.

use crate::error::{AnimationError, AnimationResult};

/// One evaluated uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformValue<'a> {
    pub name: &'a str,
    pub size: u8,
    pub values: [f32; 4],
}

impl UniformValue<'_> {
    /// The `size` leading components.
    #[inline]
    pub fn components(&self) -> &[f32] {
        &self.values[..self.size as usize]
    }
}

#[derive(Debug)]
pub struct Scratch<'a> {
    uniforms: Vec<UniformValue<'a>>,
    capacity: usize,
}

impl<'a> Scratch<'a> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uniforms: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn begin_frame(&mut self) {
        self.uniforms.clear();
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a slot for `name` and return it zeroed. `size` must be 1 to 4.
    pub fn push(&mut self, name: &'a str, size: usize) -> AnimationResult<&mut UniformValue<'a>> {
        if size == 0 || size > 4 {
            return Err(AnimationError::InvalidComponentCount {
                uniform: name.to_owned(),
                count: size,
            });
        }
        if self.uniforms.len() >= self.capacity {
            return Err(AnimationError::ScratchOverflow {
                uniforms: self.uniforms.len() + 1,
                capacity: self.capacity,
            });
        }
        self.uniforms.push(UniformValue {
            name,
            size: size as u8,
            values: [0.0; 4],
        });
        let last = self.uniforms.len() - 1;
        Ok(&mut self.uniforms[last])
    }

    #[inline]
    pub fn uniforms(&self) -> &[UniformValue<'a>] {
        &self.uniforms
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue<'a>> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_frame_keeps_the_allocation() {
        let mut scratch = Scratch::with_capacity(2);
        scratch.push("uA", 1).unwrap().values[0] = 3.0;
        scratch.push("uB", 2).unwrap();
        let before = scratch.uniforms.capacity();
        scratch.begin_frame();
        assert!(scratch.uniforms().is_empty());
        scratch.push("uC", 4).unwrap();
        assert_eq!(scratch.uniforms.capacity(), before);
        assert_eq!(scratch.get("uC").unwrap().components(), &[0.0; 4]);
    }

    #[test]
    fn component_count_must_fit_a_vec4() {
        let mut scratch = Scratch::with_capacity(2);
        assert_eq!(
            scratch.push("uWide", 5).unwrap_err(),
            AnimationError::InvalidComponentCount {
                uniform: "uWide".into(),
                count: 5
            }
        );
        assert!(scratch.push("uEmpty", 0).is_err());
        assert!(scratch.uniforms().is_empty());
    }

    #[test]
    fn overflow_is_an_error() {
        let mut scratch = Scratch::with_capacity(1);
        scratch.push("uA", 1).unwrap();
        assert_eq!(
            scratch.push("uB", 1).unwrap_err(),
            AnimationError::ScratchOverflow {
                uniforms: 2,
                capacity: 1
            }
        );
    }
}
