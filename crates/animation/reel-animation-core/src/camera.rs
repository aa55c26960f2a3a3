//! Camera processor: turns animated origin/angles/fov uniforms into a view matrix and the four
//! frustum corner rays the ray marching shaders expect.

use nalgebra::{Matrix4, Vector3};

use crate::config::CameraConfig;
use crate::processor::{AnimationProcessor, CurveSample, UniformSink};

#[derive(Clone, Debug)]
pub struct CameraProcessor {
    config: CameraConfig,
    aspect: f32,
    origin: Vector3<f32>,
    angles: Vector3<f32>,
    frustum: [f32; 16],
}

impl CameraProcessor {
    /// `width / height` of the output sets the horizontal frustum spread.
    pub fn new(config: CameraConfig, width: u32, height: u32) -> Self {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Self {
            config,
            aspect,
            origin: Vector3::zeros(),
            angles: Vector3::zeros(),
            frustum: [0.0; 16],
        }
    }

    /// Corner rays for a half field of view of `fov` radians, one per row:
    /// bottom-left, bottom-right, top-left, top-right.
    pub fn frustum_for(fov: f32, aspect: f32) -> [f32; 16] {
        let ty = fov.tan();
        let tx = ty * aspect;
        [
            -tx, -ty, 1.0, 0.0, //
            tx, -ty, 1.0, 0.0, //
            -tx, ty, 1.0, 0.0, //
            tx, ty, 1.0, 0.0,
        ]
    }

    /// Row-major camera transform: rotation `Ry(-yaw) * Rx(pitch) * Rz(roll)` in the upper 3x3,
    /// origin in the last row.
    pub fn view_for(origin: Vector3<f32>, angles: Vector3<f32>) -> [f32; 16] {
        let orient = rotate_y(-angles.y) * rotate_x(angles.x) * rotate_z(angles.z);
        let mut out = [0.0; 16];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 4 + col] = orient[(row, col)];
            }
        }
        out[12] = origin.x;
        out[13] = origin.y;
        out[14] = origin.z;
        out[15] = 1.0;
        out
    }

    pub fn origin(&self) -> Vector3<f32> {
        self.origin
    }

    pub fn angles(&self) -> Vector3<f32> {
        self.angles
    }
}

// Rotation matrices written in row-vector convention (`v' = v * M`).
fn rotate_x(radians: f32) -> Matrix4<f32> {
    let (s, c) = radians.sin_cos();
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, c, s, 0.0, //
        0.0, -s, c, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

fn rotate_y(radians: f32) -> Matrix4<f32> {
    let (s, c) = radians.sin_cos();
    Matrix4::new(
        c, 0.0, -s, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        s, 0.0, c, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

fn rotate_z(radians: f32) -> Matrix4<f32> {
    let (s, c) = radians.sin_cos();
    Matrix4::new(
        c, s, 0.0, 0.0, //
        -s, c, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

impl AnimationProcessor for CameraProcessor {
    fn curve_evaluated(&mut self, sample: &CurveSample<'_>) {
        if sample.component > 2 {
            return;
        }
        if sample.uniform == self.config.origin {
            self.origin[sample.component] = sample.value;
        } else if sample.uniform == self.config.angles {
            self.angles[sample.component] = sample.value;
        } else if sample.uniform == self.config.fov {
            self.frustum = Self::frustum_for(sample.value, self.aspect);
        }
    }

    fn finalize(&mut self, sink: &mut dyn UniformSink) {
        let view = Self::view_for(self.origin, self.angles);
        sink.set_matrix4(&self.config.view, &view);
        sink.set_matrix4(&self.config.frustum, &self.frustum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_angles_give_identity_rotation() {
        let view = CameraProcessor::view_for(Vector3::new(1.0, 2.0, 3.0), Vector3::zeros());
        let expected = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            1.0, 2.0, 3.0, 1.0,
        ];
        for (a, b) in view.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn yaw_turns_forward_axis() {
        let yaw = std::f32::consts::FRAC_PI_2;
        let view = CameraProcessor::view_for(Vector3::zeros(), Vector3::new(0.0, yaw, 0.0));
        // Ry(-yaw): row 0 = (cos, 0, sin), row 2 = (-sin, 0, cos)
        assert_relative_eq!(view[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(view[2], 1.0, epsilon = 1e-6);
        assert_relative_eq!(view[8], -1.0, epsilon = 1e-6);
        assert_relative_eq!(view[10], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn frustum_scales_with_aspect() {
        let f = CameraProcessor::frustum_for(std::f32::consts::FRAC_PI_4, 2.0);
        assert_relative_eq!(f[0], -2.0, epsilon = 1e-6);
        assert_relative_eq!(f[1], -1.0, epsilon = 1e-6);
        assert_relative_eq!(f[13], 1.0, epsilon = 1e-6);
        assert_eq!(f[14], 1.0);
        assert_eq!(f[3], 0.0);
    }
}
