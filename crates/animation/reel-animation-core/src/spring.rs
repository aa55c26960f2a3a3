//! Damped spring that chases an animated target, plus the rotation derived from its velocity.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Per-entity constants, fixed at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    /// Rolling radius: spin advances by `speed / radius` per second.
    pub radius: f32,
    pub stiffness: f32,
    /// Velocity fraction removed per second.
    pub damping: f32,
    /// Lean gain applied to the turn rate.
    pub leaning: f32,
}

impl SpringParams {
    pub const fn new(radius: f32, stiffness: f32, damping: f32, leaning: f32) -> Self {
        Self {
            radius,
            stiffness,
            damping,
            leaning,
        }
    }
}

/// Tuning shared by every spring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringTuning {
    pub teleport_distance_sq: f32,
    pub teleport_step: f32,
    pub lean_scale: f32,
}

impl Default for SpringTuning {
    fn default() -> Self {
        Self {
            teleport_distance_sq: 25.0,
            teleport_step: 0.01,
            lean_scale: 0.001,
        }
    }
}

/// Integration state persisting across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpringState {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    /// `(spin, heading, lean)` in radians.
    pub rotation: Vector3<f32>,
}

/// What a single update did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpringStep {
    /// `dt` was zero; state untouched.
    Skipped,
    Integrated,
    /// The target was too far away; the spring was snapped behind it first.
    Teleported,
}

impl SpringState {
    /// Advance the spring by `dt` seconds towards `target`.
    ///
    /// `future` is the target sampled slightly ahead in time and is only used to seed the
    /// velocity when teleporting.
    pub fn update(
        &mut self,
        params: &SpringParams,
        tuning: &SpringTuning,
        target: Vector3<f32>,
        future: Vector3<f32>,
        dt: f32,
    ) -> SpringStep {
        if dt == 0.0 {
            return SpringStep::Skipped;
        }

        let mut step = SpringStep::Integrated;
        let mut displacement = target - self.position;
        if displacement.norm_squared() > tuning.teleport_distance_sq {
            self.velocity = (future - target) / tuning.teleport_step;
            self.position = target - self.velocity * (params.damping / params.stiffness);
            displacement = Vector3::zeros();
            step = SpringStep::Teleported;
        }

        let previous = self.velocity;
        self.velocity -= self.velocity * (params.damping * dt);
        self.velocity += displacement * (params.stiffness * dt);
        self.position += self.velocity * dt;

        let speed = self.velocity.norm();
        self.rotation.y = self.velocity.x.atan2(self.velocity.z);
        self.rotation.z = 0.0;
        let previous_speed = previous.norm();
        if previous_speed != 0.0 && speed != 0.0 {
            // sign of the y component of (velocity x previous)
            let sign = if previous.z * self.velocity.x - previous.x * self.velocity.z < 0.0 {
                -1.0
            } else {
                1.0
            };
            let cos = (previous / previous_speed)
                .dot(&(self.velocity / speed))
                .clamp(-1.0, 1.0);
            self.rotation.z = cos.acos() * sign * speed * params.leaning / dt * tuning.lean_scale;
        }
        self.rotation.x += speed / params.radius * dt;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const HERO: SpringParams = SpringParams::new(0.25, 3.5, 2.0, 320.0);

    #[test]
    fn zero_dt_is_bit_identical() {
        let mut state = SpringState {
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(-0.5, 0.25, 0.125),
            rotation: Vector3::new(0.1, 0.2, 0.3),
        };
        let before = state;
        let step = state.update(
            &HERO,
            &SpringTuning::default(),
            Vector3::new(100.0, 0.0, 0.0),
            Vector3::new(101.0, 0.0, 0.0),
            0.0,
        );
        assert_eq!(step, SpringStep::Skipped);
        assert_eq!(state, before);
    }

    #[test]
    fn teleport_only_past_threshold() {
        let tuning = SpringTuning::default();
        let mut near = SpringState::default();
        // |(3,4,0)|^2 == 25, not above the threshold
        let step = near.update(&HERO, &tuning, Vector3::new(3.0, 4.0, 0.0), Vector3::zeros(), 0.01);
        assert_eq!(step, SpringStep::Integrated);

        let mut far = SpringState::default();
        let target = Vector3::new(6.0, 0.0, 0.0);
        let future = Vector3::new(6.01, 0.0, 0.0);
        let step = far.update(&HERO, &tuning, target, future, 0.0);
        assert_eq!(step, SpringStep::Skipped);
        let step = far.update(&HERO, &tuning, target, future, 0.01);
        assert_eq!(step, SpringStep::Teleported);
        // seeded velocity (1,0,0), placed d/k behind the target, then damped and integrated
        let v = 1.0 - 1.0 * 2.0 * 0.01;
        assert_relative_eq!(far.velocity.x, v, epsilon = 1e-3);
        assert_relative_eq!(far.position.x, 6.0 - 2.0 / 3.5 + v * 0.01, epsilon = 1e-3);
    }

    #[test]
    fn heading_follows_velocity() {
        let mut state = SpringState::default();
        state.update(&HERO, &SpringTuning::default(), Vector3::new(1.0, 0.0, 0.0), Vector3::zeros(), 0.1);
        // moving along +x
        assert_relative_eq!(state.rotation.y, std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
        assert!(state.rotation.x > 0.0);
        // first motion from rest has no previous velocity to lean against
        assert_eq!(state.rotation.z, 0.0);
    }

    #[test]
    fn lean_sign_follows_turn_direction() {
        let tuning = SpringTuning::default();
        let mut left = SpringState {
            velocity: Vector3::new(0.0, 0.0, 1.0),
            ..SpringState::default()
        };
        let mut right = left;
        left.update(&HERO, &tuning, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros(), 0.1);
        right.update(&HERO, &tuning, Vector3::new(-1.0, 0.0, 0.0), Vector3::zeros(), 0.1);
        assert!(left.rotation.z > 0.0);
        assert!(right.rotation.z < 0.0);
        assert_relative_eq!(left.rotation.z, -right.rotation.z, epsilon = 1e-6);
    }

    #[test]
    fn parallel_velocity_does_not_lean() {
        let mut state = SpringState {
            velocity: Vector3::new(0.0, 0.0, 2.0),
            ..SpringState::default()
        };
        state.update(&HERO, &SpringTuning::default(), Vector3::new(0.0, 0.0, 1.0), Vector3::zeros(), 0.05);
        assert_relative_eq!(state.rotation.z, 0.0, epsilon = 1e-2);
    }
}
