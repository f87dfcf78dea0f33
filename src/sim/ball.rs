//! Ball state and device input
//!
//! All state that must survive a save/restore lives on `Ball`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::ROLL_FACTOR;
use crate::maze::CellIndex;

/// One frame of orientation-sensor input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TiltInput {
    /// Raw 3-axis acceleration as reported by the device
    pub raw: Vec3,
}

impl TiltInput {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            raw: Vec3::new(x, y, z),
        }
    }

    /// Ball acceleration in maze space. The device x and y axes point against the
    /// maze axes; this is the only place the sign flip happens.
    pub fn acceleration(&self) -> Vec3 {
        Vec3::new(-self.raw.x, -self.raw.y, self.raw.z)
    }
}

/// The rolling ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// z stays fixed for the life of the level
    pub pos: Vec3,
    pub vel: Vec3,
    /// Last acceleration applied (already sign-adjusted)
    pub acc: Vec3,
    /// Accumulated rolling rotation (unit quaternion, visual only)
    pub rotation: Quat,
    /// Position at the last frame that was reported as needing a redraw
    #[serde(skip)]
    pub prev_pos: Vec3,
    pub row: usize,
    pub col: usize,
    pub radius: f32,
}

impl Ball {
    pub fn new(pos: Vec3, cell: CellIndex, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
            acc: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            prev_pos: pos,
            row: cell.0,
            col: cell.1,
            radius,
        }
    }

    #[inline]
    pub fn cell(&self) -> CellIndex {
        (self.row, self.col)
    }

    #[inline]
    pub fn diameter(&self) -> f32 {
        self.radius * 2.0
    }

    /// Teleport to `pos` in `cell`. Velocity is deliberately left as is.
    pub fn place_at(&mut self, pos: Vec3, cell: CellIndex) {
        self.pos = Vec3::new(pos.x, pos.y, self.pos.z);
        self.row = cell.0;
        self.col = cell.1;
    }

    /// Accumulate visual rolling for a step of `dt` seconds.
    ///
    /// Rotation axis is +Z x velocity, angle is |v| * dt * ROLL_FACTOR. A ball at
    /// rest has no axis, so nothing changes.
    pub fn roll(&mut self, dt: f32) {
        let planar = Vec3::new(self.vel.x, self.vel.y, 0.0);
        let axis = Vec3::Z.cross(planar);
        let axis_len = axis.length();
        if axis_len <= f32::EPSILON {
            return;
        }
        let angle = planar.length() * dt * ROLL_FACTOR;
        let delta = Quat::from_axis_angle(axis / axis_len, angle);
        self.rotation = (delta * self.rotation).normalize();
    }

    /// Report whether the ball moved more than `epsilon` since the last reported
    /// frame, and if so make this frame the new reference.
    pub fn take_redraw(&mut self, epsilon: f32) -> bool {
        if self.pos.distance(self.prev_pos) > epsilon {
            self.prev_pos = self.pos;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilt_negates_planar_axes() {
        let input = TiltInput::new(1.0, -2.0, 9.8);
        assert_eq!(input.acceleration(), Vec3::new(-1.0, 2.0, 9.8));
    }

    #[test]
    fn test_roll_skipped_at_rest() {
        let mut ball = Ball::new(Vec3::ZERO, (0, 0), 0.1);
        ball.roll(1.0);
        assert_eq!(ball.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_roll_axis_perpendicular_to_velocity() {
        let mut ball = Ball::new(Vec3::ZERO, (0, 0), 0.1);
        ball.vel = Vec3::new(1.0, 0.0, 0.0);
        ball.roll(0.01);
        let (axis, angle) = ball.rotation.to_axis_angle();
        // +Z x +X = +Y
        assert!((axis - Vec3::Y).length() < 1e-4);
        assert!((angle - 0.1).abs() < 1e-4);
        assert!((ball.rotation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_place_at_keeps_velocity_and_height() {
        let mut ball = Ball::new(Vec3::new(0.0, 0.0, 0.05), (2, 2), 0.05);
        ball.vel = Vec3::new(0.3, -0.1, 0.0);
        ball.place_at(Vec3::new(1.0, 1.0, 9.0), (0, 0));
        assert_eq!(ball.pos, Vec3::new(1.0, 1.0, 0.05));
        assert_eq!(ball.vel, Vec3::new(0.3, -0.1, 0.0));
        assert_eq!(ball.cell(), (0, 0));
    }

    #[test]
    fn test_take_redraw_threshold() {
        let mut ball = Ball::new(Vec3::ZERO, (0, 0), 0.1);
        ball.pos.x = 1e-3;
        assert!(!ball.take_redraw(7e-3));
        assert!(ball.take_redraw(5e-5));
        assert!(!ball.take_redraw(5e-5));
    }
}
