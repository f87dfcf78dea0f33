//! Ball integration and wall clamping
//!
//! Semi-implicit Euler: velocity is updated from acceleration first, then position
//! from the new velocity, once per frame. A fast ball is walked cell by cell after
//! the move and clamped in every cell it enters, so it cannot pass through a wall.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::tracker::CellTracker;
use crate::consts::{
    GRID_REDRAW_EPSILON, OPEN_AREA_REDRAW_EPSILON, OPEN_AREA_VISCOSITY, OFF_AXIS_SNAP_FRACTION,
};
use crate::maze::{Direction, Grid, MazeGeometry};

/// How the ball is constrained by the maze
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionModel {
    /// Ball is held on corridor centrelines and stops at the centre of a walled side
    GridSnapped,
    /// Ball roams the corridor freely, stopping a ball radius short of thin walls
    OpenArea { wall_thickness: f32, viscosity: f32 },
}

impl MotionModel {
    pub fn open_area(wall_thickness: f32) -> Self {
        MotionModel::OpenArea {
            wall_thickness,
            viscosity: OPEN_AREA_VISCOSITY,
        }
    }

    /// Minimum displacement since the last reported frame worth a redraw
    pub fn redraw_epsilon(&self) -> f32 {
        match self {
            MotionModel::GridSnapped => GRID_REDRAW_EPSILON,
            MotionModel::OpenArea { .. } => OPEN_AREA_REDRAW_EPSILON,
        }
    }

    /// Distance from the cell centre to the clamp line on each axis
    fn reach(&self, geometry: &MazeGeometry, ball_radius: f32) -> Vec2 {
        match *self {
            MotionModel::GridSnapped => Vec2::ZERO,
            MotionModel::OpenArea { wall_thickness, .. } => {
                // Half the corridor width, less the ball
                let slack = (geometry.cell_size() - Vec2::splat(wall_thickness)) / 2.0;
                (slack - Vec2::splat(ball_radius)).max(Vec2::ZERO)
            }
        }
    }
}

/// Advances a ball through one maze
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallPhysics {
    model: MotionModel,
    tracker: CellTracker,
}

impl BallPhysics {
    pub fn new(model: MotionModel, geometry: MazeGeometry) -> Self {
        Self {
            model,
            tracker: CellTracker::new(geometry),
        }
    }

    pub fn model(&self) -> MotionModel {
        self.model
    }

    pub fn geometry(&self) -> &MazeGeometry {
        self.tracker.geometry()
    }

    pub fn tracker(&self) -> &CellTracker {
        &self.tracker
    }

    /// Advance the ball by `dt` seconds under `acceleration` (already sign-adjusted).
    ///
    /// Returns whether the ball moved enough since the last reported frame to
    /// warrant a redraw.
    pub fn advance(&self, ball: &mut Ball, grid: &Grid, acceleration: Vec3, dt: f32) -> bool {
        ball.acc = Vec3::new(acceleration.x, acceleration.y, 0.0);
        if dt > 0.0 {
            self.step(ball, grid, dt);
        }
        ball.take_redraw(self.model.redraw_epsilon())
    }

    fn step(&self, ball: &mut Ball, grid: &Grid, dt: f32) {
        ball.vel.x += ball.acc.x * dt;
        ball.vel.y += ball.acc.y * dt;
        if let MotionModel::OpenArea { viscosity, .. } = self.model {
            apply_viscosity(&mut ball.vel, viscosity * dt);
        }

        ball.pos.x += ball.vel.x * dt;
        ball.pos.y += ball.vel.y * dt;

        self.clamp_to_walls(ball, grid);
        if self.model == MotionModel::GridSnapped {
            self.snap_to_corridor(ball);
        }
        // One cell per track call; the path is no longer than rows + columns cells
        let geometry = self.geometry();
        for _ in 0..geometry.rows + geometry.columns {
            if !self.tracker.track(ball) {
                break;
            }
            self.clamp_to_walls(ball, grid);
        }
        ball.roll(dt);
    }

    /// Stop the ball at the clamp line of any wall it has crossed while moving toward it
    pub fn clamp_to_walls(&self, ball: &mut Ball, grid: &Grid) {
        let (row, col) = ball.cell();
        let cell = grid.cell(row, col);
        let center = self.geometry().cell_center(row, col);
        let reach = self.model.reach(self.geometry(), ball.radius);

        for side in Direction::ALL {
            if !cell.has_wall(side) {
                continue;
            }
            match side {
                Direction::Left => {
                    let line = center.x - reach.x;
                    if ball.pos.x < line && ball.vel.x < 0.0 {
                        ball.pos.x = line;
                        ball.vel.x = 0.0;
                    }
                }
                Direction::Right => {
                    let line = center.x + reach.x;
                    if ball.pos.x > line && ball.vel.x > 0.0 {
                        ball.pos.x = line;
                        ball.vel.x = 0.0;
                    }
                }
                Direction::Top => {
                    let line = center.y + reach.y;
                    if ball.pos.y > line && ball.vel.y > 0.0 {
                        ball.pos.y = line;
                        ball.vel.y = 0.0;
                    }
                }
                Direction::Bottom => {
                    let line = center.y - reach.y;
                    if ball.pos.y < line && ball.vel.y < 0.0 {
                        ball.pos.y = line;
                        ball.vel.y = 0.0;
                    }
                }
            }
        }
    }

    /// Keep the ball on a corridor centreline: once it is more than a fifth of a cell
    /// along one axis, the other axis is pinned to the centre.
    fn snap_to_corridor(&self, ball: &mut Ball) {
        let (row, col) = ball.cell();
        let center = self.geometry().cell_center(row, col);
        let limit = self.geometry().cell_size() * OFF_AXIS_SNAP_FRACTION;
        let offset = ball.pos.truncate() - center;

        if offset.x.abs() > limit.x {
            ball.pos.y = center.y;
            ball.vel.y = 0.0;
        } else if offset.y.abs() > limit.y {
            ball.pos.x = center.x;
            ball.vel.x = 0.0;
        }
    }
}

/// Constant-magnitude drag per axis, never reversing direction
fn apply_viscosity(vel: &mut Vec3, amount: f32) {
    for v in [&mut vel.x, &mut vel.y] {
        if v.abs() <= amount {
            *v = 0.0;
        } else {
            *v -= amount * v.signum();
        }
    }
}
