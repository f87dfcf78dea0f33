//! Tilt Maze - simulation core for a tilt-controlled ball-in-maze game
//!
//! Core modules:
//! - `maze`: Grid/cell model, perfect-maze generation, wall geometry
//! - `sim`: Ball physics, cell tracking, finish conditions (frame-stepped, single-threaded)
//! - `level`: The `Level` interface, its variants, and save/restore
//! - `transition`: Time-polled animations gating level changes
//! - `render`: The narrow seam to the drawing collaborator
//! - `config`: Data-driven level table

pub mod config;
pub mod error;
pub mod level;
pub mod maze;
pub mod random;
pub mod render;
pub mod sim;
pub mod transition;

pub use config::{LevelConfig, LevelKind, LevelTable};
pub use error::{MazeError, Result};
pub use random::RandomSource;

use glam::{Vec2, Vec3};

/// Tuning constants shared by generation and simulation
pub mod consts {
    /// Default maze extent in render-space units
    pub const MAZE_WIDTH: f32 = 2.0;
    pub const MAZE_HEIGHT: f32 = 3.0;

    /// Ball diameter as a fraction of the smaller cell dimension
    pub const BALL_DIAMETER_FRACTION: f32 = 0.5;
    /// Wall thickness as a fraction of the smaller cell dimension
    pub const WALL_THICKNESS_FRACTION: f32 = 0.1;
    /// Height of walls above the floor
    pub const WALL_HEIGHT: f32 = 0.1;

    /// Off-centre distance (fraction of a cell) after which the grid maze forces the
    /// ball back onto the corridor centreline
    pub const OFF_AXIS_SNAP_FRACTION: f32 = 0.2;

    /// Redraw thresholds (minimum displacement since last reported frame)
    pub const GRID_REDRAW_EPSILON: f32 = 5e-5;
    pub const OPEN_AREA_REDRAW_EPSILON: f32 = 7e-3;

    /// Fixed-magnitude drag applied per axis in open-area mazes (units/s²)
    pub const OPEN_AREA_VISCOSITY: f32 = 0.3;

    /// Visual rolling: radians of rotation per unit of distance travelled
    pub const ROLL_FACTOR: f32 = 10.0;

    /// Rejection-sampling cap for start/end selection
    pub const MAX_ENDPOINT_ATTEMPTS: u32 = 10_000;
    /// Rejection-sampling cap for hazard/collectible placement (per object)
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 1_000;
    /// Minimum Manhattan distance (in cells) between placed objects and start/end
    pub const MIN_OBJECT_SEPARATION: usize = 3;

    /// Ball speed below which collectibles fall back to a one second traversal
    pub const NEGLIGIBLE_SPEED: f32 = 1e-3;
    /// Nominal traversal time for trailing collectibles (seconds)
    pub const NOMINAL_TRAVERSAL_SECS: f32 = 1.0;

    /// Transition timings (milliseconds)
    pub const QUAD_DURATION_MS: u64 = 1_000;
    pub const QUAD_POLL_INTERVAL_MS: u64 = 16;
    pub const TILE_INTERVAL_MS: u64 = 30;
    /// Vertical spacing between stacked cover tiles
    pub const TILE_LAYER_HEIGHT: f32 = 0.002;
}

/// Distance between two points, ignoring the z axis
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    a.truncate().distance(b.truncate())
}

/// Lift a planar point to 3D at height `z`
#[inline]
pub fn lift(p: Vec2, z: f32) -> Vec3 {
    Vec3::new(p.x, p.y, z)
}

/// Move `current` toward `target` by at most `max_step`, never overshooting
#[inline]
pub fn approach(current: Vec3, target: Vec3, max_step: f32) -> Vec3 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_step || dist <= f32::EPSILON {
        target
    } else {
        current + delta / dist * max_step
    }
}
