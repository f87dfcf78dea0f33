//! Maze model and generation
//!
//! Pure data plus deterministic algorithms; no rendering dependencies.

pub mod cell;
pub mod generator;
pub mod grid;
pub mod walls;

pub use cell::{Cell, Direction};
pub use generator::{CarveStrategy, MazeGenerator, carve_passages, separated_enough};
pub use grid::{CellIndex, Grid, MazeGeometry};
pub use walls::{WallStyle, floor_matrix};
