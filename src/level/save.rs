//! Flat snapshot of a level's mutable state
//!
//! The encoding (JSON, binary) belongs to the persistence layer; this module only
//! defines what is captured and validates it on the way back in. Restoring never
//! re-runs generation, and any inconsistency is fatal.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{MazeError, Result};
use crate::maze::{CellIndex, Direction, Grid, MazeGeometry};

/// Slack for a ball resting exactly on a cell border
const CELL_EDGE_TOLERANCE: f32 = 1e-4;

/// Everything needed to rebuild a level without regenerating it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub level_name: String,
    pub rows: usize,
    pub columns: usize,
    /// One wall nibble per cell, row-major (bit 0 top, 1 bottom, 2 left, 3 right)
    pub walls: Vec<u8>,
    pub row_start: usize,
    pub col_start: usize,
    pub row_end: usize,
    pub col_end: usize,
    pub ball_row: usize,
    pub ball_col: usize,
    pub ball_position: Vec3,
    pub ball_velocity: Vec3,
    pub ball_rotation: Quat,
    #[serde(default)]
    pub hazards: Vec<Vec3>,
    #[serde(default)]
    pub collectibles: Vec<Vec3>,
    #[serde(default)]
    pub collected: Vec<bool>,
    /// Most recent first
    #[serde(default)]
    pub cell_history: Vec<CellIndex>,
}

impl SaveData {
    pub fn ball_cell(&self) -> CellIndex {
        (self.ball_row, self.ball_col)
    }

    /// Rebuild the grid. The start marker moves to the ball's saved cell; the
    /// originally generated start is not kept.
    pub fn restore_grid(&self, geometry: &MazeGeometry) -> Result<Grid> {
        if (self.rows, self.columns) != (geometry.rows, geometry.columns) {
            return Err(MazeError::corrupt(format!(
                "saved maze is {}x{} but the level is {}x{}",
                self.rows, self.columns, geometry.rows, geometry.columns
            )));
        }
        let mut grid = Grid::from_wall_bits(self.rows, self.columns, &self.walls)?;
        check_walls_agree(&grid)?;
        if !grid.perimeter_closed() {
            return Err(MazeError::corrupt("outer wall of the maze has an opening"));
        }

        for (what, (row, col)) in [
            ("end", (self.row_end, self.col_end)),
            ("ball", self.ball_cell()),
        ] {
            if !grid.contains(row, col) {
                return Err(MazeError::corrupt(format!(
                    "{what} cell ({row}, {col}) outside {}x{} maze",
                    self.rows, self.columns
                )));
            }
        }
        if let Some(bad) = self.cell_history.iter().find(|(r, c)| !grid.contains(*r, *c)) {
            return Err(MazeError::corrupt(format!("history cell {bad:?} outside maze")));
        }
        self.check_ball_in_cell(geometry)?;

        grid.set_end(self.row_end, self.col_end);
        grid.set_start(self.ball_row, self.ball_col);
        Ok(grid)
    }

    /// Positions and rotation must be finite
    pub fn check_ball(&self) -> Result<()> {
        let finite = self.ball_position.is_finite()
            && self.ball_velocity.is_finite()
            && self.ball_rotation.is_finite();
        if !finite {
            return Err(MazeError::corrupt("ball state contains non-finite values"));
        }
        if self
            .hazards
            .iter()
            .chain(&self.collectibles)
            .any(|p| !p.is_finite())
        {
            return Err(MazeError::corrupt("object position contains non-finite values"));
        }
        Ok(())
    }

    /// The saved position must lie inside the saved ball cell
    fn check_ball_in_cell(&self, geometry: &MazeGeometry) -> Result<()> {
        let (row, col) = self.ball_cell();
        let offset = self.ball_position.truncate() - geometry.cell_center(row, col);
        let half = geometry.cell_size() / 2.0 + Vec2::splat(CELL_EDGE_TOLERANCE);
        if offset.x.abs() > half.x || offset.y.abs() > half.y {
            return Err(MazeError::corrupt(format!(
                "ball position ({}, {}) is not inside its cell ({row}, {col})",
                self.ball_position.x, self.ball_position.y
            )));
        }
        Ok(())
    }

    /// Saved hazards must match the configured count
    pub fn check_hazards(&self, expected: usize) -> Result<()> {
        if self.hazards.len() != expected {
            return Err(MazeError::corrupt(format!(
                "{} hazards saved, level places {expected}",
                self.hazards.len()
            )));
        }
        Ok(())
    }

    /// Saved collectibles and flags must match the configured count, and the cell
    /// history must hold between one and `expected + 1` entries
    pub fn check_collectibles(&self, expected: usize) -> Result<()> {
        if self.collectibles.len() != expected {
            return Err(MazeError::corrupt(format!(
                "{} collection objects saved, level places {expected}",
                self.collectibles.len()
            )));
        }
        if self.collected.len() != expected {
            return Err(MazeError::corrupt(format!(
                "{} collected flags for {expected} collection objects",
                self.collected.len()
            )));
        }
        if self.cell_history.is_empty() || self.cell_history.len() > expected + 1 {
            return Err(MazeError::corrupt(format!(
                "{} history cells saved, expected 1 to {}",
                self.cell_history.len(),
                expected + 1
            )));
        }
        Ok(())
    }
}

/// Walls between neighbours are stored twice and must match
fn check_walls_agree(grid: &Grid) -> Result<()> {
    for row in 0..grid.rows() {
        for col in 0..grid.columns() {
            for side in [Direction::Right, Direction::Bottom] {
                if let Some((nr, nc)) = grid.neighbor(row, col, side) {
                    if grid.cell(row, col).has_wall(side) != grid.cell(nr, nc).has_wall(side.opposite()) {
                        return Err(MazeError::corrupt(format!(
                            "wall between ({row}, {col}) and ({nr}, {nc}) disagrees"
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}
