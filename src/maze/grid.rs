//! Grid of cells plus the render-space geometry derived from it

use std::collections::VecDeque;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::cell::{Cell, Direction};
use crate::error::{MazeError, Result};

/// Row/column address of a cell
pub type CellIndex = (usize, usize);

/// A rows x columns matrix of cells with one start and one end marker.
///
/// Only serialized; rebuild one from saved data with [`Grid::from_wall_bits`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    rows: usize,
    columns: usize,
    /// Row-major
    cells: Vec<Cell>,
    pub row_start: usize,
    pub col_start: usize,
    pub row_end: usize,
    pub col_end: usize,
}

impl Grid {
    /// A fully walled grid with start and end both at (0, 0)
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(MazeError::invalid_config(format!(
                "grid must have at least one cell, got {rows}x{columns}"
            )));
        }
        Ok(Self {
            rows,
            columns,
            cells: vec![Cell::default(); rows * columns],
            row_start: 0,
            col_start: 0,
            row_end: 0,
            col_end: 0,
        })
    }

    /// Rebuild wall flags from one packed nibble per cell (row-major)
    pub fn from_wall_bits(rows: usize, columns: usize, bits: &[u8]) -> Result<Self> {
        let mut grid = Self::new(rows, columns)?;
        if bits.len() != rows * columns {
            return Err(MazeError::corrupt(format!(
                "expected {} wall nibbles for a {rows}x{columns} maze, found {}",
                rows * columns,
                bits.len()
            )));
        }
        if let Some(bad) = bits.iter().find(|b| **b > 0x0F) {
            return Err(MazeError::corrupt(format!("wall nibble out of range: {bad:#04x}")));
        }
        for (cell, &nibble) in grid.cells.iter_mut().zip(bits) {
            *cell = Cell::from_wall_bits(nibble);
        }
        Ok(grid)
    }

    /// Packed wall nibbles, row-major
    pub fn wall_bits(&self) -> Vec<u8> {
        self.cells.iter().map(Cell::wall_bits).collect()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.columns);
        row * self.columns + col
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[self.offset(row, col)]
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        let idx = self.offset(row, col);
        &mut self.cells[idx]
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.columns
    }

    /// Grid-adjacent neighbour on `side`, if inside the grid
    pub fn neighbor(&self, row: usize, col: usize, side: Direction) -> Option<CellIndex> {
        let (dr, dc) = side.offset();
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        self.contains(r, c).then_some((r, c))
    }

    /// Remove the wall on `side` of (row, col) and the matching wall of the neighbour.
    /// Returns the neighbour, or `None` (and changes nothing) on the boundary.
    pub fn carve(&mut self, row: usize, col: usize, side: Direction) -> Option<CellIndex> {
        let (nr, nc) = self.neighbor(row, col, side)?;
        self.cell_mut(row, col).set_wall(side, false);
        self.cell_mut(nr, nc).set_wall(side.opposite(), false);
        Some((nr, nc))
    }

    pub fn start(&self) -> CellIndex {
        (self.row_start, self.col_start)
    }

    pub fn end(&self) -> CellIndex {
        (self.row_end, self.col_end)
    }

    /// Move the start marker (clearing the old one)
    pub fn set_start(&mut self, row: usize, col: usize) {
        let (old_r, old_c) = self.start();
        self.cell_mut(old_r, old_c).is_start = false;
        self.row_start = row;
        self.col_start = col;
        self.cell_mut(row, col).is_start = true;
    }

    /// Move the end marker (clearing the old one)
    pub fn set_end(&mut self, row: usize, col: usize) {
        let (old_r, old_c) = self.end();
        self.cell_mut(old_r, old_c).is_end = false;
        self.row_end = row;
        self.col_end = col;
        self.cell_mut(row, col).is_end = true;
    }

    pub(crate) fn clear_visited(&mut self) {
        for cell in &mut self.cells {
            cell.visited = false;
        }
    }

    /// Number of interior edges open on both sides
    pub fn open_edge_count(&self) -> usize {
        let mut count = 0;
        for row in 0..self.rows {
            for col in 0..self.columns {
                let cell = self.cell(row, col);
                if col + 1 < self.columns && !cell.right_wall && !self.cell(row, col + 1).left_wall
                {
                    count += 1;
                }
                if row + 1 < self.rows && !cell.bottom_wall && !self.cell(row + 1, col).top_wall {
                    count += 1;
                }
            }
        }
        count
    }

    /// Cells reachable from `from` through open edges, in breadth-first order
    pub fn reachable_from(&self, from: CellIndex) -> Vec<CellIndex> {
        let mut seen = vec![false; self.rows * self.columns];
        let mut order = Vec::with_capacity(seen.len());
        let mut queue = VecDeque::from([from]);
        seen[self.offset(from.0, from.1)] = true;

        while let Some((row, col)) = queue.pop_front() {
            order.push((row, col));
            for side in Direction::ALL {
                if self.cell(row, col).has_wall(side) {
                    continue;
                }
                if let Some((nr, nc)) = self.neighbor(row, col, side) {
                    let idx = self.offset(nr, nc);
                    if !seen[idx] {
                        seen[idx] = true;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
        order
    }

    /// Every cell reachable from every other and no loops
    pub fn is_perfect(&self) -> bool {
        let total = self.rows * self.columns;
        self.reachable_from(self.start()).len() == total && self.open_edge_count() == total - 1
    }

    /// All boundary-facing walls of boundary cells are present
    pub fn perimeter_closed(&self) -> bool {
        let top_bottom = (0..self.columns).all(|col| {
            self.cell(0, col).top_wall && self.cell(self.rows - 1, col).bottom_wall
        });
        let left_right = (0..self.rows).all(|row| {
            self.cell(row, 0).left_wall && self.cell(row, self.columns - 1).right_wall
        });
        top_bottom && left_right
    }
}

impl fmt::Display for Grid {
    /// ASCII rendering: `S`/`E` mark start and end
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for col in 0..self.columns {
            write!(f, "+{}", if self.cell(0, col).top_wall { "--" } else { "  " })?;
        }
        writeln!(f, "+")?;
        for row in 0..self.rows {
            for col in 0..self.columns {
                let cell = self.cell(row, col);
                let mark = if cell.is_start {
                    "S "
                } else if cell.is_end {
                    "E "
                } else {
                    "  "
                };
                write!(f, "{}{}", if cell.left_wall { "|" } else { " " }, mark)?;
            }
            let last = self.cell(row, self.columns - 1);
            writeln!(f, "{}", if last.right_wall { "|" } else { " " })?;
            for col in 0..self.columns {
                write!(
                    f,
                    "+{}",
                    if self.cell(row, col).bottom_wall { "--" } else { "  " }
                )?;
            }
            writeln!(f, "+")?;
        }
        Ok(())
    }
}

/// Physical layout of a maze in render space.
///
/// The maze is centred on the origin. Row 0 is at the top (+y), column 0 on the
/// left (-x). `inset` reserves a border on every side, which open-area mazes use to
/// offset cell centres by half the outer wall thickness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MazeGeometry {
    pub width: f32,
    pub height: f32,
    pub rows: usize,
    pub columns: usize,
    pub inset: f32,
}

impl MazeGeometry {
    /// Columns are derived as `round(rows * width / height)` to keep cells square-ish
    pub fn new(width: f32, height: f32, rows: usize, inset: f32) -> Result<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(MazeError::invalid_config(format!(
                "maze extent must be positive, got {width}x{height}"
            )));
        }
        if rows == 0 {
            return Err(MazeError::invalid_config("maze needs at least one row"));
        }
        if !(0.0..width.min(height) / 2.0).contains(&inset) {
            return Err(MazeError::invalid_config(format!(
                "inset {inset} leaves no room inside a {width}x{height} maze"
            )));
        }
        let columns = ((rows as f32 * width / height).round() as usize).max(1);
        Ok(Self {
            width,
            height,
            rows,
            columns,
            inset,
        })
    }

    #[inline]
    pub fn cell_width(&self) -> f32 {
        (self.width - 2.0 * self.inset) / self.columns as f32
    }

    #[inline]
    pub fn cell_height(&self) -> f32 {
        (self.height - 2.0 * self.inset) / self.rows as f32
    }

    #[inline]
    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(self.cell_width(), self.cell_height())
    }

    #[inline]
    pub fn min_cell_dimension(&self) -> f32 {
        self.cell_width().min(self.cell_height())
    }

    fn left(&self) -> f32 {
        -self.width / 2.0 + self.inset
    }

    fn top(&self) -> f32 {
        self.height / 2.0 - self.inset
    }

    pub fn cell_center(&self, row: usize, col: usize) -> Vec2 {
        Vec2::new(
            self.left() + (col as f32 + 0.5) * self.cell_width(),
            self.top() - (row as f32 + 0.5) * self.cell_height(),
        )
    }

    /// Coordinate of the wall plane on `side` of a cell (x for left/right, y for top/bottom)
    pub fn wall_plane(&self, row: usize, col: usize, side: Direction) -> f32 {
        let center = self.cell_center(row, col);
        match side {
            Direction::Top => center.y + self.cell_height() / 2.0,
            Direction::Bottom => center.y - self.cell_height() / 2.0,
            Direction::Left => center.x - self.cell_width() / 2.0,
            Direction::Right => center.x + self.cell_width() / 2.0,
        }
    }

    /// Cell containing a point, clamped to the grid
    pub fn cell_at(&self, p: Vec2) -> CellIndex {
        let col = ((p.x - self.left()) / self.cell_width()).floor();
        let row = ((self.top() - p.y) / self.cell_height()).floor();
        (
            (row.max(0.0) as usize).min(self.rows - 1),
            (col.max(0.0) as usize).min(self.columns - 1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_walled() {
        let grid = Grid::new(3, 4).unwrap();
        assert_eq!(grid.open_edge_count(), 0);
        assert!(grid.perimeter_closed());
        assert_eq!(grid.reachable_from((0, 0)).len(), 1);
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(Grid::new(0, 3).is_err());
    }

    #[test]
    fn test_carve_opens_both_sides() {
        let mut grid = Grid::new(2, 2).unwrap();
        assert_eq!(grid.carve(0, 0, Direction::Right), Some((0, 1)));
        assert!(!grid.cell(0, 0).right_wall);
        assert!(!grid.cell(0, 1).left_wall);
        assert_eq!(grid.open_edge_count(), 1);
    }

    #[test]
    fn test_carve_boundary_is_noop() {
        let mut grid = Grid::new(2, 2).unwrap();
        assert_eq!(grid.carve(0, 0, Direction::Top), None);
        assert!(grid.cell(0, 0).top_wall);
    }

    #[test]
    fn test_start_end_markers_move() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set_start(1, 1);
        grid.set_end(2, 2);
        grid.set_start(0, 2);
        assert!(!grid.cell(1, 1).is_start);
        assert!(grid.cell(0, 2).is_start);
        assert!(grid.cell(2, 2).is_end);
        assert_eq!(grid.start(), (0, 2));
    }

    #[test]
    fn test_wall_bits_round_trip() {
        let mut grid = Grid::new(2, 3).unwrap();
        grid.carve(0, 0, Direction::Right);
        grid.carve(1, 2, Direction::Top);
        let restored = Grid::from_wall_bits(2, 3, &grid.wall_bits()).unwrap();
        assert_eq!(restored.wall_bits(), grid.wall_bits());
    }

    #[test]
    fn test_wall_bits_validation() {
        assert!(Grid::from_wall_bits(2, 2, &[15, 15, 15]).is_err());
        assert!(Grid::from_wall_bits(1, 1, &[16]).is_err());
        assert!(Grid::from_wall_bits(2, 3, &[15; 5]).is_err());
        let grid = Grid::from_wall_bits(2, 3, &[15; 6]).unwrap();
        assert_eq!(grid.wall_bits().len(), grid.rows() * grid.columns());
    }

    #[test]
    fn test_display_marks_endpoints() {
        let mut grid = Grid::new(1, 2).unwrap();
        grid.carve(0, 0, Direction::Right);
        grid.set_start(0, 0);
        grid.set_end(0, 1);
        assert_eq!(grid.to_string(), "+--+--+\n|S  E |\n+--+--+\n");
    }

    #[test]
    fn test_geometry_columns_derived() {
        let geom = MazeGeometry::new(2.0, 3.0, 15, 0.0).unwrap();
        assert_eq!(geom.columns, 10);
        assert!((geom.cell_width() - 0.2).abs() < 1e-6);
        assert!((geom.cell_height() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_geometry_centres_and_planes() {
        let geom = MazeGeometry::new(2.0, 2.0, 2, 0.0).unwrap();
        let c = geom.cell_center(0, 0);
        assert!((c.x + 0.5).abs() < 1e-6);
        assert!((c.y - 0.5).abs() < 1e-6);
        assert!((geom.wall_plane(0, 0, Direction::Left) + 1.0).abs() < 1e-6);
        assert!((geom.wall_plane(0, 0, Direction::Bottom)).abs() < 1e-6);
        assert_eq!(geom.cell_at(Vec2::new(0.5, -0.5)), (1, 1));
        assert_eq!(geom.cell_at(Vec2::new(-5.0, 5.0)), (0, 0));
    }

    #[test]
    fn test_geometry_inset_offsets_centres() {
        let plain = MazeGeometry::new(2.0, 2.0, 2, 0.0).unwrap();
        let inset = MazeGeometry::new(2.0, 2.0, 2, 0.1).unwrap();
        assert!(inset.cell_center(0, 0).x > plain.cell_center(0, 0).x);
        assert!((inset.cell_width() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_geometry_rejects_bad_extent() {
        assert!(MazeGeometry::new(0.0, 1.0, 4, 0.0).is_err());
        assert!(MazeGeometry::new(1.0, 1.0, 0, 0.0).is_err());
        assert!(MazeGeometry::new(1.0, 1.0, 4, 0.6).is_err());
    }
}
