//! Continuous position to grid cell mapping

use glam::Vec2;

use super::ball::Ball;
use crate::maze::{CellIndex, MazeGeometry};

/// Follows the ball from cell to cell, one step per axis per call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellTracker {
    geometry: MazeGeometry,
}

impl CellTracker {
    pub fn new(geometry: MazeGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &MazeGeometry {
        &self.geometry
    }

    /// Cell the ball occupies after moving to `pos` from `current`.
    ///
    /// An axis transitions once the offset from the current centre exceeds half the
    /// cell on that axis, clamped at the grid boundary. When both axes would change
    /// in the same call only the row moves, so the ball can never slip diagonally
    /// through a corner.
    pub fn next_cell(&self, current: CellIndex, pos: Vec2) -> CellIndex {
        let (row, col) = current;
        let offset = pos - self.geometry.cell_center(row, col);
        let half = self.geometry.cell_size() / 2.0;

        let new_row = if offset.y > half.y && row > 0 {
            row - 1
        } else if offset.y < -half.y && row + 1 < self.geometry.rows {
            row + 1
        } else {
            row
        };

        if new_row != row {
            return (new_row, col);
        }

        let new_col = if offset.x > half.x && col + 1 < self.geometry.columns {
            col + 1
        } else if offset.x < -half.x && col > 0 {
            col - 1
        } else {
            col
        };
        (row, new_col)
    }

    /// Update the ball's cell in place; returns true when it changed
    pub fn track(&self, ball: &mut Ball) -> bool {
        let next = self.next_cell(ball.cell(), ball.pos.truncate());
        if next == ball.cell() {
            return false;
        }
        log::debug!("Ball moved {:?} -> {:?}", ball.cell(), next);
        ball.row = next.0;
        ball.col = next.1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tracker() -> CellTracker {
        // 4x4 cells of 0.5 units
        CellTracker::new(MazeGeometry::new(2.0, 2.0, 4, 0.0).unwrap())
    }

    #[test]
    fn test_stays_inside_cell() {
        let t = tracker();
        let center = t.geometry().cell_center(1, 1);
        assert_eq!(t.next_cell((1, 1), center + Vec2::new(0.2, -0.2)), (1, 1));
    }

    #[test]
    fn test_moves_each_direction() {
        let t = tracker();
        let c = t.geometry().cell_center(1, 1);
        assert_eq!(t.next_cell((1, 1), c + Vec2::new(0.3, 0.0)), (1, 2));
        assert_eq!(t.next_cell((1, 1), c + Vec2::new(-0.3, 0.0)), (1, 0));
        assert_eq!(t.next_cell((1, 1), c + Vec2::new(0.0, 0.3)), (0, 1));
        assert_eq!(t.next_cell((1, 1), c + Vec2::new(0.0, -0.3)), (2, 1));
    }

    #[test]
    fn test_clamped_at_boundary() {
        let t = tracker();
        let c = t.geometry().cell_center(0, 0);
        assert_eq!(t.next_cell((0, 0), c + Vec2::new(-0.3, 0.3)), (0, 0));
        let c = t.geometry().cell_center(3, 3);
        assert_eq!(t.next_cell((3, 3), c + Vec2::new(0.3, -0.3)), (3, 3));
    }

    #[test]
    fn test_diagonal_prefers_row() {
        let t = tracker();
        let c = t.geometry().cell_center(1, 1);
        assert_eq!(t.next_cell((1, 1), c + Vec2::new(0.3, -0.3)), (2, 1));
    }

    #[test]
    fn test_track_updates_ball() {
        let t = tracker();
        let c = t.geometry().cell_center(2, 2);
        let mut ball = Ball::new(c.extend(0.0), (2, 2), 0.1);
        assert!(!t.track(&mut ball));
        ball.pos.x += 0.3;
        assert!(t.track(&mut ball));
        assert_eq!(ball.cell(), (2, 3));
    }

    proptest! {
        #[test]
        fn prop_never_moves_diagonally(
            row in 0usize..4,
            col in 0usize..4,
            dx in -1.0f32..1.0,
            dy in -1.0f32..1.0,
        ) {
            let t = tracker();
            let pos = t.geometry().cell_center(row, col) + Vec2::new(dx, dy);
            let (nr, nc) = t.next_cell((row, col), pos);
            prop_assert!(nr == row || nc == col);
            prop_assert!(nr.abs_diff(row) <= 1 && nc.abs_diff(col) <= 1);
            prop_assert!(nr < 4 && nc < 4);
        }
    }
}
