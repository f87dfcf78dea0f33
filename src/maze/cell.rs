//! A single maze cell and the four directions it can open toward

use serde::{Deserialize, Serialize};

/// Side of a cell. Rows grow downward, so `Top` faces row - 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    /// Inspection order used by the carving strategies
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Bottom,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Bit used for this side in the packed wall nibble
    pub fn bit(self) -> u8 {
        match self {
            Direction::Top => 0b0001,
            Direction::Bottom => 0b0010,
            Direction::Left => 0b0100,
            Direction::Right => 0b1000,
        }
    }

    /// (row, column) step toward the neighbour on this side
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Top => (-1, 0),
            Direction::Bottom => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// One grid unit of the maze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub top_wall: bool,
    pub bottom_wall: bool,
    pub left_wall: bool,
    pub right_wall: bool,
    /// Generation bookkeeping only
    #[serde(skip)]
    pub visited: bool,
    pub is_start: bool,
    pub is_end: bool,
}

impl Default for Cell {
    /// Fully walled, unvisited
    fn default() -> Self {
        Self {
            top_wall: true,
            bottom_wall: true,
            left_wall: true,
            right_wall: true,
            visited: false,
            is_start: false,
            is_end: false,
        }
    }
}

impl Cell {
    pub fn has_wall(&self, side: Direction) -> bool {
        match side {
            Direction::Top => self.top_wall,
            Direction::Bottom => self.bottom_wall,
            Direction::Left => self.left_wall,
            Direction::Right => self.right_wall,
        }
    }

    pub fn set_wall(&mut self, side: Direction, present: bool) {
        match side {
            Direction::Top => self.top_wall = present,
            Direction::Bottom => self.bottom_wall = present,
            Direction::Left => self.left_wall = present,
            Direction::Right => self.right_wall = present,
        }
    }

    /// Pack the four wall flags into the low nibble
    pub fn wall_bits(&self) -> u8 {
        Direction::ALL
            .iter()
            .filter(|side| self.has_wall(**side))
            .fold(0, |bits, side| bits | side.bit())
    }

    /// Rebuild a cell from a packed nibble. Start/end markers are left cleared.
    pub fn from_wall_bits(bits: u8) -> Self {
        let mut cell = Cell::default();
        for side in Direction::ALL {
            cell.set_wall(side, bits & side.bit() != 0);
        }
        cell
    }

    pub fn open_sides(&self) -> usize {
        Direction::ALL
            .iter()
            .filter(|side| !self.has_wall(**side))
            .count()
    }
}
