//! Perfect-maze generation
//!
//! Start and end cells are rejection-sampled until they are far enough apart, then
//! passages are carved from the start cell outward. Two interchangeable frontier
//! orders are supported:
//! - `DepthFirst`: a stack, giving long winding corridors (the default)
//! - `BreadthFirst`: a FIFO queue, giving shorter, bushier branches
//!
//! Both visit every cell exactly once and carve one edge per newly visited cell, so the
//! result always has `rows * columns - 1` open edges and a single component.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::cell::Direction;
use super::grid::{CellIndex, Grid};
use crate::consts::MAX_ENDPOINT_ATTEMPTS;
use crate::error::{MazeError, Result};
use crate::random::RandomSource;

/// Frontier order used while carving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CarveStrategy {
    #[default]
    DepthFirst,
    BreadthFirst,
}

/// Frontier container: the strategy only changes which end work is taken from
enum Frontier {
    Stack(Vec<CellIndex>),
    Queue(VecDeque<CellIndex>),
}

impl Frontier {
    fn new(strategy: CarveStrategy, first: CellIndex) -> Self {
        match strategy {
            CarveStrategy::DepthFirst => Frontier::Stack(vec![first]),
            CarveStrategy::BreadthFirst => Frontier::Queue(VecDeque::from([first])),
        }
    }

    fn current(&self) -> Option<CellIndex> {
        match self {
            Frontier::Stack(stack) => stack.last().copied(),
            Frontier::Queue(queue) => queue.front().copied(),
        }
    }

    fn retire_current(&mut self) {
        match self {
            Frontier::Stack(stack) => {
                stack.pop();
            }
            Frontier::Queue(queue) => {
                queue.pop_front();
            }
        }
    }

    fn push(&mut self, cell: CellIndex) {
        match self {
            Frontier::Stack(stack) => stack.push(cell),
            Frontier::Queue(queue) => queue.push_back(cell),
        }
    }
}

/// Builds perfect mazes from a random source it owns
#[derive(Debug, Clone)]
pub struct MazeGenerator {
    rng: RandomSource,
    strategy: CarveStrategy,
}

impl MazeGenerator {
    pub fn new(rng: RandomSource, strategy: CarveStrategy) -> Self {
        Self { rng, strategy }
    }

    pub fn strategy(&self) -> CarveStrategy {
        self.strategy
    }

    /// Hand the random source back (for placing objects after generation)
    pub fn into_rng(self) -> RandomSource {
        self.rng
    }

    pub fn rng_mut(&mut self) -> &mut RandomSource {
        &mut self.rng
    }

    /// Generate a `rows x columns` perfect maze with distant start and end cells
    pub fn generate(&mut self, rows: usize, columns: usize) -> Result<Grid> {
        let mut grid = Grid::new(rows, columns)?;
        let (start, end) = self.pick_endpoints(rows, columns)?;
        grid.set_start(start.0, start.1);
        grid.set_end(end.0, end.1);
        carve_passages(&mut grid, start, self.strategy, &mut self.rng);

        log::info!(
            "Generated {}x{} maze ({:?}): start {:?}, end {:?}",
            rows,
            columns,
            self.strategy,
            start,
            end
        );
        Ok(grid)
    }

    /// Rejection-sample start/end until their squared distance reaches
    /// `(rows + columns)^2 / 16`.
    pub fn pick_endpoints(&mut self, rows: usize, columns: usize) -> Result<(CellIndex, CellIndex)> {
        if !separation_satisfiable(rows, columns) {
            return Err(MazeError::UnsatisfiableSeparation { rows, columns });
        }
        for _ in 0..MAX_ENDPOINT_ATTEMPTS {
            let start = (self.rng.uniform_index(rows), self.rng.uniform_index(columns));
            let end = (self.rng.uniform_index(rows), self.rng.uniform_index(columns));
            if separated_enough(start, end, rows, columns) {
                return Ok((start, end));
            }
        }
        Err(MazeError::UnsatisfiableSeparation { rows, columns })
    }
}

/// Squared cell distance, compared as `16 * d^2 >= (rows + columns)^2` to stay in integers
pub fn separated_enough(a: CellIndex, b: CellIndex, rows: usize, columns: usize) -> bool {
    let dr = a.0.abs_diff(b.0);
    let dc = a.1.abs_diff(b.1);
    16 * (dr * dr + dc * dc) >= (rows + columns) * (rows + columns)
}

/// Whether opposite corners, the farthest possible pair, meet the separation rule
pub fn separation_satisfiable(rows: usize, columns: usize) -> bool {
    rows > 0 && columns > 0 && separated_enough((0, 0), (rows - 1, columns - 1), rows, columns)
}

/// Carve a spanning tree over `grid` starting from `start`
pub fn carve_passages(
    grid: &mut Grid,
    start: CellIndex,
    strategy: CarveStrategy,
    rng: &mut RandomSource,
) {
    grid.clear_visited();
    grid.cell_mut(start.0, start.1).visited = true;
    let mut frontier = Frontier::new(strategy, start);
    let mut candidates: Vec<(Direction, CellIndex)> = Vec::with_capacity(4);

    while let Some((row, col)) = frontier.current() {
        candidates.clear();
        for side in Direction::ALL {
            if let Some((nr, nc)) = grid.neighbor(row, col, side) {
                if !grid.cell(nr, nc).visited {
                    candidates.push((side, (nr, nc)));
                }
            }
        }

        if candidates.is_empty() {
            frontier.retire_current();
            continue;
        }

        let (side, next) = candidates[rng.uniform_index(candidates.len())];
        grid.carve(row, col, side);
        grid.cell_mut(next.0, next.1).visited = true;
        frontier.push(next);
    }
}
