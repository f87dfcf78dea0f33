//! Random placement of hazards and collectibles

use glam::Vec3;

use crate::consts::{MAX_PLACEMENT_ATTEMPTS, MIN_OBJECT_SEPARATION};
use crate::error::{MazeError, Result};
use crate::lift;
use crate::maze::{CellIndex, Grid, MazeGeometry};
use crate::random::RandomSource;

#[inline]
fn manhattan(a: CellIndex, b: CellIndex) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

/// Pick `count` cells at least `MIN_OBJECT_SEPARATION` (Manhattan) from the start,
/// the end, and each other.
pub fn pick_object_cells(grid: &Grid, count: usize, rng: &mut RandomSource) -> Result<Vec<CellIndex>> {
    let mut chosen: Vec<CellIndex> = Vec::with_capacity(count);
    let anchors = [grid.start(), grid.end()];

    for _ in 0..count {
        let mut placed = false;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let cell = (rng.uniform_index(grid.rows()), rng.uniform_index(grid.columns()));
            let clear = anchors
                .iter()
                .chain(chosen.iter())
                .all(|other| manhattan(cell, *other) >= MIN_OBJECT_SEPARATION);
            if clear {
                chosen.push(cell);
                placed = true;
                break;
            }
        }
        if !placed {
            return Err(MazeError::PlacementExhausted {
                requested: count,
                placed: chosen.len(),
            });
        }
    }
    Ok(chosen)
}

/// Cell-centre positions for `count` objects at height `z`
pub fn place_objects(
    grid: &Grid,
    geometry: &MazeGeometry,
    count: usize,
    z: f32,
    rng: &mut RandomSource,
) -> Result<Vec<Vec3>> {
    let cells = pick_object_cells(grid, count, rng)?;
    log::debug!("Placed {} objects at {:?}", cells.len(), cells);
    Ok(cells
        .into_iter()
        .map(|(row, col)| lift(geometry.cell_center(row, col), z))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{CarveStrategy, MazeGenerator};

    #[test]
    fn test_objects_respect_spacing() {
        let mut generator = MazeGenerator::new(RandomSource::seeded(21), CarveStrategy::DepthFirst);
        let grid = generator.generate(12, 8).unwrap();
        let cells = pick_object_cells(&grid, 4, generator.rng_mut()).unwrap();
        assert_eq!(cells.len(), 4);
        for (i, a) in cells.iter().enumerate() {
            assert!(manhattan(*a, grid.start()) >= MIN_OBJECT_SEPARATION);
            assert!(manhattan(*a, grid.end()) >= MIN_OBJECT_SEPARATION);
            for b in &cells[i + 1..] {
                assert!(manhattan(*a, *b) >= MIN_OBJECT_SEPARATION);
            }
        }
    }

    #[test]
    fn test_crowded_grid_fails() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.set_start(0, 0);
        grid.set_end(1, 1);
        let mut rng = RandomSource::seeded(4);
        assert!(matches!(
            pick_object_cells(&grid, 1, &mut rng),
            Err(MazeError::PlacementExhausted { requested: 1, placed: 0 })
        ));
    }

    #[test]
    fn test_positions_at_cell_centres() {
        let mut grid = Grid::new(6, 6).unwrap();
        grid.set_start(0, 0);
        grid.set_end(0, 5);
        let geom = MazeGeometry::new(3.0, 3.0, 6, 0.0).unwrap();
        let mut rng = RandomSource::seeded(8);
        let positions = place_objects(&grid, &geom, 2, 0.25, &mut rng).unwrap();
        for p in positions {
            let (row, col) = geom.cell_at(p.truncate());
            assert!((geom.cell_center(row, col) - p.truncate()).length() < 1e-5);
            assert_eq!(p.z, 0.25);
        }
    }

    #[test]
    fn test_zero_objects() {
        let grid = Grid::new(2, 2).unwrap();
        let mut rng = RandomSource::seeded(0);
        assert!(pick_object_cells(&grid, 0, &mut rng).unwrap().is_empty());
    }
}
