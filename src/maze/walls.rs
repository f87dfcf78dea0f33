//! Model matrices for maze walls
//!
//! Walls are instances of a unit cube centred on the origin. Each shared edge is
//! emitted once: every cell contributes its top and left walls, and the last
//! row/column add the bottom/right perimeter.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::cell::Direction;
use super::grid::{Grid, MazeGeometry};

/// How wall geometry is laid out for a maze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WallStyle {
    /// Slabs that overlap at the corners, so the maze reads as solid blocks
    #[default]
    StandardWalls,
    /// Thin panels stopping short of each corner, with a post at every corner joint
    OpenAreaWalls,
}

/// One wall segment in render space
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    midpoint: Vec2,
    horizontal: bool,
    /// Lattice corners at each end, as (row, column) vertex indices
    ends: [(usize, usize); 2],
}

fn segments(grid: &Grid, geom: &MazeGeometry) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut push = |row: usize, col: usize, side: Direction| {
        let center = geom.cell_center(row, col);
        let plane = geom.wall_plane(row, col, side);
        let segment = match side {
            Direction::Top => Segment {
                midpoint: Vec2::new(center.x, plane),
                horizontal: true,
                ends: [(row, col), (row, col + 1)],
            },
            Direction::Bottom => Segment {
                midpoint: Vec2::new(center.x, plane),
                horizontal: true,
                ends: [(row + 1, col), (row + 1, col + 1)],
            },
            Direction::Left => Segment {
                midpoint: Vec2::new(plane, center.y),
                horizontal: false,
                ends: [(row, col), (row + 1, col)],
            },
            Direction::Right => Segment {
                midpoint: Vec2::new(plane, center.y),
                horizontal: false,
                ends: [(row, col + 1), (row + 1, col + 1)],
            },
        };
        out.push(segment);
    };

    for row in 0..grid.rows() {
        for col in 0..grid.columns() {
            let cell = grid.cell(row, col);
            if cell.top_wall {
                push(row, col, Direction::Top);
            }
            if cell.left_wall {
                push(row, col, Direction::Left);
            }
            if row + 1 == grid.rows() && cell.bottom_wall {
                push(row, col, Direction::Bottom);
            }
            if col + 1 == grid.columns() && cell.right_wall {
                push(row, col, Direction::Right);
            }
        }
    }
    out
}

impl WallStyle {
    /// Instance matrices for every wall (and corner post, for open-area walls)
    pub fn wall_matrices(
        self,
        grid: &Grid,
        geom: &MazeGeometry,
        thickness: f32,
        height: f32,
    ) -> Vec<Mat4> {
        let segments = segments(grid, geom);
        let z = height / 2.0;
        let mut matrices = Vec::with_capacity(segments.len());

        let (overhang, mut posts) = match self {
            WallStyle::StandardWalls => (thickness, None),
            WallStyle::OpenAreaWalls => (
                -thickness,
                Some(vec![false; (grid.rows() + 1) * (grid.columns() + 1)]),
            ),
        };

        for segment in &segments {
            let scale = if segment.horizontal {
                Vec3::new(geom.cell_width() + overhang, thickness, height)
            } else {
                Vec3::new(thickness, geom.cell_height() + overhang, height)
            };
            matrices.push(Mat4::from_scale_rotation_translation(
                scale,
                Quat::IDENTITY,
                Vec3::new(segment.midpoint.x, segment.midpoint.y, z),
            ));
            if let Some(posts) = posts.as_mut() {
                for (vr, vc) in segment.ends {
                    posts[vr * (grid.columns() + 1) + vc] = true;
                }
            }
        }

        if let Some(posts) = posts {
            let left = -geom.width / 2.0 + geom.inset;
            let top = geom.height / 2.0 - geom.inset;
            for (idx, _) in posts.iter().enumerate().filter(|(_, used)| **used) {
                let vr = idx / (grid.columns() + 1);
                let vc = idx % (grid.columns() + 1);
                let at = Vec3::new(
                    left + vc as f32 * geom.cell_width(),
                    top - vr as f32 * geom.cell_height(),
                    z,
                );
                matrices.push(Mat4::from_scale_rotation_translation(
                    Vec3::new(thickness, thickness, height),
                    Quat::IDENTITY,
                    at,
                ));
            }
        }
        matrices
    }
}

/// Floor quad covering the whole maze extent at z = 0
pub fn floor_matrix(geom: &MazeGeometry) -> Mat4 {
    Mat4::from_scale(Vec3::new(geom.width, geom.height, 1.0))
}
