//! Playable levels
//!
//! Every variant implements the `Level` capability interface and embeds a
//! `GeneratedMazeCore` holding the grid, the ball, its physics and the finish rule.
//! Variants differ only in the values they hand the core (motion model, wall style,
//! finish rule) and in the extra objects they draw.

pub mod save;
pub mod variants;

pub use save::SaveData;
pub use variants::{AvoidHazardsLevel, CollectItemsLevel, MazeLevel, OpenAreaLevel};

use glam::{Mat4, Quat, Vec3};

use crate::config::{LevelConfig, LevelKind};
use crate::consts::{BALL_DIAMETER_FRACTION, WALL_HEIGHT, WALL_THICKNESS_FRACTION};
use crate::error::{MazeError, Result};
use crate::lift;
use crate::maze::{Grid, MazeGenerator, MazeGeometry, WallStyle, floor_matrix};
use crate::random::RandomSource;
use crate::render::{DrawSink, InstanceRef, ModelKind, ObjectRef};
use crate::sim::{Ball, BallPhysics, FinishConditionEvaluator, FinishRule, MotionModel, TiltInput};

/// What the game loop drives every frame
pub trait Level {
    fn name(&self) -> &str;

    /// Advance the simulation; true when the scene needs redrawing
    fn update_data(&mut self, input: TiltInput, dt: f32) -> bool;

    /// Push changed model matrices (registering objects on first call)
    fn update_draw_objects(&mut self, sink: &mut dyn DrawSink);

    /// True only on the tick the level becomes finished
    fn check_finish_condition(&mut self, dt: f32) -> bool;

    fn save_data(&self) -> SaveData;

    /// Read-only view of the shared maze state (grid, ball and finish rule), used by
    /// callers holding a `dyn Level`
    fn core(&self) -> &GeneratedMazeCore;
}

/// Sizes derived from the maze extent and cell count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelLayout {
    pub geometry: MazeGeometry,
    pub ball_radius: f32,
    pub wall_thickness: f32,
}

impl LevelLayout {
    /// Open-area walls are thin panels on the cell borders, so cells are laid out
    /// inside half a wall thickness of margin.
    pub fn new(config: &LevelConfig, width: f32, height: f32) -> Result<Self> {
        config.validate()?;
        let plain = MazeGeometry::new(width, height, config.rows, 0.0)?;
        let wall_thickness = plain.min_cell_dimension() * WALL_THICKNESS_FRACTION;
        let geometry = match config.kind.wall_style() {
            WallStyle::StandardWalls => plain,
            WallStyle::OpenAreaWalls => {
                MazeGeometry::new(width, height, config.rows, wall_thickness / 2.0)?
            }
        };
        let ball_radius = geometry.min_cell_dimension() * BALL_DIAMETER_FRACTION / 2.0;
        Ok(Self {
            geometry,
            ball_radius,
            wall_thickness,
        })
    }

    pub fn motion_model(&self, style: WallStyle) -> MotionModel {
        match style {
            WallStyle::StandardWalls => MotionModel::GridSnapped,
            WallStyle::OpenAreaWalls => MotionModel::open_area(self.wall_thickness),
        }
    }

    /// Ball resting on the floor at the centre of the start cell
    pub fn ball_at_start(&self, grid: &Grid) -> Ball {
        let (row, col) = grid.start();
        Ball::new(
            lift(self.geometry.cell_center(row, col), self.ball_radius),
            (row, col),
            self.ball_radius,
        )
    }
}

/// Generate a fresh grid for `config`
pub fn generate_grid(config: &LevelConfig, layout: &LevelLayout, rng: RandomSource) -> Result<(Grid, RandomSource)> {
    let mut generator = MazeGenerator::new(rng, config.strategy);
    let grid = generator.generate(layout.geometry.rows, layout.geometry.columns)?;
    Ok((grid, generator.into_rng()))
}

/// Generate the variant `config` asks for
pub fn generate_level(config: &LevelConfig, width: f32, height: f32, rng: RandomSource) -> Result<Box<dyn Level>> {
    Ok(match config.kind {
        LevelKind::Standard => Box::new(MazeLevel::generate(config, width, height, rng)?),
        LevelKind::OpenArea => Box::new(OpenAreaLevel::generate(config, width, height, rng)?),
        LevelKind::AvoidHazards => Box::new(AvoidHazardsLevel::generate(config, width, height, rng)?),
        LevelKind::CollectItems => Box::new(CollectItemsLevel::generate(config, width, height, rng)?),
    })
}

/// Rebuild the variant `config` asks for from a snapshot
pub fn restore_level(config: &LevelConfig, width: f32, height: f32, save: &SaveData) -> Result<Box<dyn Level>> {
    if save.level_name != config.name {
        return Err(MazeError::corrupt(format!(
            "save belongs to level '{}', not '{}'",
            save.level_name, config.name
        )));
    }
    Ok(match config.kind {
        LevelKind::Standard => Box::new(MazeLevel::restore(config, width, height, save)?),
        LevelKind::OpenArea => Box::new(OpenAreaLevel::restore(config, width, height, save)?),
        LevelKind::AvoidHazards => Box::new(AvoidHazardsLevel::restore(config, width, height, save)?),
        LevelKind::CollectItems => Box::new(CollectItemsLevel::restore(config, width, height, save)?),
    })
}

#[derive(Debug, Clone, Copy)]
struct CoreHandles {
    ball: (ObjectRef, InstanceRef),
}

/// Shared state of every generated-maze level
#[derive(Debug, Clone)]
pub struct GeneratedMazeCore {
    config: LevelConfig,
    layout: LevelLayout,
    grid: Grid,
    ball: Ball,
    physics: BallPhysics,
    wall_style: WallStyle,
    finish: FinishConditionEvaluator,
    handles: Option<CoreHandles>,
    redraw_pending: bool,
}

impl GeneratedMazeCore {
    pub fn new(config: &LevelConfig, layout: LevelLayout, grid: Grid, ball: Ball, rule: FinishRule) -> Self {
        let wall_style = config.kind.wall_style();
        Self {
            config: config.clone(),
            physics: BallPhysics::new(layout.motion_model(wall_style), layout.geometry),
            layout,
            grid,
            ball,
            wall_style,
            finish: FinishConditionEvaluator::new(rule),
            handles: None,
            redraw_pending: true,
        }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    pub fn geometry(&self) -> &MazeGeometry {
        &self.layout.geometry
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn ball_mut(&mut self) -> &mut Ball {
        &mut self.ball
    }

    pub fn physics(&self) -> &BallPhysics {
        &self.physics
    }

    pub fn finish_rule(&self) -> &FinishRule {
        self.finish.rule()
    }

    pub fn is_finished(&self) -> bool {
        self.finish.is_finished()
    }

    pub fn update_data(&mut self, input: TiltInput, dt: f32) -> bool {
        if self.finish.is_finished() {
            return false;
        }
        let moved = self
            .physics
            .advance(&mut self.ball, &self.grid, input.acceleration(), dt);
        self.redraw_pending |= moved;
        moved
    }

    pub fn check_finish_condition(&mut self, dt: f32) -> bool {
        let before = self.ball.pos;
        let finished = self
            .finish
            .check(&mut self.ball, &self.grid, &self.layout.geometry, dt);
        if self.ball.pos != before {
            self.redraw_pending = true;
        }
        if finished {
            log::info!("Level '{}' finished at {:?}", self.config.name, self.ball.cell());
        }
        finished
    }

    pub fn ball_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.ball.diameter()),
            self.ball.rotation,
            self.ball.pos,
        )
    }

    pub fn hole_matrix(&self) -> Mat4 {
        let (row, col) = self.grid.end();
        let center = self.layout.geometry.cell_center(row, col);
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.ball.diameter() * 1.2, self.ball.diameter() * 1.2, 1.0),
            Quat::IDENTITY,
            lift(center, 0.001),
        )
    }

    /// Register floor, walls, hole and ball on first call, afterwards update the
    /// ball when it has moved.
    pub fn update_draw_objects(&mut self, sink: &mut dyn DrawSink) {
        let handles = match self.handles {
            Some(handles) => handles,
            None => {
                let textures = &self.config.textures;
                let floor = sink.add_object(ModelKind::Floor, &textures.floor);
                sink.add_model_matrix_for_object(floor, floor_matrix(&self.layout.geometry));

                let wall = sink.add_object(ModelKind::Wall, &textures.wall);
                for matrix in self.wall_style.wall_matrices(
                    &self.grid,
                    &self.layout.geometry,
                    self.layout.wall_thickness,
                    WALL_HEIGHT,
                ) {
                    sink.add_model_matrix_for_object(wall, matrix);
                }

                let hole = sink.add_object(ModelKind::Hole, &textures.hole);
                sink.add_model_matrix_for_object(hole, self.hole_matrix());

                let ball = sink.add_object(ModelKind::Ball, &textures.ball);
                let instance = sink.add_model_matrix_for_object(ball, self.ball_matrix());
                self.redraw_pending = false;

                let handles = CoreHandles {
                    ball: (ball, instance),
                };
                self.handles = Some(handles);
                return;
            }
        };

        if self.redraw_pending {
            let (object, instance) = handles.ball;
            sink.update_model_matrix_for_object(object, instance, self.ball_matrix());
            self.redraw_pending = false;
        }
    }

    /// Snapshot of the maze and ball; variants add their objects
    pub fn save_data(&self) -> SaveData {
        SaveData {
            level_name: self.config.name.clone(),
            rows: self.grid.rows(),
            columns: self.grid.columns(),
            walls: self.grid.wall_bits(),
            row_start: self.grid.row_start,
            col_start: self.grid.col_start,
            row_end: self.grid.row_end,
            col_end: self.grid.col_end,
            ball_row: self.ball.row,
            ball_col: self.ball.col,
            ball_position: self.ball.pos,
            ball_velocity: self.ball.vel,
            ball_rotation: self.ball.rotation,
            hazards: Vec::new(),
            collectibles: Vec::new(),
            collected: Vec::new(),
            cell_history: Vec::new(),
        }
    }

    /// Rebuild the grid and ball from a snapshot
    pub fn restore_parts(layout: &LevelLayout, save: &SaveData) -> Result<(Grid, Ball)> {
        save.check_ball()?;
        let grid = save.restore_grid(&layout.geometry)?;
        let mut ball = Ball::new(save.ball_position, save.ball_cell(), layout.ball_radius);
        ball.vel = save.ball_velocity;
        ball.rotation = save.ball_rotation.normalize();
        log::info!(
            "Restored {}x{} maze '{}' with ball at {:?}",
            grid.rows(),
            grid.columns(),
            save.level_name,
            ball.cell()
        );
        Ok((grid, ball))
    }
}
