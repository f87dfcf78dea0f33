//! Level finish and unveil transitions
//!
//! Two small presentation state machines that take over the screen between levels.
//! Both are polled with the current wall-clock time and do nothing until their update
//! interval has elapsed, so the caller can invoke them every frame.

use std::time::Duration;

use glam::{Mat4, Quat, Vec3};

use crate::consts::{QUAD_DURATION_MS, QUAD_POLL_INTERVAL_MS, TILE_INTERVAL_MS, TILE_LAYER_HEIGHT};
use crate::random::RandomSource;
use crate::render::{DrawSink, InstanceRef, ModelKind, ObjectRef};

/// Which way a transition runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDirection {
    /// Covering the finished level
    Finish,
    /// Revealing the next level
    Unveil,
}

/// A quad scaled linearly between two sizes
#[derive(Debug, Clone, PartialEq)]
pub struct GrowingQuad {
    center: Vec3,
    min_size: f32,
    final_size: f32,
    duration: Duration,
    interval: Duration,
    direction: TransitionDirection,
    started: Option<Duration>,
    last_update: Duration,
    size: f32,
    done: bool,
}

impl GrowingQuad {
    /// Grows from `min_size` to `final_size` when finishing, shrinks the other way
    /// when unveiling.
    pub fn new(
        center: Vec3,
        min_size: f32,
        final_size: f32,
        duration: Duration,
        direction: TransitionDirection,
    ) -> Self {
        let mut quad = Self {
            center,
            min_size,
            final_size,
            duration,
            interval: Duration::from_millis(QUAD_POLL_INTERVAL_MS),
            direction,
            started: None,
            last_update: Duration::ZERO,
            size: 0.0,
            done: false,
        };
        quad.size = quad.endpoints().0;
        quad
    }

    /// Default timing for a level transition
    pub fn for_level(center: Vec3, final_size: f32, direction: TransitionDirection) -> Self {
        Self::new(
            center,
            0.0,
            final_size,
            Duration::from_millis(QUAD_DURATION_MS),
            direction,
        )
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn endpoints(&self) -> (f32, f32) {
        match self.direction {
            TransitionDirection::Finish => (self.min_size, self.final_size),
            TransitionDirection::Unveil => (self.final_size, self.min_size),
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn direction(&self) -> TransitionDirection {
        self.direction
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.size, self.size, 1.0),
            Quat::IDENTITY,
            self.center,
        )
    }

    /// Advance to `now`; true when the size changed. The first poll starts the clock.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.done {
            return false;
        }
        let Some(started) = self.started else {
            self.started = Some(now);
            self.last_update = now;
            return true;
        };
        if now.saturating_sub(self.last_update) < self.interval {
            return false;
        }
        self.last_update = now;

        let elapsed = now.saturating_sub(started);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        let (from, to) = self.endpoints();
        self.size = from + (to - from) * t;
        if t >= 1.0 {
            self.size = to;
            self.done = true;
            log::debug!("Quad transition {:?} done at size {}", self.direction, to);
        }
        true
    }
}

/// Layout of the tiles covering the maze
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    pub rows: usize,
    pub columns: usize,
    pub width: f32,
    pub height: f32,
    /// Height of the lowest layer
    pub z: f32,
}

impl TileGrid {
    pub fn slot_count(&self) -> usize {
        self.rows * self.columns
    }

    /// Model matrix for the tile at `slot` (row-major) and stack `layer`
    pub fn matrix(&self, slot: usize, layer: usize) -> Mat4 {
        let tile_w = self.width / self.columns as f32;
        let tile_h = self.height / self.rows as f32;
        let row = slot / self.columns;
        let col = slot % self.columns;
        let x = -self.width / 2.0 + (col as f32 + 0.5) * tile_w;
        let y = self.height / 2.0 - (row as f32 + 0.5) * tile_h;
        Mat4::from_scale_rotation_translation(
            Vec3::new(tile_w, tile_h, 1.0),
            Quat::IDENTITY,
            Vec3::new(x, y, self.z + layer as f32 * TILE_LAYER_HEIGHT),
        )
    }
}

/// One tile appearing or disappearing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileChange {
    Added { slot: usize, layer: usize },
    Removed { slot: usize, layer: usize },
}

/// Tiles dropped one at a time onto random slots, or lifted off again
#[derive(Debug, Clone)]
pub struct TileCover {
    grid: TileGrid,
    direction: TransitionDirection,
    interval: Duration,
    target: usize,
    placed: usize,
    /// Shuffled slots not yet covered in the current layer
    pool: Vec<usize>,
    /// Tiles stacked on each slot
    stacks: Vec<usize>,
    last_update: Option<Duration>,
    rng: RandomSource,
}

impl TileCover {
    /// Cover the grid with `target` tiles. Once every slot is covered the pool is
    /// refilled and tiles stack on top of each other.
    pub fn cover(grid: TileGrid, target: usize, rng: RandomSource) -> Self {
        Self {
            grid,
            direction: TransitionDirection::Finish,
            interval: Duration::from_millis(TILE_INTERVAL_MS),
            target,
            placed: 0,
            pool: Vec::new(),
            stacks: vec![0; grid.slot_count()],
            last_update: None,
            rng,
        }
    }

    /// Lift tiles off the given stacks until none remain
    pub fn unveil(grid: TileGrid, mut stacks: Vec<usize>, rng: RandomSource) -> Self {
        stacks.resize(grid.slot_count(), 0);
        let placed = stacks.iter().sum();
        Self {
            grid,
            direction: TransitionDirection::Unveil,
            interval: Duration::from_millis(TILE_INTERVAL_MS),
            target: 0,
            placed,
            pool: Vec::new(),
            stacks,
            last_update: None,
            rng,
        }
    }

    /// Turn a finished cover into the unveil of the next level
    pub fn reverse(self) -> Self {
        Self::unveil(self.grid, self.stacks, self.rng)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn direction(&self) -> TransitionDirection {
        self.direction
    }

    pub fn stacks(&self) -> &[usize] {
        &self.stacks
    }

    pub fn tile_count(&self) -> usize {
        self.placed
    }

    pub fn is_done(&self) -> bool {
        match self.direction {
            TransitionDirection::Finish => self.placed >= self.target || self.stacks.is_empty(),
            TransitionDirection::Unveil => self.placed == 0,
        }
    }

    /// At most one tile per elapsed interval. The first poll starts the clock.
    pub fn poll(&mut self, now: Duration) -> Option<TileChange> {
        if self.is_done() {
            return None;
        }
        match self.last_update {
            None => {
                self.last_update = Some(now);
                return None;
            }
            Some(last) if now.saturating_sub(last) < self.interval => return None,
            Some(_) => self.last_update = Some(now),
        }
        let change = match self.direction {
            TransitionDirection::Finish => self.add_tile(),
            TransitionDirection::Unveil => self.remove_tile(),
        };
        if self.is_done() {
            log::debug!("Tile transition {:?} done with {} tiles", self.direction, self.placed);
        }
        change
    }

    fn add_tile(&mut self) -> Option<TileChange> {
        if self.pool.is_empty() {
            self.pool = (0..self.stacks.len()).collect();
            self.rng.shuffle(&mut self.pool);
        }
        let slot = self.pool.pop()?;
        let layer = self.stacks[slot];
        self.stacks[slot] += 1;
        self.placed += 1;
        Some(TileChange::Added { slot, layer })
    }

    fn remove_tile(&mut self) -> Option<TileChange> {
        let covered: Vec<usize> = (0..self.stacks.len())
            .filter(|&slot| self.stacks[slot] > 0)
            .collect();
        if covered.is_empty() {
            return None;
        }
        let slot = covered[self.rng.uniform_index(covered.len())];
        self.stacks[slot] -= 1;
        self.placed -= 1;
        Some(TileChange::Removed {
            slot,
            layer: self.stacks[slot],
        })
    }
}

/// The transition shown between two levels
#[derive(Debug, Clone)]
pub enum Animation {
    Quad(GrowingQuad),
    Tiles(TileCover),
}

/// Drives an `Animation` and mirrors it into the draw sink
#[derive(Debug, Clone)]
pub struct LevelFinishAnimator {
    animation: Animation,
    texture: String,
    object: Option<ObjectRef>,
    quad: Option<InstanceRef>,
    /// Instances per tile slot, bottom layer first
    tiles: Vec<Vec<InstanceRef>>,
    /// Instances of lifted tiles, hidden and ready for reuse
    spare: Vec<InstanceRef>,
}

impl LevelFinishAnimator {
    pub fn new(animation: Animation, texture: &str) -> Self {
        Self {
            animation,
            texture: texture.to_string(),
            object: None,
            quad: None,
            tiles: Vec::new(),
            spare: Vec::new(),
        }
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Hand back the animation, e.g. to reverse a finished tile cover
    pub fn into_animation(self) -> Animation {
        self.animation
    }

    pub fn is_done(&self) -> bool {
        match &self.animation {
            Animation::Quad(quad) => quad.is_done(),
            Animation::Tiles(tiles) => tiles.is_done(),
        }
    }

    /// Poll the animation and push what changed; true when the sink was touched
    pub fn update(&mut self, now: Duration, sink: &mut dyn DrawSink) -> bool {
        let object = match self.object {
            Some(object) => object,
            None => self.register(sink),
        };
        match &mut self.animation {
            Animation::Quad(quad) => {
                if !quad.poll(now) {
                    return false;
                }
                if let Some(instance) = self.quad {
                    sink.update_model_matrix_for_object(object, instance, quad.matrix());
                }
                true
            }
            Animation::Tiles(cover) => {
                let Some(change) = cover.poll(now) else {
                    return false;
                };
                let grid = *cover.grid();
                match change {
                    TileChange::Added { slot, layer } => {
                        let matrix = grid.matrix(slot, layer);
                        let instance = match self.spare.pop() {
                            Some(instance) => {
                                sink.update_model_matrix_for_object(object, instance, matrix);
                                instance
                            }
                            None => sink.add_model_matrix_for_object(object, matrix),
                        };
                        self.tiles[slot].push(instance);
                    }
                    TileChange::Removed { slot, .. } => {
                        if let Some(instance) = self.tiles[slot].pop() {
                            sink.update_model_matrix_for_object(object, instance, Mat4::ZERO);
                            self.spare.push(instance);
                        }
                    }
                }
                true
            }
        }
    }

    /// Register the quad object and any tiles already in place
    fn register(&mut self, sink: &mut dyn DrawSink) -> ObjectRef {
        let object = sink.add_object(ModelKind::Quad, &self.texture);
        match &self.animation {
            Animation::Quad(quad) => {
                self.quad = Some(sink.add_model_matrix_for_object(object, quad.matrix()));
            }
            Animation::Tiles(cover) => {
                let grid = cover.grid();
                self.tiles = cover
                    .stacks()
                    .iter()
                    .enumerate()
                    .map(|(slot, &height)| {
                        (0..height)
                            .map(|layer| sink.add_model_matrix_for_object(object, grid.matrix(slot, layer)))
                            .collect()
                    })
                    .collect();
            }
        }
        self.object = Some(object);
        object
    }
}
