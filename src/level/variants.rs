//! Level variants
//!
//! Each struct wraps a `GeneratedMazeCore` and supplies the finish rule and any extra
//! draw objects. Levels are created either by generating a fresh maze or by
//! restoring a snapshot; restoring never touches the random source.

use glam::{Mat4, Quat, Vec3};

use super::{GeneratedMazeCore, Level, LevelLayout, SaveData, generate_grid};
use crate::config::{LevelConfig, LevelKind};
use crate::error::{MazeError, Result};
use crate::random::RandomSource;
use crate::render::{DrawSink, InstanceRef, ModelKind, ObjectRef};
use crate::sim::{CollectState, FinishRule, TiltInput, place_objects};

fn expect_kind(config: &LevelConfig, kind: LevelKind) -> Result<()> {
    if config.kind != kind {
        return Err(MazeError::invalid_config(format!(
            "level '{}' is {}, expected {}",
            config.name,
            config.kind.as_str(),
            kind.as_str()
        )));
    }
    Ok(())
}

fn object_matrix(pos: Vec3, size: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(size), Quat::IDENTITY, pos)
}

/// Build a core over a fresh maze, returning the random source for object placement
fn generate_core(
    config: &LevelConfig,
    width: f32,
    height: f32,
    rng: RandomSource,
    rule: impl FnOnce(&LevelLayout, &crate::maze::Grid, &mut RandomSource) -> Result<FinishRule>,
) -> Result<GeneratedMazeCore> {
    let layout = LevelLayout::new(config, width, height)?;
    let (grid, mut rng) = generate_grid(config, &layout, rng)?;
    let rule = rule(&layout, &grid, &mut rng)?;
    let ball = layout.ball_at_start(&grid);
    Ok(GeneratedMazeCore::new(config, layout, grid, ball, rule))
}

/// Grid-snapped maze: reach the hole
#[derive(Debug, Clone)]
pub struct MazeLevel {
    core: GeneratedMazeCore,
}

impl MazeLevel {
    pub fn generate(config: &LevelConfig, width: f32, height: f32, rng: RandomSource) -> Result<Self> {
        expect_kind(config, LevelKind::Standard)?;
        let core = generate_core(config, width, height, rng, |_, _, _| Ok(FinishRule::ReachEnd))?;
        Ok(Self { core })
    }

    pub fn restore(config: &LevelConfig, width: f32, height: f32, save: &SaveData) -> Result<Self> {
        expect_kind(config, LevelKind::Standard)?;
        let layout = LevelLayout::new(config, width, height)?;
        let (grid, ball) = GeneratedMazeCore::restore_parts(&layout, save)?;
        Ok(Self {
            core: GeneratedMazeCore::new(config, layout, grid, ball, FinishRule::ReachEnd),
        })
    }
}

impl Level for MazeLevel {
    fn name(&self) -> &str {
        &self.core.config().name
    }

    fn update_data(&mut self, input: TiltInput, dt: f32) -> bool {
        self.core.update_data(input, dt)
    }

    fn update_draw_objects(&mut self, sink: &mut dyn DrawSink) {
        self.core.update_draw_objects(sink);
    }

    fn check_finish_condition(&mut self, dt: f32) -> bool {
        self.core.check_finish_condition(dt)
    }

    fn save_data(&self) -> SaveData {
        self.core.save_data()
    }

    fn core(&self) -> &GeneratedMazeCore {
        &self.core
    }
}

/// Free movement between thin walls: reach the hole
#[derive(Debug, Clone)]
pub struct OpenAreaLevel {
    core: GeneratedMazeCore,
}

impl OpenAreaLevel {
    pub fn generate(config: &LevelConfig, width: f32, height: f32, rng: RandomSource) -> Result<Self> {
        expect_kind(config, LevelKind::OpenArea)?;
        let core = generate_core(config, width, height, rng, |_, _, _| Ok(FinishRule::ReachEnd))?;
        Ok(Self { core })
    }

    pub fn restore(config: &LevelConfig, width: f32, height: f32, save: &SaveData) -> Result<Self> {
        expect_kind(config, LevelKind::OpenArea)?;
        let layout = LevelLayout::new(config, width, height)?;
        let (grid, ball) = GeneratedMazeCore::restore_parts(&layout, save)?;
        Ok(Self {
            core: GeneratedMazeCore::new(config, layout, grid, ball, FinishRule::ReachEnd),
        })
    }
}

impl Level for OpenAreaLevel {
    fn name(&self) -> &str {
        &self.core.config().name
    }

    fn update_data(&mut self, input: TiltInput, dt: f32) -> bool {
        self.core.update_data(input, dt)
    }

    fn update_draw_objects(&mut self, sink: &mut dyn DrawSink) {
        self.core.update_draw_objects(sink);
    }

    fn check_finish_condition(&mut self, dt: f32) -> bool {
        self.core.check_finish_condition(dt)
    }

    fn save_data(&self) -> SaveData {
        self.core.save_data()
    }

    fn core(&self) -> &GeneratedMazeCore {
        &self.core
    }
}

/// Open area with hazards that send the ball back to the start
#[derive(Debug, Clone)]
pub struct AvoidHazardsLevel {
    core: GeneratedMazeCore,
    hazard_object: Option<ObjectRef>,
}

impl AvoidHazardsLevel {
    pub fn generate(config: &LevelConfig, width: f32, height: f32, rng: RandomSource) -> Result<Self> {
        expect_kind(config, LevelKind::AvoidHazards)?;
        let core = generate_core(config, width, height, rng, |layout, grid, rng| {
            let hazards = place_objects(
                grid,
                &layout.geometry,
                config.object_count,
                layout.ball_radius,
                rng,
            )?;
            Ok(FinishRule::AvoidHazards { hazards })
        })?;
        Ok(Self {
            core,
            hazard_object: None,
        })
    }

    pub fn restore(config: &LevelConfig, width: f32, height: f32, save: &SaveData) -> Result<Self> {
        expect_kind(config, LevelKind::AvoidHazards)?;
        save.check_hazards(config.object_count)?;
        let layout = LevelLayout::new(config, width, height)?;
        let (grid, ball) = GeneratedMazeCore::restore_parts(&layout, save)?;
        let rule = FinishRule::AvoidHazards {
            hazards: save.hazards.clone(),
        };
        Ok(Self {
            core: GeneratedMazeCore::new(config, layout, grid, ball, rule),
            hazard_object: None,
        })
    }

    pub fn hazards(&self) -> &[Vec3] {
        match self.core.finish_rule() {
            FinishRule::AvoidHazards { hazards } => hazards,
            _ => &[],
        }
    }
}

impl Level for AvoidHazardsLevel {
    fn name(&self) -> &str {
        &self.core.config().name
    }

    fn update_data(&mut self, input: TiltInput, dt: f32) -> bool {
        self.core.update_data(input, dt)
    }

    fn update_draw_objects(&mut self, sink: &mut dyn DrawSink) {
        self.core.update_draw_objects(sink);
        // Hazards never move; register them once
        if self.hazard_object.is_none() {
            let object = sink.add_object(ModelKind::Hazard, &self.core.config().textures.object);
            let size = self.core.ball().diameter();
            for hazard in self.hazards() {
                sink.add_model_matrix_for_object(object, object_matrix(*hazard, size));
            }
            self.hazard_object = Some(object);
        }
    }

    fn check_finish_condition(&mut self, dt: f32) -> bool {
        self.core.check_finish_condition(dt)
    }

    fn save_data(&self) -> SaveData {
        SaveData {
            hazards: self.hazards().to_vec(),
            ..self.core.save_data()
        }
    }

    fn core(&self) -> &GeneratedMazeCore {
        &self.core
    }
}

/// Open area where every item must be picked up before the hole counts
#[derive(Debug, Clone)]
pub struct CollectItemsLevel {
    core: GeneratedMazeCore,
    item_handles: Option<(ObjectRef, Vec<InstanceRef>)>,
}

impl CollectItemsLevel {
    pub fn generate(config: &LevelConfig, width: f32, height: f32, rng: RandomSource) -> Result<Self> {
        expect_kind(config, LevelKind::CollectItems)?;
        let core = generate_core(config, width, height, rng, |layout, grid, rng| {
            let positions = place_objects(
                grid,
                &layout.geometry,
                config.object_count,
                layout.ball_radius,
                rng,
            )?;
            Ok(FinishRule::CollectItems(CollectState::new(positions, grid.start())))
        })?;
        Ok(Self {
            core,
            item_handles: None,
        })
    }

    pub fn restore(config: &LevelConfig, width: f32, height: f32, save: &SaveData) -> Result<Self> {
        expect_kind(config, LevelKind::CollectItems)?;
        save.check_collectibles(config.object_count)?;
        let layout = LevelLayout::new(config, width, height)?;
        let (grid, ball) = GeneratedMazeCore::restore_parts(&layout, save)?;
        let state = CollectState::restore(
            save.collectibles.clone(),
            &save.collected,
            save.cell_history.clone(),
        );
        Ok(Self {
            core: GeneratedMazeCore::new(config, layout, grid, ball, FinishRule::CollectItems(state)),
            item_handles: None,
        })
    }

    pub fn collect_state(&self) -> Option<&CollectState> {
        match self.core.finish_rule() {
            FinishRule::CollectItems(state) => Some(state),
            _ => None,
        }
    }
}

impl Level for CollectItemsLevel {
    fn name(&self) -> &str {
        &self.core.config().name
    }

    fn update_data(&mut self, input: TiltInput, dt: f32) -> bool {
        self.core.update_data(input, dt)
    }

    fn update_draw_objects(&mut self, sink: &mut dyn DrawSink) {
        self.core.update_draw_objects(sink);
        let size = self.core.ball().diameter() * 0.8;
        let FinishRule::CollectItems(state) = self.core.finish_rule() else {
            return;
        };
        if let Some((object, instances)) = &self.item_handles {
            // Only collected items trail the ball
            for (item, instance) in state.items().iter().zip(instances) {
                if item.collected {
                    sink.update_model_matrix_for_object(*object, *instance, object_matrix(item.pos, size));
                }
            }
            return;
        }
        let object = sink.add_object(ModelKind::Collectible, &self.core.config().textures.object);
        let instances = state
            .items()
            .iter()
            .map(|item| sink.add_model_matrix_for_object(object, object_matrix(item.pos, size)))
            .collect();
        self.item_handles = Some((object, instances));
    }

    fn check_finish_condition(&mut self, dt: f32) -> bool {
        self.core.check_finish_condition(dt)
    }

    fn save_data(&self) -> SaveData {
        let base = self.core.save_data();
        match self.collect_state() {
            Some(state) => SaveData {
                collectibles: state.items().iter().map(|item| item.pos).collect(),
                collected: state.items().iter().map(|item| item.collected).collect(),
                cell_history: state.history().iter().copied().collect(),
                ..base
            },
            None => base,
        }
    }

    fn core(&self) -> &GeneratedMazeCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSink;
    use crate::sim::Ball;

    const W: f32 = 2.0;
    const H: f32 = 3.0;

    fn standard() -> LevelConfig {
        LevelConfig::new("standard", LevelKind::Standard, 9)
    }

    fn hazards() -> LevelConfig {
        LevelConfig::new("hazards", LevelKind::AvoidHazards, 12).with_objects(3)
    }

    fn collect() -> LevelConfig {
        LevelConfig::new("collect", LevelKind::CollectItems, 12).with_objects(3)
    }

    #[test]
    fn test_generate_standard_level() {
        let level = MazeLevel::generate(&standard(), W, H, RandomSource::seeded(1)).unwrap();
        let core = level.core();
        assert!(core.grid().is_perfect());
        assert_eq!(core.ball().cell(), core.grid().start());
        assert_eq!(level.name(), "standard");
        assert!(!core.is_finished());
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        assert!(matches!(
            OpenAreaLevel::generate(&standard(), W, H, RandomSource::seeded(1)),
            Err(MazeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_standard_round_trip() {
        let mut level = MazeLevel::generate(&standard(), W, H, RandomSource::seeded(2)).unwrap();
        for _ in 0..30 {
            level.update_data(TiltInput::new(-1.0, 0.5, 0.0), 1.0 / 60.0);
        }
        let save = level.save_data();
        let restored = MazeLevel::restore(&standard(), W, H, &save).unwrap();
        let grid = restored.core().grid();
        assert_eq!(grid.wall_bits(), level.core().grid().wall_bits());
        assert_eq!(grid.end(), level.core().grid().end());
        // Start follows the ball
        assert_eq!(grid.start(), level.core().ball().cell());
        assert_eq!(restored.core().ball().pos, level.core().ball().pos);
        assert_eq!(restored.core().ball().vel, level.core().ball().vel);
    }

    #[test]
    fn test_hazard_level_round_trip() {
        let level = AvoidHazardsLevel::generate(&hazards(), W, H, RandomSource::seeded(3)).unwrap();
        assert_eq!(level.hazards().len(), 3);
        let save = level.save_data();
        let restored = AvoidHazardsLevel::restore(&hazards(), W, H, &save).unwrap();
        assert_eq!(restored.hazards(), level.hazards());
        assert_eq!(restored.core().grid().wall_bits(), level.core().grid().wall_bits());
    }

    #[test]
    fn test_hazard_count_mismatch_is_corrupt() {
        let level = AvoidHazardsLevel::generate(&hazards(), W, H, RandomSource::seeded(3)).unwrap();
        let mut save = level.save_data();
        save.hazards.pop();
        assert!(matches!(
            AvoidHazardsLevel::restore(&hazards(), W, H, &save),
            Err(MazeError::CorruptSave { .. })
        ));
    }

    #[test]
    fn test_hazard_touch_resets_ball() {
        let mut level = AvoidHazardsLevel::generate(&hazards(), W, H, RandomSource::seeded(4)).unwrap();
        let hazard = level.hazards()[0];
        let vel = Vec3::new(0.2, 0.1, 0.0);
        {
            let ball: &mut Ball = level.core.ball_mut();
            ball.pos = Vec3::new(hazard.x, hazard.y, ball.pos.z);
            ball.vel = vel;
        }
        assert!(!level.check_finish_condition(0.016));
        let core = level.core();
        let (row, col) = core.grid().start();
        assert_eq!(core.ball().cell(), (row, col));
        let center = core.geometry().cell_center(row, col);
        assert!((core.ball().pos.truncate() - center).length() < 1e-6);
        assert_eq!(core.ball().vel, vel);
    }

    #[test]
    fn test_collect_level_round_trip() {
        let level = CollectItemsLevel::generate(&collect(), W, H, RandomSource::seeded(5)).unwrap();
        let save = level.save_data();
        assert_eq!(save.collectibles.len(), 3);
        assert_eq!(save.collected, vec![false; 3]);
        assert_eq!(save.cell_history, vec![level.core().grid().start()]);

        let json = serde_json::to_string(&save).unwrap();
        let decoded: SaveData = serde_json::from_str(&json).unwrap();
        let restored = CollectItemsLevel::restore(&collect(), W, H, &decoded).unwrap();
        assert_eq!(restored.save_data(), save);
    }

    #[test]
    fn test_collect_count_mismatch_is_corrupt() {
        let level = CollectItemsLevel::generate(&collect(), W, H, RandomSource::seeded(5)).unwrap();
        let save = level.save_data();
        let bigger = LevelConfig::new("collect", LevelKind::CollectItems, 12).with_objects(4);
        assert!(matches!(
            CollectItemsLevel::restore(&bigger, W, H, &save),
            Err(MazeError::CorruptSave { .. })
        ));
    }

    #[test]
    fn test_collect_bad_history_is_corrupt() {
        let level = CollectItemsLevel::generate(&collect(), W, H, RandomSource::seeded(5)).unwrap();
        let mut save = level.save_data();
        save.cell_history.clear();
        assert!(matches!(
            CollectItemsLevel::restore(&collect(), W, H, &save),
            Err(MazeError::CorruptSave { .. })
        ));
        save.cell_history = vec![level.core().grid().start(); 50];
        assert!(matches!(
            CollectItemsLevel::restore(&collect(), W, H, &save),
            Err(MazeError::CorruptSave { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_open_perimeter() {
        let level = MazeLevel::generate(&standard(), W, H, RandomSource::seeded(10)).unwrap();
        let mut save = level.save_data();
        for col in 0..save.columns {
            save.walls[col] &= !crate::maze::Direction::Top.bit();
        }
        assert!(matches!(
            MazeLevel::restore(&standard(), W, H, &save),
            Err(MazeError::CorruptSave { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_ball_in_wrong_cell() {
        let level = MazeLevel::generate(&standard(), W, H, RandomSource::seeded(11)).unwrap();
        let mut save = level.save_data();
        let geometry = *level.core().geometry();
        let other_row = if save.ball_row == 0 { geometry.rows - 1 } else { 0 };
        save.ball_position = geometry.cell_center(other_row, save.ball_col).extend(save.ball_position.z);
        assert!(matches!(
            MazeLevel::restore(&standard(), W, H, &save),
            Err(MazeError::CorruptSave { .. })
        ));
    }

    #[test]
    fn test_collect_finishes_once() {
        let mut level = CollectItemsLevel::generate(&collect(), W, H, RandomSource::seeded(6)).unwrap();
        let items: Vec<Vec3> = level
            .collect_state()
            .unwrap()
            .items()
            .iter()
            .map(|item| item.pos)
            .collect();
        for pos in items {
            let cell = level.core().geometry().cell_at(pos.truncate());
            level.core.ball_mut().place_at(pos, cell);
            assert!(!level.check_finish_condition(0.016));
        }
        assert_eq!(level.collect_state().unwrap().collected_count(), 3);

        let (row, col) = level.core().grid().end();
        let end = level.core().geometry().cell_center(row, col).extend(0.0);
        level.core.ball_mut().place_at(end, (row, col));
        assert!(level.check_finish_condition(0.016));
        assert!(!level.check_finish_condition(0.016));
        assert!(level.core().is_finished());
    }

    #[test]
    fn test_draw_objects_registered_once() {
        let mut level = CollectItemsLevel::generate(&collect(), W, H, RandomSource::seeded(7)).unwrap();
        let mut sink = RecordingSink::new();
        level.update_draw_objects(&mut sink);
        assert_eq!(sink.instance_count(ModelKind::Ball), 1);
        assert_eq!(sink.instance_count(ModelKind::Hole), 1);
        assert_eq!(sink.instance_count(ModelKind::Floor), 1);
        assert_eq!(sink.instance_count(ModelKind::Collectible), 3);
        assert!(sink.instance_count(ModelKind::Wall) > 0);
        let objects = sink.objects.len();

        level.update_draw_objects(&mut sink);
        assert_eq!(sink.objects.len(), objects);
        assert_eq!(sink.updates, 0);
    }

    #[test]
    fn test_ball_matrix_pushed_after_move() {
        let mut level = MazeLevel::generate(&standard(), W, H, RandomSource::seeded(8)).unwrap();
        let mut sink = RecordingSink::new();
        level.update_draw_objects(&mut sink);
        // Tilt in all directions; at least one corridor leaves the start cell
        let mut moved = false;
        for input in [
            TiltInput::new(1.0, 0.0, 0.0),
            TiltInput::new(-1.0, 0.0, 0.0),
            TiltInput::new(0.0, 1.0, 0.0),
            TiltInput::new(0.0, -1.0, 0.0),
        ] {
            for _ in 0..10 {
                moved |= level.update_data(input, 1.0 / 60.0);
            }
        }
        assert!(moved);
        level.update_draw_objects(&mut sink);
        assert_eq!(sink.updates, 1);
    }

    #[test]
    fn test_finished_level_freezes_ball() {
        let mut level = MazeLevel::generate(&standard(), W, H, RandomSource::seeded(9)).unwrap();
        let (row, col) = level.core().grid().end();
        let end = level.core().geometry().cell_center(row, col).extend(0.0);
        level.core.ball_mut().place_at(end, (row, col));
        assert!(level.check_finish_condition(0.016));
        assert!(!level.update_data(TiltInput::new(5.0, 5.0, 0.0), 0.1));
    }
}
