//! Tilt Maze headless demo
//!
//! Plays through the level table without a window: each level is generated, driven
//! by a wandering tilt for a fixed number of frames, saved and restored, and then
//! the finish transition is run against a recording sink.
//!
//! Usage: `tilt-maze [seed] [levels.json]`

use std::time::Duration;

use tilt_maze::consts::{MAZE_HEIGHT, MAZE_WIDTH};
use tilt_maze::level::{Level, SaveData, generate_level, restore_level};
use tilt_maze::render::RecordingSink;
use tilt_maze::sim::TiltInput;
use tilt_maze::transition::{
    Animation, GrowingQuad, LevelFinishAnimator, TileCover, TileGrid, TransitionDirection,
};
use tilt_maze::{LevelTable, MazeError, RandomSource, Result};

const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 120;
/// Frames between tilt changes
const TILT_HOLD: u32 = 45;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => Some(
            arg.parse::<u64>()
                .map_err(|_| MazeError::InvalidConfig {
                    reason: format!("seed '{arg}' is not a number"),
                })?,
        ),
        None => None,
    };
    let table = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path).map_err(|e| MazeError::InvalidConfig {
                reason: format!("cannot read {path}: {e}"),
            })?;
            LevelTable::from_json(&json)?
        }
        None => LevelTable::default(),
    };
    log::info!("Tilt Maze (headless) starting with {} levels", table.len());

    let mut control = source(seed, u64::MAX)?;
    for index in 0..table.len() {
        let config = table.get(index)?;
        let mut level = generate_level(config, MAZE_WIDTH, MAZE_HEIGHT, source(seed, index as u64)?)?;
        log::info!("Level {} '{}':\n{}", index, level.name(), level.core().grid());

        let mut sink = RecordingSink::new();
        let finished = play(level.as_mut(), &mut sink, &mut control);

        // Snapshot through JSON, as a persistence layer would
        let save = level.save_data();
        let json = serde_json::to_string(&save)?;
        let decoded: SaveData = serde_json::from_str(&json)?;
        let restored = restore_level(config, MAZE_WIDTH, MAZE_HEIGHT, &decoded)?;
        log::info!(
            "Saved {} bytes; restored '{}' with start at {:?}",
            json.len(),
            restored.name(),
            restored.core().grid().start()
        );

        if finished {
            run_transition(index, &mut sink, &mut control);
        }
        log::info!(
            "Level {} done: finished={} draw updates={}",
            index,
            finished,
            sink.updates
        );
    }
    Ok(())
}

fn source(seed: Option<u64>, stream: u64) -> Result<RandomSource> {
    match seed {
        Some(seed) => Ok(RandomSource::seeded(seed ^ stream)),
        None => RandomSource::from_os(),
    }
}

/// Roll the ball around with a tilt that changes direction now and then
fn play(level: &mut dyn Level, sink: &mut RecordingSink, control: &mut RandomSource) -> bool {
    const TILTS: [(f32, f32); 4] = [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];
    let mut tilt = TiltInput::default();
    level.update_draw_objects(sink);
    for frame in 0..MAX_FRAMES {
        if frame % TILT_HOLD == 0 {
            let (x, y) = TILTS[control.uniform_index(TILTS.len())];
            tilt = TiltInput::new(x * 2.0, y * 2.0, -9.8);
        }
        level.update_data(tilt, FRAME_DT);
        if level.check_finish_condition(FRAME_DT) {
            log::info!("'{}' finished after {} frames", level.name(), frame + 1);
            return true;
        }
        level.update_draw_objects(sink);
    }
    log::info!(
        "'{}' not finished, ball in cell {:?}",
        level.name(),
        level.core().ball().cell()
    );
    false
}

/// Alternate between the two finish transitions, driven by simulated time
fn run_transition(index: usize, sink: &mut RecordingSink, control: &mut RandomSource) {
    let animation = if index % 2 == 0 {
        Animation::Quad(GrowingQuad::for_level(
            glam::Vec3::new(0.0, 0.0, 0.5),
            MAZE_WIDTH.max(MAZE_HEIGHT),
            TransitionDirection::Finish,
        ))
    } else {
        let grid = TileGrid {
            rows: 6,
            columns: 4,
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
            z: 0.5,
        };
        let rng = RandomSource::seeded(control.uniform_index(1 << 16) as u64);
        Animation::Tiles(TileCover::cover(grid, grid.slot_count(), rng))
    };
    let mut animator = LevelFinishAnimator::new(animation, "transition");
    let mut now = Duration::ZERO;
    let mut frames = 0;
    while !animator.is_done() {
        animator.update(now, sink);
        now += Duration::from_secs_f32(FRAME_DT);
        frames += 1;
    }
    log::info!("Transition finished after {} frames", frames);
}
