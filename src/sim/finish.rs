//! Level completion rules
//!
//! The rule is a value held by the level, not an override. Each tick the evaluator
//! may move things (reset the ball on a hazard, trail collected items behind it)
//! before deciding whether the level is done. Finishing is one-way.

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use crate::consts::{NEGLIGIBLE_SPEED, NOMINAL_TRAVERSAL_SECS};
use crate::maze::{CellIndex, Grid, MazeGeometry};
use crate::{approach, lift, planar_distance};

/// An item the ball picks up and then drags along behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub pos: Vec3,
    pub collected: bool,
    /// Position in the trailing queue (1 = right behind the ball), set on collection
    #[serde(skip)]
    pub slot: Option<usize>,
}

impl Collectible {
    pub fn new(pos: Vec3) -> Self {
        Self {
            pos,
            collected: false,
            slot: None,
        }
    }
}

/// Collect-items bookkeeping: the items and the ball's recent cells
#[derive(Debug, Clone, PartialEq)]
pub struct CollectState {
    items: Vec<Collectible>,
    /// Most recent first, at most `items.len() + 1` entries
    history: VecDeque<CellIndex>,
}

impl CollectState {
    pub fn new(positions: Vec<Vec3>, ball_cell: CellIndex) -> Self {
        Self {
            items: positions.into_iter().map(Collectible::new).collect(),
            history: VecDeque::from([ball_cell]),
        }
    }

    /// Rebuild from saved flags. Trailing slots are reassigned in item order.
    pub fn restore(positions: Vec<Vec3>, collected: &[bool], history: Vec<CellIndex>) -> Self {
        let mut items: Vec<Collectible> = positions.into_iter().map(Collectible::new).collect();
        let mut slot = 0;
        for (item, &done) in items.iter_mut().zip(collected) {
            if done {
                slot += 1;
                item.collected = true;
                item.slot = Some(slot);
            }
        }
        let mut state = Self {
            history: history.into_iter().collect(),
            items,
        };
        state.history.truncate(state.capacity());
        state
    }

    pub fn items(&self) -> &[Collectible] {
        &self.items
    }

    pub fn history(&self) -> &VecDeque<CellIndex> {
        &self.history
    }

    pub fn capacity(&self) -> usize {
        self.items.len() + 1
    }

    pub fn collected_count(&self) -> usize {
        self.items.iter().filter(|item| item.collected).count()
    }

    pub fn all_collected(&self) -> bool {
        self.items.iter().all(|item| item.collected)
    }

    fn record_cell(&mut self, cell: CellIndex) {
        if self.history.front() != Some(&cell) {
            self.history.push_front(cell);
            self.history.truncate(self.capacity());
        }
    }

    fn pick_up(&mut self, ball: &Ball) {
        let mut next_slot = self.collected_count() + 1;
        for (idx, item) in self.items.iter_mut().enumerate() {
            if !item.collected && planar_distance(ball.pos, item.pos) < ball.radius {
                item.collected = true;
                item.slot = Some(next_slot);
                log::debug!("Collected item {} into slot {}", idx, next_slot);
                next_slot += 1;
            }
        }
    }

    /// Move each collected item toward the cell it trails in.
    ///
    /// Items move at the ball's speed, but never slower than covering the remaining
    /// distance in the nominal traversal time (the only rate when the ball is still).
    fn trail(&mut self, ball: &Ball, geometry: &MazeGeometry, dt: f32) {
        let ball_speed = ball.vel.truncate().length();
        for item in self.items.iter_mut().filter(|item| item.collected) {
            let Some(slot) = item.slot else { continue };
            let Some(&(row, col)) = self.history.get(slot).or(self.history.back()) else {
                continue;
            };
            let target = lift(geometry.cell_center(row, col), item.pos.z);
            let remaining = item.pos.distance(target);
            let nominal = remaining / NOMINAL_TRAVERSAL_SECS;
            let speed = if ball_speed < NEGLIGIBLE_SPEED {
                nominal
            } else {
                ball_speed.max(nominal)
            };
            item.pos = approach(item.pos, target, speed * dt);
        }
    }
}

/// Per-variant finish predicate
#[derive(Debug, Clone, PartialEq)]
pub enum FinishRule {
    /// Ball within one radius of the end cell's centre
    ReachEnd,
    /// Touching any hazard sends the ball back to the start; reaching the end finishes
    AvoidHazards { hazards: Vec<Vec3> },
    /// Gather every item, then reach the end
    CollectItems(CollectState),
}

impl FinishRule {
    /// Apply the rule for one tick; true when the finish condition currently holds
    pub fn evaluate(&mut self, ball: &mut Ball, grid: &Grid, geometry: &MazeGeometry, dt: f32) -> bool {
        match self {
            FinishRule::ReachEnd => at_end(ball, grid, geometry),
            FinishRule::AvoidHazards { hazards } => {
                if hazards
                    .iter()
                    .any(|hazard| planar_distance(ball.pos, *hazard) < ball.radius)
                {
                    let (row, col) = grid.start();
                    log::debug!("Hazard hit at {:?}, back to start {:?}", ball.cell(), (row, col));
                    ball.place_at(lift(geometry.cell_center(row, col), ball.pos.z), (row, col));
                    return false;
                }
                at_end(ball, grid, geometry)
            }
            FinishRule::CollectItems(state) => {
                state.record_cell(ball.cell());
                state.pick_up(ball);
                state.trail(ball, geometry, dt);
                state.all_collected() && at_end(ball, grid, geometry)
            }
        }
    }
}

fn at_end(ball: &Ball, grid: &Grid, geometry: &MazeGeometry) -> bool {
    let (row, col) = grid.end();
    ball.pos.truncate().distance(geometry.cell_center(row, col)) < ball.radius
}

/// Latches the first time the rule holds
#[derive(Debug, Clone, PartialEq)]
pub struct FinishConditionEvaluator {
    rule: FinishRule,
    finished: bool,
}

impl FinishConditionEvaluator {
    pub fn new(rule: FinishRule) -> Self {
        Self {
            rule,
            finished: false,
        }
    }

    pub fn rule(&self) -> &FinishRule {
        &self.rule
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True only on the tick the level becomes finished; a finished level is
    /// no longer evaluated.
    pub fn check(&mut self, ball: &mut Ball, grid: &Grid, geometry: &MazeGeometry, dt: f32) -> bool {
        if self.finished {
            return false;
        }
        self.finished = self.rule.evaluate(ball, grid, geometry, dt);
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Grid, MazeGeometry) {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.set_start(0, 0);
        grid.set_end(3, 3);
        let geom = MazeGeometry::new(2.0, 2.0, 4, 0.0).unwrap();
        (grid, geom)
    }

    #[test]
    fn test_reach_end() {
        let (grid, geom) = setup();
        let mut eval = FinishConditionEvaluator::new(FinishRule::ReachEnd);
        let mut ball = Ball::new(geom.cell_center(3, 2).extend(0.0), (3, 2), 0.1);
        assert!(!eval.check(&mut ball, &grid, &geom, 0.016));
        ball.place_at(geom.cell_center(3, 3).extend(0.0), (3, 3));
        assert!(eval.check(&mut ball, &grid, &geom, 0.016));
        assert!(eval.is_finished());
        assert!(!eval.check(&mut ball, &grid, &geom, 0.016));
    }

    #[test]
    fn test_hazard_resets_to_start_keeping_velocity() {
        let (grid, geom) = setup();
        let hazard = Vec3::new(0.3, 0.3, 0.0);
        let mut eval = FinishConditionEvaluator::new(FinishRule::AvoidHazards {
            hazards: vec![hazard],
        });
        let mut ball = Ball::new(Vec3::new(0.32, 0.29, 0.05), (1, 2), 0.1);
        ball.vel = Vec3::new(0.4, -0.2, 0.0);

        assert!(!eval.check(&mut ball, &grid, &geom, 0.016));
        assert_eq!(ball.cell(), (0, 0));
        let start = geom.cell_center(0, 0);
        assert_eq!(ball.pos, Vec3::new(start.x, start.y, 0.05));
        assert_eq!(ball.vel, Vec3::new(0.4, -0.2, 0.0));
        assert!(!eval.is_finished());
    }

    #[test]
    fn test_hazard_mode_finishes_at_end() {
        let (grid, geom) = setup();
        let mut eval = FinishConditionEvaluator::new(FinishRule::AvoidHazards {
            hazards: vec![Vec3::new(0.3, 0.3, 0.0)],
        });
        let mut ball = Ball::new(geom.cell_center(3, 3).extend(0.0), (3, 3), 0.1);
        assert!(eval.check(&mut ball, &grid, &geom, 0.016));
    }

    #[test]
    fn test_collect_all_then_finish_once() {
        let (grid, geom) = setup();
        let items: Vec<Vec3> = [(0, 3), (2, 0), (1, 2)]
            .iter()
            .map(|&(r, c)| geom.cell_center(r, c).extend(0.0))
            .collect();
        let mut eval = FinishConditionEvaluator::new(FinishRule::CollectItems(CollectState::new(
            items.clone(),
            (0, 0),
        )));
        let mut ball = Ball::new(geom.cell_center(0, 0).extend(0.0), (0, 0), 0.1);

        // Reaching the end early does nothing
        ball.place_at(geom.cell_center(3, 3).extend(0.0), (3, 3));
        assert!(!eval.check(&mut ball, &grid, &geom, 0.016));

        for item in &items {
            let cell = geom.cell_at(item.truncate());
            ball.place_at(*item, cell);
            assert!(!eval.check(&mut ball, &grid, &geom, 0.016));
        }
        let FinishRule::CollectItems(state) = eval.rule() else {
            panic!("rule changed")
        };
        assert_eq!(state.collected_count(), 3);
        assert!(state.items().iter().all(|item| item.collected));

        ball.place_at(geom.cell_center(3, 3).extend(0.0), (3, 3));
        assert!(eval.check(&mut ball, &grid, &geom, 0.016));
        assert!(!eval.check(&mut ball, &grid, &geom, 0.016));
    }

    #[test]
    fn test_history_bounded() {
        let mut state = CollectState::new(vec![Vec3::ZERO; 2], (0, 0));
        for col in 1..6 {
            state.record_cell((0, col));
        }
        assert_eq!(state.history().len(), 3);
        assert_eq!(state.history().front(), Some(&(0, 5)));
        state.record_cell((0, 5));
        assert_eq!(state.history().len(), 3);
    }

    #[test]
    fn test_collected_item_trails_ball() {
        let (grid, geom) = setup();
        let item_pos = geom.cell_center(0, 1).extend(0.0);
        let mut rule = FinishRule::CollectItems(CollectState::new(vec![item_pos], (0, 0)));
        let mut ball = Ball::new(geom.cell_center(0, 0).extend(0.0), (0, 0), 0.1);

        // Roll into the item's cell and pick it up
        ball.place_at(item_pos, (0, 1));
        rule.evaluate(&mut ball, &grid, &geom, 0.016);
        // Move on at speed; the item follows one cell behind
        ball.place_at(geom.cell_center(1, 1).extend(0.0), (1, 1));
        ball.vel = Vec3::new(0.0, -1.0, 0.0);
        for _ in 0..120 {
            rule.evaluate(&mut ball, &grid, &geom, 1.0 / 60.0);
        }
        let FinishRule::CollectItems(state) = &rule else {
            unreachable!()
        };
        // History holds (1,1) then (0,1); slot 1 is the previous cell
        let target = geom.cell_center(0, 1);
        assert!((state.items()[0].pos.truncate() - target).length() < 1e-4);
    }

    #[test]
    fn test_still_ball_uses_nominal_traversal() {
        let geom = MazeGeometry::new(2.0, 2.0, 4, 0.0).unwrap();
        let start = geom.cell_center(0, 0).extend(0.0);
        let mut state = CollectState::restore(vec![start], &[true], vec![(0, 0), (0, 2)]);
        let ball = Ball::new(geom.cell_center(0, 0).extend(0.0), (0, 0), 0.1);
        // Half a nominal second covers half of the remaining distance
        state.trail(&ball, &geom, 0.5);
        let target = geom.cell_center(0, 2);
        let expected = start.truncate().lerp(target, 0.5);
        assert!((state.items()[0].pos.truncate() - expected).length() < 1e-5);
    }

    #[test]
    fn test_restore_assigns_slots_in_order() {
        let state = CollectState::restore(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            &[false, true, true],
            vec![(0, 0); 10],
        );
        assert_eq!(state.items()[0].slot, None);
        assert_eq!(state.items()[1].slot, Some(1));
        assert_eq!(state.items()[2].slot, Some(2));
        assert_eq!(state.history().len(), 4);
    }
}
