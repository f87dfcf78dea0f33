//! Frame-stepped simulation
//!
//! Everything here runs synchronously on the caller's frame:
//! - No internal threads or blocking I/O
//! - Randomness only through an explicitly passed `RandomSource`
//! - No rendering or platform dependencies

pub mod ball;
pub mod finish;
pub mod physics;
pub mod placement;
pub mod tracker;

pub use ball::{Ball, TiltInput};
pub use finish::{CollectState, Collectible, FinishConditionEvaluator, FinishRule};
pub use physics::{BallPhysics, MotionModel};
pub use placement::{pick_object_cells, place_objects};
pub use tracker::CellTracker;
