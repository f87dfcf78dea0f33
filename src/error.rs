//! Error types for generation, restore and configuration
//!
//! Every variant is fatal to the operation that raised it. Recovery (for instance
//! regenerating instead of retrying a corrupt restore) belongs to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MazeError {
    #[error("level index {index} outside the registered table of {len} levels")]
    LevelIndexOutOfRange { index: usize, len: usize },

    #[error("invalid level configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("cannot pick start/end cells far enough apart in a {rows}x{columns} maze")]
    UnsatisfiableSeparation { rows: usize, columns: usize },

    #[error("could only place {placed} of {requested} objects with the required spacing")]
    PlacementExhausted { requested: usize, placed: usize },

    #[error("corrupt save data: {reason}")]
    CorruptSave { reason: String },

    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("level table parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl MazeError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        MazeError::CorruptSave {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        MazeError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MazeError>;
