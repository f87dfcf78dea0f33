//! Uniform random draws for generators and object placement
//!
//! A `RandomSource` is owned by whoever needs it (generator, placement routine,
//! tile animator) and threaded through explicitly. There is no global RNG state.
//! Calls are expected from the single simulation thread, so no locking is done.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{MazeError, Result};

#[derive(Debug, Clone)]
enum Source {
    Pcg(Pcg32),
    /// Replays recorded 32-bit draws, cycling when exhausted
    Sequence { values: Vec<u32>, cursor: usize },
}

/// Uniform integer and float generator
#[derive(Debug, Clone)]
pub struct RandomSource {
    source: Source,
}

impl RandomSource {
    /// Seed from the operating system's secure entropy source
    pub fn from_os() -> Result<Self> {
        let rng = Pcg32::try_from_os_rng().map_err(|err| MazeError::Entropy(err.to_string()))?;
        Ok(Self {
            source: Source::Pcg(rng),
        })
    }

    /// Deterministic source for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            source: Source::Pcg(Pcg32::seed_from_u64(seed)),
        }
    }

    /// Replay a fixed sequence of raw draws (an empty sequence behaves as all zeros)
    pub fn from_sequence(values: Vec<u32>) -> Self {
        Self {
            source: Source::Sequence { values, cursor: 0 },
        }
    }

    fn next_raw(values: &[u32], cursor: &mut usize) -> u32 {
        if values.is_empty() {
            return 0;
        }
        let value = values[*cursor % values.len()];
        *cursor = (*cursor + 1) % values.len();
        value
    }

    /// Uniform integer in `0..upper`. `upper` must be non-zero.
    pub fn uniform_index(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0, "uniform_index called with empty range");
        if upper <= 1 {
            return 0;
        }
        match &mut self.source {
            Source::Pcg(rng) => rng.random_range(0..upper),
            Source::Sequence { values, cursor } => {
                Self::next_raw(values, cursor) as usize % upper
            }
        }
    }

    /// Uniform float in `[low, high)`; returns `low` for an empty range
    pub fn uniform_float(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        let unit = match &mut self.source {
            Source::Pcg(rng) => rng.random::<f32>(),
            Source::Sequence { values, cursor } => {
                // 24 bits of mantissa keeps the result strictly below 1.0
                (Self::next_raw(values, cursor) >> 8) as f32 / (1u32 << 24) as f32
            }
        };
        low + unit * (high - low)
    }

    /// Fisher-Yates shuffle driven by `uniform_index`
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.uniform_index(i + 1);
            items.swap(i, j);
        }
    }
}
