//! Seeded input source that steers the player without a keyboard.

use maze_chase_core::{Direction, TILE_PIXELS};
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

/// Frames between two direction requests.
const DECISION_INTERVAL: u64 = TILE_PIXELS as u64;

/// Requests a random direction once per tile-length of frames.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
    frame: u64,
}

impl Autopilot {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            frame: 0,
        }
    }

    /// Direction to request on the next frame, if this frame makes a decision.
    pub(crate) fn next_direction(&mut self) -> Option<Direction> {
        let decide = self.frame % DECISION_INTERVAL == 0;
        self.frame += 1;
        if !decide {
            return None;
        }
        let index = self.rng.gen_range(0..Direction::MOVES.len());
        Some(Direction::MOVES[index])
    }
}
