#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use color::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use hint::*;
pub use piece::*;
pub use solver::*;
pub use stats::*;
pub use types::*;

mod board;
mod color;
mod engine;
mod error;
mod generator;
mod hint;
mod piece;
mod solver;
mod stats;
mod types;

/// Scoring and hint budget applied by a [`GameSession`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRules {
    pub max_hints: u8,
    pub initial_score: u32,
    pub placement_cost: u32,
    pub replace_cost: u32,
    pub hint_cost: u32,
    pub time_bonus_cap: u32,
    pub hint_penalty: u32,
}

impl SessionRules {
    pub const fn new_unchecked(max_hints: u8, initial_score: u32) -> Self {
        Self {
            max_hints,
            initial_score,
            placement_cost: 10,
            replace_cost: 5,
            hint_cost: 100,
            time_bonus_cap: 500,
            hint_penalty: 100,
        }
    }

    pub fn new(max_hints: u8, initial_score: u32) -> Self {
        let max_hints = max_hints.min(9);
        Self::new_unchecked(max_hints, initial_score)
    }

    /// Score bonus for finishing after `elapsed_secs`, never below zero.
    pub fn time_bonus(&self, elapsed_secs: u64) -> u32 {
        let elapsed = u32::try_from(elapsed_secs).unwrap_or(u32::MAX);
        self.time_bonus_cap.saturating_sub(elapsed)
    }
}

impl Default for SessionRules {
    fn default() -> Self {
        Self::new_unchecked(3, 1000)
    }
}
