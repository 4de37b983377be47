use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::*;
pub use campaign::*;
pub use catalog::*;
pub use random::*;
pub use seed::*;

mod campaign;
mod catalog;
mod random;
mod seed;

/// Puzzle difficulty, always within `MIN..=MAX`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub const fn new(level: u8) -> Self {
        let level = if level < Self::MIN {
            Self::MIN
        } else if level > Self::MAX {
            Self::MAX
        } else {
            level
        };
        Self(level)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn piece_count(self) -> usize {
        let count = 2 + self.0 as usize;
        if count < 6 { count } else { 6 }
    }

    pub const fn template_count(self) -> usize {
        let count = 4 + self.0 as usize;
        if count < 10 { count } else { 10 }
    }

    /// Easy levels repaint piece cells with primaries, giving multi-colored pieces.
    pub const fn simplified_colors(self) -> bool {
        self.0 <= 2
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new(Self::MIN)
    }
}

impl From<u8> for Difficulty {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.0
    }
}

/// Everything needed to start a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub board: Board,
    pub target: Board,
    pub pieces: Vec<Piece>,
    pub difficulty: Difficulty,
    pub seed: String,
}

impl Level {
    pub fn new(
        target: Board,
        pieces: Vec<Piece>,
        difficulty: Difficulty,
        seed: impl Into<String>,
    ) -> Self {
        Self {
            board: Board::empty(),
            target,
            pieces,
            difficulty,
            seed: seed.into(),
        }
    }
}

/// Hand-authored level used when synthesis gives up: three red cells and the matching bar.
pub fn fallback_level() -> Level {
    let bar = Piece::new(PieceId(0), Shape::parse("RRR").expect("fallback pattern is well-formed"));
    let target = Board::empty()
        .place(&bar, (1, 2))
        .expect("fallback bar fits the board");
    Level::new(target, Vec::from([bar]), Difficulty::new(Difficulty::MIN), "fallback")
}

pub trait LevelGenerator {
    fn generate(self, difficulty: Difficulty) -> Level;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Packing attempts before falling back.
    pub max_attempts: u32,
    /// Random orientation and position draws per piece within one attempt.
    pub placement_retries: u32,
    /// Bounds for the solver run that proves each candidate.
    pub verify_limits: SolverLimits,
}

impl GeneratorConfig {
    pub fn new(max_attempts: u32, placement_retries: u32, verify_limits: SolverLimits) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            placement_retries: placement_retries.max(1),
            verify_limits,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(20, 100, SolverLimits::new(20, 3000))
    }
}

/// Resolves seeds to levels: campaign seeds load authored levels, everything else is synthesized.
#[derive(Clone, Debug, Default)]
pub struct PuzzleGenerator<C = BuiltinCampaign> {
    campaign: C,
    config: GeneratorConfig,
}

impl<C: Campaign> PuzzleGenerator<C> {
    pub fn new(campaign: C, config: GeneratorConfig) -> Self {
        Self { campaign, config }
    }

    pub fn campaign(&self) -> &C {
        &self.campaign
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Builds a level; without a seed one is drawn from the clock.
    pub fn generate(&self, difficulty: Difficulty, seed: Option<LevelSeed>) -> Level {
        let seed = seed.unwrap_or_else(|| LevelSeed::Free(entropy()));

        if let Some(n) = seed.campaign_index() {
            if let Some(level) = self.campaign.level(n) {
                log::debug!("Loading campaign level {n}");
                return level;
            }
            log::debug!(
                "Campaign has {} levels, synthesizing level {n} instead",
                self.campaign.total_levels()
            );
        }

        let mut level =
            RandomLevelGenerator::new(seed.rng_seed(), self.config).generate(difficulty);
        if level.seed != FALLBACK_SEED {
            level.seed = seed.to_string();
        }
        level
    }

    /// Level for campaign number `n`, synthesized when the catalog has no such level.
    pub fn campaign_level(&self, n: u32, difficulty: Difficulty) -> Level {
        self.generate(difficulty, Some(LevelSeed::Campaign(n.max(1))))
    }
}

pub(crate) const FALLBACK_SEED: &str = "fallback";

fn entropy() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
