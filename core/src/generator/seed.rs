use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::*;

const CAMPAIGN_PREFIX: &str = "level_";

/// Parsed generation seed.
///
/// `level_<n>` selects hand-authored campaign level `n` (1-based). Any other text drives
/// synthesis: a plain decimal number is used as-is, anything else is hashed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LevelSeed {
    Campaign(u32),
    Free(u64),
}

impl LevelSeed {
    /// Seed for the synthesis RNG. Campaign seeds fall back to synthesis seeded by their index.
    pub const fn rng_seed(self) -> u64 {
        match self {
            Self::Campaign(n) => n as u64,
            Self::Free(seed) => seed,
        }
    }

    pub const fn campaign_index(self) -> Option<u32> {
        match self {
            Self::Campaign(n) => Some(n),
            Self::Free(_) => None,
        }
    }
}

impl FromStr for LevelSeed {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(digits) = s.strip_prefix(CAMPAIGN_PREFIX) {
            return parse_campaign_index(digits).map(Self::Campaign);
        }
        if is_plain_decimal(s) {
            if let Ok(seed) = s.parse() {
                return Ok(Self::Free(seed));
            }
        }
        Ok(Self::Free(fnv1a(s.as_bytes())))
    }
}

impl fmt::Display for LevelSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Campaign(n) => write!(f, "{CAMPAIGN_PREFIX}{n}"),
            Self::Free(seed) => write!(f, "{seed}"),
        }
    }
}

impl TryFrom<String> for LevelSeed {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LevelSeed> for String {
    fn from(seed: LevelSeed) -> Self {
        seed.to_string()
    }
}

impl From<u64> for LevelSeed {
    fn from(seed: u64) -> Self {
        Self::Free(seed)
    }
}

fn is_plain_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_campaign_index(digits: &str) -> Result<u32> {
    if !is_plain_decimal(digits) || digits.starts_with('0') {
        return Err(GameError::MalformedSeed);
    }
    digits.parse().map_err(|_| GameError::MalformedSeed)
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET, |hash, &byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_seeds_parse_strictly() {
        assert_eq!("level_1".parse::<LevelSeed>(), Ok(LevelSeed::Campaign(1)));
        assert_eq!("level_42".parse::<LevelSeed>(), Ok(LevelSeed::Campaign(42)));
        assert_eq!("level_4294967295".parse::<LevelSeed>(), Ok(LevelSeed::Campaign(u32::MAX)));

        for malformed in [
            "level_", "level_0", "level_07", "level_+3", "level_-3", "level_3a", "level_ 3",
            "level_4294967296",
        ] {
            assert_eq!(
                malformed.parse::<LevelSeed>(),
                Err(GameError::MalformedSeed),
                "{malformed}"
            );
        }
    }

    #[test]
    fn free_seeds_are_numbers_or_hashes() {
        assert_eq!("12345".parse::<LevelSeed>(), Ok(LevelSeed::Free(12345)));
        assert_eq!("".parse::<LevelSeed>(), Ok(LevelSeed::Free(0xcbf2_9ce4_8422_2325)));
        assert_eq!("a".parse::<LevelSeed>(), Ok(LevelSeed::Free(0xaf63_dc4c_8601_ec8c)));
        assert_eq!("Level_1".parse::<LevelSeed>(), "Level_1".parse());
        assert_ne!("Level_1".parse::<LevelSeed>(), Ok(LevelSeed::Campaign(1)));
        assert!(matches!("99999999999999999999".parse::<LevelSeed>(), Ok(LevelSeed::Free(_))));
    }

    #[test]
    fn display_round_trips() {
        for seed in [LevelSeed::Campaign(3), LevelSeed::Free(7)] {
            assert_eq!(seed.to_string().parse::<LevelSeed>(), Ok(seed));
        }
    }

    #[test]
    fn campaign_falls_back_to_index_seed() {
        assert_eq!(LevelSeed::Campaign(9).rng_seed(), 9);
        assert_eq!(LevelSeed::Free(9).campaign_index(), None);
    }
}
