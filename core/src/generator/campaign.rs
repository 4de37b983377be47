use alloc::string::ToString;
use alloc::vec::Vec;

use super::*;

/// Source of pre-authored, pre-verified levels, numbered from 1.
pub trait Campaign {
    /// Owned copy of level `n`, or `None` past the end of the catalog.
    fn level(&self, n: u32) -> Option<Level>;

    fn total_levels(&self) -> u32;
}

/// Piece patterns and where each sits in the solution.
type Authored = &'static [(&'static str, Coord2)];

const TUTORIAL: [(Authored, u8); 3] = [
    // One red corner.
    (&[("RR/R.", (2, 1))], 1),
    // Red over yellow blends into orange.
    (&[("RR/R.", (1, 1)), ("YY/Y.", (1, 1))], 1),
    // A blue bar next to a blue corner turned green.
    (&[("B/B/B", (1, 1)), ("BB/B.", (2, 1)), ("YY/Y.", (2, 1))], 2),
];

/// Tutorial levels built into the engine.
#[derive(Clone, Debug, Default)]
pub struct BuiltinCampaign;

impl Campaign for BuiltinCampaign {
    fn level(&self, n: u32) -> Option<Level> {
        let index = usize::try_from(n.checked_sub(1)?).ok()?;
        let &(authored, difficulty) = TUTORIAL.get(index)?;
        Some(build(authored, Difficulty::new(difficulty), n))
    }

    fn total_levels(&self) -> u32 {
        TUTORIAL.len() as u32
    }
}

/// Derives the target by actually placing the authored solution.
fn build(authored: Authored, difficulty: Difficulty, n: u32) -> Level {
    let solution: Vec<PlacedPiece> = authored
        .iter()
        .enumerate()
        .map(|(id, &(pattern, position))| {
            let shape = Shape::parse(pattern).expect("campaign patterns are well-formed");
            Piece::new(PieceId(id as u16), shape).place_at(position)
        })
        .collect();
    let target = Board::from_placements(&solution).expect("campaign solutions are legal");
    let pieces = solution.into_iter().map(PlacedPiece::into_piece).collect();
    Level::new(target, pieces, difficulty, LevelSeed::Campaign(n).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_level_is_solvable() {
        let campaign = BuiltinCampaign;
        for n in 1..=campaign.total_levels() {
            let level = campaign.level(n).unwrap();

            assert!(level.board.is_blank());
            assert_eq!(level.seed.parse::<LevelSeed>(), Ok(LevelSeed::Campaign(n)));
            assert!(
                is_solvable(&level.target, &level.pieces, SolverLimits::default()).is_solvable(),
                "level {n}"
            );
        }
    }

    #[test]
    fn out_of_range_levels_are_missing() {
        let campaign = BuiltinCampaign;

        assert!(campaign.level(0).is_none());
        assert!(campaign.level(campaign.total_levels() + 1).is_none());
    }

    #[test]
    fn tutorial_targets() {
        let campaign = BuiltinCampaign;

        let first = campaign.level(1).unwrap();
        assert_eq!(first.target.filled_count(), 3);
        assert_eq!(first.target.shade_at((3, 1)), Shade::Solid(Color::Red));

        let second = campaign.level(2).unwrap();
        assert_eq!(second.target.shade_at((1, 2)), Shade::Solid(Color::Orange));
        assert_eq!(second.pieces.len(), 2);

        let third = campaign.level(3).unwrap();
        assert_eq!(third.target.filled_count(), 6);
        assert_eq!(third.target.shade_at((1, 3)), Shade::Solid(Color::Blue));
        assert_eq!(third.target.shade_at((2, 2)), Shade::Solid(Color::Green));
    }

    #[test]
    fn levels_are_independent_copies() {
        let campaign = BuiltinCampaign;
        let mut level = campaign.level(1).unwrap();
        level.pieces.clear();

        assert_eq!(campaign.level(1).unwrap().pieces.len(), 1);
    }
}
