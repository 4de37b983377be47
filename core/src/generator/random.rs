use alloc::string::ToString;
use alloc::vec::Vec;
use rand::prelude::*;

use super::*;

/// Construct-then-verify synthesis: pack random pieces onto an empty board, take the packed
/// board as the target, and keep it only once the solver proves the pool reproduces it.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLevelGenerator {
    seed: u64,
    config: GeneratorConfig,
}

impl RandomLevelGenerator {
    pub fn new(seed: u64, config: GeneratorConfig) -> Self {
        Self { seed, config }
    }

    fn attempt(&self, difficulty: Difficulty, rng: &mut SmallRng) -> Option<Level> {
        let pieces = synthesize_pieces(difficulty, rng);
        if pieces.is_empty() {
            return None;
        }

        let packed = self.pack(&pieces, rng)?;
        let target = Board::from_placements(&packed).ok()?;
        if target.is_blank() {
            log::debug!("Packed board is blank, discarding");
            return None;
        }

        let verify_rng = SmallRng::seed_from_u64(rng.random());
        let verdict = LevelSolver::new(&target, self.config.verify_limits)
            .with_rng(verify_rng)
            .solve(&pieces);
        if !verdict.is_solvable() {
            log::debug!("Candidate rejected by solver: {:?}", verdict);
            return None;
        }

        let pool = packed.into_iter().map(|placed| present(placed, rng)).collect();
        Some(Level::new(target, pool, difficulty, self.seed.to_string()))
    }

    /// Places every piece in a random orientation and position, or gives up on the first
    /// piece that finds no legal spot within the retry budget.
    fn pack(&self, pieces: &[Piece], rng: &mut SmallRng) -> Option<Vec<PlacedPiece>> {
        let mut order: Vec<&Piece> = pieces.iter().collect();
        order.shuffle(rng);

        let mut board = Board::empty();
        let mut placed = Vec::with_capacity(pieces.len());
        for piece in order {
            let found = (0..self.config.placement_retries).find_map(|_| {
                let orientation = *Orientation::ALL.choose(rng)?;
                let piece = piece.clone().with_orientation(orientation);
                let (width, height) = piece.transform().size();
                let x = rng.random_range(0..=BOARD_SIZE.checked_sub(width)?);
                let y = rng.random_range(0..=BOARD_SIZE.checked_sub(height)?);
                let next = board.place(&piece, (x, y)).ok()?;
                Some((next, piece.place_at((x, y))))
            });

            let Some((next, placement)) = found else {
                log::debug!(
                    "No room for {} after {} tries",
                    piece.id,
                    self.config.placement_retries
                );
                return None;
            };
            board = next;
            placed.push(placement);
        }

        placed.sort_by_key(PlacedPiece::id);
        Some(placed)
    }
}

impl LevelGenerator for RandomLevelGenerator {
    fn generate(self, difficulty: Difficulty) -> Level {
        let mut rng = SmallRng::seed_from_u64(self.seed);

        for attempt in 1..=self.config.max_attempts {
            log::debug!("Generating level attempt {}/{}", attempt, self.config.max_attempts);
            if let Some(level) = self.attempt(difficulty, &mut rng) {
                log::debug!(
                    "Generated level with {} pieces covering {} cells",
                    level.pieces.len(),
                    level.target.filled_count()
                );
                return level;
            }
        }

        log::warn!(
            "All {} level generation attempts failed, using fallback level",
            self.config.max_attempts
        );
        fallback_level()
    }
}

/// Returns the piece to the pool in an orientation other than the one it was packed in,
/// preferring one whose footprint differs visibly.
fn present(placed: PlacedPiece, rng: &mut SmallRng) -> Piece {
    let packed = placed.piece.orientation;
    let footprint = placed.piece.transform();

    let mut others: Vec<Orientation> = Orientation::ALL
        .into_iter()
        .filter(|&orientation| orientation != packed)
        .collect();
    others.shuffle(rng);

    let chosen = others
        .iter()
        .copied()
        .find(|&orientation| placed.piece.shape().transformed(orientation) != footprint)
        .or_else(|| others.first().copied())
        .unwrap_or(packed);
    placed.into_piece().with_orientation(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(seed: u64, difficulty: u8) -> Level {
        RandomLevelGenerator::new(seed, GeneratorConfig::default())
            .generate(Difficulty::new(difficulty))
    }

    #[test]
    fn generated_levels_are_solvable() {
        for difficulty in Difficulty::MIN..=Difficulty::MAX {
            let level = generate(u64::from(difficulty) * 17, difficulty);

            assert!(level.board.is_blank());
            assert!(level.target.filled_count() > 0);
            assert!(!level.pieces.is_empty());
            assert!(
                is_solvable(&level.target, &level.pieces, SolverLimits::default()).is_solvable(),
                "difficulty {difficulty}"
            );
        }
    }

    #[test]
    fn pool_ids_are_sequential() {
        let level = generate(3, 3);
        if level.seed == FALLBACK_SEED {
            return;
        }

        assert_eq!(level.pieces.len(), Difficulty::new(3).piece_count());
        for (index, piece) in level.pieces.iter().enumerate() {
            assert_eq!(piece.id, PieceId(index as u16));
        }
    }

    #[test]
    fn generation_is_reproducible() {
        assert_eq!(generate(99, 2), generate(99, 2));
    }

    #[test]
    fn unprovable_candidates_fall_back() {
        let config = GeneratorConfig::new(3, 100, SolverLimits::new(20, 0));
        let level = RandomLevelGenerator::new(1, config).generate(Difficulty::new(2));

        assert_eq!(level, fallback_level());
    }

    #[test]
    fn presented_orientation_differs_from_packing() {
        let mut rng = SmallRng::seed_from_u64(4);
        for pattern in ["RR/RR", "R./R./RR", "GGG", "B"] {
            for orientation in Orientation::ALL {
                let piece = Piece::new(PieceId(0), Shape::parse(pattern).unwrap())
                    .with_orientation(orientation);
                let presented = present(piece.clone().place_at((0, 0)), &mut rng);

                assert_ne!(presented.orientation, orientation);
                assert_eq!(presented.shape(), piece.shape());
            }
        }
    }

    #[test]
    fn asymmetric_pieces_are_presented_with_a_new_footprint() {
        let mut rng = SmallRng::seed_from_u64(8);
        let piece = Piece::new(PieceId(0), Shape::parse("R./R./RR").unwrap());
        let presented = present(piece.clone().place_at((1, 1)), &mut rng);

        assert_ne!(presented.transform(), piece.transform());
    }
}
