use alloc::vec::Vec;
use core::time::Duration;
use hashbrown::HashSet;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

/// Pieces are tracked in a `u64` bitmask.
pub const MAX_SOLVER_PIECES: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverLimits {
    pub max_depth: usize,
    pub timeout_ms: u64,
}

impl SolverLimits {
    pub const fn new(max_depth: usize, timeout_ms: u64) -> Self {
        Self {
            max_depth,
            timeout_ms,
        }
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self::new(20, 5000)
    }
}

/// One placement of a witness sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionStep {
    pub piece: PieceId,
    pub position: Coord2,
    pub orientation: Orientation,
}

/// Why a search stopped before reaching a verdict.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchAbort {
    Deadline,
    DepthLimit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The pieces reproduce the target; the witness places them in order.
    Solvable(Vec<SolutionStep>),
    /// Every arrangement was explored and none matches.
    Unsolvable,
    /// The search was cut short. This says nothing about solvability.
    Unproven(SearchAbort),
}

impl Verdict {
    pub const fn is_solvable(&self) -> bool {
        matches!(self, Self::Solvable(_))
    }

    pub const fn is_unsolvable(&self) -> bool {
        matches!(self, Self::Unsolvable)
    }

    pub fn witness(&self) -> Option<&[SolutionStep]> {
        match self {
            Self::Solvable(steps) => Some(steps),
            Self::Unsolvable | Self::Unproven(_) => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub nodes: u64,
    pub pruned: u64,
    pub memo_hits: u64,
}

/// Decides whether `pieces` can exactly reproduce the shades of `target`.
pub fn is_solvable(target: &Board, pieces: &[Piece], limits: SolverLimits) -> Verdict {
    LevelSolver::new(target, limits).solve(pieces)
}

/// Distinct footprints of one piece, each with the first orientation producing it.
#[derive(Clone, Debug)]
struct PieceOptions {
    id: PieceId,
    cell_count: usize,
    footprints: Vec<(Orientation, Shape)>,
}

impl PieceOptions {
    fn new(piece: &Piece) -> Self {
        let mut footprints: Vec<(Orientation, Shape)> = Vec::with_capacity(Orientation::ALL.len());
        for orientation in Orientation::ALL {
            let footprint = piece.shape().transformed(orientation);
            if footprints.iter().all(|(_, seen)| *seen != footprint) {
                footprints.push((orientation, footprint));
            }
        }
        Self {
            id: piece.id,
            cell_count: piece.cell_count(),
            footprints,
        }
    }
}

enum Search {
    Found,
    Exhausted,
    Aborted(SearchAbort),
}

/// Depth-first backtracking over piece × orientation × position.
///
/// Board states already proven dead (for a given set of remaining pieces) are remembered, so
/// permutations of the same placements are explored once. States abandoned because of a
/// bound are never remembered.
pub struct LevelSolver<'t> {
    target: &'t Board,
    limits: SolverLimits,
    rng: Option<SmallRng>,
    deadline: Option<Instant>,
    dead_states: HashSet<(Board, u64)>,
    path: Vec<SolutionStep>,
    stats: SolverStats,
}

impl<'t> LevelSolver<'t> {
    pub fn new(target: &'t Board, limits: SolverLimits) -> Self {
        Self {
            target,
            limits,
            rng: None,
            deadline: None,
            dead_states: HashSet::new(),
            path: Vec::new(),
            stats: SolverStats::default(),
        }
    }

    /// Explores branches in a random order driven by `rng`.
    pub fn with_rng(mut self, rng: SmallRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    pub fn solve(&mut self, pieces: &[Piece]) -> Verdict {
        if pieces.len() > MAX_SOLVER_PIECES {
            log::warn!(
                "Refusing to search {} pieces, at most {} are supported",
                pieces.len(),
                MAX_SOLVER_PIECES
            );
            return Verdict::Unproven(SearchAbort::DepthLimit);
        }

        self.deadline = Instant::now().checked_add(self.limits.timeout());
        self.dead_states.clear();
        self.path.clear();
        self.stats = SolverStats::default();

        let options: Vec<PieceOptions> = pieces.iter().map(PieceOptions::new).collect();
        let remaining = if pieces.len() == MAX_SOLVER_PIECES {
            u64::MAX
        } else {
            (1u64 << pieces.len()) - 1
        };

        let verdict = match self.search(&Board::empty(), &options, remaining) {
            Search::Found => Verdict::Solvable(core::mem::take(&mut self.path)),
            Search::Exhausted => Verdict::Unsolvable,
            Search::Aborted(reason) => Verdict::Unproven(reason),
        };
        log::debug!(
            "Solver finished with {:?} after {} nodes ({} pruned, {} memo hits)",
            verdict,
            self.stats.nodes,
            self.stats.pruned,
            self.stats.memo_hits
        );
        verdict
    }

    fn search(&mut self, board: &Board, options: &[PieceOptions], remaining: u64) -> Search {
        self.stats.nodes += 1;

        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Search::Aborted(SearchAbort::Deadline);
        }
        if self.path.len() > self.limits.max_depth {
            return Search::Aborted(SearchAbort::DepthLimit);
        }

        if remaining == 0 {
            return if board.matches(self.target) {
                Search::Found
            } else {
                Search::Exhausted
            };
        }

        let state = (board.clone(), remaining);
        if self.dead_states.contains(&state) {
            self.stats.memo_hits += 1;
            return Search::Exhausted;
        }

        let available: usize = iter_bits(remaining).map(|index| options[index].cell_count).sum();
        if board.unfilled_count(self.target) > available {
            self.stats.pruned += 1;
            self.dead_states.insert(state);
            return Search::Exhausted;
        }

        let mut order: Vec<usize> = iter_bits(remaining).collect();
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }

        for index in order {
            let piece = &options[index];
            for (orientation, footprint) in &piece.footprints {
                for position in CoordIter::board() {
                    if !self.within_target(footprint, position) {
                        continue;
                    }
                    let Ok(next) = board.place_shape(footprint, position) else {
                        continue;
                    };

                    log::trace!("Try {} at {:?} as {:?}", piece.id, position, orientation);
                    self.path.push(SolutionStep {
                        piece: piece.id,
                        position,
                        orientation: *orientation,
                    });
                    match self.search(&next, options, remaining & !(1 << index)) {
                        Search::Found => return Search::Found,
                        Search::Exhausted => {}
                        aborted @ Search::Aborted(_) => return aborted,
                    }
                    self.path.pop();
                }
            }
        }

        self.dead_states.insert(state);
        Search::Exhausted
    }

    /// Every covered cell must be filled in the target; layers are never removed, so covering
    /// a cell the target leaves empty can not lead to a match.
    fn within_target(&self, footprint: &Shape, position: Coord2) -> bool {
        let bounds = self.target.size();
        footprint.occupied().all(|(offset, _)| {
            apply_offset(position, offset, bounds)
                .is_some_and(|coords| !self.target[coords].is_empty())
        })
    }
}

fn iter_bits(mask: u64) -> impl Iterator<Item = usize> {
    (0..MAX_SOLVER_PIECES).filter(move |&index| mask & (1 << index) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn piece(id: u16, pattern: &str) -> Piece {
        Piece::new(PieceId(id), Shape::parse(pattern).unwrap())
    }

    fn target_from(placements: &[PlacedPiece]) -> Board {
        Board::from_placements(placements).unwrap()
    }

    fn replay(witness: &[SolutionStep], pieces: &[Piece]) -> Board {
        let placements: Vec<PlacedPiece> = witness
            .iter()
            .map(|step| {
                let piece = pieces.iter().find(|piece| piece.id == step.piece).unwrap();
                piece.clone().with_orientation(step.orientation).place_at(step.position)
            })
            .collect();
        Board::from_placements(&placements).unwrap()
    }

    #[test]
    fn single_piece_target_is_solvable() {
        let pieces = vec![piece(0, "R")];
        let target = target_from(&[pieces[0].clone().place_at((2, 2))]);

        let verdict = is_solvable(&target, &pieces, SolverLimits::default());

        let witness = verdict.witness().expect("should be solvable");
        assert_eq!(witness, [SolutionStep {
            piece: PieceId(0),
            position: (2, 2),
            orientation: Orientation::IDENTITY,
        }]);
    }

    #[test]
    fn packed_board_is_solvable_from_any_presented_orientation() {
        let packed = vec![
            piece(0, "R./R./RR")
                .with_orientation(Orientation::new(Rotation::R90, false))
                .place_at((0, 0)),
            piece(1, "YY/Y.").place_at((0, 0)),
            piece(2, "BBB/B..")
                .with_orientation(Orientation::new(Rotation::R180, true))
                .place_at((2, 3)),
            piece(3, "MM./.MM").place_at((3, 1)),
        ];
        let target = target_from(&packed);
        let pool: Vec<Piece> = packed
            .iter()
            .map(|placed| placed.piece.clone().with_orientation(Orientation::IDENTITY))
            .collect();

        let verdict = is_solvable(&target, &pool, SolverLimits::default());

        let witness = verdict.witness().expect("should be solvable");
        assert_eq!(witness.len(), pool.len());
        assert!(replay(witness, &pool).matches(&target));
    }

    #[test]
    fn missing_color_is_unsolvable() {
        let target = target_from(&[piece(0, "R").place_at((2, 2))]);
        let pieces = vec![piece(1, "B"), piece(2, "B")];

        assert_eq!(is_solvable(&target, &pieces, SolverLimits::default()), Verdict::Unsolvable);
    }

    #[test]
    fn too_few_cells_is_pruned() {
        let target = target_from(&[piece(0, "RRRR").place_at((0, 0))]);
        let pieces = vec![piece(1, "RR")];
        let mut solver = LevelSolver::new(&target, SolverLimits::default());

        assert_eq!(solver.solve(&pieces), Verdict::Unsolvable);
        assert_eq!(solver.stats().nodes, 1);
        assert_eq!(solver.stats().pruned, 1);
    }

    #[test]
    fn every_piece_must_be_used() {
        let target = target_from(&[piece(0, "RR").place_at((0, 0))]);
        let tinted = vec![piece(1, "RR"), piece(2, "Y")];
        let doubled = vec![piece(1, "RR"), piece(2, "R")];

        assert_eq!(is_solvable(&target, &tinted, SolverLimits::default()), Verdict::Unsolvable);
        assert!(is_solvable(&target, &doubled, SolverLimits::default()).is_solvable());
    }

    #[test]
    fn blended_target_needs_both_layers() {
        let target = target_from(&[piece(0, "R").place_at((1, 1)), piece(1, "Y").place_at((1, 1))]);

        let orange = vec![piece(2, "O")];
        let layers = vec![piece(3, "Y"), piece(4, "R")];

        assert!(is_solvable(&target, &orange, SolverLimits::default()).is_solvable());
        assert!(is_solvable(&target, &layers, SolverLimits::default()).is_solvable());
        assert!(is_solvable(&target, &[piece(5, "R")], SolverLimits::default()).is_unsolvable());
    }

    #[test]
    fn zero_timeout_is_unproven_not_unsolvable() {
        let target = target_from(&[piece(0, "R").place_at((2, 2))]);
        let limits = SolverLimits::new(20, 0);

        assert_eq!(
            is_solvable(&target, &[piece(1, "R")], limits),
            Verdict::Unproven(SearchAbort::Deadline)
        );
    }

    #[test]
    fn depth_ceiling_is_unproven() {
        let target = target_from(&[piece(0, "RRR").place_at((0, 0))]);
        let pieces = vec![piece(1, "R"), piece(2, "R"), piece(3, "R")];
        let limits = SolverLimits::new(1, 5000);

        assert_eq!(
            is_solvable(&target, &pieces, limits),
            Verdict::Unproven(SearchAbort::DepthLimit)
        );
    }

    #[test]
    fn shuffled_order_keeps_verdict() {
        let target = target_from(&[
            piece(0, "BB/B.").place_at((1, 1)),
            piece(1, "YY/Y.").place_at((1, 1)),
            piece(2, "B/B/B").place_at((0, 1)),
        ]);
        let pieces = vec![piece(0, "BB/B."), piece(1, "YY/Y."), piece(2, "B/B/B")];
        let wrong = vec![piece(0, "BB/B."), piece(1, "BB/B."), piece(2, "B/B/B")];

        for seed in 0..8 {
            let rng = SmallRng::seed_from_u64(seed);
            let mut solver =
                LevelSolver::new(&target, SolverLimits::default()).with_rng(rng.clone());
            assert!(solver.solve(&pieces).is_solvable());

            let mut solver = LevelSolver::new(&target, SolverLimits::default()).with_rng(rng);
            assert!(solver.solve(&wrong).is_unsolvable());
        }
    }
}
