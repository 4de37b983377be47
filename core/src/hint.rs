use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// Most target cells a reveal hint uncovers.
pub const MAX_REVEALED_CELLS: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    NextPiece,
    Position,
    RevealTarget,
}

impl HintKind {
    pub const CYCLE: [HintKind; 3] = [
        HintKind::NextPiece,
        HintKind::Position,
        HintKind::RevealTarget,
    ];

    /// Kind handed out after `hints_used` hints.
    pub const fn for_turn(hints_used: u8) -> Self {
        Self::CYCLE[hints_used as usize % Self::CYCLE.len()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Hint {
    NextPiece {
        piece: PieceId,
        message: String,
    },
    Position {
        piece: PieceId,
        position: Coord2,
        message: String,
    },
    RevealTarget {
        cells: Vec<Coord2>,
        message: String,
    },
}

impl Hint {
    pub fn kind(&self) -> HintKind {
        match self {
            Self::NextPiece { .. } => HintKind::NextPiece,
            Self::Position { .. } => HintKind::Position,
            Self::RevealTarget { .. } => HintKind::RevealTarget,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NextPiece { message, .. }
            | Self::Position { message, .. }
            | Self::RevealTarget { message, .. } => message,
        }
    }
}

/// Read-only view of the state a hint is computed from.
#[derive(Copy, Clone, Debug)]
pub struct HintInput<'a> {
    pub board: &'a Board,
    pub target: &'a Board,
    pub pool: &'a [Piece],
    pub selected: Option<PieceId>,
    pub hints_used: u8,
}

/// Picks the hint kind from `hints_used` and computes it. Nothing is mutated.
pub fn generate_hint<R: Rng + ?Sized>(input: &HintInput<'_>, rng: &mut R) -> Option<Hint> {
    match HintKind::for_turn(input.hints_used) {
        HintKind::NextPiece => next_piece_hint(input.board, input.pool),
        HintKind::Position => position_hint(input.board, input.target, input.pool, input.selected),
        HintKind::RevealTarget => reveal_target_hint(input.board, input.target, rng),
    }
}

/// Positions where `piece`, in its current orientation, may be placed.
pub fn legal_positions<'a>(
    board: &'a Board,
    piece: &Piece,
) -> impl Iterator<Item = Coord2> + use<'a> {
    let footprint = piece.transform();
    CoordIter::board().filter(move |&position| board.can_place_shape(&footprint, position))
}

/// Suggests the pool piece with the most legal positions.
pub fn next_piece_hint(board: &Board, pool: &[Piece]) -> Option<Hint> {
    let mut best: Option<(&Piece, usize)> = None;
    for piece in pool {
        let count = legal_positions(board, piece).count();
        if count > best.map_or(0, |(_, most)| most) {
            best = Some((piece, count));
        }
    }

    let (piece, _) = best?;
    Some(Hint::NextPiece {
        piece: piece.id,
        message: format!("Try placing piece {} first", display_number(piece.id)),
    })
}

/// Best-scoring position for the selected piece, or the first pool piece without a selection.
pub fn position_hint(
    board: &Board,
    target: &Board,
    pool: &[Piece],
    selected: Option<PieceId>,
) -> Option<Hint> {
    let piece = match selected {
        Some(id) => pool.iter().find(|piece| piece.id == id),
        None => pool.first(),
    }?;

    let mut best: Option<(Coord2, i32)> = None;
    for position in legal_positions(board, piece) {
        let score = score_position(board, target, piece, position);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((position, score));
        }
    }

    let ((x, y), _) = best?;
    Some(Hint::Position {
        piece: piece.id,
        position: (x, y),
        message: format!(
            "Place piece {} at ({}, {})",
            display_number(piece.id),
            u16::from(x) + 1,
            u16::from(y) + 1
        ),
    })
}

/// Up to [`MAX_REVEALED_CELLS`] random target cells the board has not filled yet.
pub fn reveal_target_hint<R: Rng + ?Sized>(
    board: &Board,
    target: &Board,
    rng: &mut R,
) -> Option<Hint> {
    let mut cells: Vec<Coord2> = CoordIter::board()
        .filter(|&coords| !target[coords].is_empty() && board[coords].is_empty())
        .collect();
    if cells.is_empty() {
        return None;
    }

    cells.shuffle(rng);
    cells.truncate(MAX_REVEALED_CELLS);
    Some(Hint::RevealTarget {
        cells,
        message: String::from("Here are some cells of the target"),
    })
}

/// Scores how well placing `piece` at `position` moves the board toward the target.
///
/// Per covered cell with a non-empty target: 10 when the resolved colors match, 5 when only
/// the layer count matches, 1 when the piece adds one of the target's layers, -5 otherwise.
pub fn score_position(board: &Board, target: &Board, piece: &Piece, position: Coord2) -> i32 {
    let bounds = board.size();
    piece
        .transform()
        .occupied()
        .filter_map(|(offset, color)| {
            apply_offset(position, offset, bounds).map(|coords| (coords, color))
        })
        .map(|(coords, color)| {
            let goal = &target[coords];
            if goal.is_empty() {
                return 0;
            }
            match board[coords].stack(color) {
                Ok(next) if next.shade() == goal.shade() => 10,
                Ok(next) if next.len() == goal.len() => 5,
                Ok(_) if goal.layers().contains(&color) => 1,
                _ => -5,
            }
        })
        .sum()
}

fn display_number(id: PieceId) -> u32 {
    u32::from(id.0) + 1
}
