use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Layers stacked on one board cell, kept in palette order so that stacking order never
/// changes the cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Color>", into = "Vec<Color>")]
pub struct Cell {
    layers: SmallVec<[Color; MAX_LAYERS]>,
}

impl Cell {
    pub fn single(color: Color) -> Self {
        let mut layers = SmallVec::new();
        layers.push(color);
        Self { layers }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Color] {
        &self.layers
    }

    pub fn shade(&self) -> Shade {
        resolve(&self.layers)
    }

    /// Adds one more layer, rejecting overflow and blends into white.
    pub fn stack(&self, color: Color) -> Result<Self> {
        match *self.layers {
            [] => Ok(Self::single(color)),
            [existing] => match blend(existing, color) {
                Blend::Forbidden => Err(GameError::ForbiddenBlend),
                Blend::Mixed(_) | Blend::Unmixed => {
                    let mut layers = self.layers.clone();
                    let at = layers.partition_point(|&layer| layer <= color);
                    layers.insert(at, color);
                    Ok(Self { layers })
                }
            },
            _ => Err(GameError::LayerOverflow),
        }
    }

    /// Whether the cell shows what `target` shows: both empty, or both resolving alike.
    pub fn matches(&self, target: &Cell) -> bool {
        self.is_empty() == target.is_empty() && self.shade() == target.shade()
    }
}

impl TryFrom<Vec<Color>> for Cell {
    type Error = GameError;

    fn try_from(layers: Vec<Color>) -> Result<Self> {
        mix(&layers)
    }
}

impl From<Cell> for Vec<Color> {
    fn from(cell: Cell) -> Self {
        cell.layers.into_vec()
    }
}

/// Play grid, indexed `[x, y]`.
///
/// Boards are values: every mutation returns a new board and leaves `self` untouched,
/// so a rejected placement can never leave a partial write behind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Array2<Cell>", into = "Array2<Cell>")]
pub struct Board {
    cells: Array2<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: Array2::default((BOARD_SIZE, BOARD_SIZE).to_nd_index()),
        }
    }

    pub fn from_cells(cells: Array2<Cell>) -> Result<Self> {
        let expected = (usize::from(BOARD_SIZE), usize::from(BOARD_SIZE));
        if cells.dim() != expected {
            return Err(GameError::InvalidBoardShape);
        }
        Ok(Self { cells })
    }

    /// Replays every placement onto an empty board.
    pub fn from_placements<'a>(
        placements: impl IntoIterator<Item = &'a PlacedPiece>,
    ) -> Result<Self> {
        placements
            .into_iter()
            .try_fold(Self::empty(), |board, placed| {
                board.place(&placed.piece, placed.position)
            })
    }

    pub fn size(&self) -> Coord2 {
        (BOARD_SIZE, BOARD_SIZE)
    }

    pub fn cell_at(&self, coords: Coord2) -> &Cell {
        &self.cells[coords.to_nd_index()]
    }

    pub fn shade_at(&self, coords: Coord2) -> Shade {
        self.cell_at(coords).shade()
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, &Cell)> + '_ {
        CoordIter::board().map(|coords| (coords, self.cell_at(coords)))
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    /// Cells filled in `target` that are still empty here.
    pub fn unfilled_count(&self, target: &Board) -> usize {
        self.cells
            .iter()
            .zip(target.cells.iter())
            .filter(|(cell, target)| cell.is_empty() && !target.is_empty())
            .count()
    }

    /// Cell-for-cell comparison of emptiness and resolved shade.
    pub fn matches(&self, target: &Board) -> bool {
        self.cells
            .iter()
            .zip(target.cells.iter())
            .all(|(cell, target)| cell.matches(target))
    }

    pub fn can_place(&self, piece: &Piece, position: Coord2) -> bool {
        self.stage(&piece.transform(), position).is_ok()
    }

    pub fn place(&self, piece: &Piece, position: Coord2) -> Result<Self> {
        self.place_shape(&piece.transform(), position)
    }

    /// Places an already transformed footprint with its top-left at `position`.
    pub fn place_shape(&self, footprint: &Shape, position: Coord2) -> Result<Self> {
        let staged = self.stage(footprint, position)?;
        let mut next = self.clone();
        for (coords, cell) in staged {
            next.cells[coords.to_nd_index()] = cell;
        }
        Ok(next)
    }

    pub fn can_place_shape(&self, footprint: &Shape, position: Coord2) -> bool {
        self.stage(footprint, position).is_ok()
    }

    /// Computes every cell a placement would write without writing any of them.
    fn stage(&self, footprint: &Shape, position: Coord2) -> Result<SmallVec<[(Coord2, Cell); 8]>> {
        let bounds = self.size();
        footprint
            .occupied()
            .map(|(offset, color)| {
                let coords =
                    apply_offset(position, offset, bounds).ok_or(GameError::InvalidCoords)?;
                let cell = self.cell_at(coords).stack(color)?;
                Ok((coords, cell))
            })
            .collect()
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        self.cell_at(coords)
    }
}

impl TryFrom<Array2<Cell>> for Board {
    type Error = GameError;

    fn try_from(cells: Array2<Cell>) -> Result<Self> {
        Self::from_cells(cells)
    }
}

impl From<Board> for Array2<Cell> {
    fn from(board: Board) -> Self {
        board.cells
    }
}

/// The placed piece whose footprint covers `coords`, if any.
pub fn find_occupant(placed: &[PlacedPiece], coords: Coord2) -> Option<&PlacedPiece> {
    placed.iter().find(|piece| piece.covers(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn piece(id: u16, pattern: &str) -> Piece {
        Piece::new(PieceId(id), Shape::parse(pattern).unwrap())
    }

    #[test]
    fn place_stacks_two_layers_and_blends() {
        let board = Board::empty().place(&piece(0, "R"), (1, 1)).unwrap();
        let board = board.place(&piece(1, "Y"), (1, 1)).unwrap();

        assert_eq!(board[(1, 1)].layers(), [Color::Red, Color::Yellow]);
        assert_eq!(board.shade_at((1, 1)), Shade::Solid(Color::Orange));
    }

    #[test]
    fn third_layer_is_rejected_without_change() {
        let board = Board::empty()
            .place(&piece(0, "R"), (1, 1))
            .and_then(|board| board.place(&piece(1, "Y"), (1, 1)))
            .unwrap();
        let before = board.clone();

        assert_eq!(board.place(&piece(2, "R"), (1, 1)), Err(GameError::LayerOverflow));
        assert!(!board.can_place(&piece(2, "R"), (1, 1)));
        assert_eq!(board, before);
    }

    #[test]
    fn forbidden_blend_is_rejected() {
        let board = Board::empty().place(&piece(0, "R"), (2, 2)).unwrap();

        assert_eq!(board.place(&piece(1, "G"), (2, 2)), Err(GameError::ForbiddenBlend));
        assert_eq!(board[(2, 2)].layers(), [Color::Red]);
    }

    #[test]
    fn out_of_bounds_placement_is_atomic() {
        let board = Board::empty();

        assert_eq!(board.place(&piece(0, "RRR"), (4, 0)), Err(GameError::InvalidCoords));
        assert!(board.is_blank());
    }

    #[test]
    fn partial_conflict_rejects_whole_piece() {
        let board = Board::empty().place(&piece(0, "G"), (3, 0)).unwrap();
        let result = board.place(&piece(1, "RRR"), (1, 0));

        assert_eq!(result, Err(GameError::ForbiddenBlend));
        assert!(board[(1, 0)].is_empty());
        assert!(board[(2, 0)].is_empty());
    }

    #[test]
    fn can_place_agrees_with_place() {
        let mut board = Board::empty();
        let placements = [(0, "RR/R.", (0, 0)), (1, "BBB", (0, 1)), (2, "G./GG", (3, 3))];
        for (id, pattern, position) in placements {
            board = board.place(&piece(id, pattern), position).unwrap();
        }

        let probes = [piece(9, "Y/Y"), piece(9, "O.O/OOO"), piece(9, "MM"), piece(9, "R")];
        for probe in &probes {
            for orientation in Orientation::ALL {
                let probe = probe.clone().with_orientation(orientation);
                for position in CoordIter::board() {
                    assert_eq!(
                        board.can_place(&probe, position),
                        board.place(&probe, position).is_ok(),
                        "{} at {position:?}",
                        probe.transform()
                    );
                }
            }
        }
    }

    #[test]
    fn replay_order_does_not_matter() {
        let placements = vec![
            piece(0, "RR/R.").place_at((1, 1)),
            piece(1, "YY/Y.").place_at((1, 1)),
            piece(2, "BBB").place_at((0, 4)),
            piece(3, "O./OO").place_at((3, 3)),
        ];
        let forward = Board::from_placements(&placements).unwrap();
        let backward = Board::from_placements(placements.iter().rev()).unwrap();
        let shuffled =
            Board::from_placements([&placements[2], &placements[0], &placements[3], &placements[1]])
                .unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
        assert_eq!(forward.shade_at((2, 1)), Shade::Solid(Color::Orange));
    }

    #[test]
    fn matches_compares_emptiness_and_shade_only() {
        let layered = Board::empty()
            .place(&piece(0, "R"), (0, 0))
            .and_then(|board| board.place(&piece(1, "Y"), (0, 0)))
            .unwrap();
        let flat = Board::empty().place(&piece(2, "O"), (0, 0)).unwrap();

        assert!(layered.matches(&flat));
        assert!(!layered.matches(&Board::empty()));
        assert_eq!(flat.unfilled_count(&layered), 0);
        assert_eq!(Board::empty().unfilled_count(&layered), 1);
    }

    #[test]
    fn find_occupant_uses_footprint_not_bounding_box() {
        let placed = vec![piece(0, "R./RR").place_at((0, 0))];

        assert_eq!(find_occupant(&placed, (0, 1)).map(PlacedPiece::id), Some(PieceId(0)));
        assert!(find_occupant(&placed, (1, 0)).is_none());
    }

    #[test]
    fn deserialization_rejects_illegal_cells() {
        let cell: core::result::Result<Cell, _> = Cell::try_from(vec![Color::Blue, Color::Orange]);
        assert_eq!(cell, Err(GameError::ForbiddenBlend));
    }
}
