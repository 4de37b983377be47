use alloc::vec::Vec;
use core::fmt;
use ndarray::{Array2, s};
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(pub u16);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "piece_{}", self.0)
    }
}

/// Clockwise quarter turns applied before reflection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::R0 => 0,
            Self::R90 => 1,
            Self::R180 => 2,
            Self::R270 => 3,
        }
    }

    pub const fn degrees(self) -> u16 {
        self.quarter_turns() as u16 * 90
    }

    pub fn from_degrees(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Self::R0),
            90 => Ok(Self::R90),
            180 => Ok(Self::R180),
            270 => Ok(Self::R270),
            _ => Err(GameError::InvalidRotation),
        }
    }

    pub const fn clockwise(self) -> Self {
        match self {
            Self::R0 => Self::R90,
            Self::R90 => Self::R180,
            Self::R180 => Self::R270,
            Self::R270 => Self::R0,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = GameError;

    fn try_from(degrees: u16) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    pub rotation: Rotation,
    pub reflected: bool,
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation::new(Rotation::R0, false);

    /// Every rotation, unreflected then reflected.
    pub const ALL: [Orientation; 8] = [
        Orientation::new(Rotation::R0, false),
        Orientation::new(Rotation::R90, false),
        Orientation::new(Rotation::R180, false),
        Orientation::new(Rotation::R270, false),
        Orientation::new(Rotation::R0, true),
        Orientation::new(Rotation::R90, true),
        Orientation::new(Rotation::R180, true),
        Orientation::new(Rotation::R270, true),
    ];

    pub const fn new(rotation: Rotation, reflected: bool) -> Self {
        Self {
            rotation,
            reflected,
        }
    }
}

/// Cell matrix of a piece, indexed `[x, y]`. `None` marks a hole.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Array2<Option<Color>>", into = "Array2<Option<Color>>")]
pub struct Shape {
    cells: Array2<Option<Color>>,
}

impl Shape {
    pub fn new(cells: Array2<Option<Color>>) -> Result<Self> {
        let (width, height) = cells.dim();
        let max = usize::from(BOARD_SIZE);
        if width == 0 || height == 0 || width > max || height > max {
            return Err(GameError::InvalidShape);
        }
        if cells.iter().all(Option::is_none) {
            return Err(GameError::InvalidShape);
        }
        Ok(Self { cells })
    }

    /// Parses rows separated by `/`, one symbol per cell (`R`, `Y`, `B`, `O`, `G`, `M`, or `.`
    /// for a hole). `"R./RR"` is an L tromino.
    pub fn parse(pattern: &str) -> Result<Self> {
        let rows: Vec<Vec<Option<Color>>> = pattern
            .split('/')
            .map(|row| {
                row.chars()
                    .map(|symbol| match symbol {
                        '.' => Ok(None),
                        _ => Color::from_symbol(symbol).map(Some).ok_or(GameError::InvalidShape),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;

        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(GameError::InvalidShape);
        }

        Self::new(Array2::from_shape_fn((width, rows.len()), |(x, y)| rows[y][x]))
    }

    pub fn size(&self) -> Coord2 {
        let (width, height) = self.cells.dim();
        (width as Coord, height as Coord)
    }

    pub fn cell(&self, (x, y): Coord2) -> Option<Color> {
        self.cells
            .get((usize::from(x), usize::from(y)))
            .copied()
            .flatten()
    }

    /// Occupied cells as matrix offsets `(x, y)` with their color.
    pub fn occupied(&self) -> impl Iterator<Item = ((usize, usize), Color)> + '_ {
        self.cells
            .indexed_iter()
            .filter_map(|(offset, cell)| cell.map(|color| (offset, color)))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// One quarter turn clockwise; width and height swap.
    pub fn rotated(&self) -> Self {
        Self {
            cells: self.cells.t().slice(s![..;-1, ..]).to_owned(),
        }
    }

    /// Mirrors the column order.
    pub fn mirrored(&self) -> Self {
        Self {
            cells: self.cells.slice(s![..;-1, ..]).to_owned(),
        }
    }

    pub fn transformed(&self, orientation: Orientation) -> Self {
        let mut shape = self.clone();
        for _ in 0..orientation.rotation.quarter_turns() {
            shape = shape.rotated();
        }
        if orientation.reflected {
            shape = shape.mirrored();
        }
        shape
    }

    pub fn map_colors(&self, mut f: impl FnMut(Color) -> Color) -> Self {
        Self {
            cells: self.cells.map(|cell| cell.map(&mut f)),
        }
    }
}

impl TryFrom<Array2<Option<Color>>> for Shape {
    type Error = GameError;

    fn try_from(cells: Array2<Option<Color>>) -> Result<Self> {
        Self::new(cells)
    }
}

impl From<Shape> for Array2<Option<Color>> {
    fn from(shape: Shape) -> Self {
        shape.cells
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.size();
        for y in 0..height {
            if y > 0 {
                f.write_str("/")?;
            }
            for x in 0..width {
                let symbol = self.cell((x, y)).map_or('.', Color::symbol);
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

/// A piece in the pool: its base shape plus the orientation the player chose.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    shape: Shape,
    #[serde(flatten)]
    pub orientation: Orientation,
}

impl Piece {
    pub fn new(id: PieceId, shape: Shape) -> Self {
        Self {
            id,
            shape,
            orientation: Orientation::IDENTITY,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rotation(&self) -> Rotation {
        self.orientation.rotation
    }

    pub fn is_reflected(&self) -> bool {
        self.orientation.reflected
    }

    pub fn rotate(&mut self) {
        self.orientation.rotation = self.orientation.rotation.clockwise();
    }

    pub fn flip(&mut self) {
        self.orientation.reflected = !self.orientation.reflected;
    }

    /// The base shape with this piece's rotation and reflection applied.
    pub fn transform(&self) -> Shape {
        self.shape.transformed(self.orientation)
    }

    /// Number of occupied cells, which no orientation changes.
    pub fn cell_count(&self) -> usize {
        self.shape.cell_count()
    }

    pub fn place_at(self, position: Coord2) -> PlacedPiece {
        PlacedPiece {
            piece: self,
            position,
        }
    }
}

/// A piece frozen onto the board with the top-left of its transformed matrix at `position`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub piece: Piece,
    pub position: Coord2,
}

impl PlacedPiece {
    pub fn id(&self) -> PieceId {
        self.piece.id
    }

    /// Absolute board cells covered by the piece; cells off the board are skipped.
    pub fn footprint(&self) -> Vec<(Coord2, Color)> {
        let bounds = (BOARD_SIZE, BOARD_SIZE);
        self.piece
            .transform()
            .occupied()
            .filter_map(|(offset, color)| {
                apply_offset(self.position, offset, bounds).map(|coords| (coords, color))
            })
            .collect()
    }

    pub fn covers(&self, coords: Coord2) -> bool {
        self.footprint().iter().any(|&(cell, _)| cell == coords)
    }

    /// Returns the piece to the pool, keeping its orientation.
    pub fn into_piece(self) -> Piece {
        self.piece
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn shape(pattern: &str) -> Shape {
        Shape::parse(pattern).unwrap()
    }

    #[test]
    fn parse_rejects_bad_patterns() {
        assert_eq!(Shape::parse("R./RRR"), Err(GameError::InvalidShape));
        assert_eq!(Shape::parse(".."), Err(GameError::InvalidShape));
        assert_eq!(Shape::parse("RX"), Err(GameError::InvalidShape));
        assert_eq!(Shape::parse(""), Err(GameError::InvalidShape));
        assert_eq!(Shape::parse("RRRRRRR"), Err(GameError::InvalidShape));
    }

    #[test]
    fn rotation_turns_clockwise() {
        let l = shape("R./R./RR");
        assert_eq!(l.size(), (2, 3));

        let turned = l.rotated();
        assert_eq!(turned.size(), (3, 2));
        assert_eq!(turned.to_string(), "RRR/R..");
        assert_eq!(turned.rotated().to_string(), "RR/.R/.R");
    }

    #[test]
    fn reflection_mirrors_columns() {
        assert_eq!(shape("RY./..B").mirrored().to_string(), ".YR/B..");
    }

    #[test]
    fn four_rotations_and_two_flips_are_identity() {
        let z = shape("MM./.MY");
        let full_turn = z.rotated().rotated().rotated().rotated();
        assert_eq!(full_turn, z);
        assert_eq!(z.mirrored().mirrored(), z);
    }

    #[test]
    fn transform_applies_rotation_then_reflection() {
        let l = shape("R./R./RR");
        let orientation = Orientation::new(Rotation::R90, true);
        assert_eq!(l.transformed(orientation), l.rotated().mirrored());
        assert_eq!(l.transformed(orientation).to_string(), "RRR/..R");
    }

    #[test]
    fn cell_count_ignores_orientation() {
        let mut piece = Piece::new(PieceId(0), shape(".O./OOO"));
        for _ in 0..8 {
            piece.rotate();
            if piece.rotation() == Rotation::R0 {
                piece.flip();
            }
            assert_eq!(piece.transform().cell_count(), 4);
        }
        assert_eq!(piece.cell_count(), 4);
    }

    #[test]
    fn rotation_degrees_are_validated() {
        assert_eq!(Rotation::from_degrees(270), Ok(Rotation::R270));
        assert_eq!(Rotation::from_degrees(45), Err(GameError::InvalidRotation));
        assert_eq!(Rotation::R270.clockwise(), Rotation::R0);
    }

    #[test]
    fn placed_piece_footprint_is_translated() {
        let placed = Piece::new(PieceId(1), shape("RY")).place_at((2, 3));
        assert_eq!(placed.footprint(), [((2, 3), Color::Red), ((3, 3), Color::Yellow)]);
        assert!(placed.covers((3, 3)));
        assert!(!placed.covers((4, 3)));
    }
}
