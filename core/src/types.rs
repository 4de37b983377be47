/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`, `x` grows to the right and `y` downwards.
pub type Coord2 = (Coord, Coord);

/// Width and height of the play board.
pub const BOARD_SIZE: Coord = 6;

/// Total number of cells on the play board.
pub const BOARD_CELLS: CellCount = mult(BOARD_SIZE, BOARD_SIZE);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Applies the matrix `offset` to `origin`, returning a value only when it remains in bounds.
pub fn apply_offset(origin: Coord2, offset: (usize, usize), bounds: Coord2) -> Option<Coord2> {
    let (x, y) = origin;
    let (dx, dy) = offset;
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add(dx.try_into().ok()?)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add(dy.try_into().ok()?)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

/// Row-major walk over every coordinate of a `size` grid: `y` outer, `x` inner.
#[derive(Debug, Clone)]
pub struct CoordIter {
    size: Coord2,
    next: Option<Coord2>,
}

impl CoordIter {
    pub fn new(size: Coord2) -> Self {
        let next = (size.0 > 0 && size.1 > 0).then_some((0, 0));
        Self { size, next }
    }

    pub fn board() -> Self {
        Self::new((BOARD_SIZE, BOARD_SIZE))
    }
}

impl Iterator for CoordIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let (x, y) = current;
        self.next = if x + 1 < self.size.0 {
            Some((x + 1, y))
        } else if y + 1 < self.size.1 {
            Some((0, y + 1))
        } else {
            None
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn coord_iter_is_row_major() {
        let coords: Vec<_> = CoordIter::new((2, 2)).collect();
        assert_eq!(coords, [(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(CoordIter::board().count(), usize::from(BOARD_CELLS));
    }

    #[test]
    fn apply_offset_rejects_out_of_bounds() {
        let bounds = (BOARD_SIZE, BOARD_SIZE);
        assert_eq!(apply_offset((4, 4), (1, 1), bounds), Some((5, 5)));
        assert_eq!(apply_offset((4, 4), (2, 0), bounds), None);
        assert_eq!(apply_offset((0, 5), (0, 1), bounds), None);
        assert_eq!(apply_offset((0, 0), (300, 0), bounds), None);
    }
}
