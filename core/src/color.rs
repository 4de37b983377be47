use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

/// Most layers a single cell can hold.
pub const MAX_LAYERS: usize = 2;

/// Paint a piece cell can carry, declared in canonical palette order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Orange,
    Green,
    Magenta,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Yellow,
        Color::Blue,
        Color::Orange,
        Color::Green,
        Color::Magenta,
    ];

    pub const PRIMARIES: [Color; 3] = [Color::Red, Color::Yellow, Color::Blue];

    pub const fn name(self) -> &'static str {
        use Color::*;
        match self {
            Red => "red",
            Yellow => "yellow",
            Blue => "blue",
            Orange => "orange",
            Green => "green",
            Magenta => "magenta",
        }
    }

    /// Single letter used by shape patterns.
    pub const fn symbol(self) -> char {
        use Color::*;
        match self {
            Red => 'R',
            Yellow => 'Y',
            Blue => 'B',
            Orange => 'O',
            Green => 'G',
            Magenta => 'M',
        }
    }

    pub const fn from_symbol(symbol: char) -> Option<Self> {
        use Color::*;
        match symbol {
            'R' => Some(Red),
            'Y' => Some(Yellow),
            'B' => Some(Blue),
            'O' => Some(Orange),
            'G' => Some(Green),
            'M' => Some(Magenta),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What two stacked layers look like.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Blend {
    /// A mixing rule applies and the cell shows one color.
    Mixed(Color),
    /// No rule: both layers stay, the cell shows the earlier palette color.
    Unmixed,
    /// The pair cancels into white, which is never written to a board.
    Forbidden,
}

/// Looks up the unordered pair `{a, b}` in the mixing table.
pub fn blend(a: Color, b: Color) -> Blend {
    use Blend::*;
    use Color::*;

    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    match (low, high) {
        _ if low == high => Mixed(low),
        (Red, Yellow) => Mixed(Orange),
        (Yellow, Blue) => Mixed(Green),
        (Red, Blue) => Mixed(Magenta),
        (Red, Green) | (Yellow, Magenta) | (Blue, Orange) => Forbidden,
        _ => Unmixed,
    }
}

/// Color a cell displays once its layers are resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shade {
    Empty,
    Solid(Color),
    White,
}

impl Shade {
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Resolves raw layers into the displayed shade.
///
/// Anything a board could never hold (a forbidden pair, more than [`MAX_LAYERS`] layers)
/// resolves to [`Shade::White`].
pub fn resolve(layers: &[Color]) -> Shade {
    match *layers {
        [] => Shade::Empty,
        [color] => Shade::Solid(color),
        [a, b] => match blend(a, b) {
            Blend::Mixed(color) => Shade::Solid(color),
            Blend::Unmixed => Shade::Solid(a.min(b)),
            Blend::Forbidden => Shade::White,
        },
        _ => Shade::White,
    }
}

/// Validates a layer stack and returns it as a [`Cell`].
///
/// More than [`MAX_LAYERS`] layers is a [`GameError::LayerOverflow`], a pair that blends into
/// white is a [`GameError::ForbiddenBlend`]. Unmapped pairs are kept as two layers.
pub fn mix(layers: &[Color]) -> Result<Cell> {
    if layers.len() > MAX_LAYERS {
        return Err(GameError::LayerOverflow);
    }
    layers
        .iter()
        .try_fold(Cell::default(), |cell, &color| cell.stack(color))
}
