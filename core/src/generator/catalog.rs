use alloc::vec::Vec;
use rand::prelude::*;

use super::*;

/// Shape templates, easiest first. A difficulty draws from a prefix of this list.
pub const TEMPLATES: [&str; 10] = [
    "R./R./RR",
    "BBB/B..",
    "Y/Y/Y/Y",
    "GGG",
    ".O./OOO",
    "MM./.MM",
    "RR/RR",
    "B",
    "RR",
    "Y/Y",
];

/// Chance that a simplified piece cell is repainted with a random primary.
const RECOLOR_CHANCE: f64 = 0.7;

pub fn template(index: usize) -> Shape {
    Shape::parse(TEMPLATES[index]).expect("catalog patterns are well-formed")
}

/// Draws `difficulty.piece_count()` pieces with ids `0..k`.
pub fn synthesize_pieces<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Vec<Piece> {
    let available = difficulty.template_count().min(TEMPLATES.len());
    (0..difficulty.piece_count())
        .map(|id| {
            let mut shape = template(rng.random_range(0..available));
            if difficulty.simplified_colors() {
                shape = shape.map_colors(|color| {
                    if rng.random_bool(RECOLOR_CHANCE) {
                        *Color::PRIMARIES.choose(rng).expect("palette is not empty")
                    } else {
                        color
                    }
                });
            }
            Piece::new(PieceId(id as u16), shape)
        })
        .collect()
}
