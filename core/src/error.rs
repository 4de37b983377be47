use thiserror::Error;

use crate::PieceId;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Piece does not fit inside the board")]
    InvalidCoords,
    #[error("Board shape does not match the play board size")]
    InvalidBoardShape,
    #[error("Cell already holds the maximum number of layers")]
    LayerOverflow,
    #[error("Colors blend into white")]
    ForbiddenBlend,
    #[error("Piece shape is empty or ragged")]
    InvalidShape,
    #[error("Rotation must be a multiple of 90 degrees below 360")]
    InvalidRotation,
    #[error("Unknown {0}")]
    UnknownPiece(PieceId),
    #[error("{0} is not in the pool")]
    PieceNotInPool(PieceId),
    #[error("{0} is not on the board")]
    PieceNotPlaced(PieceId),
    #[error("{0} appears more than once")]
    DuplicatePiece(PieceId),
    #[error("No hints left")]
    HintLimitReached,
    #[error("No hint available for the current board")]
    NoHintAvailable,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Game is paused")]
    Paused,
    #[error("Game is not paused")]
    NotPaused,
    #[error("Malformed campaign seed")]
    MalformedSeed,
}

pub type Result<T, E = GameError> = core::result::Result<T, E>;
