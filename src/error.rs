//! Error types for the row packer.

use thiserror::Error;

use crate::types::Rect;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Container dimensions must be non-zero.
    #[error("container dimensions must be non-zero, got {0}")]
    InvalidContainer(Rect),

    /// Piece dimensions must be non-zero.
    #[error("piece {index} has a zero dimension: {rect}")]
    InvalidPiece { index: usize, rect: Rect },

    /// Width and height lists describe a different number of pieces.
    #[error("got {widths} widths but {heights} heights")]
    LengthMismatch { widths: usize, heights: usize },

    /// No feasible trial was found, either because every rotation vector
    /// was infeasible or because the search was cancelled first.
    #[error("no feasible layout found")]
    NoFeasibleSolution,

    /// The dimension file could not be read or parsed.
    #[error("input error: {0}")]
    Input(String),
}
