//! Precondition errors raised by the engines.
//!
//! These describe caller bugs (bad coordinates, malformed grids, short
//! chains). Inputs that are well-formed but illegal under the game rules are
//! not errors; they come back as explicit no-op outcomes instead.

use crate::engine::Coord;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("cell ({}, {}) is outside a {size}x{size} grid", .coord.row, .coord.col)]
    OutOfBounds { coord: Coord, size: usize },
    #[error("grid size must be at least 2, got {0}")]
    GridTooSmall(usize),
    #[error("grid rows are not square: expected {expected} cells in row {row}, found {found}")]
    NotSquare { row: usize, expected: usize, found: usize },
    #[error("expected a {expected}x{expected} grid, got {found}x{found}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("a chain needs at least 2 cells, got {0}")]
    ChainTooShort(usize),
    #[error("invalid spawn table: {0}")]
    InvalidSpawnTable(&'static str),
}
