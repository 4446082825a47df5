use thiserror::Error;

/// Errors raised by the grid store and the simulation context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The grid would have no rows or no columns.
    #[error("grid of {rows}x{cols} cells has no area")]
    InvalidDimension { rows: usize, cols: usize },
    /// A row/column pair outside the grid.
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },
}
