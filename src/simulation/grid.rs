use rand::Rng;

use crate::simulation::cell::{CellChange, CellState, GpuCell};
use crate::simulation::error::GridError;

/// Fixed-size rectangle of cells, stored row-major
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<CellState>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Create a `rows x cols` grid with every cell dead
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidDimension { rows, cols });
        }

        Ok(Self {
            cells: vec![CellState::Dead; rows * cols],
            rows,
            cols,
        })
    }

    /// Create the grid that covers a display area for a given cell size.
    /// Partial cells at the right and bottom edges are left out.
    pub fn for_display(
        display: (u32, u32),
        cell_width: u32,
        cell_height: u32,
    ) -> Result<Self, GridError> {
        let (rows, cols) = dimensions_for(display, cell_width, cell_height);
        Self::new(rows, cols)
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(GridError::OutOfBounds { row, col })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<CellState, GridError> {
        let idx = self.index(row, col)?;
        Ok(self.cells[idx])
    }

    /// Overwrite one cell. Redrawing it is up to the caller.
    pub fn set(&mut self, row: usize, col: usize, state: CellState) -> Result<(), GridError> {
        let idx = self.index(row, col)?;
        self.cells[idx] = state;
        Ok(())
    }

    /// Map a pixel position to the `(row, col)` under it, if it lies on the grid
    pub fn cell_at(&self, x: f64, y: f64, cell_width: u32, cell_height: u32) -> Option<(usize, usize)> {
        if cell_width == 0 || cell_height == 0 || !(x >= 0.0 && y >= 0.0) {
            return None;
        }

        let col = (x / cell_width as f64).floor() as usize;
        let row = (y / cell_height as f64).floor() as usize;

        (row < self.rows && col < self.cols).then_some((row, col))
    }

    /// Number of alive cells
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_alive()).count()
    }

    /// Kill every cell, returning the cells that were alive
    pub fn clear(&mut self) -> Vec<CellChange> {
        let cols = self.cols;
        let mut changes = Vec::new();

        for (idx, cell) in self.cells.iter_mut().enumerate() {
            if cell.is_alive() {
                *cell = CellState::Dead;
                changes.push(CellChange::new(idx / cols, idx % cols, CellState::Dead));
            }
        }

        changes
    }

    /// Bring each cell to life with probability `density`, killing the rest
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R, density: f64) {
        let density = density.clamp(0.0, 1.0);
        for cell in &mut self.cells {
            *cell = CellState::from(rng.gen_bool(density));
        }
    }

    /// Snapshot of the grid in GPU layout, row-major
    pub fn to_gpu_cells(&self) -> Vec<GpuCell> {
        self.cells.iter().map(|&state| GpuCell::from(state)).collect()
    }
}

/// `(rows, cols)` that fit in a display area for a given cell size
pub fn dimensions_for(display: (u32, u32), cell_width: u32, cell_height: u32) -> (usize, usize) {
    let (width, height) = display;
    let cols = width.checked_div(cell_width).unwrap_or(0);
    let rows = height.checked_div(cell_height).unwrap_or(0);
    (rows as usize, cols as usize)
}
