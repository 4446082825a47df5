use crate::simulation::cell::{CellChange, CellState};
use crate::simulation::grid::Grid;

/// Which cells the rule is evaluated for on each generation.
///
/// Both policies read neighbours from the whole grid; they differ only in
/// which cells may change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Every cell is updated.
    #[default]
    Full,
    /// The last row and last column are never updated and stay frozen.
    #[allow(dead_code)]
    Legacy,
}

impl BoundaryPolicy {
    /// Number of leading indices along an axis of length `extent` that are updated
    fn subject_extent(self, extent: usize) -> usize {
        match self {
            BoundaryPolicy::Full => extent,
            BoundaryPolicy::Legacy => extent.saturating_sub(1),
        }
    }
}

/// Count alive cells among the (up to) eight cells around `(row, col)`.
///
/// Neighbours beyond the grid edge do not exist: there is no wrap-around.
pub fn live_neighbors(grid: &Grid, row: usize, col: usize) -> u8 {
    let (rows, cols) = grid.dimensions();
    if row >= rows || col >= cols {
        return 0;
    }

    let row_span = row.saturating_sub(1)..=(row + 1).min(rows - 1);
    let col_span = col.saturating_sub(1)..=(col + 1).min(cols - 1);

    let mut count = 0;
    for r in row_span {
        for c in col_span.clone() {
            if r == row && c == col {
                continue;
            }
            if grid.get(r, c).is_ok_and(CellState::is_alive) {
                count += 1;
            }
        }
    }

    count
}

/// Conway's B3/S23 transition
pub fn next_state(live_neighbors: u8, current: CellState) -> CellState {
    match (current, live_neighbors) {
        (CellState::Alive, 2 | 3) => CellState::Alive,
        (CellState::Alive, _) => CellState::Dead,
        (CellState::Dead, 3) => CellState::Alive,
        (CellState::Dead, _) => CellState::Dead,
    }
}

/// Compute one generation and apply it to `grid`.
///
/// Every transition is decided from the grid as it was before this call; the
/// collected changes are written only after the scan ends. Returns the cells
/// that changed, in row-major order.
pub fn advance(grid: &mut Grid, policy: BoundaryPolicy) -> Vec<CellChange> {
    let changes = pending_changes(grid, policy);

    for change in &changes {
        // Coordinates come from the scan of this same grid.
        let _ = grid.set(change.row, change.col, change.state);
    }

    changes
}

fn pending_changes(grid: &Grid, policy: BoundaryPolicy) -> Vec<CellChange> {
    let (rows, cols) = grid.dimensions();
    let mut changes = Vec::new();

    for row in 0..policy.subject_extent(rows) {
        for col in 0..policy.subject_extent(cols) {
            let Ok(current) = grid.get(row, col) else {
                continue;
            };
            let next = next_state(live_neighbors(grid, row, col), current);
            if next != current {
                changes.push(CellChange::new(row, col, next));
            }
        }
    }

    changes
}
