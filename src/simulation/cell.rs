/// State of a single cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellState {
    Alive,
    #[default]
    Dead,
}

impl CellState {
    pub fn is_alive(self) -> bool {
        self == CellState::Alive
    }
}

impl From<bool> for CellState {
    fn from(alive: bool) -> Self {
        if alive {
            CellState::Alive
        } else {
            CellState::Dead
        }
    }
}

/// One cell whose state changed, handed to the renderer after an edit or a generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    pub state: CellState,
}

impl CellChange {
    pub fn new(row: usize, col: usize, state: CellState) -> Self {
        Self { row, col, state }
    }
}

/// GPU-side cell, one per grid slot in the storage buffer.
///
/// Layout: 4 bytes, `state` is 1 for alive and 0 for dead.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuCell {
    pub state: u32,
}

impl From<CellState> for GpuCell {
    fn from(state: CellState) -> Self {
        Self {
            state: state.is_alive() as u32,
        }
    }
}
