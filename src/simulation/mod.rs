pub mod cell;
pub mod engine;
pub mod error;
pub mod grid;
pub mod rules;

pub use cell::{CellChange, GpuCell};
pub use engine::{Command, EditKind, Mode, Outcome, Simulation};
pub use grid::Grid;
pub use rules::BoundaryPolicy;
