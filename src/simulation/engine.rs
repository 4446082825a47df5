use rand::Rng;

use crate::simulation::cell::{CellChange, CellState};
use crate::simulation::error::GridError;
use crate::simulation::grid::{dimensions_for, Grid};
use crate::simulation::rules::{advance, BoundaryPolicy};

/// Whether ticks advance generations on their own
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Paused,
    Running,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Paused => Mode::Running,
            Mode::Running => Mode::Paused,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Paused => "Paused",
            Mode::Running => "Running",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    SetAlive,
    SetDead,
}

impl From<EditKind> for CellState {
    fn from(kind: EditKind) -> Self {
        match kind {
            EditKind::SetAlive => CellState::Alive,
            EditKind::SetDead => CellState::Dead,
        }
    }
}

/// Input delivered to the simulation by the event source
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Quit,
    /// Set the cell under a pixel position (only while paused)
    PointerEdit { x: f64, y: f64, kind: EditKind },
    ToggleRun,
    /// Advance exactly one generation (only while paused)
    SingleStep,
    /// Grow or shrink the cell side by `delta` pixels, clearing the grid
    ResizeCells(i32),
    /// Kill every cell
    Clear,
    /// Reseed the grid with random cells (only while paused)
    Randomize,
}

/// What a command or tick did, as far as the renderer is concerned
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing visible changed
    Unchanged,
    /// Only the mode flag changed
    ModeChanged(Mode),
    /// These cells changed state
    Cells(Vec<CellChange>),
    /// Every cell may have changed, or the grid was reallocated
    Redraw,
    Quit,
}

impl Outcome {
    fn from_changes(changes: Vec<CellChange>) -> Self {
        if changes.is_empty() {
            Outcome::Unchanged
        } else {
            Outcome::Cells(changes)
        }
    }
}

/// Simulation context: the grid, the cell size that shapes it, and the run/pause mode.
///
/// All mutation goes through [`Simulation::handle`] and [`Simulation::tick`],
/// called from a single loop.
pub struct Simulation {
    grid: Grid,
    mode: Mode,
    display: (u32, u32),
    cell_width: u32,
    cell_height: u32,
    min_cell_size: u32,
    boundary: BoundaryPolicy,
    fill_density: f64,
    generation: u64,
}

impl Simulation {
    /// Build a paused simulation with an empty grid covering `display`
    pub fn new(
        display: (u32, u32),
        cell_width: u32,
        cell_height: u32,
        boundary: BoundaryPolicy,
    ) -> Result<Self, GridError> {
        let grid = Grid::for_display(display, cell_width, cell_height)?;

        Ok(Self {
            grid,
            mode: Mode::Paused,
            display,
            cell_width,
            cell_height,
            min_cell_size: 1,
            boundary,
            fill_density: 0.5,
            generation: 0,
        })
    }

    /// Refuse zoom-outs below this cell side
    pub fn with_min_cell_size(mut self, min_cell_size: u32) -> Self {
        self.min_cell_size = min_cell_size.max(1);
        self
    }

    /// Fraction of cells a random reseed brings to life
    pub fn with_fill_density(mut self, density: f64) -> Self {
        self.fill_density = density.clamp(0.0, 1.0);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    /// Generations applied since the grid was last reset
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply one input command.
    ///
    /// Only a resize to a degenerate grid fails; the previous grid and mode
    /// are kept in that case. Edits off the grid are dropped silently.
    pub fn handle(&mut self, command: Command) -> Result<Outcome, GridError> {
        self.handle_with_rng(command, &mut rand::thread_rng())
    }

    /// [`Simulation::handle`] with an explicit random source for reseeding
    pub fn handle_with_rng<R: Rng + ?Sized>(
        &mut self,
        command: Command,
        rng: &mut R,
    ) -> Result<Outcome, GridError> {
        match command {
            Command::Quit => Ok(Outcome::Quit),
            Command::PointerEdit { x, y, kind } => Ok(self.edit_at(x, y, kind)),
            Command::ToggleRun => Ok(self.toggle_run()),
            Command::SingleStep => Ok(self.single_step()),
            Command::ResizeCells(delta) => self.resize_cells(delta),
            Command::Clear => Ok(self.clear()),
            Command::Randomize => Ok(self.randomize(rng)),
        }
    }

    /// One scheduler tick: advance a generation if running
    pub fn tick(&mut self) -> Outcome {
        match self.mode {
            Mode::Running => self.step(),
            Mode::Paused => Outcome::Unchanged,
        }
    }

    fn step(&mut self) -> Outcome {
        let changes = advance(&mut self.grid, self.boundary);
        self.generation += 1;
        Outcome::from_changes(changes)
    }

    fn toggle_run(&mut self) -> Outcome {
        self.mode = self.mode.toggled();
        log::info!("Simulation {}", self.mode.label().to_lowercase());
        Outcome::ModeChanged(self.mode)
    }

    fn single_step(&mut self) -> Outcome {
        if self.mode == Mode::Running {
            log::debug!("Single step ignored while running");
            return Outcome::Unchanged;
        }
        self.step()
    }

    fn edit_at(&mut self, x: f64, y: f64, kind: EditKind) -> Outcome {
        if self.mode == Mode::Running {
            log::debug!("Edit at ({x:.0}, {y:.0}) ignored while running");
            return Outcome::Unchanged;
        }

        let Some((row, col)) = self.grid.cell_at(x, y, self.cell_width, self.cell_height) else {
            return Outcome::Unchanged;
        };

        let state = CellState::from(kind);
        if self.grid.get(row, col) == Ok(state) || self.grid.set(row, col, state).is_err() {
            return Outcome::Unchanged;
        }
        Outcome::Cells(vec![CellChange::new(row, col, state)])
    }

    fn resize_cells(&mut self, delta: i32) -> Result<Outcome, GridError> {
        let cell_width = resized(self.cell_width, delta);
        let cell_height = resized(self.cell_height, delta);

        if cell_width < self.min_cell_size || cell_height < self.min_cell_size {
            let (rows, cols) = dimensions_for(self.display, cell_width, cell_height);
            log::debug!(
                "Cell size {}x{} is below the minimum of {}px, keeping {}x{}",
                cell_width,
                cell_height,
                self.min_cell_size,
                self.cell_width,
                self.cell_height
            );
            return Err(GridError::InvalidDimension { rows, cols });
        }

        let grid = Grid::for_display(self.display, cell_width, cell_height)?;

        self.grid = grid;
        self.cell_width = cell_width;
        self.cell_height = cell_height;
        self.mode = Mode::Paused;
        self.generation = 0;

        let (rows, cols) = self.grid.dimensions();
        log::info!("Cells resized to {}x{} px, grid is now {}x{}", cell_width, cell_height, cols, rows);

        Ok(Outcome::Redraw)
    }

    fn clear(&mut self) -> Outcome {
        let changes = self.grid.clear();
        self.generation = 0;
        log::info!("Grid cleared ({} cells killed)", changes.len());
        Outcome::from_changes(changes)
    }

    fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Outcome {
        if self.mode == Mode::Running {
            log::debug!("Reseed ignored while running");
            return Outcome::Unchanged;
        }

        self.grid.randomize(rng, self.fill_density);
        self.generation = 0;
        log::info!("Grid reseeded with {} live cells", self.grid.population());
        Outcome::Redraw
    }
}

/// Cell side after applying `delta`, saturating at zero
fn resized(size: u32, delta: i32) -> u32 {
    size.saturating_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn paused_sim() -> Simulation {
        // 10x10 cells of 10px
        Simulation::new((100, 100), 10, 10, BoundaryPolicy::Full).unwrap()
    }

    fn paint(sim: &mut Simulation, x: f64, y: f64) -> Outcome {
        sim.handle(Command::PointerEdit {
            x,
            y,
            kind: EditKind::SetAlive,
        })
        .unwrap()
    }

    #[test]
    fn test_starts_paused_and_empty() {
        let sim = paused_sim();
        assert_eq!(sim.mode(), Mode::Paused);
        assert_eq!(sim.grid().dimensions(), (10, 10));
        assert_eq!(sim.grid().population(), 0);
        assert_eq!(sim.generation(), 0);
    }

    #[test]
    fn test_degenerate_startup_rejected() {
        assert!(matches!(
            Simulation::new((100, 5), 10, 10, BoundaryPolicy::Full),
            Err(GridError::InvalidDimension { rows: 0, cols: 10 })
        ));
    }

    #[test]
    fn test_toggle_parity() {
        let mut sim = paused_sim();
        for presses in 1..=5 {
            let outcome = sim.handle(Command::ToggleRun).unwrap();
            let expected = if presses % 2 == 1 { Mode::Running } else { Mode::Paused };
            assert_eq!(sim.mode(), expected);
            assert_eq!(outcome, Outcome::ModeChanged(expected));
        }
    }

    #[test]
    fn test_edit_while_paused() {
        let mut sim = paused_sim();
        let outcome = paint(&mut sim, 25.0, 47.0);
        assert_eq!(
            outcome,
            Outcome::Cells(vec![CellChange::new(4, 2, CellState::Alive)])
        );
        assert_eq!(sim.grid().get(4, 2), Ok(CellState::Alive));

        // Painting the same cell again changes nothing.
        assert_eq!(paint(&mut sim, 21.0, 41.0), Outcome::Unchanged);

        let outcome = sim
            .handle(Command::PointerEdit {
                x: 25.0,
                y: 47.0,
                kind: EditKind::SetDead,
            })
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Cells(vec![CellChange::new(4, 2, CellState::Dead)])
        );
    }

    #[test]
    fn test_edit_outside_grid_is_ignored() {
        let mut sim = Simulation::new((105, 100), 10, 10, BoundaryPolicy::Full).unwrap();
        assert_eq!(paint(&mut sim, 102.0, 5.0), Outcome::Unchanged);
        assert_eq!(paint(&mut sim, -3.0, 5.0), Outcome::Unchanged);
        assert_eq!(paint(&mut sim, 5.0, 100.0), Outcome::Unchanged);
        assert_eq!(sim.grid().population(), 0);
    }

    #[test]
    fn test_edit_while_running_is_ignored() {
        let mut sim = paused_sim();
        sim.handle(Command::ToggleRun).unwrap();
        assert_eq!(paint(&mut sim, 15.0, 15.0), Outcome::Unchanged);
        assert_eq!(sim.grid().population(), 0);
    }

    #[test]
    fn test_tick_only_advances_when_running() {
        let mut sim = paused_sim();
        paint(&mut sim, 55.0, 55.0);

        assert_eq!(sim.tick(), Outcome::Unchanged);
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.grid().population(), 1);

        sim.handle(Command::ToggleRun).unwrap();
        assert_eq!(
            sim.tick(),
            Outcome::Cells(vec![CellChange::new(5, 5, CellState::Dead)])
        );
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.mode(), Mode::Running);
    }

    #[test]
    fn test_single_step_while_paused() {
        let mut sim = paused_sim();
        for x in [15.0, 25.0, 35.0] {
            paint(&mut sim, x, 25.0);
        }

        let outcome = sim.handle(Command::SingleStep).unwrap();
        assert!(matches!(outcome, Outcome::Cells(ref changes) if changes.len() == 4));
        assert_eq!(sim.mode(), Mode::Paused);
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.grid().get(1, 2), Ok(CellState::Alive));
        assert_eq!(sim.grid().get(3, 2), Ok(CellState::Alive));
    }

    #[test]
    fn test_single_step_ignored_while_running() {
        let mut sim = paused_sim();
        paint(&mut sim, 55.0, 55.0);
        sim.handle(Command::ToggleRun).unwrap();

        assert_eq!(sim.handle(Command::SingleStep).unwrap(), Outcome::Unchanged);
        assert_eq!(sim.generation(), 0);
    }

    #[test]
    fn test_resize_resets_grid_and_pauses() {
        let mut sim = paused_sim();
        paint(&mut sim, 55.0, 55.0);
        sim.handle(Command::ToggleRun).unwrap();
        sim.tick();

        let outcome = sim.handle(Command::ResizeCells(10)).unwrap();
        assert_eq!(outcome, Outcome::Redraw);
        assert_eq!(sim.mode(), Mode::Paused);
        assert_eq!(sim.cell_size(), (20, 20));
        assert_eq!(sim.grid().dimensions(), (5, 5));
        assert_eq!(sim.generation(), 0);
        for row in 0..5 {
            for col in 0..5 {
                assert_eq!(sim.grid().get(row, col), Ok(CellState::Dead));
            }
        }
    }

    #[test]
    fn test_degenerate_resize_keeps_previous_state() {
        let mut sim = paused_sim();
        paint(&mut sim, 55.0, 55.0);
        sim.handle(Command::ToggleRun).unwrap();

        // 110px cells do not fit a 100px display.
        let err = sim.handle(Command::ResizeCells(100)).unwrap_err();
        assert_eq!(err, GridError::InvalidDimension { rows: 0, cols: 0 });
        assert_eq!(sim.mode(), Mode::Running);
        assert_eq!(sim.cell_size(), (10, 10));
        assert_eq!(sim.grid().get(5, 5), Ok(CellState::Alive));

        // Shrinking to nothing is rejected as well.
        assert!(sim.handle(Command::ResizeCells(-10)).is_err());
        assert!(sim.handle(Command::ResizeCells(-50)).is_err());
        assert_eq!(sim.cell_size(), (10, 10));
    }

    #[test]
    fn test_min_cell_size_guard() {
        let mut sim = paused_sim().with_min_cell_size(8);
        assert!(sim.handle(Command::ResizeCells(-2)).is_ok());
        assert_eq!(sim.cell_size(), (8, 8));
        assert!(sim.handle(Command::ResizeCells(-2)).is_err());
        assert_eq!(sim.cell_size(), (8, 8));
    }

    #[test]
    fn test_clear_keeps_mode() {
        let mut sim = paused_sim();
        paint(&mut sim, 5.0, 5.0);
        paint(&mut sim, 95.0, 95.0);
        sim.handle(Command::ToggleRun).unwrap();

        let outcome = sim.handle(Command::Clear).unwrap();
        assert_eq!(
            outcome,
            Outcome::Cells(vec![
                CellChange::new(0, 0, CellState::Dead),
                CellChange::new(9, 9, CellState::Dead),
            ])
        );
        assert_eq!(sim.mode(), Mode::Running);
        assert_eq!(sim.handle(Command::Clear).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn test_randomize_only_while_paused() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut sim = paused_sim().with_fill_density(1.0);

        let outcome = sim.handle_with_rng(Command::Randomize, &mut rng).unwrap();
        assert_eq!(outcome, Outcome::Redraw);
        assert_eq!(sim.grid().population(), 100);

        sim.handle(Command::Clear).unwrap();
        sim.handle(Command::ToggleRun).unwrap();
        let outcome = sim.handle_with_rng(Command::Randomize, &mut rng).unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(sim.grid().population(), 0);
    }

    #[test]
    fn test_quit() {
        let mut sim = paused_sim();
        assert_eq!(sim.handle(Command::Quit).unwrap(), Outcome::Quit);
    }

    #[test]
    fn test_legacy_boundary_is_threaded_through() {
        let mut sim = Simulation::new((50, 50), 10, 10, BoundaryPolicy::Legacy).unwrap();
        paint(&mut sim, 45.0, 45.0);
        sim.handle(Command::SingleStep).unwrap();
        assert_eq!(sim.grid().get(4, 4), Ok(CellState::Alive));
        assert_eq!(sim.generation(), 1);
    }
}
