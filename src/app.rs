use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::{
    BOUNDARY_POLICY, DISPLAY_HEIGHT, DISPLAY_WIDTH, GENERATION_DELAY, INITIAL_CELL_SIZE,
    MIN_CELL_SIZE, RANDOM_FILL_DENSITY, ZOOM_STEP,
};
use crate::gpu::{GpuContext, GridBuffers, RenderPipeline};
use crate::simulation::{Command, EditKind, Mode, Outcome, Simulation};

/// Window plus everything needed to draw into it
struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    buffers: GridBuffers,
    pipeline: RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl Graphics {
    fn new(event_loop: &ActiveEventLoop) -> anyhow::Result<(Self, Simulation)> {
        let window_attrs = Window::default_attributes()
            .with_title("Game of Life")
            .with_inner_size(PhysicalSize::new(DISPLAY_WIDTH, DISPLAY_HEIGHT))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );

        // The grid covers whatever area the window actually got.
        let size = window.inner_size();
        log::info!("Display size: {}x{}", size.width, size.height);

        let simulation = Simulation::new(
            (size.width, size.height),
            INITIAL_CELL_SIZE,
            INITIAL_CELL_SIZE,
            BOUNDARY_POLICY,
        )
        .context("display too small for the initial cell size")?
        .with_min_cell_size(MIN_CELL_SIZE)
        .with_fill_density(RANDOM_FILL_DENSITY);

        let (rows, cols) = simulation.grid().dimensions();
        log::info!("Grid size: {}x{} cells of {}px", cols, rows, INITIAL_CELL_SIZE);

        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;

        let buffers = GridBuffers::new(
            &gpu.device,
            &gpu.queue,
            simulation.grid(),
            simulation.cell_size(),
        );
        let pipeline = RenderPipeline::new(&gpu.device, gpu.format());
        let bind_group = pipeline.create_bind_group(&gpu.device, &buffers);

        Ok((
            Self {
                window,
                gpu,
                buffers,
                pipeline,
                bind_group,
            },
            simulation,
        ))
    }

    /// Push the effect of a command or tick to the GPU
    fn apply(&mut self, outcome: &Outcome, simulation: &Simulation) {
        match outcome {
            Outcome::Cells(changes) => {
                self.buffers.apply_changes(&self.gpu.queue, changes);
            }
            Outcome::Redraw => {
                let grid = simulation.grid();
                if self.buffers.matches(grid) {
                    self.buffers.upload_grid(&self.gpu.queue, grid);
                    self.buffers
                        .update_render_params(&self.gpu.queue, simulation.cell_size());
                } else {
                    self.buffers = GridBuffers::new(
                        &self.gpu.device,
                        &self.gpu.queue,
                        grid,
                        simulation.cell_size(),
                    );
                    self.bind_group = self.pipeline.create_bind_group(&self.gpu.device, &self.buffers);
                }
            }
            Outcome::Unchanged | Outcome::ModeChanged(_) | Outcome::Quit => {}
        }
    }

    fn render(&self) {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                self.window.request_redraw();
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        self.pipeline.draw(&mut encoder, &view, &self.bind_group);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Application state
pub struct App {
    gfx: Option<Graphics>,
    simulation: Option<Simulation>,
    pointer: PointerState,
    timer: GenerationTimer,
    rate: GenerationRate,
}

impl App {
    pub fn new() -> Self {
        Self {
            gfx: None,
            simulation: None,
            pointer: PointerState::default(),
            timer: GenerationTimer::new(GENERATION_DELAY),
            rate: GenerationRate::new(),
        }
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, command: Command) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };

        match simulation.handle(command) {
            Ok(Outcome::Quit) => {
                log::info!("Quit requested, exiting...");
                event_loop.exit();
            }
            Ok(outcome) => self.present(outcome),
            Err(err) => log::warn!("Ignoring {:?}: {}", command, err),
        }
    }

    fn present(&mut self, outcome: Outcome) {
        let (Some(gfx), Some(simulation)) = (self.gfx.as_mut(), self.simulation.as_ref()) else {
            return;
        };

        if outcome == Outcome::Unchanged {
            return;
        }

        gfx.apply(&outcome, simulation);

        if matches!(outcome, Outcome::ModeChanged(_) | Outcome::Redraw) {
            self.rate.reset();
            update_title(&gfx.window, simulation, None);
        }
        gfx.window.request_redraw();
    }

    fn tick(&mut self) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };

        let outcome = simulation.tick();
        let rate = self.rate.tick();
        if let (Some(gfx), Some(rate)) = (self.gfx.as_ref(), rate) {
            update_title(&gfx.window, simulation, Some(rate));
        }
        self.present(outcome);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }

        log::info!("Initializing Game of Life...");
        let (gfx, simulation) = match Graphics::new(event_loop) {
            Ok(parts) => parts,
            Err(err) => {
                log::error!("Initialization failed: {:#}", err);
                event_loop.exit();
                return;
            }
        };

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Left mouse: Bring cells to life (paused only)");
        log::info!("  Right mouse: Kill cells (paused only)");
        log::info!("  Space: Run/pause");
        log::info!("  Right arrow: Advance one generation (paused only)");
        log::info!("  Mouse wheel: Zoom in/out (clears the grid)");
        log::info!("  C: Clear grid");
        log::info!("  R: Random soup (paused only)");
        log::info!("  Escape: Quit");

        update_title(&gfx.window, &simulation, None);
        gfx.window.request_redraw();

        self.gfx = Some(gfx);
        self.simulation = Some(simulation);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let command = match event {
            WindowEvent::CloseRequested => Some(Command::Quit),
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(key_code) if event.state.is_pressed() && !event.repeat => {
                    command_for_key(key_code)
                }
                _ => None,
            },
            WindowEvent::CursorMoved { position, .. } => self.pointer.moved(position.x, position.y),
            WindowEvent::CursorLeft { .. } => {
                self.pointer.left();
                None
            }
            WindowEvent::MouseInput { state, button, .. } => self.pointer.button(button, state),
            WindowEvent::MouseWheel { delta, .. } => command_for_wheel(delta),
            WindowEvent::Resized(new_size) => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.gpu.resize(new_size);
                    gfx.window.request_redraw();
                }
                None
            }
            WindowEvent::RedrawRequested => {
                if let Some(gfx) = &self.gfx {
                    gfx.render();
                }
                None
            }
            _ => None,
        };

        if let Some(command) = command {
            self.dispatch(event_loop, command);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let running = self
            .simulation
            .as_ref()
            .is_some_and(|sim| sim.mode() == Mode::Running);

        if !running {
            self.timer.reset();
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        if self.timer.ready(Instant::now()) {
            self.tick();
        }

        match self.timer.deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Poll),
        }
    }
}

fn update_title(window: &Window, simulation: &Simulation, rate: Option<f64>) {
    let (rows, cols) = simulation.grid().dimensions();
    let rate = rate.map(|r| format!(" - {:.0} gen/s", r)).unwrap_or_default();
    window.set_title(&format!(
        "Game of Life - {} - generation {} - {}x{}{}",
        simulation.mode().label(),
        simulation.generation(),
        cols,
        rows,
        rate
    ));
}

/// Map a key press to a command
fn command_for_key(key_code: KeyCode) -> Option<Command> {
    match key_code {
        KeyCode::Escape => Some(Command::Quit),
        KeyCode::Space => Some(Command::ToggleRun),
        KeyCode::ArrowRight => Some(Command::SingleStep),
        KeyCode::KeyC => Some(Command::Clear),
        KeyCode::KeyR => Some(Command::Randomize),
        _ => None,
    }
}

/// Wheel up zooms in (bigger cells), wheel down zooms out
fn command_for_wheel(delta: MouseScrollDelta) -> Option<Command> {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64,
        MouseScrollDelta::PixelDelta(p) => p.y,
    };

    if y > 0.0 {
        Some(Command::ResizeCells(ZOOM_STEP))
    } else if y < 0.0 {
        Some(Command::ResizeCells(-ZOOM_STEP))
    } else {
        None
    }
}

/// Cursor position and held button, turned into paint commands
#[derive(Default)]
struct PointerState {
    cursor: Option<(f64, f64)>,
    held: Option<(MouseButton, EditKind)>,
}

impl PointerState {
    fn edit(&self) -> Option<Command> {
        let (x, y) = self.cursor?;
        let (_, kind) = self.held?;
        Some(Command::PointerEdit { x, y, kind })
    }

    fn moved(&mut self, x: f64, y: f64) -> Option<Command> {
        self.cursor = Some((x, y));
        self.edit()
    }

    fn left(&mut self) {
        self.cursor = None;
    }

    fn button(&mut self, button: MouseButton, state: ElementState) -> Option<Command> {
        let kind = match button {
            MouseButton::Left => EditKind::SetAlive,
            MouseButton::Right => EditKind::SetDead,
            _ => return None,
        };

        match state {
            ElementState::Pressed => {
                self.held = Some((button, kind));
                self.edit()
            }
            ElementState::Released => {
                if self.held.is_some_and(|(held, _)| held == button) {
                    self.held = None;
                }
                None
            }
        }
    }
}

/// Paces generations: once one runs, the next is not due before `delay` has passed
struct GenerationTimer {
    delay: Duration,
    next_due: Option<Instant>,
}

impl GenerationTimer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_due: None,
        }
    }

    /// Whether a generation may run at `now`; if so the next one is scheduled
    fn ready(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.delay);
                true
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.next_due
    }

    fn reset(&mut self) {
        self.next_due = None;
    }
}

/// Generations per second, reported once a second
struct GenerationRate {
    last_update: Instant,
    generations: u32,
}

impl GenerationRate {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            generations: 0,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    /// Count a generation, returns Some(rate) every second
    fn tick(&mut self) -> Option<f64> {
        self.generations += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let rate = self.generations as f64 / elapsed.as_secs_f64();
            self.generations = 0;
            self.last_update = Instant::now();
            Some(rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_key_mapping() {
        assert_eq!(command_for_key(KeyCode::Space), Some(Command::ToggleRun));
        assert_eq!(command_for_key(KeyCode::ArrowRight), Some(Command::SingleStep));
        assert_eq!(command_for_key(KeyCode::Escape), Some(Command::Quit));
        assert_eq!(command_for_key(KeyCode::KeyC), Some(Command::Clear));
        assert_eq!(command_for_key(KeyCode::KeyR), Some(Command::Randomize));
        assert_eq!(command_for_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_wheel_mapping() {
        assert_eq!(
            command_for_wheel(MouseScrollDelta::LineDelta(0.0, 1.0)),
            Some(Command::ResizeCells(ZOOM_STEP))
        );
        assert_eq!(
            command_for_wheel(MouseScrollDelta::LineDelta(0.0, -3.0)),
            Some(Command::ResizeCells(-ZOOM_STEP))
        );
        assert_eq!(
            command_for_wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -12.0))),
            Some(Command::ResizeCells(-ZOOM_STEP))
        );
        assert_eq!(command_for_wheel(MouseScrollDelta::LineDelta(2.0, 0.0)), None);
    }

    #[test]
    fn test_drag_painting() {
        let mut pointer = PointerState::default();
        assert_eq!(pointer.moved(10.0, 20.0), None);

        assert_eq!(
            pointer.button(MouseButton::Left, ElementState::Pressed),
            Some(Command::PointerEdit {
                x: 10.0,
                y: 20.0,
                kind: EditKind::SetAlive
            })
        );
        assert_eq!(
            pointer.moved(40.0, 20.0),
            Some(Command::PointerEdit {
                x: 40.0,
                y: 20.0,
                kind: EditKind::SetAlive
            })
        );

        assert_eq!(pointer.button(MouseButton::Left, ElementState::Released), None);
        assert_eq!(pointer.moved(50.0, 20.0), None);
    }

    #[test]
    fn test_right_button_kills_and_other_buttons_ignored() {
        let mut pointer = PointerState::default();
        pointer.moved(5.0, 5.0);

        assert_eq!(pointer.button(MouseButton::Middle, ElementState::Pressed), None);
        assert_eq!(
            pointer.button(MouseButton::Right, ElementState::Pressed),
            Some(Command::PointerEdit {
                x: 5.0,
                y: 5.0,
                kind: EditKind::SetDead
            })
        );

        // Releasing a button that is not the held one keeps painting.
        pointer.button(MouseButton::Left, ElementState::Released);
        assert!(pointer.moved(6.0, 6.0).is_some());

        pointer.left();
        assert_eq!(pointer.edit(), None);
    }

    #[test]
    fn test_generation_timer_paces() {
        let delay = Duration::from_millis(10);
        let mut timer = GenerationTimer::new(delay);
        let start = Instant::now();

        assert!(timer.ready(start));
        assert_eq!(timer.deadline(), Some(start + delay));
        assert!(!timer.ready(start + Duration::from_millis(5)));
        assert!(timer.ready(start + delay));

        timer.reset();
        assert_eq!(timer.deadline(), None);
        assert!(timer.ready(start + Duration::from_millis(11)));
    }
}
