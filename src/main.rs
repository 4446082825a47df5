//! Conway's Game of Life on a fixed pixel grid.
//!
//! Paint cells with the mouse while paused, run or step the simulation from
//! the keyboard, and zoom with the wheel.

mod app;
mod config;
mod gpu;
mod simulation;

use winit::event_loop::EventLoop;

use app::App;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
