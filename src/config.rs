use std::time::Duration;

use crate::simulation::BoundaryPolicy;

/// Display size in pixels (the grid is this area divided by the cell size)
pub const DISPLAY_WIDTH: u32 = 1920;
pub const DISPLAY_HEIGHT: u32 = 1080;

/// Initial cell side in pixels
pub const INITIAL_CELL_SIZE: u32 = 30;

/// Pixels added to (or removed from) the cell side per wheel notch
pub const ZOOM_STEP: i32 = 2;

/// Smallest cell side accepted by a zoom out
pub const MIN_CELL_SIZE: u32 = 2;

/// Pause between two generations while running
pub const GENERATION_DELAY: Duration = Duration::from_millis(10);

/// Which cells the rule is applied to on each generation
pub const BOUNDARY_POLICY: BoundaryPolicy = BoundaryPolicy::Full;

/// Fraction of cells brought to life by a random reseed
pub const RANDOM_FILL_DENSITY: f64 = 0.3;

// ============================================
// Colours (RGB, 0-255)
// ============================================

pub const ALIVE_COLOR: [u8; 3] = [255, 255, 0];
pub const DEAD_COLOR: [u8; 3] = [128, 128, 128];
pub const LINE_COLOR: [u8; 3] = [180, 180, 180];

/// Convert an 8-bit RGB triple into the normalised RGBA floats the shader expects
pub fn rgba(color: [u8; 3]) -> [f32; 4] {
    [
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        1.0,
    ]
}
