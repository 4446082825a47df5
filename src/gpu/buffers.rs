use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::config::{rgba, ALIVE_COLOR, DEAD_COLOR, LINE_COLOR};
use crate::simulation::{CellChange, GpuCell, Grid};

/// Storage buffer holding one `GpuCell` per grid slot, plus the render uniforms
pub struct GridBuffers {
    /// Cell states, row-major
    pub cells_buffer: Buffer,
    /// Uniform buffer for render parameters
    pub render_params_buffer: Buffer,
    /// Grid dimensions
    pub rows: u32,
    pub cols: u32,
}

/// Render parameters passed to the fragment shader (64 bytes, aligned to 16)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderParams {
    // Grid shape (16 bytes)
    pub cols: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,

    // Colours (48 bytes)
    pub alive_color: [f32; 4],
    pub dead_color: [f32; 4],
    pub line_color: [f32; 4],
}

impl RenderParams {
    pub fn new(rows: u32, cols: u32, cell_width: u32, cell_height: u32) -> Self {
        Self {
            cols,
            rows,
            cell_width,
            cell_height,
            alive_color: rgba(ALIVE_COLOR),
            dead_color: rgba(DEAD_COLOR),
            line_color: rgba(LINE_COLOR),
        }
    }
}

impl GridBuffers {
    /// Create buffers sized for `grid` and upload its current state
    pub fn new(device: &Device, queue: &Queue, grid: &Grid, cell_size: (u32, u32)) -> Self {
        let (rows, cols) = grid.dimensions();
        let buffer_size = (rows * cols * std::mem::size_of::<GpuCell>()) as u64;

        let cells_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grid-cells-buffer"),
            size: buffer_size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let render_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("render-params-buffer"),
            size: std::mem::size_of::<RenderParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let buffers = Self {
            cells_buffer,
            render_params_buffer,
            rows: rows as u32,
            cols: cols as u32,
        };

        buffers.upload_grid(queue, grid);
        buffers.update_render_params(queue, cell_size);
        buffers
    }

    /// Whether these buffers were allocated for a grid of this shape
    pub fn matches(&self, grid: &Grid) -> bool {
        let (rows, cols) = grid.dimensions();
        self.rows as usize == rows && self.cols as usize == cols
    }

    /// Re-upload every cell
    pub fn upload_grid(&self, queue: &Queue, grid: &Grid) {
        queue.write_buffer(&self.cells_buffer, 0, bytemuck::cast_slice(&grid.to_gpu_cells()));
    }

    /// Write only the cells that changed
    pub fn apply_changes(&self, queue: &Queue, changes: &[CellChange]) {
        for change in changes {
            if let Some(offset) = cell_offset(self.cols, self.rows, change) {
                let cell = GpuCell::from(change.state);
                queue.write_buffer(&self.cells_buffer, offset, bytemuck::bytes_of(&cell));
            }
        }
    }

    pub fn update_render_params(&self, queue: &Queue, cell_size: (u32, u32)) {
        let params = RenderParams::new(self.rows, self.cols, cell_size.0, cell_size.1);
        queue.write_buffer(&self.render_params_buffer, 0, bytemuck::bytes_of(&params));
    }
}

/// Byte offset of a changed cell inside the cells buffer
fn cell_offset(cols: u32, rows: u32, change: &CellChange) -> Option<u64> {
    if change.row >= rows as usize || change.col >= cols as usize {
        return None;
    }
    let index = (change.row * cols as usize + change.col) as u64;
    Some(index * std::mem::size_of::<GpuCell>() as u64)
}
