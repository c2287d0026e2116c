//! Marble Grid - physics-driven animations for an addressable LED grid
//!
//! Core modules:
//! - `grid`: Logical (column, row) to serpentine LED index mapping
//! - `pixels`: Pixel buffer, colors and the dirty flag shared with the driver
//! - `sim`: Physics world, body primitives, background stepper
//! - `raster`: Frame sampling and grid rasterization
//! - `scenes`: Per-mode world population and reset policies
//! - `modes`: Mode table and lifecycle manager
//! - `settings`: JSON configuration
//! - `display`: Display driver boundary

pub mod display;
pub mod error;
pub mod grid;
pub mod modes;
pub mod pixels;
pub mod raster;
pub mod scenes;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use grid::Grid;
pub use modes::{ModeInfo, ModeManager};
pub use pixels::{PixelBuffer, Rgb};
pub use settings::Settings;

/// Display and simulation constants
pub mod consts {
    use std::time::Duration;

    /// Grid dimensions (19x19 panel, one strip per row)
    pub const GRID_WIDTH: usize = 19;
    pub const GRID_HEIGHT: usize = 19;

    /// Physics tick rate
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep, never variable
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Wall-clock period of the physics stepper
    pub const SIM_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / SIM_HZ as u64);
    /// Internal solver substeps per fixed timestep
    pub const SOLVER_SUBSTEPS: u32 = 4;

    /// Display frame period (~60 FPS)
    pub const FRAME_PERIOD: Duration = Duration::from_millis(16);

    /// Standard gravity in world units (1 unit = 1 LED cell) per s²
    pub const GRAVITY: f32 = -9.8;

    /// Density applied to every circle shape
    pub const MARBLE_DENSITY: f32 = 5.5;
    /// Glass marble coefficient of restitution (real glass is 0.84 - 0.86)
    pub const GLASS_RESTITUTION: f32 = 0.85;
    /// Steel pachinko pin coefficient of restitution (real pins are 0.80 - 0.85)
    pub const STEEL_PIN_RESTITUTION: f32 = 0.80;
    pub const MARBLE_FRICTION: f32 = 0.3;

    /// Default body capacity of a world
    pub const MAX_BODIES: usize = 256;

    /// Default settings speed (0-255)
    pub const DEFAULT_SPEED: u8 = 128;
    /// Brightness floor so the panel never goes fully dark
    pub const MIN_BRIGHTNESS: u8 = 32;
}

/// Round a world coordinate to the nearest whole cell (half away from zero)
#[inline]
pub fn round_to_cell(v: f32) -> i32 {
    v.round() as i32
}
