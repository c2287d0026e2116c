//! Non-physics marble walking a zig-zag track, paced by the speed setting

use std::time::Duration;

use super::{Every, Mode, ModeContext};
use crate::error::SimError;
use crate::grid::Grid;
use crate::pixels::Rgb;

/// Step period at speed 0
const MAX_STEP_MILLIS: u64 = 300;

/// Trail fade per step (75%)
const TRAIL_FADE: u8 = 191;

/// Step period for a speed setting: 300 ms at 0, every frame at 255
pub fn step_period(speed: u8) -> Duration {
    Duration::from_millis(MAX_STEP_MILLIS - speed as u64 * MAX_STEP_MILLIS / 255)
}

pub struct MarbleTrack {
    track: Vec<bool>,
    width: i32,
    height: i32,
    col: i32,
    row: i32,
    step: Every,
}

impl Default for MarbleTrack {
    fn default() -> Self {
        Self {
            track: Vec::new(),
            width: 0,
            height: 0,
            col: 0,
            row: 0,
            step: Every::immediate(step_period(0)),
        }
    }
}

impl MarbleTrack {
    /// Rails on every even row, alternately open at the left and right end
    fn build_track(&mut self, grid: &Grid) {
        self.width = grid.width() as i32;
        self.height = grid.height() as i32;
        self.track = vec![false; grid.len()];
        for row in (0..self.height).step_by(2) {
            let cols = if row % 4 == 0 {
                1..self.width
            } else {
                0..self.width - 1
            };
            for col in cols {
                self.track[(row * self.width + col) as usize] = true;
            }
        }
    }

    fn is_track(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 || col >= self.width || row >= self.height {
            return false;
        }
        self.track[(row * self.width + col) as usize]
    }

    pub fn position(&self) -> (i32, i32) {
        (self.col, self.row)
    }

    /// Advance one cell: fall when possible, otherwise roll along the rail
    fn advance(&mut self) -> Option<(i32, i32)> {
        if self.row >= self.height - 1 {
            let vacated = (self.col, self.row);
            self.col = 0;
            self.row = 0;
            return Some(vacated);
        }
        if !self.is_track(self.col, self.row + 1) {
            self.row += 1;
        } else if (self.row - 1) % 4 != 0 {
            self.col -= 1;
        } else {
            self.col += 1;
        }
        None
    }
}

impl Mode for MarbleTrack {
    fn name(&self) -> &'static str {
        "MarbleTrack"
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), SimError> {
        self.build_track(&ctx.grid);
        self.col = self.width - 1;
        self.row = self.height - 1;
        self.step.reset();
        for row in 0..self.height {
            for col in 0..self.width {
                if self.is_track(col, row) {
                    ctx.pixels.set(ctx.grid.map(col, row), Rgb::OBSTACLE);
                }
            }
        }
        ctx.pixels.mark_dirty();
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        self.step.set_period(step_period(ctx.speed));
        if !self.step.ready(ctx.now) {
            return;
        }

        if let Some((col, row)) = self.advance() {
            ctx.pixels.set(ctx.grid.map(col, row), Rgb::BLACK);
        }
        for led in ctx.pixels.iter_mut().filter(|led| **led != Rgb::OBSTACLE) {
            *led = led.fade_to_black_by(TRAIL_FADE);
        }
        ctx.pixels.set(ctx.grid.map(self.col, self.row), Rgb::RED);
        ctx.pixels.mark_dirty();
    }
}
