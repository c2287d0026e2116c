//! Display driver boundary
//!
//! The manager only fills a `PixelBuffer` and raises its dirty flag. A driver
//! pushes the buffer to hardware when it sees the flag, applying brightness on
//! the way out.

use std::io::{self, Write};

use crate::grid::Grid;
use crate::pixels::PixelBuffer;

pub trait Display {
    /// Push one frame to the output
    fn show(&mut self, grid: &Grid, pixels: &PixelBuffer) -> io::Result<()>;

    fn set_brightness(&mut self, brightness: u8);
}

/// Renders the grid as 24-bit ANSI colored cells, two columns per LED
pub struct AnsiTerminal<W: Write> {
    out: W,
    brightness: u8,
    frames: u64,
}

impl<W: Write> AnsiTerminal<W> {
    pub fn new(out: W, brightness: u8) -> Self {
        Self {
            out,
            brightness,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Display for AnsiTerminal<W> {
    fn show(&mut self, grid: &Grid, pixels: &PixelBuffer) -> io::Result<()> {
        let mut frame = String::with_capacity(grid.len() * 24);
        // Home the cursor so frames overwrite each other
        frame.push_str("\x1b[H");
        for row in 0..grid.height() as i32 {
            for col in 0..grid.width() as i32 {
                let c = pixels.get(grid.map(col, row)).scaled(self.brightness);
                frame.push_str(&format!("\x1b[48;2;{};{};{}m  ", c.r, c.g, c.b));
            }
            frame.push_str("\x1b[0m\n");
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::Rgb;

    #[test]
    fn test_ansi_frame_layout() {
        let grid = Grid::new(3, 2);
        let mut pixels = PixelBuffer::new(&grid);
        pixels.set(grid.map(0, 0), Rgb::RED);

        let mut display = AnsiTerminal::new(Vec::new(), 255);
        display.show(&grid, &pixels).unwrap();
        assert_eq!(display.frames(), 1);

        let text = String::from_utf8(display.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        // Top-left cell comes first
        assert!(lines[0].starts_with("\x1b[H\x1b[48;2;255;0;0m  "));
        assert_eq!(lines[1].matches("48;2;0;0;0m").count(), 3);
    }

    #[test]
    fn test_brightness_scales_output() {
        let grid = Grid::new(1, 1);
        let mut pixels = PixelBuffer::new(&grid);
        pixels.set(grid.map(0, 0), Rgb::WHITE);

        let mut display = AnsiTerminal::new(Vec::new(), 255);
        display.set_brightness(127);
        display.show(&grid, &pixels).unwrap();
        let text = String::from_utf8(display.into_inner()).unwrap();
        assert!(text.contains("48;2;127;127;127m"));
    }
}
