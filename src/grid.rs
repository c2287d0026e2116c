//! Logical grid to physical LED index mapping
//!
//! The panel is wired as one serpentine strip: every row is a run of LEDs and
//! consecutive rows alternate direction. Index 0 sits at the bottom-right
//! corner, so the row-major serpentine index is reversed at the end.

use crate::consts::{GRID_HEIGHT, GRID_WIDTH};

/// Fixed-size logical coordinate space, row 0 at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GRID_WIDTH, GRID_HEIGHT)
    }
}

impl Grid {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of displayable cells
    #[inline]
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserved sink slot for out-of-range coordinates, never displayed
    #[inline]
    pub const fn void_index(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height
    }

    /// Map (col, row) to a pixel buffer index
    ///
    /// Even rows run left to right and odd rows right to left before the
    /// final reversal, which puts the top-left cell at the last index.
    #[inline]
    pub fn map(&self, col: i32, row: i32) -> usize {
        if !self.contains(col, row) {
            return self.void_index();
        }
        let (col, row) = (col as usize, row as usize);
        let base = if row % 2 == 0 {
            row * self.width + col
        } else {
            row * self.width + (self.width - 1 - col)
        };
        self.len() - 1 - base
    }
}
