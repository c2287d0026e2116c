//! LED pixel buffer and colors
//!
//! The buffer holds one color per physical LED plus one trailing void slot
//! that absorbs writes to out-of-range coordinates.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// 24-bit color, laid out as the bytes a WS2812 driver consumes
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::hex(0x000000);
    pub const WHITE: Rgb = Rgb::hex(0xFFFFFF);
    pub const RED: Rgb = Rgb::hex(0xFF0000);
    pub const GREEN: Rgb = Rgb::hex(0x008000);
    pub const BLUE: Rgb = Rgb::hex(0x0000FF);
    pub const YELLOW: Rgb = Rgb::hex(0xFFFF00);
    pub const PURPLE: Rgb = Rgb::hex(0x800080);
    pub const CYAN: Rgb = Rgb::hex(0x00FFFF);
    pub const ORANGE: Rgb = Rgb::hex(0xFFA500);
    pub const PINK: Rgb = Rgb::hex(0xFFC0CB);
    pub const LIME_GREEN: Rgb = Rgb::hex(0x32CD32);

    /// Dim grey used for pins, rails and other static obstacles
    pub const OBSTACLE: Rgb = Rgb::hex(0x161616);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn hex(code: u32) -> Self {
        Self {
            r: (code >> 16) as u8,
            g: (code >> 8) as u8,
            b: code as u8,
        }
    }

    pub const fn to_hex(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    #[inline]
    pub fn is_black(self) -> bool {
        self == Rgb::BLACK
    }

    /// Scale every channel by `scale / 256`, keeping lit channels lit
    pub fn scaled(self, scale: u8) -> Self {
        let s = scale as u16 + 1;
        Self {
            r: ((self.r as u16 * s) >> 8) as u8,
            g: ((self.g as u16 * s) >> 8) as u8,
            b: ((self.b as u16 * s) >> 8) as u8,
        }
    }

    /// Dim toward black by `amount / 256`
    pub fn fade_to_black_by(self, amount: u8) -> Self {
        self.scaled(255 - amount)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        format!("#{:06X}", color.to_hex())
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let digits = value.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("expected #RRGGBB, got {value:?}"));
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb::hex)
            .map_err(|e| format!("invalid color {value:?}: {e}"))
    }
}

/// Marble colors, cycled by body index
pub const MARBLE_PALETTE: [Rgb; 9] = [
    Rgb::RED,
    Rgb::GREEN,
    Rgb::BLUE,
    Rgb::YELLOW,
    Rgb::PURPLE,
    Rgb::CYAN,
    Rgb::ORANGE,
    Rgb::PINK,
    Rgb::LIME_GREEN,
];

/// Color for the marble at `index`, cycling through `palette`
#[inline]
pub fn palette_color(palette: &[Rgb], index: usize) -> Rgb {
    palette.get(index % palette.len().max(1)).copied().unwrap_or(Rgb::WHITE)
}

/// Frame handed to the display driver
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    leds: Vec<Rgb>,
    dirty: bool,
}

impl PixelBuffer {
    /// Allocate `grid.len() + 1` slots, the last being the void sink
    pub fn new(grid: &Grid) -> Self {
        Self {
            leds: vec![Rgb::BLACK; grid.len() + 1],
            dirty: true,
        }
    }

    /// Total slots including the void sink
    #[inline]
    pub fn len(&self) -> usize {
        self.leds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }

    /// Displayable LEDs, without the void sink
    #[inline]
    pub fn visible(&self) -> &[Rgb] {
        &self.leds[..self.leds.len() - 1]
    }

    /// Displayable LEDs as raw RGB bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.visible())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Rgb {
        self.leds.get(index).copied().unwrap_or(Rgb::BLACK)
    }

    /// Write a color; indices past the end land in the void sink
    #[inline]
    pub fn set(&mut self, index: usize, color: Rgb) {
        let last = self.leds.len() - 1;
        self.leds[index.min(last)] = color;
    }

    pub fn fill(&mut self, color: Rgb) {
        self.leds.fill(color);
    }

    pub fn clear(&mut self) {
        self.fill(Rgb::BLACK);
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Rgb> {
        let last = self.leds.len() - 1;
        self.leds[..last].iter_mut()
    }

    /// Signal the driver that a new frame is ready
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Driver side: consume the dirty flag after a refresh
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_has_void_slot() {
        let grid = Grid::new(3, 2);
        let mut pixels = PixelBuffer::new(&grid);
        assert_eq!(pixels.len(), 7);
        assert_eq!(pixels.visible().len(), 6);
        assert_eq!(pixels.as_bytes().len(), 18);

        pixels.set(grid.map(-1, 0), Rgb::RED);
        assert!(pixels.visible().iter().all(|c| c.is_black()));
        assert_eq!(pixels.get(grid.void_index()), Rgb::RED);
    }

    #[test]
    fn test_dirty_flag() {
        let mut pixels = PixelBuffer::new(&Grid::default());
        assert!(pixels.take_dirty());
        assert!(!pixels.take_dirty());
        pixels.mark_dirty();
        assert!(pixels.is_dirty());
    }

    #[test]
    fn test_fade_to_black() {
        let faded = Rgb::RED.fade_to_black_by(191);
        assert_eq!(faded, Rgb::new(64, 0, 0));
        let mut color = Rgb::WHITE;
        for _ in 0..6 {
            color = color.fade_to_black_by(191);
        }
        assert!(color.is_black());
    }

    #[test]
    fn test_color_json() {
        let json = serde_json::to_string(&Rgb::OBSTACLE).unwrap();
        assert_eq!(json, "\"#161616\"");
        let back: Rgb = serde_json::from_str("\"#ff8000\"").unwrap();
        assert_eq!(back, Rgb::new(0xFF, 0x80, 0x00));
        assert!(serde_json::from_str::<Rgb>("\"red\"").is_err());
    }

    #[test]
    fn test_color_rejects_signs_and_non_hex() {
        for bad in ["#+FFFFF", "#-00001", "# FFFFF", "#12345G"] {
            assert!(Rgb::try_from(bad.to_string()).is_err(), "{bad} parsed");
        }
        assert_eq!(Rgb::try_from("#00ff00".to_string()), Ok(Rgb::hex(0x00FF00)));
    }
}
