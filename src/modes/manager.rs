//! Mode table and transitions

use std::time::Instant;

use serde::Serialize;

use super::{MarbleTrack, Mode, ModeContext, ModeStatus, Off, PhysicsMode};
use crate::grid::Grid;
use crate::pixels::PixelBuffer;
use crate::scenes::{Bounce, Connect4, Pachinko, Ringer, Roller, connect4::FixedPattern};
use crate::settings::Settings;
use crate::sim::PhysicsSession;

/// Entry in the external mode listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub name: &'static str,
    pub visible: bool,
}

pub struct ModeManager {
    modes: Vec<Box<dyn Mode>>,
    current: usize,
    grid: Grid,
    pixels: PixelBuffer,
    speed: u8,
}

impl ModeManager {
    /// The standard mode table, starting on `off`
    pub fn new(grid: Grid, settings: &Settings) -> Self {
        let seed = settings.seed;
        let modes: Vec<Box<dyn Mode>> = vec![
            Box::new(PhysicsMode::new(Bounce::default(), seed)),
            Box::new(PhysicsMode::new(Pachinko::default(), seed.wrapping_add(1))),
            Box::new(PhysicsMode::new(Ringer::default(), seed.wrapping_add(2))),
            Box::new(PhysicsMode::new(Roller::default(), seed.wrapping_add(3))),
            Box::new(PhysicsMode::new(
                Connect4::new(Box::new(FixedPattern), settings.clock_color),
                seed.wrapping_add(4),
            )),
            Box::new(MarbleTrack::default()),
            Box::new(Off),
        ];
        Self::with_modes(grid, modes, settings.speed)
    }

    /// Custom table; the last entry is current until the first activation
    pub fn with_modes(grid: Grid, modes: Vec<Box<dyn Mode>>, speed: u8) -> Self {
        let current = modes.len().saturating_sub(1);
        Self {
            modes,
            current,
            grid,
            pixels: PixelBuffer::new(&grid),
            speed,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Driver access, for consuming the dirty flag
    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.pixels
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: u8) {
        if speed != self.speed {
            log::info!("speed set to {speed}");
            self.speed = speed;
        }
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.modes.get(self.current).map(|m| m.name())
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.modes
            .iter()
            .position(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Switch modes by case-insensitive name
    ///
    /// Returns whether a transition happened. Unknown names and the current
    /// mode are no-ops. The old mode has fully left before the new one enters.
    pub fn activate(&mut self, name: &str) -> bool {
        let Some(index) = self.find(name) else {
            log::debug!("ignoring unknown mode {name:?}");
            return false;
        };
        if index == self.current {
            return false;
        }

        if let Some(old) = self.modes.get_mut(self.current) {
            old.leave();
        }
        self.pixels.clear();
        self.pixels.mark_dirty();
        self.current = index;

        let mode = &mut self.modes[index];
        log::info!("entering mode {}", mode.name());
        let mut ctx = ModeContext {
            grid: self.grid,
            pixels: &mut self.pixels,
            speed: self.speed,
            now: Instant::now(),
        };
        if let Err(e) = mode.enter(&mut ctx) {
            log::warn!("mode {} failed to start: {e}", mode.name());
        }
        true
    }

    /// Advance the current mode by one loop iteration
    pub fn render(&mut self, now: Instant) {
        let Some(mode) = self.modes.get_mut(self.current) else {
            return;
        };
        let mut ctx = ModeContext {
            grid: self.grid,
            pixels: &mut self.pixels,
            speed: self.speed,
            now,
        };
        mode.update(&mut ctx);
    }

    /// Every mode in table order
    pub fn modes(&self) -> Vec<ModeInfo> {
        self.modes
            .iter()
            .map(|m| ModeInfo {
                name: m.name(),
                visible: m.visible(),
            })
            .collect()
    }

    /// Mode listing as JSON, for a REST or CLI layer
    pub fn modes_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.modes())
    }

    /// Resources held by the current mode
    pub fn status(&self) -> ModeStatus {
        self.modes
            .get(self.current)
            .map(|m| m.status())
            .unwrap_or_default()
    }

    /// Physics session of the current mode, if it runs one
    pub fn session(&self) -> Option<&PhysicsSession> {
        self.modes.get(self.current).and_then(|m| m.session())
    }

    pub fn status_of(&self, name: &str) -> Option<ModeStatus> {
        self.find(name).map(|i| self.modes[i].status())
    }

    /// Number of modes with a running stepper; never more than one
    pub fn active_steppers(&self) -> usize {
        self.modes.iter().filter(|m| m.status().stepping).count()
    }
}

impl Drop for ModeManager {
    fn drop(&mut self) {
        if let Some(mode) = self.modes.get_mut(self.current) {
            mode.leave();
        }
    }
}
